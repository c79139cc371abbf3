//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式，格式由文件扩展名决定。

use std::path::Path;

use contracts::{ContractError, SheetsBlueprint};
use serde::de::DeserializeOwned;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 从文件路径推断格式
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "cannot determine config format of '{}'",
                path.display()
            ))
        })?;
        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<SheetsBlueprint, ContractError> {
    parse_as(content, ConfigFormat::Toml)
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<SheetsBlueprint, ContractError> {
    parse_as(content, ConfigFormat::Json)
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<SheetsBlueprint, ContractError> {
    parse_as(content, format)
}

fn parse_as<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T, ContractError> {
    let parsed = match format {
        ConfigFormat::Toml => toml::from_str(content)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    };
    parsed.map_err(|e| ContractError::ConfigParse {
        message: format!("{} parse error: {e}", format.label()),
        source: Some(e),
    })
}
