//! 配置校验模块
//!
//! 校验规则：
//! - 至少一个任务
//! - 任务名非空且唯一
//! - 0 < period_secs <= JobSpec::MAX_SECS，offset_secs <= JobSpec::MAX_SECS
//! - max_attempts >= 1
//! - interrupt_after < kill_after
//!
//! 任务名是否可识别由 JobRegistry 在启动时判定。

use std::collections::HashSet;

use contracts::{ContractError, JobSpec, SheetsBlueprint};

/// 校验 SheetsBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &SheetsBlueprint) -> Result<(), ContractError> {
    validate_job_names(blueprint)?;
    validate_job_periods(blueprint)?;
    validate_delivery(blueprint)?;
    Ok(())
}

/// 非致命问题 (offset 超出一个周期等)
pub fn warnings(blueprint: &SheetsBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    for job in &blueprint.jobs {
        if job.period_secs > 0 && job.offset_secs >= job.period_secs {
            warnings.push(format!(
                "job '{}': offset_secs ({}) >= period_secs ({}), the first tick may wait longer than one period",
                job.name, job.offset_secs, job.period_secs
            ));
        }
    }
    warnings
}

/// 校验任务名唯一性
fn validate_job_names(blueprint: &SheetsBlueprint) -> Result<(), ContractError> {
    if blueprint.jobs.is_empty() {
        return Err(ContractError::config_validation(
            "jobs",
            "at least one job must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, job) in blueprint.jobs.iter().enumerate() {
        if job.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("jobs[{}].name", idx),
                "job name cannot be empty",
            ));
        }
        if !seen.insert(job.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("jobs[name={}]", job.name),
                "duplicate job name",
            ));
        }
    }
    Ok(())
}

/// 校验周期与偏移
fn validate_job_periods(blueprint: &SheetsBlueprint) -> Result<(), ContractError> {
    for job in &blueprint.jobs {
        if job.period_secs == 0 {
            return Err(ContractError::config_validation(
                format!("jobs[{}].period_secs", job.name),
                "period_secs must be > 0",
            ));
        }
        if job.period_secs > JobSpec::MAX_SECS {
            return Err(ContractError::config_validation(
                format!("jobs[{}].period_secs", job.name),
                format!("period_secs must be <= {}", JobSpec::MAX_SECS),
            ));
        }
        if job.offset_secs > JobSpec::MAX_SECS {
            return Err(ContractError::config_validation(
                format!("jobs[{}].offset_secs", job.name),
                format!("offset_secs must be <= {}", JobSpec::MAX_SECS),
            ));
        }
    }
    Ok(())
}

/// 校验投递策略
fn validate_delivery(blueprint: &SheetsBlueprint) -> Result<(), ContractError> {
    let delivery = &blueprint.delivery;

    if delivery.max_attempts == 0 {
        return Err(ContractError::config_validation(
            "delivery.max_attempts",
            "max_attempts must be >= 1",
        ));
    }

    if delivery.interrupt_after() >= delivery.kill_after() {
        return Err(ContractError::config_validation(
            "delivery.interrupt_after_secs / delivery.kill_after_secs",
            format!(
                "interrupt_after_secs ({:.3}) must be < kill_after_secs ({:.3})",
                delivery.interrupt_after().as_secs_f64(),
                delivery.kill_after().as_secs_f64()
            ),
        ));
    }

    Ok(())
}
