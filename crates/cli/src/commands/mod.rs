//! Command implementations.

mod info;
mod once;
mod run;
mod validate;

pub use info::run_info;
pub use once::run_once;
pub use run::run_scheduler;
pub use validate::run_validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use collector::SnapshotSource;
use contracts::{DeliverySink, SheetsBlueprint};
use dispatcher::{ConfiguredSink, FanOut};
use tracing::info;

use crate::cli::DeliveryArgs;

/// Load and validate the configuration file
fn load_blueprint(path: &Path) -> Result<SheetsBlueprint> {
    info!(config = %path.display(), "Loading configuration");

    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    info!(
        jobs = blueprint.jobs.len(),
        snapshot_dir = %blueprint.source.snapshot_dir.display(),
        max_attempts = blueprint.delivery.max_attempts,
        "Configuration loaded"
    );
    Ok(blueprint)
}

/// Sink, fan-out and source shared by every job of this process
struct DeliveryStack {
    sink: Arc<ConfiguredSink>,
    fanout: FanOut<ConfiguredSink>,
    source: Arc<SnapshotSource>,
}

impl DeliveryStack {
    fn new(blueprint: &SheetsBlueprint, delivery: &DeliveryArgs) -> Self {
        let sink = Arc::new(ConfiguredSink::new(delivery.dry_run, blueprint.delivery));
        let fanout = FanOut::new(Arc::clone(&sink), Arc::new(delivery.target()));
        let source = Arc::new(SnapshotSource::new(&blueprint.source.snapshot_dir));

        info!(
            sink = %sink.name(),
            program = %delivery.bin.display(),
            spreadsheet = %delivery.spreadsheet,
            "Delivery configured"
        );

        Self {
            sink,
            fanout,
            source,
        }
    }
}
