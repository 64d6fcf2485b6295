use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use bucket_sync_core::{KeyLayout, RestoreEngine, SyncTarget};
use tracing::info;

use super::{print_progress, Settings};
use crate::OutputFormat;

pub async fn run(settings: &Settings, target: &SyncTarget, local_dir: &Path, full_prefix: bool) -> Result<()> {
    let mut config = settings.resolve_config().await?;
    if full_prefix {
        config.restore.layout = KeyLayout::FullPrefix;
    }

    let storage = settings.backend(&config).await?;

    info!("Starting restore of {} into {}", target, local_dir.display());

    let mut engine = RestoreEngine::new(storage, config.restore);
    if settings.format == OutputFormat::Text {
        engine = engine.with_progress(Arc::new(print_progress));
    }

    let report = engine.run(target, local_dir).await?;

    match settings.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{} files restored", report.files_restored()),
    }

    Ok(())
}
