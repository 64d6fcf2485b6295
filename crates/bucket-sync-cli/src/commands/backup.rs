use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use bucket_sync_core::{BackupEngine, BackupReport, SyncTarget};
use tracing::info;

use super::{print_progress, Settings};
use crate::OutputFormat;

pub async fn run(settings: &Settings, local_dir: &Path, target: &SyncTarget, dry_run: bool) -> Result<()> {
    let mut config = settings.resolve_config().await?;
    config.backup.dry_run |= dry_run;

    let storage = settings.backend(&config).await?;

    info!("Starting backup of {} to {}", local_dir.display(), target);

    let mut engine = BackupEngine::new(storage, config.backup);
    if settings.format == OutputFormat::Text {
        engine = engine.with_progress(Arc::new(print_progress));
    }

    let report = engine.run(local_dir, target).await?;

    match settings.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_summary(&report),
    }

    Ok(())
}

fn print_summary(report: &BackupReport) {
    for issue in &report.walk_issues {
        println!("Back up failed for {}: {}", issue.path, issue.reason);
    }

    if report.dry_run {
        println!(
            "Dry run: {} would be uploaded, {} unchanged, {} failed",
            report.would_upload(),
            report.unchanged(),
            report.failed()
        );
    } else {
        println!(
            "{} uploaded, {} unchanged, {} failed",
            report.uploaded(),
            report.unchanged(),
            report.failed()
        );
    }
}
