use std::path::PathBuf;
use std::process::ExitCode;

use bucket_sync_core::SyncTarget;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "bucket-sync")]
#[command(about = "Back up a directory to object storage and restore it", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Storage backend URL (s3://?region=.., file:///path, memory://)
    #[arg(long, global = true, env = "BUCKET_SYNC_STORAGE")]
    storage: Option<String>,

    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Region for the S3 client and for newly created buckets
    #[arg(long, global = true)]
    region: Option<String>,

    /// Output format for the end-of-pass report
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up a local directory into bucket::directory
    Backup {
        /// Local directory to back up
        local_dir: PathBuf,

        /// Destination as bucket::directory
        #[arg(value_parser = SyncTarget::parse)]
        target: SyncTarget,

        /// Show what would be uploaded without creating buckets or uploading
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore bucket::directory into a local directory
    Restore {
        /// Source as bucket::directory
        #[arg(value_parser = SyncTarget::parse)]
        target: SyncTarget,

        /// Local directory to restore into
        local_dir: PathBuf,

        /// Strip the whole directory from keys instead of only its first segment
        #[arg(long)]
        full_prefix: bool,
    },
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Usage errors go to stdout alongside the progress lines
            println!("{}", e.render());
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = commands::Settings {
        config: cli.config,
        storage: cli.storage,
        region: cli.region,
        format: cli.format,
    };

    match cli.command {
        Commands::Backup {
            local_dir,
            target,
            dry_run,
        } => {
            commands::backup::run(&settings, &local_dir, &target, dry_run).await?;
        }
        Commands::Restore {
            target,
            local_dir,
            full_prefix,
        } => {
            commands::restore::run(&settings, &target, &local_dir, full_prefix).await?;
        }
    }

    Ok(())
}
