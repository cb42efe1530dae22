//! Command-line interface for bt-fixture
//!
//! # Usage Examples
//!
//! ```bash
//! # Load one fixture
//! bt-fixture load \
//!   --project test-project --instance test-instance \
//!   testdata/test.yml
//!
//! # Several fixtures, text encoding, 30 second deadline per file
//! BIGTABLE_ACCESS_TOKEN="$(gcloud auth print-access-token)" \
//! bt-fixture load --project p --instance i \
//!   --encoding text --timeout 30s \
//!   fixtures/users.yml fixtures/orders.yaml
//!
//! # Validate fixtures without touching Bigtable
//! bt-fixture load --dry-run fixtures/*.yml
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use bt_fixture::config::parse_duration;
use bt_fixture::table_store::{MemoryStore, TableStore};
use bt_fixture::{BigtableOpts, BigtableOptions, Encoding, Fixture, FixtureConfig, LoadSummary};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bt-fixture")]
#[command(about = "Load YAML fixtures into Cloud Bigtable tables")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace tables with the contents of fixture files
    Load {
        /// Bigtable connection options
        #[command(flatten)]
        bigtable: BigtableOpts,

        /// Cell value encoding
        #[arg(long, value_enum, default_value = "big-endian")]
        encoding: Encoding,

        /// Maximum time per fixture file (e.g. "300", "30s", "5m", "1h")
        #[arg(long)]
        timeout: Option<String>,

        /// Fixture files (.yml or .yaml), loaded in order
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            bigtable,
            encoding,
            timeout,
            files,
        } => {
            let timeout = timeout.as_deref().map(parse_duration).transpose()?;
            let config = FixtureConfig {
                encoder: encoding.encoder(),
                bigtable: BigtableOptions::from(&bigtable),
            };

            if bigtable.dry_run {
                let fixture = Fixture::with_store(MemoryStore::new(), config);
                load_files(&fixture, &files, timeout).await
            } else {
                let project = bigtable
                    .project
                    .as_deref()
                    .context("--project (or BIGTABLE_PROJECT) is required")?;
                let instance = bigtable
                    .instance
                    .as_deref()
                    .context("--instance (or BIGTABLE_INSTANCE) is required")?;
                let fixture = Fixture::new(project, instance, config)
                    .context("Failed to create Bigtable client")?;
                load_files(&fixture, &files, timeout).await
            }
        }
    }
}

async fn load_files<S: TableStore>(
    fixture: &Fixture<S>,
    files: &[PathBuf],
    timeout: Option<Duration>,
) -> anyhow::Result<()> {
    for file in files {
        let summary = load_one(fixture, file, timeout)
            .await
            .with_context(|| format!("Failed to load {}", file.display()))?;
        println!(
            "{}: table '{}' {} ({} families, {} cells)",
            file.display(),
            summary.table,
            if summary.replaced_existing {
                "replaced"
            } else {
                "created"
            },
            summary.families_created,
            summary.cells_written
        );
    }
    Ok(())
}

async fn load_one<S: TableStore>(
    fixture: &Fixture<S>,
    file: &Path,
    timeout: Option<Duration>,
) -> anyhow::Result<LoadSummary> {
    let summary = match timeout {
        Some(limit) => tokio::time::timeout(limit, fixture.load(file))
            .await
            .with_context(|| format!("Timed out after {limit:?}"))??,
        None => fixture.load(file).await?,
    };
    Ok(summary)
}
