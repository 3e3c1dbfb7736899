use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use health_export::{
    constants::RECORDS_DIR, discover_sources, init_logging, load_all, serve, source_for_file,
    ExportWriter, SeriesStore, Settings, Validator,
};
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use std::{path::{Path, PathBuf}, sync::Arc};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "health-export")]
#[command(about = "Day-aggregated health series export service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(short = 'b', long)]
        host: Option<String>,

        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Export a day range of one flag to CSV
    Export {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        flag: String,

        #[arg(short, long)]
        start_index: Option<i64>,

        #[arg(short, long)]
        end_index: Option<i64>,

        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Write per-flag day aggregates as parquet
    Aggregate {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Check day series invariants for every flag
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn ensure_directories(data_dir: &Path) -> Result<()> {
    let records_dir = data_dir.join(RECORDS_DIR);
    if !records_dir.exists() {
        std::fs::create_dir_all(&records_dir)?;
        info!("Created directory: {:?}", records_dir);
    }
    Ok(())
}

fn local_store(dir: &Path) -> Result<Arc<dyn ObjectStore>> {
    std::fs::create_dir_all(dir)?;
    let store = LocalFileSystem::new_with_prefix(dir)
        .with_context(|| format!("Failed to open {:?}", dir))?;
    Ok(Arc::new(store))
}

async fn load_file(input: &Path) -> Result<Arc<SeriesStore>> {
    let source = source_for_file(input)?;
    let records = source.load().await?;
    info!("Read {} records from {}", records.len(), source.name());

    let store = Arc::new(SeriesStore::new());
    store
        .load(Some(source.name()), records)
        .await
        .with_context(|| format!("No usable records in {:?}", input))?;
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before the log filter reads RUST_LOG
    dotenv::dotenv().ok();

    // Initialize logging
    init_logging();

    // Parse command line arguments
    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Serve { port, host, data_dir } => {
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(data_dir) = data_dir {
                settings.data_dir = data_dir;
            }

            ensure_directories(&settings.data_dir)?;
            let data_store = local_store(&settings.data_dir)?;
            let store = Arc::new(SeriesStore::new());

            // Preload anything already sitting under records/
            let sources = discover_sources(Arc::clone(&data_store)).await?;
            if sources.is_empty() {
                info!("No record files found; waiting for an upload");
            } else {
                let records = load_all(&sources).await?;
                match store.load(Some(settings.data_dir.display().to_string()), records).await {
                    Ok(snapshot) => info!("Preloaded {} flags", snapshot.flag_count()),
                    Err(e) => warn!("Preload skipped: {}", e),
                }
            }

            info!("Starting API server using data from {:?}", settings.data_dir);
            serve(settings, store).await?;
        }
        Commands::Export {
            input,
            flag,
            start_index,
            end_index,
            out_dir,
        } => {
            let store = load_file(&input).await?;
            let export = store.get_export(&flag, start_index, end_index).await?;

            let out_dir = out_dir.unwrap_or_else(|| settings.data_dir.clone());
            let writer = ExportWriter::new(local_store(&out_dir)?);
            let path = writer.write_export(&export).await?;

            info!("Exported {} rows of {} to {:?}/{}", export.rows, flag, out_dir, path);
        }
        Commands::Aggregate { input, out_dir } => {
            let store = load_file(&input).await?;
            let snapshot = store.snapshot().await;

            let out_dir = out_dir.unwrap_or_else(|| settings.data_dir.clone());
            let writer = ExportWriter::new(local_store(&out_dir)?);

            for flag in snapshot.flags() {
                let aggregation = store.aggregation_in(&snapshot, flag)?;
                writer.write_aggregation(flag, &aggregation).await?;
            }

            info!("Successfully wrote aggregates for {} flags", snapshot.flag_count());
        }
        Commands::Validate { input } => {
            let store = load_file(&input).await?;
            let validator = Validator::new(Arc::clone(&store));
            let results = validator.validate_all().await?;

            let failed: Vec<&String> = results
                .iter()
                .filter(|(_, stats)| !stats.is_valid())
                .map(|(flag, _)| flag)
                .collect();

            if !failed.is_empty() {
                error!("Validation failed for {} flags: {:?}", failed.len(), failed);
                return Err(anyhow::anyhow!("Validation failed for {} flags", failed.len()));
            }

            info!("Validation completed successfully for {} flags", results.len());
        }
    }

    Ok(())
}
