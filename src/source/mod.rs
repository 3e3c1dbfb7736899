pub mod parquet_source;
pub mod json_source;

pub use parquet_source::ParquetRecordSource;
pub use json_source::JsonRecordSource;

use async_trait::async_trait;
use futures::StreamExt;
use object_store::{local::LocalFileSystem, path::Path, ObjectStore};
use std::sync::Arc;
use tracing::{info, warn};
use crate::constants::RECORDS_DIR;
use crate::error::{Error, Result};
use crate::models::RawObservation;

/// Boundary to the vendor export parser: anything that can hand over
/// `(flag, start_date, value)` records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn name(&self) -> String;
    async fn load(&self) -> Result<Vec<RawObservation>>;
}

/// Picks a source by file extension.
pub fn source_for_path(store: Arc<dyn ObjectStore>, path: Path) -> Result<Box<dyn RecordSource>> {
    match path.extension().map(|ext| ext.to_lowercase()).as_deref() {
        Some("parquet") => Ok(Box::new(ParquetRecordSource::new(store, path))),
        Some("json") => Ok(Box::new(JsonRecordSource::new(store, path))),
        _ => Err(Error::Input(format!("Unsupported record file: {}", path))),
    }
}

/// Opens a single file on the local filesystem as a record source.
pub fn source_for_file(file: &std::path::Path) -> Result<Box<dyn RecordSource>> {
    let parent = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::Input(format!("Invalid record file path: {:?}", file)))?;

    let store: Arc<dyn ObjectStore> = Arc::new(LocalFileSystem::new_with_prefix(parent)?);
    source_for_path(store, Path::from(name))
}

/// Every parquet or JSON file under `records/`.
pub async fn discover_sources(store: Arc<dyn ObjectStore>) -> Result<Vec<Box<dyn RecordSource>>> {
    let records_path = Path::from(RECORDS_DIR);
    let mut listing = store.list(Some(&records_path));
    let mut sources = Vec::new();

    while let Some(meta) = listing.next().await {
        let meta = meta?;
        match source_for_path(Arc::clone(&store), meta.location.clone()) {
            Ok(source) => sources.push(source),
            Err(_) => warn!("Skipping unsupported file {}", meta.location),
        }
    }

    sources.sort_by_key(|source| source.name());
    Ok(sources)
}

pub async fn load_all(sources: &[Box<dyn RecordSource>]) -> Result<Vec<RawObservation>> {
    let mut observations = Vec::new();
    for source in sources {
        let records = source.load().await?;
        info!("Loaded {} records from {}", records.len(), source.name());
        observations.extend(records);
    }
    Ok(observations)
}
