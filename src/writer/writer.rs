use arrow::{
    array::{ArrayRef, Date32Array, Float64Array},
    datatypes::Date32Type,
    record_batch::RecordBatch,
};
use bytes::Bytes;
use object_store::{path::Path, ObjectStore};
use parquet::{
    arrow::ArrowWriter,
    basic::Compression,
    file::properties::WriterProperties,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use crate::constants::{AGGREGATES_DIR, EXPORTS_DIR};
use crate::error::{Error, Result};
use crate::models::{Aggregation, ExportFile};

const MAX_CONCURRENT_WRITES: usize = 8;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Writes CSV exports and per-flag aggregate snapshots to an object store.
pub struct ExportWriter {
    write_semaphore: Arc<Semaphore>,
    object_store: Arc<dyn ObjectStore>,
    max_retries: u32,
    retry_delay: Duration,
}

impl ExportWriter {
    pub fn new(object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            write_semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_WRITES)),
            object_store,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(500),
        }
    }

    fn get_export_path(&self, filename: &str) -> Path {
        Path::from(format!("{}/{}", EXPORTS_DIR, filename))
    }

    fn get_aggregate_path(&self, flag: &str) -> Path {
        Path::from(format!("{}/{}.parquet", AGGREGATES_DIR, flag))
    }

    pub async fn write_export(&self, export: &ExportFile) -> Result<Path> {
        let _permit = self
            .write_semaphore
            .acquire()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        let path = self.get_export_path(&export.filename);
        self.put_with_retries(&path, export.bytes.clone()).await?;
        info!("Wrote {} rows to {}", export.rows, path);
        Ok(path)
    }

    /// Stores a flag's day series as parquet with `date` and `value` columns.
    pub async fn write_aggregation(&self, flag: &str, aggregation: &Aggregation) -> Result<Path> {
        let _permit = self
            .write_semaphore
            .acquire()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        if aggregation.is_empty() {
            warn!("No day aggregates to write for flag {}", flag);
        }

        let batch = create_record_batch_from_aggregation(aggregation)?;
        let buffer = encode_parquet(&batch)?;
        let path = self.get_aggregate_path(flag);
        self.put_with_retries(&path, buffer).await?;

        info!("Wrote {} day aggregates for {} to {}", aggregation.len(), flag, path);
        Ok(path)
    }

    async fn put_with_retries(&self, path: &Path, bytes: Bytes) -> Result<()> {
        let mut retries = 0;
        loop {
            match self.object_store.put(path, bytes.clone().into()).await {
                Ok(_) => return Ok(()),
                Err(e) if retries + 1 < self.max_retries => {
                    retries += 1;
                    let delay = self.retry_delay * 2u32.pow(retries - 1);
                    warn!(
                        "Write attempt {} failed for path {}: {}. Retrying in {:?}...",
                        retries, path, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn encode_parquet(batch: &RecordBatch) -> Result<Bytes> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buffer = Vec::new();
    {
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
        writer.write(batch)?;
        writer.close()?;
    }
    Ok(Bytes::from(buffer))
}

fn create_record_batch_from_aggregation(aggregation: &Aggregation) -> Result<RecordBatch> {
    let dates: Vec<i32> = aggregation
        .series
        .iter()
        .map(|day| Date32Type::from_naive_date(day.date))
        .collect();
    let values: Vec<Option<f64>> = aggregation.series.iter().map(|day| day.value).collect();

    Ok(RecordBatch::try_from_iter([
        ("date", Arc::new(Date32Array::from(dates)) as ArrayRef),
        ("value", Arc::new(Float64Array::from(values)) as ArrayRef),
    ])?)
}
