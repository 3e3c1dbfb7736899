use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use object_store::{path::Path, ObjectStore};
use parquet::arrow::arrow_reader::ParquetRecordBatchReader;
use std::sync::Arc;
use tracing::{debug, error};
use crate::constants::{RECORD_FLAG_COLUMN, RECORD_TIMESTAMP_COLUMN, RECORD_VALUE_COLUMN};
use crate::error::{Error, Result};
use crate::models::RawObservation;
use super::RecordSource;

const BATCH_SIZE: usize = 1024;

/// Parquet file with `flag`, `start_date` and `value` columns. Timestamp and
/// value columns may be of any type arrow can cast to text and float; values
/// that fail to cast become missing.
pub struct ParquetRecordSource {
    store: Arc<dyn ObjectStore>,
    path: Path,
}

impl ParquetRecordSource {
    pub fn new(store: Arc<dyn ObjectStore>, path: Path) -> Self {
        Self { store, path }
    }
}

#[async_trait]
impl RecordSource for ParquetRecordSource {
    fn name(&self) -> String {
        self.path.to_string()
    }

    async fn load(&self) -> Result<Vec<RawObservation>> {
        let bytes = self
            .store
            .get(&self.path)
            .await
            .map_err(|e| {
                error!("Failed to read record file {}: {}", self.path, e);
                Error::from(e)
            })?
            .bytes()
            .await?;

        let reader = ParquetRecordBatchReader::try_new(bytes, BATCH_SIZE).map_err(|e| {
            error!("Failed to create Parquet reader for {}: {}", self.path, e);
            Error::from(e)
        })?;

        let mut observations = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;
            observations.extend(read_batch(&batch)?);
        }

        debug!("Read {} records from {}", observations.len(), self.path);
        Ok(observations)
    }
}

fn column_as(batch: &RecordBatch, name: &str, data_type: &DataType) -> Result<ArrayRef> {
    let idx = batch.schema().index_of(name).map_err(|e| {
        error!("Failed to find {} column: {}", name, e);
        Error::from(e)
    })?;
    Ok(cast(batch.column(idx).as_ref(), data_type)?)
}

fn read_batch(batch: &RecordBatch) -> Result<Vec<RawObservation>> {
    let flags = column_as(batch, RECORD_FLAG_COLUMN, &DataType::Utf8)?;
    let dates = column_as(batch, RECORD_TIMESTAMP_COLUMN, &DataType::Utf8)?;
    let values = column_as(batch, RECORD_VALUE_COLUMN, &DataType::Float64)?;

    let flags = downcast::<StringArray>(&flags, RECORD_FLAG_COLUMN)?;
    let dates = downcast::<StringArray>(&dates, RECORD_TIMESTAMP_COLUMN)?;
    let values = downcast::<Float64Array>(&values, RECORD_VALUE_COLUMN)?;

    let mut observations = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        // Records without a flag cannot be attributed to any series
        if flags.is_null(i) {
            continue;
        }

        let start_date = if dates.is_null(i) { "" } else { dates.value(i) };
        let value = (!values.is_null(i)).then(|| values.value(i));
        observations.push(RawObservation::new(flags.value(i), start_date, value));
    }

    Ok(observations)
}

fn downcast<'a, A: Array + 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        error!("Failed to downcast {} column", name);
        Error::Parquet(format!("Unexpected type for column {}", name))
    })
}
