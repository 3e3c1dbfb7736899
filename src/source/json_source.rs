use async_trait::async_trait;
use object_store::{path::Path, ObjectStore};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};
use crate::error::{Error, Result};
use crate::models::{RawObservation, UploadDocument};
use super::RecordSource;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordPayload {
    Document(UploadDocument),
    Records(Vec<RawObservation>),
}

/// Accepts either an upload document or a bare array of records.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RawObservation>> {
    let payload: RecordPayload = serde_json::from_slice(bytes)?;
    Ok(match payload {
        RecordPayload::Document(document) => document.records,
        RecordPayload::Records(records) => records,
    })
}

pub struct JsonRecordSource {
    store: Arc<dyn ObjectStore>,
    path: Path,
}

impl JsonRecordSource {
    pub fn new(store: Arc<dyn ObjectStore>, path: Path) -> Self {
        Self { store, path }
    }
}

#[async_trait]
impl RecordSource for JsonRecordSource {
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

        let records = parse_records(&bytes)?;
        debug!("Read {} records from {}", records.len(), self.path);
        Ok(records)
    }
}
