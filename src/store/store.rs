use dashmap::DashMap;
use itertools::Itertools;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use crate::constants::PREVIEW_ROWS;
use crate::error::{Error, Result};
use crate::models::{Aggregation, ExportFile, FlagSummary, RawObservation};
use crate::processor::{aggregate, export_file, slice};

/// Observations of one flag, tagged with the generation that published them.
#[derive(Debug, Clone)]
pub struct FlagRecords {
    pub generation: u64,
    pub observations: Arc<[RawObservation]>,
}

/// Immutable view of every flag's records. A new upload publishes a new
/// snapshot; requests hold on to the one they started with.
#[derive(Debug, Default)]
pub struct RecordSnapshot {
    pub generation: u64,
    pub source: Option<String>,
    flags: HashMap<String, FlagRecords>,
}

impl RecordSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    pub fn records(&self, flag: &str) -> Result<&FlagRecords> {
        if !self.is_loaded() {
            return Err(Error::NotReady);
        }
        self.flags
            .get(flag)
            .ok_or_else(|| Error::UnknownFlag(flag.to_string()))
    }

    pub fn flags(&self) -> Vec<&str> {
        self.flags.keys().map(String::as_str).sorted().collect()
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }
}

/// Per-session record store with an aggregate cache keyed by
/// `(flag, generation)`.
pub struct SeriesStore {
    snapshot: RwLock<Arc<RecordSnapshot>>,
    aggregates: DashMap<(String, u64), Arc<Aggregation>>,
    // Published generation of every flag, updated before stale entries are purged
    live: DashMap<String, u64>,
    next_generation: AtomicU64,
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(RecordSnapshot::default())),
            aggregates: DashMap::new(),
            live: DashMap::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Only called with the snapshot write guard held, so generations are
    /// published in the order they are allocated.
    fn bump_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst)
    }

    fn is_live(&self, flag: &str, generation: u64) -> bool {
        self.live.get(flag).is_some_and(|live| *live == generation)
    }

    pub async fn snapshot(&self) -> Arc<RecordSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    pub async fn generation(&self) -> u64 {
        self.snapshot.read().await.generation
    }

    /// Replaces the whole store with a new upload. Every flag moves to a new
    /// generation and cached aggregates of the old ones are purged.
    pub async fn load(
        &self,
        source: Option<String>,
        observations: Vec<RawObservation>,
    ) -> Result<Arc<RecordSnapshot>> {
        let grouped = observations
            .into_iter()
            .into_group_map_by(|observation| observation.flag.clone());

        if grouped.is_empty() {
            warn!("Upload {:?} contained no flags", source);
            return Err(Error::NoFlags);
        }

        let mut current = self.snapshot.write().await;
        let generation = self.bump_generation();
        let flags: HashMap<String, FlagRecords> = grouped
            .into_iter()
            .map(|(flag, records)| {
                let records = FlagRecords {
                    generation,
                    observations: Arc::from(records),
                };
                (flag, records)
            })
            .collect();

        let snapshot = Arc::new(RecordSnapshot {
            generation,
            source,
            flags,
        });

        self.live.retain(|flag, _| snapshot.flags.contains_key(flag));
        for flag in snapshot.flags.keys() {
            self.live.insert(flag.clone(), generation);
        }
        *current = Arc::clone(&snapshot);
        self.purge_stale(&snapshot);
        drop(current);

        info!(
            "Loaded {} flags as generation {}{}",
            snapshot.flag_count(),
            generation,
            snapshot
                .source
                .as_ref()
                .map_or(String::new(), |s| format!(" from {}", s))
        );

        Ok(snapshot)
    }

    /// Swaps the observations of a single flag and drops its cached aggregate.
    /// Other flags keep their generation and their cached aggregates.
    pub async fn replace_flag(&self, flag: &str, observations: Vec<RawObservation>) -> Result<u64> {
        let mut current = self.snapshot.write().await;
        let generation = self.bump_generation();

        let mut flags = current.flags.clone();
        flags.insert(
            flag.to_string(),
            FlagRecords {
                generation,
                observations: Arc::from(observations),
            },
        );
        let next = Arc::new(RecordSnapshot {
            generation,
            source: current.source.clone(),
            flags,
        });

        self.live.insert(flag.to_string(), generation);
        *current = next;
        self.discard(flag);
        drop(current);

        info!("Replaced records for flag {} at generation {}", flag, generation);
        Ok(generation)
    }

    /// Discards every cached aggregate for `flag`. The next export recomputes
    /// it from the current snapshot.
    pub async fn reload(&self, flag: &str) -> Result<u64> {
        let snapshot = self.snapshot().await;
        let records = snapshot.records(flag)?;
        let removed = self.discard(flag);
        debug!("Discarded {} cached aggregates for {}", removed, flag);
        Ok(records.generation)
    }

    fn discard(&self, flag: &str) -> usize {
        let before = self.aggregates.len();
        self.aggregates.retain(|(cached_flag, _), _| cached_flag != flag);
        before.saturating_sub(self.aggregates.len())
    }

    fn purge_stale(&self, snapshot: &RecordSnapshot) {
        self.aggregates.retain(|(flag, generation), _| {
            snapshot
                .flags
                .get(flag)
                .is_some_and(|records| records.generation == *generation)
        });
    }

    #[cfg(test)]
    pub fn cached_aggregates(&self) -> usize {
        self.aggregates.len()
    }

    /// RecordStore lookup: the same `Arc` is returned for a flag until the
    /// next reload replaces it.
    pub async fn get(&self, flag: &str) -> Result<Arc<[RawObservation]>> {
        let snapshot = self.snapshot().await;
        let records = snapshot.records(flag)?;
        Ok(Arc::clone(&records.observations))
    }

    pub async fn aggregation(&self, flag: &str) -> Result<Arc<Aggregation>> {
        let snapshot = self.snapshot().await;
        self.aggregation_in(&snapshot, flag)
    }

    /// Aggregates `flag` as of `snapshot`, at most once per generation. The
    /// entry is published only once the aggregation is complete, and only
    /// while `snapshot` still holds the flag's live generation.
    pub fn aggregation_in(&self, snapshot: &RecordSnapshot, flag: &str) -> Result<Arc<Aggregation>> {
        let records = snapshot.records(flag)?;
        let key = (flag.to_string(), records.generation);

        if let Some(cached) = self.aggregates.get(&key) {
            return Ok(Arc::clone(cached.value()));
        }

        if !self.is_live(flag, records.generation) {
            debug!(
                "Generation {} of {} is superseded; aggregating without caching",
                records.generation, flag
            );
            return Ok(Arc::new(aggregate_records(flag, records)));
        }

        let aggregation = Arc::clone(
            self.aggregates
                .entry(key.clone())
                .or_insert_with(|| Arc::new(aggregate_records(flag, records)))
                .value(),
        );

        // A publish that ran its purge before this insert has already moved `live`
        if !self.is_live(flag, records.generation) {
            self.aggregates.remove(&key);
        }

        Ok(aggregation)
    }

    /// Builds the CSV export for the inclusive ordinal range of a flag's day
    /// series. A missing index selects the corresponding end of the series.
    pub async fn get_export(
        &self,
        flag: &str,
        start_index: Option<i64>,
        end_index: Option<i64>,
    ) -> Result<ExportFile> {
        let snapshot = self.snapshot().await;
        let aggregation = self.aggregation_in(&snapshot, flag)?;

        if aggregation.is_empty() {
            return Err(Error::EmptySeries);
        }

        let last_index = aggregation.len() as i64 - 1;
        let start_index = start_index.unwrap_or(0);
        let end_index = end_index.unwrap_or(last_index);

        let selected = slice(&aggregation.series, start_index, end_index)?;
        let file = export_file(flag, selected)?;

        debug!(
            "Export {} for {} [{}, {}]: {} rows",
            file.filename, flag, start_index, end_index, file.rows
        );
        Ok(file)
    }

    pub async fn summaries(&self) -> Result<Vec<FlagSummary>> {
        let snapshot = self.snapshot().await;
        if !snapshot.is_loaded() {
            return Err(Error::NotReady);
        }

        snapshot
            .flags()
            .into_iter()
            .map(|flag| {
                let records = snapshot.records(flag)?;
                let aggregation = self.aggregation_in(&snapshot, flag)?;
                Ok(summarize(flag, records.generation, &aggregation))
            })
            .collect()
    }
}

fn aggregate_records(flag: &str, records: &FlagRecords) -> Aggregation {
    let aggregation = aggregate(&records.observations);
    info!(
        "Aggregated flag {} (generation {}): {} days from {} observations, {} excluded",
        flag,
        records.generation,
        aggregation.len(),
        aggregation.total,
        aggregation.excluded
    );
    aggregation
}

pub fn summarize(flag: &str, generation: u64, aggregation: &Aggregation) -> FlagSummary {
    let unique_days = aggregation.len();
    let last_index = unique_days.saturating_sub(1);
    let download_href = if unique_days > 0 {
        format!(
            "/download_csv?flag={}&start_index=0&end_index={}",
            flag, last_index
        )
    } else {
        "#".to_string()
    };

    FlagSummary {
        flag: flag.to_string(),
        generation,
        unique_days,
        excluded: aggregation.excluded,
        preview: aggregation.series.iter().take(PREVIEW_ROWS).copied().collect(),
        default_range: [0, last_index],
        download_href,
    }
}
