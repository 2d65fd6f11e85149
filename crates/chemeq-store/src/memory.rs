//! In-memory retention store.

use tracing::debug;

use chemeq_types::{EquipmentRecord, Upload, UploadSummary};

use crate::error::{Error, Result};
use crate::queries::RecordQuery;
use crate::retention::{self, PutOutcome, Retained, UploadStore};

/// Volatile store with the same contract as [`Store`](crate::Store).
///
/// Uploads are kept newest-first in a `Vec`; `put` replaces the vector only
/// after eviction has been computed, so a failed put changes nothing.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    uploads: Vec<Upload>,
    retention: usize,
}

impl MemoryStore {
    /// Create an empty store with the default retention bound.
    pub fn new() -> Self {
        Self {
            uploads: Vec::new(),
            retention: chemeq_types::DEFAULT_RETENTION,
        }
    }

    /// Create an empty store keeping at most `retention` uploads.
    pub fn with_retention(retention: usize) -> Result<Self> {
        if retention == 0 {
            return Err(Error::InvalidRetention(retention));
        }
        Ok(Self {
            uploads: Vec::new(),
            retention,
        })
    }
}

impl MemoryStore {
    /// Change the retention bound, evicting surplus uploads immediately.
    ///
    /// Returns the ids of the evicted uploads, newest-first.
    pub fn set_retention(&mut self, retention: usize) -> Result<Vec<String>> {
        if retention == 0 {
            return Err(Error::InvalidRetention(retention));
        }
        let (kept, removed) = retention::evict(std::mem::take(&mut self.uploads), retention);
        self.uploads = kept;
        self.retention = retention;
        Ok(removed.into_iter().map(|u| u.id).collect())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadStore for MemoryStore {
    fn retention(&self) -> usize {
        self.retention
    }

    fn put(&mut self, mut upload: Upload) -> Result<PutOutcome> {
        if !upload.is_consistent() {
            return Err(Error::InconsistentUpload {
                id: upload.id,
                count: upload.aggregates.count,
                records: upload.records.len(),
            });
        }
        if self.uploads.iter().any(|u| u.id == upload.id) {
            return Err(Error::DuplicateUpload(upload.id));
        }

        let latest = self.uploads.first().map(Retained::created_at);
        upload.created_at = retention::next_created_at(latest, upload.created_at);

        let mut all = self.uploads.clone();
        all.push(upload.clone());
        let (kept, removed) = retention::evict(all, self.retention);
        self.uploads = kept;

        for evicted in &removed {
            debug!("Evicted upload {} from memory store", evicted.id);
        }

        Ok(PutOutcome {
            upload,
            evicted_ids: removed.into_iter().map(|u| u.id).collect(),
        })
    }

    fn get(&self, id: &str) -> Result<Option<Upload>> {
        Ok(self.uploads.iter().find(|u| u.id == id).cloned())
    }

    fn get_summary(&self, id: &str) -> Result<Option<UploadSummary>> {
        Ok(self.uploads.iter().find(|u| u.id == id).map(Upload::summary))
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Upload>> {
        Ok(self.uploads.iter().take(limit).cloned().collect())
    }

    fn list_summaries(&self, limit: usize) -> Result<Vec<UploadSummary>> {
        Ok(self.uploads.iter().take(limit).map(Upload::summary).collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.uploads.len())
    }

    fn query_records(&self, query: &RecordQuery) -> Result<Option<Vec<EquipmentRecord>>> {
        Ok(self
            .uploads
            .iter()
            .find(|u| u.id == query.upload_id)
            .map(|u| query.apply(&u.records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemeq_types::Aggregates;
    use time::macros::datetime;

    fn upload(id: &str) -> Upload {
        Upload {
            id: id.to_string(),
            filename: "plant.csv".to_string(),
            created_at: datetime!(2025-06-01 08:00 UTC),
            aggregates: Aggregates {
                count: 1,
                avg_flowrate: 1.0,
                avg_pressure: 1.0,
                avg_temperature: 1.0,
                category_counts: [("Pump".to_string(), 1)].into_iter().collect(),
            },
            records: vec![EquipmentRecord::new("P-1", "Pump", 1.0, 1.0, 1.0)],
        }
    }

    #[test]
    fn test_same_timestamp_keeps_insertion_order() {
        let mut store = MemoryStore::new();
        for i in 0..7 {
            store.put(upload(&format!("ds_{i}"))).unwrap();
        }

        let ids: Vec<_> = store
            .list_recent(10)
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["ds_6", "ds_5", "ds_4", "ds_3", "ds_2"]);
    }

    #[test]
    fn test_duplicate_id_rejected_without_change() {
        let mut store = MemoryStore::with_retention(2).unwrap();
        store.put(upload("ds_a")).unwrap();
        assert!(matches!(
            store.put(upload("ds_a")),
            Err(Error::DuplicateUpload(id)) if id == "ds_a"
        ));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_set_retention_evicts_oldest() {
        let mut store = MemoryStore::with_retention(10).unwrap();
        for i in 0..8 {
            store.put(upload(&format!("ds_{i}"))).unwrap();
        }

        let evicted = store.set_retention(5).unwrap();
        assert_eq!(evicted, vec!["ds_2", "ds_1", "ds_0"]);
        assert_eq!(store.count().unwrap(), 5);
        assert!(matches!(store.set_retention(0), Err(Error::InvalidRetention(0))));
        assert_eq!(store.retention(), 5);
    }

    #[test]
    fn test_latest_and_records() {
        let mut store = MemoryStore::new();
        store.put(upload("ds_a")).unwrap();
        store.put(upload("ds_b")).unwrap();

        assert_eq!(store.latest().unwrap().unwrap().id, "ds_b");
        let records = store
            .query_records(&RecordQuery::new("ds_a"))
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(store.query_records(&RecordQuery::new("nope")).unwrap().is_none());
    }
}
