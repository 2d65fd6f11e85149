//! Retention policy and the store contract.
//!
//! Eviction is a pure function over anything that has an id and a creation
//! time, so the policy can be tested without a database. Backends call
//! [`evict`] inside their write path and delete whatever it returns.

use std::cmp::Ordering;

use time::{Duration, OffsetDateTime};

use chemeq_types::{EquipmentRecord, Upload, UploadSummary};

use crate::error::Result;
use crate::queries::RecordQuery;

/// Something that takes part in retention ordering.
pub trait Retained {
    /// Unique identifier, used as the tie-break.
    fn id(&self) -> &str;
    /// Creation time, the primary ordering key.
    fn created_at(&self) -> OffsetDateTime;
}

impl Retained for Upload {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Retained for UploadSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

/// Minimal retention key as loaded from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadKey {
    /// Upload identifier.
    pub id: String,
    /// Upload creation time.
    pub created_at: OffsetDateTime,
}

impl Retained for UploadKey {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

/// Newest-first ordering; equal timestamps fall back to descending id.
pub fn newest_first<T: Retained>(a: &T, b: &T) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| b.id().cmp(a.id()))
}

/// Split `uploads` into the `max` newest (kept) and the rest (removed).
///
/// Both halves are returned newest-first.
///
/// ```
/// use chemeq_store::retention::{UploadKey, evict};
/// use time::macros::datetime;
///
/// let keys: Vec<UploadKey> = (0..7)
///     .map(|i| UploadKey {
///         id: format!("ds_{i}"),
///         created_at: datetime!(2025-01-01 00:00 UTC) + time::Duration::minutes(i),
///     })
///     .collect();
///
/// let (kept, removed) = evict(keys, 5);
/// assert_eq!(kept.len(), 5);
/// assert_eq!(removed.iter().map(|k| k.id.as_str()).collect::<Vec<_>>(), ["ds_1", "ds_0"]);
/// ```
pub fn evict<T: Retained>(mut uploads: Vec<T>, max: usize) -> (Vec<T>, Vec<T>) {
    uploads.sort_by(newest_first);
    let removed = if uploads.len() > max {
        uploads.split_off(max)
    } else {
        Vec::new()
    };
    (uploads, removed)
}

/// Timestamp that places a new upload strictly after the current newest one.
///
/// Returns `requested` unless an existing upload is at least as new, in which
/// case the result is one nanosecond after `latest`.
pub fn next_created_at(latest: Option<OffsetDateTime>, requested: OffsetDateTime) -> OffsetDateTime {
    match latest {
        Some(latest) if latest >= requested => latest + Duration::nanoseconds(1),
        _ => requested,
    }
}

/// Result of a successful [`UploadStore::put`].
#[derive(Debug, Clone, PartialEq)]
pub struct PutOutcome {
    /// The upload as stored (its `created_at` may have been moved forward).
    pub upload: Upload,
    /// Ids of uploads removed to honour the retention bound, newest-first.
    pub evicted_ids: Vec<String>,
}

/// A bounded store of uploads.
///
/// Implementations guarantee that after `put` returns, at most
/// [`retention`](UploadStore::retention) uploads exist, and that eviction and
/// insertion become visible together.
pub trait UploadStore {
    /// Maximum number of uploads kept.
    fn retention(&self) -> usize;

    /// Insert a new upload as the most recent one and evict the oldest
    /// surplus uploads.
    fn put(&mut self, upload: Upload) -> Result<PutOutcome>;

    /// Fetch one upload with its records.
    fn get(&self, id: &str) -> Result<Option<Upload>>;

    /// Metadata and statistics of one upload, without loading its records.
    fn get_summary(&self, id: &str) -> Result<Option<UploadSummary>> {
        Ok(self.get(id)?.map(|u| u.summary()))
    }

    /// Up to `limit` uploads, newest-first.
    fn list_recent(&self, limit: usize) -> Result<Vec<Upload>>;

    /// Up to `limit` upload summaries (no records), newest-first.
    fn list_summaries(&self, limit: usize) -> Result<Vec<UploadSummary>>;

    /// Number of stored uploads.
    fn count(&self) -> Result<usize>;

    /// Records of one upload, filtered and paginated.
    ///
    /// Returns `None` when the upload does not exist.
    fn query_records(&self, query: &RecordQuery) -> Result<Option<Vec<EquipmentRecord>>>;

    /// The most recent upload, if any.
    fn latest(&self) -> Result<Option<Upload>> {
        Ok(self.list_recent(1)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn key(id: &str, minute: i64) -> UploadKey {
        UploadKey {
            id: id.to_string(),
            created_at: datetime!(2025-03-01 12:00 UTC) + Duration::minutes(minute),
        }
    }

    fn ids(keys: &[UploadKey]) -> Vec<&str> {
        keys.iter().map(|k| k.id.as_str()).collect()
    }

    #[test]
    fn test_evict_under_bound_keeps_everything() {
        let (kept, removed) = evict(vec![key("a", 0), key("b", 1)], 5);
        assert_eq!(ids(&kept), vec!["b", "a"]);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_evict_exactly_at_bound() {
        let keys: Vec<_> = (0..5).map(|i| key(&format!("k{i}"), i)).collect();
        let (kept, removed) = evict(keys, 5);
        assert_eq!(kept.len(), 5);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_evict_removes_oldest_first() {
        let keys = vec![
            key("mid", 5),
            key("oldest", 0),
            key("newest", 9),
            key("old", 2),
        ];
        let (kept, removed) = evict(keys, 2);
        assert_eq!(ids(&kept), vec!["newest", "mid"]);
        assert_eq!(ids(&removed), vec!["old", "oldest"]);
    }

    #[test]
    fn test_evict_tie_break_by_id() {
        let keys = vec![key("ds_a", 1), key("ds_c", 1), key("ds_b", 1)];
        let (kept, removed) = evict(keys, 2);
        assert_eq!(ids(&kept), vec!["ds_c", "ds_b"]);
        assert_eq!(ids(&removed), vec!["ds_a"]);
    }

    #[test]
    fn test_evict_zero_bound_removes_all() {
        let (kept, removed) = evict(vec![key("a", 0)], 0);
        assert!(kept.is_empty());
        assert_eq!(removed.len(), 1);
    }

    #[test]
    fn test_next_created_at() {
        let t0 = datetime!(2025-03-01 12:00 UTC);

        assert_eq!(next_created_at(None, t0), t0);
        assert_eq!(next_created_at(Some(t0 - Duration::seconds(1)), t0), t0);
        assert_eq!(
            next_created_at(Some(t0), t0),
            t0 + Duration::nanoseconds(1)
        );
        assert_eq!(
            next_created_at(Some(t0 + Duration::seconds(5)), t0),
            t0 + Duration::seconds(5) + Duration::nanoseconds(1)
        );
    }
}
