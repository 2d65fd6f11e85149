//! SQLite-backed retention store.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use time::OffsetDateTime;
use tracing::{debug, info};

use chemeq_types::{Aggregates, EquipmentRecord, Upload, UploadSummary};

use crate::error::{Error, Result};
use crate::queries::RecordQuery;
use crate::retention::{self, PutOutcome, UploadKey, UploadStore};
use crate::schema;

const SUMMARY_COLUMNS: &str = "id, filename, created_at, record_count, \
     avg_flowrate, avg_pressure, avg_temperature, category_counts";

/// SQLite-based store keeping the most recent uploads.
pub struct Store {
    conn: Connection,
    retention: usize,
}

impl Store {
    /// Open or create a database at the given path.
    ///
    /// The store starts with the default retention bound but evicts nothing
    /// until [`with_retention`](Self::with_retention) or the next `put`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            conn,
            retention: chemeq_types::DEFAULT_RETENTION,
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            retention: chemeq_types::DEFAULT_RETENTION,
        })
    }

    /// Change the retention bound, evicting any surplus uploads immediately.
    pub fn with_retention(mut self, retention: usize) -> Result<Self> {
        self.set_retention(retention)?;
        Ok(self)
    }

    /// Change the retention bound in place.
    ///
    /// Returns the ids of uploads evicted to honour the new bound.
    pub fn set_retention(&mut self, retention: usize) -> Result<Vec<String>> {
        if retention == 0 {
            return Err(Error::InvalidRetention(retention));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = evict_surplus(&tx, retention)?;
        tx.commit()?;

        self.retention = retention;
        if !removed.is_empty() {
            info!(
                "Retention lowered to {}, evicted {} uploads",
                retention,
                removed.len()
            );
        }
        Ok(removed.into_iter().map(|k| k.id).collect())
    }

    /// Total number of equipment rows across all uploads.
    pub fn count_records(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM equipment", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn to_nanos(ts: OffsetDateTime) -> Result<i64> {
    i64::try_from(ts.unix_timestamp_nanos()).map_err(|_| Error::InvalidTimestamp(ts.to_string()))
}

fn from_nanos(idx: usize, nanos: i64) -> rusqlite::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UploadSummary> {
    let counts: String = row.get(7)?;
    let category_counts = serde_json::from_str(&counts)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(UploadSummary {
        id: row.get(0)?,
        filename: row.get(1)?,
        created_at: from_nanos(2, row.get(2)?)?,
        aggregates: Aggregates {
            count: row.get::<_, i64>(3)? as u64,
            avg_flowrate: row.get(4)?,
            avg_pressure: row.get(5)?,
            avg_temperature: row.get(6)?,
            category_counts,
        },
    })
}

fn load_summary(conn: &Connection, id: &str) -> Result<Option<UploadSummary>> {
    let sql = format!("SELECT {} FROM uploads WHERE id = ?", SUMMARY_COLUMNS);
    let summary = conn.query_row(&sql, [id], summary_from_row).optional()?;
    Ok(summary)
}

fn load_records(conn: &Connection, query: &RecordQuery) -> Result<Vec<EquipmentRecord>> {
    let sql = query.build_sql();
    let (_, params) = query.build_where();
    let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params_ref.as_slice(), |row| {
            Ok(EquipmentRecord {
                name: row.get(0)?,
                category: row.get(1)?,
                flowrate: row.get(2)?,
                pressure: row.get(3)?,
                temperature: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

fn load_upload(conn: &Connection, id: &str) -> Result<Option<Upload>> {
    let Some(summary) = load_summary(conn, id)? else {
        return Ok(None);
    };
    let records = load_records(conn, &RecordQuery::new(id))?;

    Ok(Some(Upload {
        id: summary.id,
        filename: summary.filename,
        created_at: summary.created_at,
        aggregates: summary.aggregates,
        records,
    }))
}

fn recent_ids(conn: &Connection, limit: usize) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT id FROM uploads ORDER BY created_at DESC, id DESC LIMIT ?")?;
    let ids = stmt
        .query_map([limit as i64], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn retention_keys(conn: &Connection) -> Result<Vec<UploadKey>> {
    let mut stmt = conn.prepare("SELECT id, created_at FROM uploads")?;
    let keys = stmt
        .query_map([], |row| {
            Ok(UploadKey {
                id: row.get(0)?,
                created_at: from_nanos(1, row.get(1)?)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(keys)
}

/// Delete every upload beyond the `retention` newest, with its records.
fn evict_surplus(conn: &Connection, retention: usize) -> Result<Vec<UploadKey>> {
    let (_, removed) = retention::evict(retention_keys(conn)?, retention);
    for key in &removed {
        conn.execute("DELETE FROM equipment WHERE upload_id = ?", [&key.id])?;
        conn.execute("DELETE FROM uploads WHERE id = ?", [&key.id])?;
        debug!("Evicted upload {} ({})", key.id, key.created_at);
    }
    Ok(removed)
}

impl UploadStore for Store {
    fn retention(&self) -> usize {
        self.retention
    }

    /// Insert an upload and evict in a single `IMMEDIATE` transaction.
    ///
    /// Any error rolls the whole operation back, so neither a half-written
    /// upload nor a half-applied eviction is ever committed.
    fn put(&mut self, mut upload: Upload) -> Result<PutOutcome> {
        if !upload.is_consistent() {
            return Err(Error::InconsistentUpload {
                id: upload.id,
                count: upload.aggregates.count,
                records: upload.records.len(),
            });
        }

        let retention = self.retention;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_summary(&tx, &upload.id)?.is_some() {
            return Err(Error::DuplicateUpload(upload.id));
        }

        let latest: Option<i64> =
            tx.query_row("SELECT MAX(created_at) FROM uploads", [], |row| row.get(0))?;
        let latest = latest.map(|n| from_nanos(0, n)).transpose()?;
        upload.created_at = retention::next_created_at(latest, upload.created_at);

        let agg = &upload.aggregates;
        tx.execute(
            "INSERT INTO uploads (id, filename, created_at, record_count,
             avg_flowrate, avg_pressure, avg_temperature, category_counts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                upload.id,
                upload.filename,
                to_nanos(upload.created_at)?,
                agg.count as i64,
                agg.avg_flowrate,
                agg.avg_pressure,
                agg.avg_temperature,
                serde_json::to_string(&agg.category_counts)?,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO equipment (upload_id, position, name, equipment_type,
                 flowrate, pressure, temperature)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (position, record) in upload.records.iter().enumerate() {
                stmt.execute(rusqlite::params![
                    upload.id,
                    position as i64,
                    record.name,
                    record.category,
                    record.flowrate,
                    record.pressure,
                    record.temperature,
                ])?;
            }
        }

        let removed = evict_surplus(&tx, retention)?;
        tx.commit()?;

        info!(
            "Stored upload {} with {} records ({} evicted)",
            upload.id,
            upload.records.len(),
            removed.len()
        );

        Ok(PutOutcome {
            upload,
            evicted_ids: removed.into_iter().map(|k| k.id).collect(),
        })
    }

    fn get(&self, id: &str) -> Result<Option<Upload>> {
        let tx = self.conn.unchecked_transaction()?;
        let upload = load_upload(&tx, id)?;
        tx.commit()?;
        Ok(upload)
    }

    fn get_summary(&self, id: &str) -> Result<Option<UploadSummary>> {
        load_summary(&self.conn, id)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Upload>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut uploads = Vec::new();
        for id in recent_ids(&tx, limit)? {
            if let Some(upload) = load_upload(&tx, &id)? {
                uploads.push(upload);
            }
        }
        tx.commit()?;
        Ok(uploads)
    }

    fn list_summaries(&self, limit: usize) -> Result<Vec<UploadSummary>> {
        let sql = format!(
            "SELECT {} FROM uploads ORDER BY created_at DESC, id DESC LIMIT ?",
            SUMMARY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let summaries = stmt
            .query_map([limit as i64], summary_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM uploads", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_records(&self, query: &RecordQuery) -> Result<Option<Vec<EquipmentRecord>>> {
        let tx = self.conn.unchecked_transaction()?;
        let exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM uploads WHERE id = ?",
            [&query.upload_id],
            |row| row.get(0),
        )?;
        let records = if exists {
            Some(load_records(&tx, query)?)
        } else {
            None
        };
        tx.commit()?;
        Ok(records)
    }
}
