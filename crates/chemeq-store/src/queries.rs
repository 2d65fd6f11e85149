//! Query builder for equipment records.
//!
//! # Example
//!
//! ```
//! use chemeq_store::RecordQuery;
//!
//! // Second page of pumps, 20 per page
//! let query = RecordQuery::new("ds_20250115_103005_1a2b3c4d")
//!     .category("Pump")
//!     .limit(20)
//!     .offset(20);
//! assert_eq!(query.offset, Some(20));
//! ```

use chemeq_types::EquipmentRecord;

/// Fluent query builder for the records of one upload.
///
/// Results are always returned in dataset row order.
#[derive(Debug, Default, Clone)]
pub struct RecordQuery {
    /// Upload whose records are queried.
    pub upload_id: String,
    /// Only include records of this equipment type (exact match).
    pub category: Option<String>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Number of results to skip.
    pub offset: Option<u32>,
}

impl RecordQuery {
    /// Query all records of an upload.
    pub fn new(upload_id: &str) -> Self {
        Self {
            upload_id: upload_id.to_string(),
            ..Default::default()
        }
    }

    /// Filter by equipment type.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = vec!["upload_id = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(self.upload_id.clone())];

        if let Some(ref category) = self.category {
            conditions.push("equipment_type = ?");
            params.push(Box::new(category.clone()));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();

        let mut sql = format!(
            "SELECT name, equipment_type, flowrate, pressure, temperature \
             FROM equipment {} ORDER BY position ASC",
            where_clause
        );

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        sql
    }

    /// Apply the filter and pagination to records already in memory.
    pub(crate) fn apply(&self, records: &[EquipmentRecord]) -> Vec<EquipmentRecord> {
        let filtered = records
            .iter()
            .filter(|r| self.category.as_deref().is_none_or(|c| r.category == c))
            .skip(self.offset.unwrap_or(0) as usize);

        match self.limit {
            Some(limit) => filtered.take(limit as usize).cloned().collect(),
            None => filtered.cloned().collect(),
        }
    }
}
