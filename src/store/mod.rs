pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{BulkWriteResult, Collection, Seed, SortDirection, UpsertOp};

pub use sqlite::SqliteStore;

/// Offset/limit window over a collection ordered by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub skip: usize,
    pub limit: usize,
    pub sort: SortDirection,
}

impl PageQuery {
    pub fn new(skip: usize, limit: usize, sort: SortDirection) -> Self {
        Self { skip, limit, sort }
    }
}

/// A stored document: its natural key plus the payload written on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub trait Store: Send + Sync {
    fn count(&self, collection: Collection) -> Result<u64>;

    fn page(&self, collection: Collection, query: &PageQuery) -> Result<Vec<Document>>;

    /// Applies every operation independently (unordered); a rejected
    /// operation is counted in `failed` and does not stop the rest.
    fn bulk_write(&self, collection: Collection, ops: &[UpsertOp]) -> Result<BulkWriteResult>;

    /// Unique first entries of the websites' `keywords` meta tag, lowercased
    /// and trimmed, ordered by when each keyword was first seen.
    fn distinct_keywords(&self, query: &PageQuery) -> Result<Vec<String>>;

    /// Reads a page and projects it to the natural key only.
    fn seeds(&self, collection: Collection, query: &PageQuery) -> Result<Vec<Seed>> {
        Ok(self
            .page(collection, query)?
            .into_iter()
            .map(|doc| Seed::new(doc.key))
            .collect())
    }
}
