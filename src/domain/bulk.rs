use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app::TrawlerError;

/// The searchable collections kept by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Websites,
    Suggests,
    Images,
    Assets,
    News,
    Shopping,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Websites,
        Collection::Suggests,
        Collection::Images,
        Collection::Assets,
        Collection::News,
        Collection::Shopping,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Collection::Websites => "websites",
            Collection::Suggests => "suggests",
            Collection::Images => "images",
            Collection::Assets => "assets",
            Collection::News => "news",
            Collection::Shopping => "shopping",
        }
    }

    /// Field enforcing document uniqueness.
    pub fn natural_key(self) -> &'static str {
        match self {
            Collection::Websites
            | Collection::News
            | Collection::Shopping
            | Collection::Assets => "url",
            Collection::Suggests => "suggest",
            Collection::Images => "src",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for Collection {
    type Err = TrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Collection::ALL
            .into_iter()
            .find(|c| {
                let table = c.table();
                wanted == table || table.strip_suffix('s') == Some(wanted.as_str())
            })
            .ok_or_else(|| TrawlerError::UnknownCollection(s.to_string()))
    }
}

/// An idempotent insert-if-absent write keyed by a natural key.
///
/// Re-applying the same operation never overwrites an existing document;
/// the first writer for a key wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertOp {
    pub filter: String,
    #[serde(rename = "setOnInsert")]
    pub set_on_insert: serde_json::Value,
    pub upsert: bool,
}

impl UpsertOp {
    pub fn new(filter: impl Into<String>, set_on_insert: serde_json::Value) -> Self {
        Self {
            filter: filter.into(),
            set_on_insert,
            upsert: true,
        }
    }

    /// Builds an operation from any serializable payload. Payloads that fail
    /// to serialize yield `None` so mappers can drop them.
    pub fn from_payload<T: Serialize>(filter: impl Into<String>, payload: &T) -> Option<Self> {
        match serde_json::to_value(payload) {
            Ok(value) => Some(Self::new(filter, value)),
            Err(e) => {
                tracing::debug!("Dropping unserializable payload: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkWriteResult {
    /// Documents created by this write.
    pub upserted: usize,
    /// Operations whose key already existed (no-ops).
    pub matched: usize,
    /// Operations rejected by the store.
    pub failed: usize,
}

impl BulkWriteResult {
    pub fn merge(&mut self, other: BulkWriteResult) {
        self.upserted += other.upserted;
        self.matched += other.matched;
        self.failed += other.failed;
    }
}
