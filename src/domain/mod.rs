pub mod bulk;
pub mod record;
pub mod seed;

pub use bulk::{BulkWriteResult, Collection, UpsertOp};
pub use record::{AssetKind, ScrapedAsset, ScrapedImage, ScrapedRecord, Suggestion};
pub use seed::{Seed, SortDirection};
