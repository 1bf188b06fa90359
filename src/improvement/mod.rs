//! Improvement strategies.
//!
//! Each strategy pages seeds out of the store, derives candidates through
//! the scraper (or a provider), maps every candidate to an idempotent
//! [`UpsertOp`] keyed by its collection's natural key and hands the batch to
//! its own collection. Orchestration lives in [`crate::engine`]; nothing here
//! schedules work itself.
//!
//! | Strategy                         | Seeds                | Target      |
//! |----------------------------------|----------------------|-------------|
//! | [`WebsiteImprovement::hyperlink_based`] | websites      | websites    |
//! | [`WebsiteImprovement::suggests_based`]  | suggests      | websites    |
//! | [`WebsiteImprovement::list_based`]      | target lists  | websites    |
//! | [`SuggestImprovement::content_based`]   | websites      | suggests    |
//! | [`SuggestImprovement::keyword_based`]   | website keywords | suggests |
//! | [`ResourceImprovement::content_based`]  | websites      | images, assets |
//! | [`ProviderImprovement::secure_providers_based`] | news / shopping targets | news, shopping |

pub mod provider;
pub mod resource;
pub mod suggest;
pub mod website;

pub use provider::ProviderImprovement;
pub use resource::{Resource, ResourceImprovement};
pub use suggest::SuggestImprovement;
pub use website::WebsiteImprovement;

use std::sync::Arc;

use crate::app::Result;
use crate::domain::{BulkWriteResult, Collection, ScrapedRecord, Seed, SortDirection, UpsertOp};
use crate::engine::BatchTask;
use crate::store::{PageQuery, Store};

/// Sweep direction used by single-sweep strategies.
pub const NEWEST_FIRST: SortDirection = SortDirection::Descending;

/// Reads the seed page a batch task points at.
pub(crate) fn seed_page(
    store: &dyn Store,
    collection: Collection,
    task: BatchTask,
    sort: SortDirection,
) -> Result<Vec<Seed>> {
    store.seeds(collection, &PageQuery::new(task.skip, task.batch_size, sort))
}

/// The slice of a static list a batch task points at.
pub(crate) fn list_page(urls: &[String], task: BatchTask) -> Vec<Seed> {
    urls.iter()
        .skip(task.skip)
        .take(task.batch_size)
        .map(|url| Seed::new(url.as_str()))
        .collect()
}

pub(crate) fn seed_total(store: &dyn Store, collection: Collection) -> Result<usize> {
    Ok(store.count(collection)? as usize)
}

/// Maps a scraped page to an insert-if-absent keyed by its URL.
pub fn record_op(record: &ScrapedRecord) -> Vec<UpsertOp> {
    if record.url.is_empty() {
        return Vec::new();
    }
    UpsertOp::from_payload(record.url.as_str(), record)
        .into_iter()
        .collect()
}

/// Unordered bulk write into one collection.
pub(crate) async fn persist(
    store: &dyn Store,
    collection: Collection,
    ops: Arc<[UpsertOp]>,
) -> Result<BulkWriteResult> {
    let result = store.bulk_write(collection, &ops)?;
    tracing::debug!(
        "{}: {} upserted, {} already present, {} rejected",
        collection,
        result.upserted,
        result.matched,
        result.failed
    );
    Ok(result)
}
