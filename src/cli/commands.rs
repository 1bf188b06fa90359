use std::path::Path;

use serde_json::Value;
use tracing::{error, info};

use crate::app::{AppContext, Result};
use crate::cli::Strategy;
use crate::domain::{BulkWriteResult, Collection, SortDirection, UpsertOp};
use crate::engine::RunSummary;
use crate::store::{PageQuery, Store};

/// Documents written per store transaction during an import.
pub const IMPORT_BATCH_SIZE: usize = 25_000;

/// Fields of exported documents that belong to the exporting store.
const FOREIGN_FIELDS: [&str; 4] = ["_id", "__v", "createdAt", "updatedAt"];

pub async fn improve(
    ctx: &AppContext,
    strategy: Strategy,
    batch_size: Option<usize>,
    include_same_domain: bool,
) -> Result<()> {
    let batch_size = batch_size.unwrap_or(ctx.config.engine.batch_size);
    let runs = run_strategy(ctx, strategy, batch_size, include_same_domain).await?;

    for (label, summary) in &runs {
        println!(
            "{}: {}/{} batches ok, {} empty, {} failed, {} cancelled; \
             {} new, {} existing, {} rejected",
            label,
            summary.batches_succeeded,
            summary.batches_planned,
            summary.batches_empty,
            summary.batches_failed,
            summary.batches_cancelled,
            summary.written.upserted,
            summary.written.matched,
            summary.written.failed
        );
    }
    Ok(())
}

async fn run_strategy(
    ctx: &AppContext,
    strategy: Strategy,
    batch_size: usize,
    include_same_domain: bool,
) -> Result<Vec<(String, RunSummary)>> {
    let labelled = |label: &str, summary: RunSummary| (label.to_string(), summary);

    let runs = match strategy {
        Strategy::Hyperlinks => {
            let website = ctx.website_improvement();
            vec![labelled(
                "Website/hyperlinkBased",
                website.hyperlink_based(batch_size, include_same_domain).await?,
            )]
        }
        Strategy::Suggests => {
            let website = ctx.website_improvement();
            vec![labelled("Website/suggestsBased", website.suggests_based(batch_size).await?)]
        }
        Strategy::Lists => {
            let website = ctx.website_improvement();
            let targets = ctx.config.targets.all();
            vec![labelled(
                "Website/listBased",
                website.list_based(batch_size, &targets, include_same_domain).await,
            )]
        }
        Strategy::Content => {
            let (oldest, newest) = ctx.suggest_improvement().content_based(batch_size).await?;
            vec![
                labelled("Suggest/contentBased (oldest)", oldest),
                labelled("Suggest/contentBased (newest)", newest),
            ]
        }
        Strategy::Keywords => {
            let suggest = ctx.suggest_improvement();
            vec![labelled("Suggest/keywordBased", suggest.keyword_based(batch_size).await?)]
        }
        Strategy::Images => {
            let image = ctx.image_improvement();
            vec![labelled("Image/contentBased", image.content_based(batch_size).await?)]
        }
        Strategy::Assets => {
            let asset = ctx.asset_improvement();
            vec![labelled("Asset/contentBased", asset.content_based(batch_size).await?)]
        }
        Strategy::News => {
            let news = ctx.news_improvement();
            vec![labelled(
                "News/secureProviders",
                news.secure_providers_based(batch_size).await,
            )]
        }
        Strategy::Shopping => {
            let shopping = ctx.shopping_improvement();
            vec![labelled(
                "Shopping/secureProviders",
                shopping.secure_providers_based(batch_size).await,
            )]
        }
        Strategy::All => run_all(ctx, batch_size, include_same_domain).await,
    };
    Ok(runs)
}

/// Runs every strategy concurrently. A strategy that cannot start is logged
/// and left out; the others still run to completion.
async fn run_all(
    ctx: &AppContext,
    batch_size: usize,
    include_same_domain: bool,
) -> Vec<(String, RunSummary)> {
    let website = ctx.website_improvement();
    let suggest = ctx.suggest_improvement();
    let image = ctx.image_improvement();
    let asset = ctx.asset_improvement();
    let news = ctx.news_improvement();
    let shopping = ctx.shopping_improvement();
    let targets = ctx.config.targets.all();

    let (hyperlinks, suggests, lists, content, keywords, images, assets, news_run, shopping_run) =
        tokio::join!(
            website.hyperlink_based(batch_size, include_same_domain),
            website.suggests_based(batch_size),
            website.list_based(batch_size, &targets, include_same_domain),
            suggest.content_based(batch_size),
            suggest.keyword_based(batch_size),
            image.content_based(batch_size),
            asset.content_based(batch_size),
            news.secure_providers_based(batch_size),
            shopping.secure_providers_based(batch_size),
        );

    let mut runs = vec![
        ("Website/listBased".to_string(), lists),
        ("News/secureProviders".to_string(), news_run),
        ("Shopping/secureProviders".to_string(), shopping_run),
    ];

    let fallible = [
        ("Website/hyperlinkBased", hyperlinks),
        ("Website/suggestsBased", suggests),
        ("Suggest/keywordBased", keywords),
        ("Image/contentBased", images),
        ("Asset/contentBased", assets),
    ];
    for (label, result) in fallible {
        match result {
            Ok(summary) => runs.push((label.to_string(), summary)),
            Err(e) => error!("{} could not start: {}", label, e),
        }
    }

    match content {
        Ok((oldest, newest)) => {
            runs.push(("Suggest/contentBased (oldest)".to_string(), oldest));
            runs.push(("Suggest/contentBased (newest)".to_string(), newest));
        }
        Err(e) => error!("Suggest/contentBased could not start: {}", e),
    }

    runs
}

/// Import a JSON array of documents into one collection.
///
/// Documents without a usable natural key are skipped. Existing keys are
/// left untouched, so re-running an import is harmless.
pub fn import_documents(
    ctx: &AppContext,
    collection: &str,
    path: &Path,
) -> Result<BulkWriteResult> {
    let collection: Collection = collection.parse()?;
    let content = std::fs::read_to_string(path)?;
    let documents: Vec<Value> = serde_json::from_str(&content)?;
    let read = documents.len();

    let ops: Vec<UpsertOp> = documents
        .into_iter()
        .filter_map(|doc| import_op(collection, doc))
        .collect();
    let skipped = read - ops.len();

    let batches = ops.len().div_ceil(IMPORT_BATCH_SIZE);
    println!(
        "Importing {} {} documents in {} batches ({} skipped)",
        ops.len(),
        collection,
        batches,
        skipped
    );

    let mut total = BulkWriteResult::default();
    for (index, chunk) in ops.chunks(IMPORT_BATCH_SIZE).enumerate() {
        let result = ctx.store.bulk_write(collection, chunk)?;
        total.merge(result);
        info!(
            "Import {}: batch {}/{} done ({} new)",
            collection,
            index + 1,
            batches,
            result.upserted
        );
    }

    println!(
        "Import complete: {} new, {} already present, {} rejected",
        total.upserted, total.matched, total.failed
    );
    Ok(total)
}

/// Maps one exported document to an upsert keyed by the collection's
/// natural key.
pub fn import_op(collection: Collection, document: Value) -> Option<UpsertOp> {
    let Value::Object(mut fields) = document else {
        return None;
    };
    for field in FOREIGN_FIELDS {
        fields.remove(field);
    }

    let key = fields
        .get(collection.natural_key())?
        .as_str()?
        .trim()
        .to_string();
    if key.is_empty() {
        return None;
    }
    fields.insert(
        collection.natural_key().to_string(),
        Value::String(key.clone()),
    );
    Some(UpsertOp::new(key, Value::Object(fields)))
}

pub fn count_documents(ctx: &AppContext, collection: &str) -> Result<()> {
    let collection: Collection = collection.parse()?;
    println!("{}: {}", collection, ctx.store.count(collection)?);
    Ok(())
}

pub fn list_documents(
    ctx: &AppContext,
    collection: &str,
    limit: usize,
    sort: SortDirection,
) -> Result<()> {
    let collection: Collection = collection.parse()?;

    let documents = ctx.store.page(collection, &PageQuery::new(0, limit, sort))?;
    if documents.is_empty() {
        println!("No {}", collection);
        return Ok(());
    }

    for doc in documents {
        let title = doc
            .payload
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or_default();
        println!(
            "{} {} {}",
            doc.created_at.format("%Y-%m-%d %H:%M"),
            doc.key,
            title
        );
    }
    Ok(())
}
