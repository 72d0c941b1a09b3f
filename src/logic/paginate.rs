use anyhow::Result;
use serde_json::Value;

use crate::logic::{ListPipeline, COUNT_FIELD};
use crate::model::{PageEnvelope, PaginationSpec, Stage};
use crate::store::DocumentStore;

/// Run the list pipeline, then the match-only count pipeline, and wrap
/// both in a page envelope. Read-only; store errors pass through.
pub async fn execute<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &str,
    pipeline: &ListPipeline,
    pagination: &PaginationSpec,
) -> Result<PageEnvelope> {
    let docs = store.aggregate(collection, &pipeline.stages).await?;
    let counted = store.aggregate(collection, &pipeline.count_stages()).await?;

    let total_docs = counted
        .first()
        .and_then(|row| row.get(COUNT_FIELD))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    log::debug!(
        "{collection}: page {} returned {} of {total_docs} documents",
        pagination.page,
        docs.len()
    );

    Ok(PageEnvelope::new(
        docs,
        total_docs,
        pagination.page,
        pagination.limit,
    ))
}

/// First document produced by a point-query pipeline, if any
pub async fn find_one<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &str,
    stages: &[Stage],
) -> Result<Option<Value>> {
    let mut docs = store.aggregate(collection, stages).await?;
    if docs.is_empty() {
        return Ok(None);
    }
    Ok(Some(docs.swap_remove(0)))
}
