use anyhow::Result;
use chrono::Utc;
use serde_json::Value;

use crate::model::{generate_id, Stage, CREATED_AT};

/// Read contract the query core depends on
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run an aggregation pipeline over a collection
    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> Result<Vec<Value>>;
}

/// Bulk insertion, used by seeding and tests
#[async_trait::async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Insert documents, returning how many were written
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<usize>;
}

pub trait Store: DocumentStore + DocumentWriter + Send + Sync {}
impl<T: DocumentStore + DocumentWriter> Store for T {}

/// Give a document an `_id` and timestamps when it has none
pub fn stamp_document(mut document: Value) -> Result<Value> {
    let Some(fields) = document.as_object_mut() else {
        anyhow::bail!("documents must be JSON objects");
    };

    fields
        .entry("_id")
        .or_insert_with(|| Value::String(generate_id()));

    let now = Value::String(Utc::now().to_rfc3339());
    fields.entry(CREATED_AT).or_insert_with(|| now.clone());
    fields.entry("updatedAt").or_insert(now);

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stamp_keeps_existing_fields() {
        let stamped = stamp_document(json!({"_id": "a", "createdAt": "2024"})).unwrap();

        assert_eq!(stamped["_id"], "a");
        assert_eq!(stamped["createdAt"], "2024");
        assert!(stamped["updatedAt"].is_string());
    }

    #[test]
    fn test_stamp_rejects_non_objects() {
        assert!(stamp_document(json!([1, 2])).is_err());
    }
}
