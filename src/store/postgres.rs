use anyhow::{Context, Result};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::collections::HashMap;

use crate::model::{FilterValue, Stage};
use crate::store::aggregate::{referenced_collections, run_pipeline};
use crate::store::traits::{stamp_document, DocumentStore, DocumentWriter};

/// Documents kept as JSONB rows keyed by collection and `_id`.
/// Pipelines are evaluated in process over the collections they touch,
/// with the base collection narrowed by its leading `$match` in SQL.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the document table if it does not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create documents table")?;

        log::info!("documents table ready");
        Ok(())
    }

    /// Base collection rows satisfying every containment clause, in
    /// insertion order
    async fn load_base(&self, collection: &str, clauses: &Value) -> Result<Vec<Value>> {
        let rows = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE collection = $1
              AND NOT EXISTS (
                  SELECT 1 FROM jsonb_array_elements($2::jsonb) AS clause
                  WHERE NOT (body @> clause->0 OR body @> clause->1)
              )
            ORDER BY created_at, id
            "#,
        )
        .bind(collection)
        .bind(clauses)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load {collection}"))?;

        Ok(rows.into_iter().map(|row| row.get("body")).collect())
    }

    /// Load whole collections in insertion order, grouped by name
    async fn load_collections(&self, names: Vec<String>) -> Result<HashMap<String, Vec<Value>>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT collection, body FROM documents WHERE collection = ANY($1) ORDER BY created_at, id",
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load collections")?;

        let mut collections: HashMap<String, Vec<Value>> = HashMap::new();
        for row in rows {
            let name: String = row.get("collection");
            let body: Value = row.get("body");
            collections.entry(name).or_default().push(body);
        }
        Ok(collections)
    }
}

/// Containment pairs `[{field: v}, {field: [v]}]` implied by the leading
/// `$match`, one per top-level scalar equality. A row failing both sides
/// of any pair cannot match; the full match still runs in process.
fn containment_clauses(pipeline: &[Stage]) -> Value {
    let Some(Stage::Match(filter)) = pipeline.first() else {
        return Value::Array(Vec::new());
    };

    filter
        .clauses()
        .iter()
        .filter(|(field, _)| !field.contains('.') && !field.starts_with('$'))
        .filter_map(|(field, condition)| match condition {
            FilterValue::Literal(
                value @ (Value::Bool(_) | Value::Number(_) | Value::String(_)),
            ) => Some(json!([{ field: value }, { field: [value] }])),
            _ => None,
        })
        .collect()
}

#[async_trait::async_trait]
impl DocumentStore for PostgresStore {
    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> Result<Vec<Value>> {
        let joined = referenced_collections(pipeline);

        // A self-join needs the unfiltered base collection as a lookup source
        let (base, collections) = if joined.contains(collection) {
            let collections = self.load_collections(joined.into_iter().collect()).await?;
            let base = collections.get(collection).cloned().unwrap_or_default();
            (base, collections)
        } else {
            let base = self
                .load_base(collection, &containment_clauses(pipeline))
                .await?;
            let collections = self.load_collections(joined.into_iter().collect()).await?;
            (base, collections)
        };

        log::debug!("aggregating {} {collection} rows", base.len());
        Ok(run_pipeline(base, pipeline, &collections))
    }
}

#[async_trait::async_trait]
impl DocumentWriter for PostgresStore {
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut written = 0;
        for document in documents {
            let document = stamp_document(document)?;
            let id = match &document["_id"] {
                Value::String(id) => id.clone(),
                other => other.to_string(),
            };

            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, body)
                VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body
                "#,
            )
            .bind(collection)
            .bind(&id)
            .bind(&document)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert document {id} into {collection}"))?;

            written += 1;
        }

        tx.commit().await.context("Failed to commit documents")?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComparisonOp, Filter};

    #[test]
    fn test_containment_clauses_cover_scalar_equality_only() {
        let filter = Filter::new()
            .with("suspended", false)
            .with("niche", json!(["tech"]))
            .with("user.country", "NG")
            .with("missing", Value::Null)
            .with_compare("balance", ComparisonOp::Gt, 10);
        let pipeline = vec![Stage::Match(filter), Stage::Limit(5)];

        assert_eq!(
            containment_clauses(&pipeline),
            json!([[{"suspended": false}, {"suspended": [false]}]])
        );
    }

    #[test]
    fn test_containment_clauses_need_a_leading_match() {
        let pipeline = vec![Stage::Limit(1), Stage::Match(Filter::new().with("a", 1))];
        assert_eq!(containment_clauses(&pipeline), json!([]));

        let or_only = vec![Stage::Match(Filter::any(vec![Filter::new().with("a", 1)]))];
        assert_eq!(containment_clauses(&or_only), json!([]));
    }
}
