pub mod bids;
pub mod error;
pub mod hires;
pub mod influencers;
pub mod job_requests;
pub mod query_options;
pub mod reviews;

pub use error::*;
pub use influencers::browse_filter;
pub use query_options::*;

use serde_json::Value;
use std::sync::Arc;

use crate::logic::{build_list_pipeline, build_single_pipeline, execute, find_one};
use crate::model::{
    CallerIdentity, Filter, JoinRegistry, JoinSpec, PageEnvelope, PaginationDefaults,
    PaginationSpec, RawQuery,
};
use crate::store::DocumentStore;

/// Read-side entry point shared by every resource. Holds the store,
/// the join registry built at start-up and the pagination defaults.
#[derive(Debug)]
pub struct QueryService<S: ?Sized> {
    registry: Arc<JoinRegistry>,
    defaults: PaginationDefaults,
    store: Arc<S>,
}

impl<S: ?Sized> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            defaults: self.defaults,
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore + ?Sized> QueryService<S> {
    pub fn new(store: Arc<S>, registry: JoinRegistry, defaults: PaginationDefaults) -> Self {
        Self {
            registry: Arc::new(registry),
            defaults,
            store,
        }
    }

    pub(crate) fn options(&self, raw: &RawQuery) -> Result<QueryOptions, ServiceError> {
        Ok(QueryOptions::parse(raw, self.defaults)?)
    }

    pub(crate) async fn paginate(
        &self,
        collection: &str,
        filter: Filter,
        pagination: &PaginationSpec,
    ) -> Result<PageEnvelope, ServiceError> {
        let pipeline = build_list_pipeline(&self.registry, filter, pagination)?;
        Ok(execute(self.store.as_ref(), collection, &pipeline, pagination).await?)
    }

    pub(crate) async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
        joins: &[JoinSpec],
        not_found: &str,
    ) -> Result<Value, ServiceError> {
        let stages = build_single_pipeline(&self.registry, filter, joins)?;
        find_one(self.store.as_ref(), collection, &stages)
            .await?
            .ok_or_else(|| ServiceError::not_found(not_found))
    }
}

/// Influencer id of a caller acting on their own resources
pub(crate) fn require_influencer(caller: &CallerIdentity) -> Result<&str, ServiceError> {
    caller
        .influencer_id
        .as_deref()
        .ok_or_else(|| ServiceError::forbidden("Caller is not an influencer"))
}

/// `$or` over the document's `_id` and its public id field, each branch
/// also carrying `extra` clauses
pub(crate) fn by_any_id(id_field: &str, id: &str, extra: &Filter) -> Filter {
    let branch = |field: &str| {
        let mut filter = Filter::new().with(field, id);
        for (name, value) in extra.clauses() {
            filter.set(name.clone(), value.clone());
        }
        filter
    };
    Filter::any(vec![branch("_id"), branch(id_field)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_by_any_id_repeats_extra_clauses() {
        let filter = by_any_id("bidId", "b1", &Filter::new().with("influencerId", "i1"));

        assert_eq!(
            filter.to_document(),
            json!({"$or": [
                {"_id": "b1", "influencerId": "i1"},
                {"bidId": "b1", "influencerId": "i1"}
            ]})
        );
    }

    #[test]
    fn test_require_influencer() {
        assert!(require_influencer(&CallerIdentity::new("u1")).is_err());
        assert_eq!(
            require_influencer(&CallerIdentity::influencer("u1", "i1")).unwrap(),
            "i1"
        );
    }
}
