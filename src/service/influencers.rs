use serde_json::Value;

use crate::model::{
    collections, CallerIdentity, ComparisonOp, Filter, FilterValue, JoinSpec, PageEnvelope,
    RawQuery,
};
use crate::service::{by_any_id, require_influencer, QueryService, ServiceError};
use crate::store::DocumentStore;

const USER_FIELDS: [&str; 5] = ["firstName", "lastName", "avatar", "country", "userId"];

/// Relations shown on every public influencer profile
fn profile_joins() -> Vec<JoinSpec> {
    vec![
        JoinSpec::new("user").select(USER_FIELDS),
        JoinSpec::new("jobsCompleted"),
    ]
}

/// Narrow a compiled filter for browsing: a non-empty `niche` list
/// matches any of its entries, the caller's own profile and suspended
/// profiles are excluded
pub fn browse_filter(mut filter: Filter, caller: &CallerIdentity) -> Filter {
    if let Some(FilterValue::Literal(Value::Array(niches))) = filter.get("niche") {
        if !niches.is_empty() {
            let niches = niches.clone();
            filter.set("niche", FilterValue::compare(ComparisonOp::In, niches));
        }
    }
    if let Some(influencer_id) = &caller.influencer_id {
        filter.set(
            "influencerId",
            FilterValue::compare(ComparisonOp::Ne, influencer_id.as_str()),
        );
    }
    filter.set("suspended", FilterValue::literal(false));
    filter
}

impl<S: DocumentStore + ?Sized> QueryService<S> {
    /// Browse active influencers, never including the caller
    pub async fn list_influencers(
        &self,
        raw: &RawQuery,
        caller: &CallerIdentity,
    ) -> Result<PageEnvelope, ServiceError> {
        let options = self.options(raw)?;
        let filter = browse_filter(options.filter, caller);
        let pagination = options.pagination.with_populate(profile_joins());
        self.paginate(collections::INFLUENCERS, filter, &pagination)
            .await
    }

    /// Active influencer by `_id` or `influencerId`
    pub async fn get_influencer(&self, id: &str) -> Result<Value, ServiceError> {
        let filter = by_any_id("influencerId", id, &Filter::new().with("suspended", false));
        self.find_one(
            collections::INFLUENCERS,
            filter,
            &profile_joins(),
            "Influencer Not Found",
        )
        .await
    }

    /// Profile owned by a user account, suspended or not
    pub async fn get_influencer_by_user(&self, user_id: &str) -> Result<Value, ServiceError> {
        let filter = Filter::new().with("userId", user_id);
        self.find_one(collections::INFLUENCERS, filter, &[], "Influencer Not Found")
            .await
    }

    /// The caller's own profile, suspended or not
    pub async fn get_me(&self, caller: &CallerIdentity) -> Result<Value, ServiceError> {
        let influencer_id = require_influencer(caller)?;
        self.influencer_profile(influencer_id).await
    }

    /// Profile of an influencer allowed to act, `Forbidden` once suspended
    pub async fn ensure_not_suspended(&self, influencer_id: &str) -> Result<Value, ServiceError> {
        let profile = self.influencer_profile(influencer_id).await?;

        if profile.get("suspended").and_then(Value::as_bool) == Some(true) {
            log::info!("rejected suspended influencer {influencer_id}");
            return Err(ServiceError::forbidden("Influencer has been suspended!"));
        }
        Ok(profile)
    }

    async fn influencer_profile(&self, influencer_id: &str) -> Result<Value, ServiceError> {
        let filter = by_any_id("influencerId", influencer_id, &Filter::new());
        self.find_one(collections::INFLUENCERS, filter, &[], "Influencer Not Found")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JoinRegistry, PaginationDefaults};
    use crate::store::{DocumentWriter, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    async fn service() -> QueryService<MemoryStore> {
        let store = MemoryStore::new();
        store
            .insert_many(
                collections::INFLUENCERS,
                vec![
                    json!({"_id": "a", "influencerId": "inf-a", "userId": "u-a", "niche": ["tech"], "suspended": false, "createdAt": "2024-01-01"}),
                    json!({"_id": "b", "influencerId": "inf-b", "userId": "u-b", "niche": ["fashion", "music"], "suspended": false, "createdAt": "2024-01-02"}),
                    json!({"_id": "c", "influencerId": "inf-c", "userId": "u-c", "niche": ["tech"], "suspended": true, "createdAt": "2024-01-03"}),
                ],
            )
            .await
            .unwrap();
        store
            .insert_many(
                collections::USERS,
                vec![json!({"userId": "u-a", "firstName": "Ada", "email": "ada@example.com"})],
            )
            .await
            .unwrap();
        store
            .insert_many(
                collections::JOBS,
                vec![
                    json!({"jobId": "j1", "influencerId": "inf-a", "completed": true}),
                    json!({"jobId": "j2", "influencerId": "inf-a", "completed": true}),
                    json!({"jobId": "j3", "influencerId": "inf-a", "completed": false}),
                ],
            )
            .await
            .unwrap();

        QueryService::new(
            Arc::new(store),
            JoinRegistry::standard(),
            PaginationDefaults::default(),
        )
    }

    #[tokio::test]
    async fn test_list_hides_suspended_and_caller() {
        let service = service().await;
        let caller = CallerIdentity::influencer("u-b", "inf-b");

        let page = service
            .list_influencers(&RawQuery::new(), &caller)
            .await
            .unwrap();

        assert_eq!(page.total_docs, 1);
        let doc = &page.docs[0];
        assert_eq!(doc["influencerId"], "inf-a");
        assert_eq!(doc["jobsCompleted"], 2);
        assert_eq!(doc["user"][0]["firstName"], "Ada");
        assert!(doc["user"][0].get("email").is_none());
    }

    #[tokio::test]
    async fn test_list_niche_array_matches_any() {
        let service = service().await;
        let raw = RawQuery::from_query_string("niche[]=music&niche[]=tech");

        let page = service
            .list_influencers(&raw, &CallerIdentity::new("someone"))
            .await
            .unwrap();

        assert_eq!(page.total_docs, 2);
    }

    #[tokio::test]
    async fn test_get_influencer_by_either_id() {
        let service = service().await;

        let by_public = service.get_influencer("inf-a").await.unwrap();
        let by_internal = service.get_influencer("a").await.unwrap();
        assert_eq!(by_public["_id"], by_internal["_id"]);

        assert!(matches!(
            service.get_influencer("c").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_influencer_by_user() {
        let service = service().await;

        let suspended = service.get_influencer_by_user("u-c").await.unwrap();
        assert_eq!(suspended["influencerId"], "inf-c");

        assert!(matches!(
            service.get_influencer_by_user("inf-a").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_me_and_suspension() {
        let service = service().await;

        let me = service
            .get_me(&CallerIdentity::influencer("u-c", "inf-c"))
            .await
            .unwrap();
        assert_eq!(me["suspended"], true);

        assert!(matches!(
            service.ensure_not_suspended("inf-c").await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(service.ensure_not_suspended("inf-a").await.is_ok());
        assert!(matches!(
            service.get_me(&CallerIdentity::new("u-x")).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
