use serde_json::Value;

use crate::model::{collections, CallerIdentity, Filter, JoinSpec, UnwindMode};
use crate::service::{require_influencer, QueryService, ServiceError};
use crate::store::DocumentStore;

/// Both parties of a review, each with their user account embedded
fn review_joins() -> Vec<JoinSpec> {
    vec![
        JoinSpec::new("influencer").unwind(UnwindMode::Flatten),
        JoinSpec::new("creator").unwind(UnwindMode::Flatten),
    ]
}

impl<S: DocumentStore + ?Sized> QueryService<S> {
    /// Review left on a job
    pub async fn get_review(
        &self,
        job_id: &str,
        caller: &CallerIdentity,
    ) -> Result<Value, ServiceError> {
        require_influencer(caller)?;
        let filter = Filter::new().with("jobId", job_id);
        self.find_one(collections::REVIEWS, filter, &review_joins(), "Review not found")
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

    #[tokio::test]
    async fn test_review_embeds_both_parties() {
        let store = MemoryStore::new();
        store
            .insert_many(
                collections::REVIEWS,
                vec![json!({"jobId": "job-1", "creatorId": "cr-1", "influencerId": "inf-a", "proof": []})],
            )
            .await
            .unwrap();
        store
            .insert_many(
                collections::INFLUENCERS,
                vec![json!({"influencerId": "inf-a", "userId": "u-a"})],
            )
            .await
            .unwrap();
        store
            .insert_many(
                collections::CREATORS,
                vec![json!({"creatorId": "cr-1", "userId": "u-c"})],
            )
            .await
            .unwrap();
        store
            .insert_many(
                collections::USERS,
                vec![
                    json!({"userId": "u-a", "firstName": "Ada"}),
                    json!({"userId": "u-c", "firstName": "Morgan"}),
                ],
            )
            .await
            .unwrap();
        let service = QueryService::new(
            Arc::new(store),
            JoinRegistry::standard(),
            PaginationDefaults::default(),
        );
        let caller = CallerIdentity::influencer("u-a", "inf-a");

        let review = service.get_review("job-1", &caller).await.unwrap();
        assert_eq!(review["influencer"]["user"]["firstName"], "Ada");
        assert_eq!(review["creator"]["user"]["firstName"], "Morgan");

        assert!(matches!(
            service.get_review("job-2", &caller).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.get_review("job-1", &CallerIdentity::new("u-x")).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
