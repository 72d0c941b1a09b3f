use serde_json::Value;

use crate::model::{
    collections, CallerIdentity, Filter, FilterValue, JoinSpec, PageEnvelope, RawQuery,
    UnwindMode,
};
use crate::service::{by_any_id, require_influencer, QueryService, ServiceError};
use crate::store::DocumentStore;

fn job_join() -> JoinSpec {
    JoinSpec::new("job").unwind(UnwindMode::Flatten)
}

impl<S: DocumentStore + ?Sized> QueryService<S> {
    /// Engagements the caller was hired for
    pub async fn list_my_hires(
        &self,
        raw: &RawQuery,
        caller: &CallerIdentity,
    ) -> Result<PageEnvelope, ServiceError> {
        let influencer_id = require_influencer(caller)?;
        let options = self.options(raw)?;

        let mut filter = options.filter;
        filter.set("influencerId", FilterValue::literal(influencer_id));

        let pagination = options.pagination.with_populate(vec![job_join()]);
        self.paginate(collections::HIRES, filter, &pagination).await
    }

    pub async fn get_my_hire(
        &self,
        id: &str,
        caller: &CallerIdentity,
    ) -> Result<Value, ServiceError> {
        let influencer_id = require_influencer(caller)?;
        let filter = by_any_id(
            "hiredId",
            id,
            &Filter::new().with("influencerId", influencer_id),
        );
        self.find_one(collections::HIRES, filter, &[job_join()], "Job Not Found")
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
    async fn test_hires_for_caller_only() {
        let store = MemoryStore::new();
        store
            .insert_many(
                collections::HIRES,
                vec![
                    json!({"_id": "h1", "hiredId": "hire-1", "jobId": "job-1", "influencerId": "inf-a", "influencerStatus": false}),
                    json!({"_id": "h2", "hiredId": "hire-2", "jobId": "job-2", "influencerId": "inf-b", "influencerStatus": true}),
                ],
            )
            .await
            .unwrap();
        store
            .insert_many(collections::JOBS, vec![json!({"jobId": "job-1", "title": "Launch video"})])
            .await
            .unwrap();
        let service = QueryService::new(
            Arc::new(store),
            JoinRegistry::standard(),
            PaginationDefaults::default(),
        );
        let caller = CallerIdentity::influencer("u-a", "inf-a");

        let page = service
            .list_my_hires(&RawQuery::from_query_string("influencerStatus=false"), &caller)
            .await
            .unwrap();
        assert_eq!(page.total_docs, 1);
        assert_eq!(page.docs[0]["job"]["title"], "Launch video");

        assert_eq!(
            service.get_my_hire("h1", &caller).await.unwrap()["hiredId"],
            "hire-1"
        );
        assert!(matches!(
            service.get_my_hire("hire-2", &caller).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
