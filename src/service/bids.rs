use serde_json::Value;

use crate::model::{
    collections, CallerIdentity, Filter, FilterValue, JoinSpec, PageEnvelope, RawQuery,
    UnwindMode,
};
use crate::service::{by_any_id, require_influencer, QueryService, ServiceError};
use crate::store::DocumentStore;

fn influencer_join() -> JoinSpec {
    JoinSpec::new("influencer").unwind(UnwindMode::Flatten)
}

fn job_join() -> JoinSpec {
    JoinSpec::new("job").unwind(UnwindMode::Flatten)
}

impl<S: DocumentStore + ?Sized> QueryService<S> {
    /// All bids, each with the bidding influencer and their user record
    pub async fn list_bids(&self, raw: &RawQuery) -> Result<PageEnvelope, ServiceError> {
        let options = self.options(raw)?;
        let pagination = options.pagination.with_populate(vec![influencer_join()]);
        self.paginate(collections::BIDS, options.filter, &pagination)
            .await
    }

    /// Bid by `_id` or `bidId`
    pub async fn get_bid(&self, id: &str) -> Result<Value, ServiceError> {
        let filter = by_any_id("bidId", id, &Filter::new());
        self.find_one(collections::BIDS, filter, &[influencer_join()], "Bid Not Found")
            .await
    }

    /// Bids placed by the caller, each with its job
    pub async fn list_my_bids(
        &self,
        raw: &RawQuery,
        caller: &CallerIdentity,
    ) -> Result<PageEnvelope, ServiceError> {
        let influencer_id = require_influencer(caller)?;
        let options = self.options(raw)?;

        let mut filter = options.filter;
        filter.set("influencerId", FilterValue::literal(influencer_id));

        let pagination = options.pagination.with_populate(vec![job_join()]);
        self.paginate(collections::BIDS, filter, &pagination).await
    }

    /// One of the caller's bids; someone else's bid is not found
    pub async fn get_my_bid(
        &self,
        id: &str,
        caller: &CallerIdentity,
    ) -> Result<Value, ServiceError> {
        let influencer_id = require_influencer(caller)?;
        let filter = by_any_id(
            "bidId",
            id,
            &Filter::new().with("influencerId", influencer_id),
        );
        self.find_one(collections::BIDS, filter, &[job_join()], "Bid Not Found")
            .await
    }
}
