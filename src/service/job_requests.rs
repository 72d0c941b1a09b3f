use crate::model::{
    collections, CallerIdentity, FilterValue, JoinSpec, PageEnvelope, RawQuery, UnwindMode,
};
use crate::service::{require_influencer, QueryService, ServiceError};
use crate::store::DocumentStore;

const CREATOR_FIELDS: [&str; 4] = ["firstName", "lastName", "avatar", "cover"];

impl<S: DocumentStore + ?Sized> QueryService<S> {
    /// Direct job offers sent to the caller, with the job and the
    /// requesting creator's public user data
    pub async fn list_job_requests(
        &self,
        raw: &RawQuery,
        caller: &CallerIdentity,
    ) -> Result<PageEnvelope, ServiceError> {
        let influencer_id = require_influencer(caller)?;
        let options = self.options(raw)?;

        let mut filter = options.filter;
        filter.set("influencerId", FilterValue::literal(influencer_id));

        let pagination = options.pagination.with_populate(vec![
            JoinSpec::new("job").unwind(UnwindMode::Flatten),
            JoinSpec::new("creatorUserData")
                .select(CREATOR_FIELDS)
                .unwind(UnwindMode::Flatten),
        ]);
        self.paginate(collections::JOB_REQUESTS, filter, &pagination)
            .await
    }
}
