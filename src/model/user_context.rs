use serde::{Deserialize, Serialize};

/// Identity attached to an inbound call by the authentication gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub influencer_id: Option<String>,
    pub creator_id: Option<String>,
}

impl CallerIdentity {
    /// Create a caller with only a user ID
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            influencer_id: None,
            creator_id: None,
        }
    }

    /// Caller acting as an influencer
    pub fn influencer(user_id: impl Into<String>, influencer_id: impl Into<String>) -> Self {
        Self {
            influencer_id: Some(influencer_id.into()),
            ..Self::new(user_id)
        }
    }

    pub fn with_creator(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = Some(creator_id.into());
        self
    }

    pub fn is_influencer(&self) -> bool {
        self.influencer_id.is_some()
    }
}
