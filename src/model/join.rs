use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{collections, Filter, Lookup, SortSpec, Stage};

/// How a joined array is shaped on the parent document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum UnwindMode {
    /// Keep the joined documents as an array
    #[default]
    Keep,
    /// Flatten to a single object; parents without a match are kept
    Flatten,
    /// Flatten, copy the selected fields onto the parent, drop the object
    Splice,
}

impl TryFrom<u8> for UnwindMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UnwindMode::Keep),
            1 => Ok(UnwindMode::Flatten),
            2 => Ok(UnwindMode::Splice),
            other => Err(format!("unwind type must be 0, 1 or 2, got {other}")),
        }
    }
}

impl From<UnwindMode> for u8 {
    fn from(mode: UnwindMode) -> Self {
        match mode {
            UnwindMode::Keep => 0,
            UnwindMode::Flatten => 1,
            UnwindMode::Splice => 2,
        }
    }
}

/// Caller request to populate a named relation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinSpec {
    pub path: String,
    pub alias: Option<String>,
    pub select: Vec<String>,
    pub filter: Option<Filter>,
    pub unwind: UnwindMode,
    pub sort: Option<SortSpec>,
}

impl JoinSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn select<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn matching(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn unwind(mut self, mode: UnwindMode) -> Self {
        self.unwind = mode;
        self
    }

    /// Sort applied right after flattening, same syntax as list sorting
    pub fn sort_populate(mut self, sort: &str) -> Self {
        self.sort = Some(SortSpec::parse(sort));
        self
    }

    /// Field the joined result is written to
    pub fn output_field(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.path)
    }
}

/// Static description of a relation the store can join
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDescriptor {
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub pipeline: Vec<Stage>,
    pub count: bool,
}

impl JoinDescriptor {
    pub fn new(
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            pipeline: Vec::new(),
            count: false,
        }
    }

    /// Fixed stages appended after the caller's projection and match
    pub fn with_pipeline(mut self, stages: Vec<Stage>) -> Self {
        self.pipeline = stages;
        self
    }

    /// Replace the joined array with its length
    pub fn count_only(mut self) -> Self {
        self.count = true;
        self
    }
}

/// What happens when a caller names a relation the registry lacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Unknown relations contribute no stages
    #[default]
    Lenient,
    /// Unknown relations fail the pipeline build
    Strict,
}

/// Immutable name -> relation table, built once at start-up
#[derive(Debug, Clone, Default)]
pub struct JoinRegistry {
    joins: HashMap<String, JoinDescriptor>,
    policy: JoinPolicy,
}

impl JoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, descriptor: JoinDescriptor) -> Self {
        self.joins.insert(name.into(), descriptor);
        self
    }

    pub fn with_policy(mut self, policy: JoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> JoinPolicy {
        self.policy
    }

    pub fn resolve(&self, name: &str) -> Option<&JoinDescriptor> {
        self.joins.get(name)
    }

    /// Relations between the marketplace collections
    pub fn standard() -> Self {
        Self::new()
            .register(
                "user",
                JoinDescriptor::new(collections::USERS, "userId", "userId"),
            )
            .register(
                "creator",
                JoinDescriptor::new(collections::CREATORS, "creatorId", "creatorId")
                    .with_pipeline(owning_user()),
            )
            .register(
                "job",
                JoinDescriptor::new(collections::JOBS, "jobId", "jobId"),
            )
            .register(
                "jobsCompleted",
                JoinDescriptor::new(collections::JOBS, "influencerId", "influencerId")
                    .with_pipeline(vec![Stage::Match(Filter::new().with("completed", true))])
                    .count_only(),
            )
            .register(
                "influencer",
                JoinDescriptor::new(collections::INFLUENCERS, "influencerId", "influencerId")
                    .with_pipeline(owning_user()),
            )
            .register(
                "bid",
                JoinDescriptor::new(collections::BIDS, "bidId", "bidId"),
            )
            .register(
                "creatorUserData",
                JoinDescriptor::new(collections::USERS, "creatorUserId", "userId"),
            )
    }
}

/// Embed the owning user account as a single `user` object
fn owning_user() -> Vec<Stage> {
    vec![
        Stage::Lookup(Lookup {
            from: collections::USERS.to_string(),
            local_field: "userId".to_string(),
            foreign_field: "userId".to_string(),
            pipeline: Vec::new(),
            as_field: "user".to_string(),
        }),
        Stage::Unwind {
            path: "user".to_string(),
            preserve_null_and_empty_arrays: true,
        },
    ]
}
