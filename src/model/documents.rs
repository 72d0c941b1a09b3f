use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Id = String;

/// Collection names in the document store
pub mod collections {
    pub const USERS: &str = "users";
    pub const CREATORS: &str = "creators";
    pub const INFLUENCERS: &str = "influencers";
    pub const JOBS: &str = "jobs";
    pub const BIDS: &str = "bids";
    pub const HIRES: &str = "hireds";
    pub const JOB_REQUESTS: &str = "jobrequests";
    pub const REVIEWS: &str = "reviews";
}

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Short public identifier, like the ones exposed in URLs
pub fn generate_public_id() -> Id {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Id,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub cover: Option<String>,
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub influencer_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub creator_id: Id,
    pub user_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Social {
    pub name: String,
    pub followers: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Influencer {
    pub influencer_id: Id,
    pub user_id: Id,
    pub niche: Vec<String>,
    pub bio: String,
    pub completed: bool,
    pub socials: Vec<Social>,
    pub suspended: bool,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: Id,
    pub creator_id: Id,
    pub title: String,
    pub budget: f64,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub influencer_id: Option<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    Pending,
    Declined,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub bid_id: Id,
    pub job_id: Id,
    pub influencer_id: Id,
    pub cover_letter: Option<String>,
    pub price: f64,
    pub terms: Vec<String>,
    pub status: BidStatus,
    pub payment_status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hired_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hired {
    pub hired_id: Id,
    pub job_id: Id,
    pub creator_id: Id,
    pub influencer_id: Id,
    pub bid_id: Id,
    pub price: f64,
    pub deadline: DateTime<Utc>,
    pub creator_status: bool,
    pub influencer_status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobRequestStatus {
    Pending,
    Bidded,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub job_request_id: Id,
    pub job_id: Id,
    pub creator_id: Id,
    pub creator_user_id: Id,
    pub influencer_id: Id,
    pub status: JobRequestStatus,
    pub declined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub job_id: Id,
    pub creator_id: Id,
    pub influencer_id: Id,
    pub proof: Vec<String>,
}
