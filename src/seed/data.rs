use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::{
    collections, generate_public_id, Bid, BidStatus, Creator, Hired, Influencer, Job, JobRequest,
    JobRequestStatus, Review, Social, User,
};
use crate::store::DocumentWriter;

/// Small marketplace: one creator, three influencers (one suspended),
/// two jobs with bids, one hire, one open job request and one review
pub async fn load_seed_data<S: DocumentWriter + ?Sized>(store: &S) -> Result<()> {
    let creator_user = user("Morgan", "Reyes", "US", None);
    let creator = Creator {
        creator_id: generate_public_id(),
        user_id: creator_user.user_id.clone(),
    };

    let mut users = vec![creator_user.clone()];
    let mut influencers = Vec::new();
    for (first, last, country, niche, suspended) in [
        ("Ada", "Okafor", "NG", vec!["tech", "gaming"], false),
        ("Lea", "Martin", "FR", vec!["fashion", "beauty"], false),
        ("Sam", "Kowalski", "PL", vec!["fitness"], true),
    ] {
        let influencer_id = generate_public_id();
        let account = user(first, last, country, Some(influencer_id.clone()));
        influencers.push(Influencer {
            influencer_id,
            user_id: account.user_id.clone(),
            niche: niche.into_iter().map(str::to_string).collect(),
            bio: format!("{first} creates {country} focused content"),
            completed: true,
            socials: vec![Social {
                name: "instagram".to_string(),
                followers: 12_500,
                url: format!("https://instagram.com/{}", first.to_lowercase()),
            }],
            suspended,
            balance: 0.0,
        });
        users.push(account);
    }

    let ada = &influencers[0];
    let lea = &influencers[1];

    let launch = job(&creator, "Launch video for a budget headset", 400.0, Some(ada), true);
    let haul = job(&creator, "Spring collection try-on haul", 650.0, None, false);

    let bids = vec![
        bid(&launch, ada, 380.0, BidStatus::Accepted),
        bid(&haul, ada, 600.0, BidStatus::Pending),
        bid(&haul, lea, 640.0, BidStatus::Pending),
    ];

    let hire = Hired {
        hired_id: generate_public_id(),
        job_id: launch.job_id.clone(),
        creator_id: creator.creator_id.clone(),
        influencer_id: ada.influencer_id.clone(),
        bid_id: bids[0].bid_id.clone(),
        price: bids[0].price,
        deadline: Utc::now() + Duration::days(14),
        creator_status: true,
        influencer_status: true,
    };

    let request = JobRequest {
        job_request_id: generate_public_id(),
        job_id: haul.job_id.clone(),
        creator_id: creator.creator_id.clone(),
        creator_user_id: creator_user.user_id.clone(),
        influencer_id: lea.influencer_id.clone(),
        status: JobRequestStatus::Pending,
        declined: false,
        bid_id: None,
    };

    let launch_review = Review {
        job_id: launch.job_id.clone(),
        creator_id: creator.creator_id.clone(),
        influencer_id: ada.influencer_id.clone(),
        proof: vec!["https://cdn.example.com/proof/launch.mp4".to_string()],
    };

    insert(store, collections::USERS, &users).await?;
    insert(store, collections::CREATORS, &[creator]).await?;
    insert(store, collections::INFLUENCERS, &influencers).await?;
    insert(store, collections::JOBS, &[launch, haul]).await?;
    insert(store, collections::BIDS, &bids).await?;
    insert(store, collections::HIRES, &[hire]).await?;
    insert(store, collections::JOB_REQUESTS, &[request]).await?;
    insert(store, collections::REVIEWS, &[launch_review]).await?;

    Ok(())
}

fn user(first: &str, last: &str, country: &str, influencer_id: Option<String>) -> User {
    User {
        user_id: generate_public_id(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        avatar: Some(format!("https://cdn.example.com/avatars/{}.png", first.to_lowercase())),
        cover: None,
        country: Some(country.to_string()),
        influencer_id,
        creator_id: None,
    }
}

fn job(
    creator: &Creator,
    title: &str,
    budget: f64,
    influencer: Option<&Influencer>,
    completed: bool,
) -> Job {
    Job {
        job_id: generate_public_id(),
        creator_id: creator.creator_id.clone(),
        title: title.to_string(),
        budget,
        completed,
        influencer_id: influencer.map(|i| i.influencer_id.clone()),
    }
}

fn bid(job: &Job, influencer: &Influencer, price: f64, status: BidStatus) -> Bid {
    Bid {
        bid_id: generate_public_id(),
        job_id: job.job_id.clone(),
        influencer_id: influencer.influencer_id.clone(),
        cover_letter: Some(format!("Happy to take on \"{}\"", job.title)),
        price,
        terms: vec!["two revisions".to_string()],
        status,
        payment_status: false,
        hired_id: None,
    }
}

async fn insert<S: DocumentWriter + ?Sized, T: Serialize>(
    store: &S,
    collection: &str,
    documents: &[T],
) -> Result<()> {
    let documents = documents
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()
        .with_context(|| format!("Failed to serialize {collection} seed data"))?;

    let written = store.insert_many(collection, documents).await?;
    log::info!("seeded {written} {collection}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallerIdentity, JoinRegistry, PaginationDefaults, RawQuery};
    use crate::service::QueryService;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seed_is_consistent() {
        let store = Arc::new(MemoryStore::new());
        load_seed_data(store.as_ref()).await.unwrap();

        assert_eq!(store.len(collections::USERS), 4);
        assert_eq!(store.len(collections::INFLUENCERS), 3);
        assert_eq!(store.len(collections::BIDS), 3);
        assert_eq!(store.len(collections::REVIEWS), 1);

        let service = QueryService::new(store, JoinRegistry::standard(), PaginationDefaults::default());
        let page = service
            .list_influencers(&RawQuery::new(), &CallerIdentity::new("visitor"))
            .await
            .unwrap();

        assert_eq!(page.total_docs, 2);
        let completed: Vec<_> = page.docs.iter().map(|doc| doc["jobsCompleted"].clone()).collect();
        assert!(completed.contains(&serde_json::json!(1)));
    }
}
