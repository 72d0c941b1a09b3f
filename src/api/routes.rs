use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::api::handlers::{self, AppState};
use crate::store::DocumentStore;

pub fn create_router<S: DocumentStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Influencers
        .route("/", get(handlers::list_influencers::<S>))
        .route("/:id/single", get(handlers::get_influencer::<S>))
        .route("/:id/active", get(handlers::get_active_influencer::<S>))
        .route("/user/:id", get(handlers::get_influencer_by_user::<S>))
        // Caller's own resources
        .route("/me", get(handlers::get_me::<S>))
        .route("/me/bids", get(handlers::list_my_bids::<S>))
        .route("/me/bids/:id/single", get(handlers::get_my_bid::<S>))
        .route("/me/hires", get(handlers::list_my_hires::<S>))
        .route("/me/hires/:id/single", get(handlers::get_my_hire::<S>))
        .route("/me/jobs/requests", get(handlers::list_job_requests::<S>))
        .route("/me/jobs/review/:id", get(handlers::get_review::<S>))
        // Bids
        .route("/bids", get(handlers::list_bids::<S>))
        .route("/bids/:id/single", get(handlers::get_bid::<S>))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JoinRegistry, PaginationDefaults};
    use crate::service::QueryService;
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let service = QueryService::new(
            Arc::new(MemoryStore::new()),
            JoinRegistry::standard(),
            PaginationDefaults::default(),
        );
        create_router().with_state(Arc::new(service))
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_routes_resolve() {
        let health = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(health).await, StatusCode::OK);

        let anonymous = Request::get("/me/bids").body(Body::empty()).unwrap();
        assert_eq!(status_of(anonymous).await, StatusCode::UNAUTHORIZED);

        let empty_list = Request::get("/bids?page=3")
            .header("x-user-id", "u1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(empty_list).await, StatusCode::OK);

        let missing = Request::get("/bids/nope/single").body(Body::empty()).unwrap();
        assert_eq!(status_of(missing).await, StatusCode::NOT_FOUND);

        let unknown = Request::get("/nowhere/at/all").body(Body::empty()).unwrap();
        assert_eq!(status_of(unknown).await, StatusCode::NOT_FOUND);
    }
}
