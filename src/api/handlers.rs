use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::model::{CallerIdentity, PageEnvelope, RawQuery};
use crate::service::{QueryService, ServiceError};
use crate::store::DocumentStore;

pub type AppState<S> = Arc<QueryService<S>>;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Map a service failure onto a status code and error body
pub fn error_response(error: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        log::error!("{error}");
    }

    (status, Json(ErrorResponse::new(&error.to_string())))
}

// Influencers

pub async fn list_influencers<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
    raw: RawQuery,
) -> ApiResult<PageEnvelope> {
    service
        .list_influencers(&raw, &caller)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_influencer<S: DocumentStore>(
    State(service): State<AppState<S>>,
    _caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    service
        .get_influencer(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_me<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
) -> ApiResult<Value> {
    service.get_me(&caller).await.map(Json).map_err(error_response)
}

pub async fn get_influencer_by_user<S: DocumentStore>(
    State(service): State<AppState<S>>,
    _caller: CallerIdentity,
    Path(user_id): Path<String>,
) -> ApiResult<Value> {
    service
        .get_influencer_by_user(&user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Profile of an influencer still allowed to act, 403 once suspended
pub async fn get_active_influencer<S: DocumentStore>(
    State(service): State<AppState<S>>,
    _caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    service
        .ensure_not_suspended(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_review<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
    Path(job_id): Path<String>,
) -> ApiResult<Value> {
    service
        .get_review(&job_id, &caller)
        .await
        .map(Json)
        .map_err(error_response)
}

// Bids

pub async fn list_bids<S: DocumentStore>(
    State(service): State<AppState<S>>,
    _caller: CallerIdentity,
    raw: RawQuery,
) -> ApiResult<PageEnvelope> {
    service.list_bids(&raw).await.map(Json).map_err(error_response)
}

/// Public: no caller identity required
pub async fn get_bid<S: DocumentStore>(
    State(service): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    service.get_bid(&id).await.map(Json).map_err(error_response)
}

pub async fn list_my_bids<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
    raw: RawQuery,
) -> ApiResult<PageEnvelope> {
    service
        .list_my_bids(&raw, &caller)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_my_bid<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    service
        .get_my_bid(&id, &caller)
        .await
        .map(Json)
        .map_err(error_response)
}

// Hires

pub async fn list_my_hires<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
    raw: RawQuery,
) -> ApiResult<PageEnvelope> {
    service
        .list_my_hires(&raw, &caller)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_my_hire<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    service
        .get_my_hire(&id, &caller)
        .await
        .map(Json)
        .map_err(error_response)
}

// Job requests

pub async fn list_job_requests<S: DocumentStore>(
    State(service): State<AppState<S>>,
    caller: CallerIdentity,
    raw: RawQuery,
) -> ApiResult<PageEnvelope> {
    service
        .list_job_requests(&raw, &caller)
        .await
        .map(Json)
        .map_err(error_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::QueryError;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ServiceError::not_found("Bid Not Found"), StatusCode::NOT_FOUND),
            (ServiceError::forbidden("suspended"), StatusCode::FORBIDDEN),
            (
                ServiceError::Unauthorized("no caller".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ServiceError::BadRequest(QueryError::PipelineBuild("limit".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Store(anyhow::anyhow!("connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let (status, Json(body)) = error_response(error);
            assert_eq!(status, expected);
            assert!(!body.error.is_empty());
        }
    }

    #[test]
    fn test_not_found_message_is_passed_through() {
        let (_, Json(body)) = error_response(ServiceError::not_found("Influencer Not Found"));
        assert_eq!(body.error, "Influencer Not Found");
    }
}
