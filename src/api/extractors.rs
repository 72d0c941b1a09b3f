use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use std::convert::Infallible;

use crate::api::handlers::{error_response, ErrorResponse};
use crate::model::{CallerIdentity, RawQuery};
use crate::service::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const INFLUENCER_ID_HEADER: &str = "x-influencer-id";
pub const CREATOR_ID_HEADER: &str = "x-creator-id";

/// Caller identity set by the authentication gate in front of the service.
///
/// - `X-User-Id`: required
/// - `X-Influencer-Id`: present when the caller has an influencer profile
/// - `X-Creator-Id`: present when the caller has a creator profile
#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).ok_or_else(|| {
            error_response(ServiceError::unauthorized("Missing caller identity"))
        })
    }
}

/// Query string decoded into nested caller input
#[async_trait]
impl<S> FromRequestParts<S> for RawQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RawQuery::from_query_string(parts.uri.query().unwrap_or_default()))
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Option<CallerIdentity> {
    let mut caller = CallerIdentity::new(extract_header_value(headers, USER_ID_HEADER)?);
    caller.influencer_id = extract_header_value(headers, INFLUENCER_ID_HEADER);
    caller.creator_id = extract_header_value(headers, CREATOR_ID_HEADER);
    Some(caller)
}

/// Non-empty header value as a string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn test_caller_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_static("user-123"),
        );
        headers.insert(
            HeaderName::from_static(INFLUENCER_ID_HEADER),
            HeaderValue::from_static("inf-9"),
        );

        let caller = caller_from_headers(&headers).unwrap();
        assert_eq!(caller, CallerIdentity::influencer("user-123", "inf-9"));
        assert!(caller.creator_id.is_none());
    }

    #[tokio::test]
    async fn test_missing_caller_is_rejected_as_unauthorized() {
        let (mut parts, _) = axum::http::Request::get("/me").body(()).unwrap().into_parts();

        let Err((status, Json(body))) = CallerIdentity::from_request_parts(&mut parts, &()).await
        else {
            panic!("request without caller headers was accepted");
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "Missing caller identity");
    }

    #[test]
    fn test_blank_user_id_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_static("  "),
        );

        assert!(caller_from_headers(&headers).is_none());
    }
}
