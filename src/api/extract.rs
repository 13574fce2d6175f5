//! Request extractors

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use super::middleware::ApiError;
use crate::validation::{parse_json, ValidationErrors, ValidationIssue};

/// JSON body extractor whose failures are reported as validation errors
/// (400 with an issue list) instead of axum's plain-text rejections.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state).await.map_err(|e| {
            ApiError::validation(ValidationErrors::from(ValidationIssue::invalid_body(
                e.body_text(),
            )))
        })?;

        Ok(JsonBody(parse_json(&bytes)?))
    }
}

/// Query string extractor with the same JSON error shape as [`JsonBody`]
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::try_from_uri(&parts.uri).map_err(|e| {
            tracing::debug!(error = %e, "Rejected query string");
            ApiError::validation(ValidationErrors::from(ValidationIssue::invalid_query(
                e.body_text(),
            )))
        })?;
        Ok(QueryParams(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoginInput, PostQuery};
    use axum::body::Body;
    use axum::http::StatusCode;

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_parses_json() {
        let JsonBody(input) =
            JsonBody::<LoginInput>::from_request(request(r#"{"email":"a@b.com","password":"x"}"#), &())
                .await
                .unwrap();
        assert_eq!(input.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let err = JsonBody::<LoginInput>::from_request(request("{oops"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Validation error");
        assert_eq!(err.issues.map(|i| i.len()), Some(1));
    }

    fn parts(uri: &str) -> Parts {
        let (parts, _) = Request::builder().uri(uri).body(Body::empty()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_parses_query() {
        let QueryParams(query) =
            QueryParams::<PostQuery>::from_request_parts(&mut parts("/?featured=true&slug=a"), &())
                .await
                .unwrap();
        assert_eq!(query.featured, Some(true));
        assert_eq!(query.slug.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_bad_query_is_validation_error() {
        let err = QueryParams::<PostQuery>::from_request_parts(&mut parts("/?featured=abc"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Validation error");
        let issues = err.issues.unwrap();
        assert_eq!(issues[0].code, "invalid_query");
    }
}
