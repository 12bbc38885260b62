//! Axum extractors that run the validation stage before a handler.
//!
//! The pipe is resolved from request extensions, where the launcher puts
//! it. When it cannot be resolved the default pipe is used instead of
//! failing the request.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::observability::metrics;
use crate::validation::error::{FieldError, RpcException};
use crate::validation::pipe::ValidationPipe;

/// JSON body that passed the validation stage.
#[derive(Debug, Clone)]
pub struct Valid<T>(pub T);

/// Query string that passed the validation stage.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

fn resolve_pipe(extensions: &axum::http::Extensions) -> Arc<ValidationPipe> {
    extensions
        .get::<Arc<ValidationPipe>>()
        .cloned()
        .unwrap_or_default()
}

fn rejected(err: RpcException) -> RpcException {
    metrics::record_validation_failure("http");
    tracing::debug!(reason = %err, "Request rejected by validation stage");
    err
}

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = RpcException;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let pipe = resolve_pipe(req.extensions());

        let Json(value) = Json::<Value>::from_request(req, state).await.map_err(|e| {
            rejected(RpcException::validation(vec![FieldError::constraint(
                "$",
                "isJson",
                format!("request body must be a JSON document ({})", e.status()),
            )]))
        })?;

        pipe.transform(value).map(Valid).map_err(rejected)
    }
}

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = RpcException;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pipe = resolve_pipe(&parts.extensions);
        let mut errors = Vec::new();

        let Query(raw) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri).map_err(|_| {
            rejected(RpcException::validation(vec![FieldError::constraint(
                "$",
                "isQueryString",
                "query string is malformed",
            )]))
        })?;
        pipe.check_properties::<T>(raw.keys().map(String::as_str), &mut errors);

        // Undeclared keys are ignored by the typed decode; they were reported above.
        match Query::<T>::try_from_uri(&parts.uri) {
            Ok(Query(payload)) => pipe.finish(payload, errors).map(ValidQuery).map_err(rejected),
            Err(_) => {
                errors.push(FieldError::constraint(
                    "$",
                    "isValid",
                    "query parameters have an invalid type or are missing",
                ));
                Err(rejected(RpcException::validation(errors)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::{get, post}, Extension, Router};
    use serde::{Deserialize, Serialize};
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Serialize, Validate)]
    struct Greeting {
        #[validate(length(min = 1, max = 16))]
        name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Page {
        #[validate(range(min = 1, max = 50))]
        limit: Option<usize>,
    }

    fn router() -> Router {
        Router::new()
            .route("/greet", post(|Valid(g): Valid<Greeting>| async move { format!("hi {}", g.name) }))
            .route(
                "/page",
                get(|ValidQuery(p): ValidQuery<Page>| async move { format!("{:?}", p.limit) }),
            )
            .layer(Extension(Arc::new(ValidationPipe::strict())))
    }

    async fn call(router: Router, req: axum::http::Request<Body>) -> (StatusCode, Value) {
        let res = router.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into()));
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> axum::http::Request<Body> {
        axum::http::Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_body_passes_through() {
        let (status, body) = call(router(), post_json("/greet", serde_json::json!({ "name": "ada" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("hi ada".into()));
    }

    #[tokio::test]
    async fn test_extra_body_field_rejected_as_rpc_error() {
        let (status, body) = call(
            router(),
            post_json("/greet", serde_json::json!({ "name": "ada", "admin": true })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"][0]["property"], "admin");
    }

    #[tokio::test]
    async fn test_non_json_body_rejected() {
        let req = axum::http::Request::post("/greet")
            .header("content-type", "text/plain")
            .body(Body::from("name=ada"))
            .unwrap();
        let (status, body) = call(router(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"][0]["constraints"]["isJson"].is_string());
    }

    #[tokio::test]
    async fn test_query_whitelist_and_constraints() {
        let req = axum::http::Request::get("/page?limit=5").body(Body::empty()).unwrap();
        let (status, _) = call(router(), req).await;
        assert_eq!(status, StatusCode::OK);

        let req = axum::http::Request::get("/page?limit=500&sort=desc").body(Body::empty()).unwrap();
        let (status, body) = call(router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"][0]["property"], "sort");
        assert_eq!(body["message"][1]["property"], "limit");
    }

    #[tokio::test]
    async fn test_missing_pipe_falls_back_to_default() {
        let router = Router::new().route(
            "/greet",
            post(|Valid(g): Valid<Greeting>| async move { g.name }),
        );
        let (status, _) = call(router, post_json("/greet", serde_json::json!({ "name": "ada", "x": 1 }))).await;
        assert_eq!(status, StatusCode::OK);
    }
}
