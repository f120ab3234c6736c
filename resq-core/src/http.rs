//! axum glue: the [`QueryParams`] extractor, [`ResourceResponse`] and
//! [`ResourceError`].

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use resq_data::{DataError, Page, PageMeta};
use serde::{Deserialize, Serialize};

use crate::compiler::AppliedRules;
use crate::params::RequestParams;

/// Helper to create a JSON error response with a `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Error returned by resource handlers.
pub enum ResourceError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ResourceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ResourceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ResourceError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        error_response(status, message)
    }
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            ResourceError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            ResourceError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl std::fmt::Debug for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl From<DataError> for ResourceError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => ResourceError::NotFound(msg),
            other => {
                tracing::error!(error = %other, "resource query failed");
                ResourceError::Internal(other.to_string())
            }
        }
    }
}

// ── Extractor ──────────────────────────────────────────────────────────

/// Request parameters from the query string, plus the body of POST requests.
///
/// Body values win over query values. Form and JSON bodies are understood;
/// any other content type is ignored.
///
/// ```ignore
/// async fn list(QueryParams(params): QueryParams) -> Result<ResourceResponse<User>, ResourceError> {
///     let compiled = compiler.compile(QueryBuilder::new("users"), &params);
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParams(pub RequestParams);

impl QueryParams {
    /// The verb tunneled through `_method`, if any.
    pub fn method_override(&self) -> Option<String> {
        self.0.method_override()
    }

    pub fn into_inner(self) -> RequestParams {
        self.0
    }
}

impl std::ops::Deref for QueryParams {
    type Target = RequestParams;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequest<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ResourceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = RequestParams::from_query_string(req.uri().query().unwrap_or_default());
        if req.method() != Method::POST {
            return Ok(QueryParams(params));
        }

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ResourceError::BadRequest(rejection.body_text()))?;
        if body.is_empty() {
            return Ok(QueryParams(params));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            params.merge(RequestParams::from_query_string(&String::from_utf8_lossy(&body)));
        } else if content_type.starts_with("application/json") {
            let json: serde_json::Value = serde_json::from_slice(&body)
                .map_err(|e| ResourceError::BadRequest(format!("invalid JSON body: {e}")))?;
            params.merge(RequestParams::from_json(json));
        } else {
            tracing::debug!(content_type = %content_type, "ignoring body of unsupported content type");
        }

        if let Some(method) = params.method_override() {
            tracing::debug!(method = %method, "method override");
        }
        Ok(QueryParams(params))
    }
}

// ── Response ───────────────────────────────────────────────────────────

/// Resource listing payload:
/// `{ data, meta?, applied_filters, order_by }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceResponse<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    #[serde(flatten)]
    pub applied: AppliedRules,
}

impl<T> ResourceResponse<T> {
    pub fn from_page(page: Page<T>, applied: AppliedRules) -> Self {
        Self {
            data: page.data,
            meta: page.meta,
            applied,
        }
    }

    pub fn unpaged(data: Vec<T>, applied: AppliedRules) -> Self {
        Self {
            data,
            meta: None,
            applied,
        }
    }

    pub fn into_page(self) -> Page<T> {
        Page {
            data: self.data,
            meta: self.meta,
        }
    }
}

impl<T: Serialize> IntoResponse for ResourceResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
