use std::sync::Arc;

use http::Method;
use resq_data::{Direction, FilterValue, Page};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::paginator::Paginator;
use crate::result::PageResult;
use crate::transport::{Transport, WireRequest};
use crate::METHOD_OVERRIDE_FIELD;

/// Client-side description of a resource query.
///
/// Encodes filters, ordering and page exactly the way the server-side
/// compiler reads them. Builder methods consume and return `self`; clone the
/// query to branch it.
///
/// ```ignore
/// let query = RemoteQuery::new(transport, "/api/users")
///     .filter("status", "active")
///     .order_by("created_at", Direction::Desc)
///     .page(2);
/// let page: Page<User> = query.get_page(&CancellationToken::new()).await?;
/// ```
#[derive(Clone)]
pub struct RemoteQuery {
    transport: Arc<dyn Transport>,
    action: String,
    method: Method,
    filters: Vec<(String, FilterValue)>,
    order_by: Vec<String>,
    page: u64,
    page_size: Option<u64>,
    filter_parameter: Option<String>,
    order_parameter: String,
    page_parameter: String,
    page_size_parameter: String,
}

impl std::fmt::Debug for RemoteQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteQuery")
            .field("action", &self.action)
            .field("method", &self.method)
            .field("filters", &self.filters)
            .field("order_by", &self.order_by)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl RemoteQuery {
    /// A GET query against `action` with the default parameter names.
    pub fn new(transport: Arc<dyn Transport>, action: impl Into<String>) -> Self {
        Self::with_config(transport, &ClientConfig::default(), action)
    }

    /// A GET query using the parameter names and base URL of `config`.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
        action: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            action: config.resolve_url(&action.into()),
            method: Method::GET,
            filters: Vec::new(),
            order_by: Vec::new(),
            page: 1,
            page_size: None,
            filter_parameter: config.filter_parameter.clone(),
            order_parameter: config.order_parameter.clone(),
            page_parameter: config.page_parameter.clone(),
            page_size_parameter: config.page_size_parameter.clone(),
        }
    }

    // ── Builder ────────────────────────────────────────────────────────

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set a filter value, replacing any previous value for `name`.
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.filters.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.filters.push((name, value)),
        }
        self
    }

    pub fn add_filters<I, K, V>(self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        filters
            .into_iter()
            .fold(self, |query, (k, v)| query.filter(k, v))
    }

    pub fn clear_filters(mut self) -> Self {
        self.filters.clear();
        self
    }

    /// Append an ordering as `field:direction`.
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(format!("{field}:{direction}"));
        self
    }

    /// Append a raw ordering token such as `-created_at`.
    pub fn order_token(mut self, token: impl Into<String>) -> Self {
        self.order_by.push(token.into());
        self
    }

    pub fn clear_order_by(mut self) -> Self {
        self.order_by.clear();
        self
    }

    /// Clear filters and ordering, and go back to page 1.
    pub fn reset_query(mut self) -> Self {
        self.filters.clear();
        self.order_by.clear();
        self.page = 1;
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    /// Request a page size. The server honors it only when its policy allows it.
    pub fn page_size(mut self, size: Option<u64>) -> Self {
        self.page_size = size;
        self
    }

    pub fn filter_parameter(mut self, root: Option<&str>) -> Self {
        self.filter_parameter = root.map(str::to_string);
        self
    }

    pub fn order_parameter(mut self, name: impl Into<String>) -> Self {
        self.order_parameter = name.into();
        self
    }

    pub fn page_size_parameter(mut self, name: impl Into<String>) -> Self {
        self.page_size_parameter = name.into();
        self
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn filters(&self) -> &[(String, FilterValue)] {
        &self.filters
    }

    pub fn order_tokens(&self) -> &[String] {
        &self.order_by
    }

    pub fn page_number(&self) -> u64 {
        self.page
    }

    pub fn requested_page_size(&self) -> Option<u64> {
        self.page_size
    }

    // ── Encoding ───────────────────────────────────────────────────────

    /// Encode the query. Non-GET methods are sent as POST with the intended
    /// verb in `_method`.
    pub fn to_wire(&self) -> WireRequest {
        let mut params = Vec::new();
        for (name, value) in &self.filters {
            let key = match &self.filter_parameter {
                Some(root) => format!("{root}[{name}]"),
                None => name.clone(),
            };
            flatten_params(value, &key, &mut params);
        }
        if !self.order_by.is_empty() {
            params.push((self.order_parameter.clone(), self.order_by.join(",")));
        }
        params.push((self.page_parameter.clone(), self.page.to_string()));
        if let Some(size) = self.page_size {
            params.push((self.page_size_parameter.clone(), size.to_string()));
        }

        let method = if self.method == Method::GET {
            Method::GET
        } else {
            params.push((METHOD_OVERRIDE_FIELD.to_string(), self.method.to_string()));
            Method::POST
        };

        WireRequest {
            method,
            url: self.action.clone(),
            params,
        }
    }

    /// The encoded parameters as a URL-encoded string.
    pub fn query_string(&self) -> String {
        self.to_wire().query_string()
    }

    // ── Execution ──────────────────────────────────────────────────────

    /// Execute and return the raw JSON payload.
    ///
    /// Resolves with [`ClientError::Cancelled`] once `cancel` fires, even if
    /// the transport call is still running.
    pub async fn get(&self, cancel: &CancellationToken) -> Result<Value, ClientError> {
        let request = self.to_wire();
        let payload = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(url = %request.url, page = self.page, "resource query cancelled");
                return Err(ClientError::Cancelled);
            }
            result = self.transport.send(&request) => result?,
        };
        match payload {
            Value::Object(_) => Ok(payload),
            other => Err(ClientError::UnexpectedPayload(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Execute and decode a `{ data, meta? }` payload.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Page<T>, ClientError> {
        let payload = self.get(cancel).await?;
        if payload.get("data").is_none() {
            return Err(ClientError::UnexpectedPayload(
                "missing `data` field".to_string(),
            ));
        }
        serde_json::from_value(payload).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Execute and wrap the page with navigation helpers.
    pub async fn get_result<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PageResult<T>, ClientError> {
        let page = self.get_page(cancel).await?;
        Ok(PageResult::new(page, self.clone()))
    }

    /// Incremental fetcher starting at this query's page.
    ///
    /// With `prefetch` the first page is requested immediately, which needs a
    /// running tokio runtime.
    pub fn paginate<T>(&self, prefetch: bool) -> Paginator<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        Paginator::new(self.clone(), prefetch)
    }
}

/// Flatten a value into bracketed `(key, value)` pairs under `prefix`.
///
/// Maps nest as `prefix[key]`, lists as `prefix[0]`, `prefix[1]`; `null`
/// and empty collections contribute nothing.
pub fn flatten_params(value: &FilterValue, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        FilterValue::Null => {}
        FilterValue::Map(map) => {
            for (k, v) in map {
                flatten_params(v, &format!("{prefix}[{k}]"), out);
            }
        }
        FilterValue::List(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_params(v, &format!("{prefix}[{i}]"), out);
            }
        }
        scalar => out.push((prefix.to_string(), scalar.to_param_string())),
    }
}
