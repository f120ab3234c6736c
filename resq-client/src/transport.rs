use std::future::Future;
use std::pin::Pin;

use http::Method;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Future returned by [`Transport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ClientError>> + Send + 'a>>;

/// One encoded request, ready for a transport.
///
/// `method` is the verb actually sent: GET, or POST with the intended verb
/// tunneled in a `_method` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl WireRequest {
    /// Parameters rendered as `application/x-www-form-urlencoded`.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }

    /// The value of the first parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The verb the server should act on.
    pub fn intended_method(&self) -> Method {
        self.param(crate::METHOD_OVERRIDE_FIELD)
            .and_then(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .unwrap_or_else(|| self.method.clone())
    }
}

/// Sends encoded requests and returns the decoded JSON payload.
///
/// Implement this to plug in another HTTP stack, or a scripted one in tests.
pub trait Transport: Send + Sync + 'static {
    fn send<'a>(&'a self, request: &'a WireRequest) -> TransportFuture<'a>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: &WireRequest) -> Result<Value, ClientError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending resource query");

        let builder = if request.method == Method::GET {
            self.client.get(&request.url).query(&request.params)
        } else {
            self.client
                .request(request.method.clone(), &request.url)
                .form(&request.params)
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(url = %request.url, error = %e, "resource query failed");
            ClientError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url = %request.url, status = status.as_u16(), "resource query rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, request: &'a WireRequest) -> TransportFuture<'a> {
        Box::pin(self.execute(request))
    }
}
