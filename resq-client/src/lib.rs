//! Client side of resq: encode resource queries the way the server-side
//! compiler reads them, and consume paginated payloads page by page or
//! incrementally.

pub mod config;
pub mod error;
pub mod paginator;
pub mod query;
pub mod result;
pub mod transport;

pub use config::ClientConfig;
pub use error::ClientError;
pub use paginator::{LoadHandle, Paginator};
pub use query::{flatten_params, RemoteQuery};
pub use result::PageResult;
pub use transport::{HttpTransport, Transport, TransportFuture, WireRequest};

pub use tokio_util::sync::CancellationToken;

/// Parameter carrying the intended verb of a tunneled request.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";
