//! resq: declarative filter, ordering and pagination rules for axum
//! resources, plus a client that consumes the paginated payloads.
//!
//! This facade re-exports the sub-crates through one dependency with feature
//! flags:
//!
//! ```ignore
//! use resq::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crate                      |
//! |-------------|---------|----------------------------|
//! | `client`    | **yes** | `resq-client`              |
//! | `data-sqlx` | no      | `resq-data-sqlx`           |
//! | `sqlite`    | no      | `resq-data-sqlx/sqlite`    |
//! | `postgres`  | no      | `resq-data-sqlx/postgres`  |
//! | `mysql`     | no      | `resq-data-sqlx/mysql`     |
//! | `full`      | no      | All of the above           |

pub use resq_core::*;

pub use resq_data;

#[cfg(feature = "client")]
pub use resq_client;

#[cfg(feature = "data-sqlx")]
pub use resq_data_sqlx;

/// Unified prelude. Import everything with `use resq::prelude::*`.
pub mod prelude {
    pub use resq_core::prelude::*;

    #[cfg(feature = "client")]
    pub use resq_client::{
        CancellationToken, ClientConfig, ClientError, HttpTransport, PageResult, Paginator,
        RemoteQuery, Transport,
    };

    #[cfg(feature = "data-sqlx")]
    pub use resq_data_sqlx::prelude::*;
}
