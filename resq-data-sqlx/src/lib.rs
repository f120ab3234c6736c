//! # resq-data-sqlx
//!
//! Executes a compiled [`QueryBuilder`](resq_data::QueryBuilder) through
//! [SQLx](https://github.com/launchbadge/sqlx).
//!
//! | Item | Description |
//! |------|-------------|
//! | [`fetch_all`] | Full fetch, no paging |
//! | [`fetch_page`] | `COUNT(*)` plus one page, returned as `Page<T>` with meta |
//! | [`fetch`] | Either of the above depending on the compiled pagination |
//! | [`SqlxErrorExt`] | `sqlx::Error` → `DataError` (`.into_data_error()`) |
//!
//! Enable exactly one driver feature: `sqlite`, `postgres` or `mysql`, and
//! build the query with the matching [`Dialect`](resq_data::Dialect).
//!
//! ```ignore
//! let compiled = compiler.compile(QueryBuilder::new_with_dialect("users", Dialect::Sqlite), &params);
//! let page: Page<User> = resq_data_sqlx::fetch(&pool, &compiled.target, &["*"], compiled.page.as_ref()).await?;
//! ```
//!
//! Identifiers are always rendered through the checked builders, so a column
//! name that is not a plain identifier fails with `DataError::Query`.

pub mod error;
pub mod fetch;

pub use error::{SqlxErrorExt, SqlxResult};
pub use fetch::{count, fetch, fetch_all, fetch_page, BindFilterValue};

/// Re-exports of the most commonly used types from both `resq-data` and this crate.
pub mod prelude {
    pub use crate::{fetch, fetch_all, fetch_page, SqlxErrorExt};
    pub use resq_data::prelude::*;
}
