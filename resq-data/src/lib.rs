pub mod error;
pub mod page;
pub mod query;
pub mod target;
pub mod value;

pub use error::{DataError, QueryError};
pub use page::{Page, PageMeta, PageRequest};
pub use query::{Dialect, IdentifierPolicy, QueryBuilder};
pub use target::{Comparison, Direction, QueryTarget};
pub use value::FilterValue;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Comparison, Direction, FilterValue, Page, PageMeta, PageRequest, QueryBuilder, QueryTarget,
    };
}
