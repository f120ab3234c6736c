//! Request-to-query compiler: declarative filter and ordering rules applied
//! to any [`QueryTarget`](resq_data::QueryTarget), plus pagination.

pub mod compiler;
pub mod config;
pub mod filter;
pub mod http;
pub mod layers;
pub mod order;
pub mod params;
pub mod prelude;

pub use compiler::{AppliedRules, CompiledQuery, QueryCompiler};
pub use config::{CompilerConfig, ConfigError, PageSizePolicy, DEFAULT_PAGE_SIZE};
pub use filter::{
    Condition, FilterField, FilterInput, FilterRule, FilterSet, Operator, IN_SET_DELIMITER,
};
pub use http::{QueryParams, ResourceError, ResourceResponse};
pub use layers::init_tracing;
pub use order::{AppliedOrder, DefaultOrder, OrderField, OrderRule, OrderSet, OrderToken};
pub use params::{RequestParams, METHOD_OVERRIDE_FIELD};

pub use resq_data;
