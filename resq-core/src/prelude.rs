//! Re-exports of the most commonly used types.

pub use crate::compiler::{AppliedRules, CompiledQuery, QueryCompiler};
pub use crate::config::{CompilerConfig, PageSizePolicy};
pub use crate::filter::{FilterInput, FilterRule, FilterSet, Operator};
pub use crate::http::{QueryParams, ResourceError, ResourceResponse};
pub use crate::order::{DefaultOrder, OrderRule, OrderSet, OrderToken};
pub use crate::params::RequestParams;
pub use resq_data::prelude::*;
