use resq_data::{FilterValue, PageRequest, QueryTarget};
use serde::{Deserialize, Serialize};

use crate::config::{CompilerConfig, PageSizePolicy};
use crate::filter::{FilterInput, FilterRule, FilterSet};
use crate::order::{AppliedOrder, OrderRule, OrderSet, OrderToken};
use crate::params::RequestParams;

/// Which rules fired during one compilation.
///
/// Serializes as `{ "applied_filters": [...], "order_by": [[name, dir], ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRules {
    pub applied_filters: Vec<String>,
    pub order_by: Vec<AppliedOrder>,
}

/// Output of [`QueryCompiler::compile`].
#[derive(Debug, Clone)]
pub struct CompiledQuery<Q> {
    pub target: Q,
    pub applied: AppliedRules,
    /// Effective pagination; `None` means the full result set.
    pub page: Option<PageRequest>,
}

impl<Q> CompiledQuery<Q> {
    pub fn into_parts(self) -> (Q, AppliedRules, Option<PageRequest>) {
        (self.target, self.applied, self.page)
    }
}

/// Compiles request parameters into mutations of a query target.
///
/// Owns one [`FilterSet`] and one [`OrderSet`]. Filters are applied first,
/// then orderings, then pagination:
///
/// ```ignore
/// let mut compiler = QueryCompiler::<QueryBuilder>::new(CompilerConfig::default());
/// compiler.filter("status").condition("=").field("state");
/// compiler.order_by("created_at");
///
/// let compiled = compiler.compile(QueryBuilder::new("users"), &params);
/// ```
pub struct QueryCompiler<Q> {
    config: CompilerConfig,
    filters: FilterSet<Q>,
    orderings: OrderSet<Q>,
}

impl<Q> Clone for QueryCompiler<Q> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            filters: self.filters.clone(),
            orderings: self.orderings.clone(),
        }
    }
}

impl<Q> std::fmt::Debug for QueryCompiler<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCompiler")
            .field("config", &self.config)
            .field("filters", &self.filters)
            .field("orderings", &self.orderings)
            .finish()
    }
}

impl<Q: QueryTarget> Default for QueryCompiler<Q> {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl<Q: QueryTarget> QueryCompiler<Q> {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            filters: FilterSet::new(),
            orderings: OrderSet::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterSet<Q> {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet<Q> {
        &mut self.filters
    }

    pub fn orderings(&self) -> &OrderSet<Q> {
        &self.orderings
    }

    pub fn orderings_mut(&mut self) -> &mut OrderSet<Q> {
        &mut self.orderings
    }

    /// Get or declare a filter rule.
    pub fn filter(&mut self, name: &str) -> &mut FilterRule<Q> {
        self.filters.get_or_create(name)
    }

    /// Get or declare an ordering rule.
    pub fn order_by(&mut self, name: &str) -> &mut OrderRule<Q> {
        self.orderings.get_or_create(name)
    }

    pub fn remove_filters(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    pub fn set_pagination(&mut self, policy: PageSizePolicy) -> &mut Self {
        self.config.pagination = policy;
        self
    }

    /// Change where filter values are read from; `None` means top-level keys.
    pub fn set_filter_parameter(&mut self, root: Option<&str>) -> &mut Self {
        self.config.filter_parameter = root.map(str::to_string);
        self
    }

    /// Compile using values read from `params` under the configured keys.
    pub fn compile(&self, target: Q, params: &RequestParams) -> CompiledQuery<Q> {
        let filters = params.filter_input(self.config.filter_parameter.as_deref());
        let order = params
            .get(&self.config.order_parameter)
            .cloned()
            .unwrap_or_default();
        let page = params
            .get(&self.config.page_parameter)
            .and_then(FilterValue::as_i64)
            .and_then(|p| u64::try_from(p).ok());
        let requested_size = params
            .get(&self.config.page_size_parameter)
            .and_then(FilterValue::as_i64)
            .and_then(|s| u64::try_from(s).ok());
        self.compile_parts(target, &filters, &order, page, requested_size)
    }

    /// Compile from already separated inputs.
    ///
    /// `order` may be a `,`-delimited string or a list of tokens/pairs.
    /// `page` defaults to 1.
    pub fn compile_parts(
        &self,
        mut target: Q,
        filters: &FilterInput,
        order: &FilterValue,
        page: Option<u64>,
        requested_size: Option<u64>,
    ) -> CompiledQuery<Q> {
        let applied_filters = self.filters.apply_conditions(&mut target, filters);

        let tokens = OrderToken::from_input(order);
        let order_by = self.orderings.apply_conditions(&mut target, &tokens);

        let page = self
            .config
            .pagination
            .resolve(requested_size)
            .map(|per_page| PageRequest::new(page.unwrap_or(1), per_page));
        if let Some(page) = &page {
            target.paginate(page);
        }

        tracing::debug!(
            filters = applied_filters.len(),
            orderings = order_by.len(),
            page = page.map(|p| p.page),
            per_page = page.map(|p| p.per_page),
            "compiled query"
        );

        CompiledQuery {
            target,
            applied: AppliedRules {
                applied_filters,
                order_by,
            },
            page,
        }
    }
}
