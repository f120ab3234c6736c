use resq::prelude::*;

/// Filters and orderings accepted by `/users`.
pub fn user_compiler(config: CompilerConfig) -> QueryCompiler<QueryBuilder> {
    let mut compiler = QueryCompiler::new(config);

    compiler.filter("status").condition("=").field("state");
    compiler.filter("name").condition("%like%");
    compiler.filter("role").condition("in");
    compiler
        .filter("created_after")
        .condition(">=")
        .field("created_at");
    compiler
        .filter("email_domain")
        .condition_with(|query: &mut QueryBuilder, value, _rule| {
            let pattern = FilterValue::from(format!("%@{}", value.to_param_string()));
            query.where_cmp("email", Comparison::Like, &pattern);
        });
    // Archived users stay hidden unless a status is asked for explicitly.
    compiler
        .filter("visible")
        .condition("!=")
        .field("state")
        .default_value("archived")
        .apply_if_not_present(["status"]);

    compiler.order_by("id");
    compiler.order_by("name");
    compiler
        .order_by("created_at")
        .default_order(Direction::Desc)
        .use_as_default(true);
    compiler.order_by("newest").field("created_at").direction(Some(Direction::Desc));

    compiler
}
