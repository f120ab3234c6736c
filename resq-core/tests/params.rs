use resq_core::params::{RequestParams, MAX_NESTING_DEPTH, METHOD_OVERRIDE_FIELD};
use resq_data::FilterValue;
use serde_json::json;

#[test]
fn nested_filters_from_query_string() {
    let params = RequestParams::from_query_string(
        "?filters[status]=active&filters[name]=bob%20smith&page=2",
    );
    let filters = params.filter_input(Some("filters"));
    assert_eq!(filters.get("status"), Some(&FilterValue::from("active")));
    assert_eq!(filters.get("name"), Some(&FilterValue::from("bob smith")));
    assert_eq!(params.get("page"), Some(&FilterValue::from("2")));
}

#[test]
fn bracketed_lists_become_sequences() {
    let params = RequestParams::from_query_string(
        "filters[tags][]=a&filters[tags][]=b&filters[ids][1]=y&filters[ids][0]=x",
    );
    let filters = params.filter_input(Some("filters"));
    assert_eq!(filters.get("tags"), Some(&FilterValue::from(vec!["a", "b"])));
    assert_eq!(filters.get("ids"), Some(&FilterValue::from(vec!["x", "y"])));
}

#[test]
fn deep_nesting_builds_maps() {
    let params = RequestParams::from_query_string("a[b][c]=d");
    let a = params.get("a").unwrap();
    assert_eq!(a.get("b").and_then(|b| b.get("c")), Some(&FilterValue::from("d")));
}

#[test]
fn missing_or_scalar_root_yields_no_filters() {
    let params = RequestParams::from_query_string("filters=oops&status=x");
    assert!(params.filter_input(Some("filters")).is_empty());
    assert!(params.filter_input(Some("other")).is_empty());
    assert_eq!(params.filter_input(None).len(), 2);
}

#[test]
fn later_values_win_for_plain_keys() {
    let params = RequestParams::from_query_string("page=1&page=3");
    assert_eq!(params.get("page"), Some(&FilterValue::from("3")));
}

#[test]
fn json_body_keeps_native_types() {
    let params = RequestParams::from_json(json!({
        "filters": { "age": 30, "active": true, "ids": [1, 2] },
        "page": 2,
    }));
    let filters = params.filter_input(Some("filters"));
    assert_eq!(filters.get("age"), Some(&FilterValue::Int(30)));
    assert_eq!(filters.get("active"), Some(&FilterValue::Bool(true)));
    assert_eq!(filters.get("ids"), Some(&FilterValue::from(vec![1i64, 2])));
    assert_eq!(params.get("page").and_then(FilterValue::as_i64), Some(2));

    assert!(RequestParams::from_json(json!([1, 2])).is_empty());
}

#[test]
fn merge_prefers_the_overlay() {
    let mut params = RequestParams::from_query_string("page=1&order_by=name");
    params.merge(RequestParams::from_query_string("page=2&_method=get"));
    assert_eq!(params.get("page"), Some(&FilterValue::from("2")));
    assert_eq!(params.get("order_by"), Some(&FilterValue::from("name")));
    assert_eq!(params.method_override().as_deref(), Some("GET"));
}

#[test]
fn method_override_ignores_blank_values() {
    let mut params = RequestParams::new();
    assert_eq!(params.method_override(), None);
    params.insert(METHOD_OVERRIDE_FIELD, " ");
    assert_eq!(params.method_override(), None);
    params.insert(METHOD_OVERRIDE_FIELD, "patch");
    assert_eq!(params.method_override().as_deref(), Some("PATCH"));
    assert!(params.remove(METHOD_OVERRIDE_FIELD).is_some());
}

// ── Hostile input ───────────────────────────────────────────────────────

#[test]
fn deeply_nested_key_is_dropped() {
    let query = format!("f{}=x&page=2", "[a]".repeat(100_000));
    let params = RequestParams::from_query_string(&query);
    assert_eq!(params.get("f"), None);
    assert_eq!(params.get("page"), Some(&FilterValue::from("2")));
}

#[test]
fn nesting_up_to_the_limit_is_kept() {
    let query = format!("f{}=x", "[a]".repeat(MAX_NESTING_DEPTH));
    let params = RequestParams::from_query_string(&query);

    let mut depth = 0;
    let mut node = params.get("f");
    while let Some(FilterValue::Map(map)) = node {
        depth += 1;
        node = map.get("a");
    }
    assert_eq!(depth, MAX_NESTING_DEPTH);
    assert_eq!(node, Some(&FilterValue::from("x")));
}

#[test]
fn append_after_the_largest_index_is_dropped() {
    let params = RequestParams::from_query_string(&format!(
        "filters[t][{}]=a&filters[t][]=b&filters[status]=on",
        usize::MAX
    ));
    let filters = params.filter_input(Some("filters"));
    assert_eq!(filters.get("t"), Some(&FilterValue::from(vec!["a"])));
    assert_eq!(filters.get("status"), Some(&FilterValue::from("on")));
}
