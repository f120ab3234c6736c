use std::collections::HashMap;
use std::io::Write;

use resq_core::config::{CompilerConfig, ConfigError, PageSizePolicy};

// ── PageSizePolicy ──────────────────────────────────────────────────────

#[test]
fn allowed_sizes_honor_members_only() {
    let policy = PageSizePolicy::Allowed(vec![10, 25, 50]);
    assert_eq!(policy.resolve(Some(25)), Some(25));
    assert_eq!(policy.resolve(Some(999)), Some(10));
    assert_eq!(policy.resolve(None), Some(10));
}

#[test]
fn fixed_and_disabled_policies() {
    assert_eq!(PageSizePolicy::Fixed(15).resolve(Some(50)), Some(15));
    assert_eq!(PageSizePolicy::Disabled.resolve(Some(50)), None);
    assert!(!PageSizePolicy::Allowed(vec![]).is_enabled());
    assert_eq!(PageSizePolicy::default(), PageSizePolicy::Fixed(10));
}

#[test]
fn policy_parses_compact_form() {
    assert_eq!(PageSizePolicy::parse("none"), Ok(PageSizePolicy::Disabled));
    assert_eq!(PageSizePolicy::parse("25"), Ok(PageSizePolicy::Fixed(25)));
    assert_eq!(
        PageSizePolicy::parse("10, 25,50"),
        Ok(PageSizePolicy::Allowed(vec![10, 25, 50]))
    );
    assert!(PageSizePolicy::parse("ten").is_err());
}

// ── YAML ────────────────────────────────────────────────────────────────

#[test]
fn empty_yaml_is_the_default_config() {
    let config = CompilerConfig::from_yaml_str("").unwrap();
    assert_eq!(config, CompilerConfig::default());
    assert_eq!(config.filter_parameter.as_deref(), Some("filters"));
    assert_eq!(config.order_parameter, "order_by");
    assert_eq!(config.page_parameter, "page");
    assert_eq!(config.page_size_parameter, "per_page");
}

#[test]
fn yaml_pagination_shapes() {
    let list = CompilerConfig::from_yaml_str("pagination: [10, 25, 50]").unwrap();
    assert_eq!(list.pagination, PageSizePolicy::Allowed(vec![10, 25, 50]));

    let fixed = CompilerConfig::from_yaml_str("pagination: 30").unwrap();
    assert_eq!(fixed.pagination, PageSizePolicy::Fixed(30));

    let off = CompilerConfig::from_yaml_str("pagination: ~\nfilter_parameter: ~").unwrap();
    assert_eq!(off.pagination, PageSizePolicy::Disabled);
    assert_eq!(off.filter_parameter, None);
}

#[test]
fn yaml_section_lookup() {
    let yaml = "app:\n  query:\n    order_parameter: sort\n    pagination: 5\nother: 1\n";
    let config = CompilerConfig::from_yaml_section(yaml, "app.query").unwrap();
    assert_eq!(config.order_parameter, "sort");
    assert_eq!(config.pagination, PageSizePolicy::Fixed(5));

    let missing = CompilerConfig::from_yaml_section(yaml, "app.nothing").unwrap();
    assert_eq!(missing, CompilerConfig::default());

    let bad = CompilerConfig::from_yaml_section("app:\n  query:\n    pagination: nope\n", "app.query");
    assert!(matches!(bad, Err(ConfigError::Invalid { key, .. }) if key == "app.query"));
}

#[test]
fn config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "page_parameter: p\npagination: [20, 40]").unwrap();

    let config = CompilerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.page_parameter, "p");
    assert_eq!(config.pagination, PageSizePolicy::Allowed(vec![20, 40]));

    let missing = CompilerConfig::from_file("/definitely/not/here.yaml").unwrap();
    assert_eq!(missing, CompilerConfig::default());
}

#[test]
fn malformed_yaml_is_a_load_error() {
    let err = CompilerConfig::from_yaml_str("pagination: [1, 2").unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
    assert!(err.to_string().starts_with("Config load error"));
}

// ── Environment overrides ───────────────────────────────────────────────

#[test]
fn overrides_replace_yaml_values() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("RESQ_FILTER_PARAMETER", ""),
        ("RESQ_ORDER_PARAMETER", "sort"),
        ("RESQ_PAGINATION", "10,20"),
    ]);
    let config = CompilerConfig::default()
        .with_overrides_from(|key| env.get(key).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.filter_parameter, None);
    assert_eq!(config.order_parameter, "sort");
    assert_eq!(config.page_parameter, "page");
    assert_eq!(config.pagination, PageSizePolicy::Allowed(vec![10, 20]));
}

#[test]
fn invalid_override_names_the_variable() {
    let err = CompilerConfig::default()
        .with_overrides_from(|key| (key == "RESQ_PAGINATION").then(|| "lots".to_string()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "RESQ_PAGINATION"));
}
