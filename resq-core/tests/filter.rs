use resq_core::filter::{FilterInput, FilterRule, FilterSet};
use resq_data::{Comparison, FilterValue};
use resq_test::{RecordingTarget, TargetOp};

fn input(pairs: &[(&str, FilterValue)]) -> FilterInput {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn apply(rule: &FilterRule<RecordingTarget>, input: &FilterInput) -> (RecordingTarget, Vec<String>) {
    let mut target = RecordingTarget::new();
    let mut applied = Vec::new();
    rule.apply(&mut target, input, &mut applied);
    (target, applied)
}

// ── Eligibility ─────────────────────────────────────────────────────────

#[test]
fn equals_rule_targets_its_field() {
    let mut rule = FilterRule::<RecordingTarget>::new("status");
    rule.condition("=").field("state");

    let (target, applied) = apply(&rule, &input(&[("status", "active".into())]));
    assert_eq!(applied, vec!["status"]);
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("state".into(), Comparison::Eq, "active".into())]
    );
}

#[test]
fn field_defaults_to_rule_name() {
    let rule = FilterRule::<RecordingTarget>::new("role");
    let (target, _) = apply(&rule, &input(&[("role", "admin".into())]));
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("role".into(), Comparison::Eq, "admin".into())]
    );
}

#[test]
fn absent_or_empty_input_does_not_fire() {
    let rule = FilterRule::<RecordingTarget>::new("status");

    let (target, applied) = apply(&rule, &FilterInput::new());
    assert!(applied.is_empty());
    assert!(target.ops.is_empty());

    let (target, applied) = apply(&rule, &input(&[("status", "".into())]));
    assert!(applied.is_empty());
    assert!(target.ops.is_empty());
}

#[test]
fn default_value_fires_when_input_is_absent() {
    let mut rule = FilterRule::<RecordingTarget>::new("status");
    rule.default_value("active");

    let (target, applied) = apply(&rule, &FilterInput::new());
    assert_eq!(applied, vec!["status"]);
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("status".into(), Comparison::Eq, "active".into())]
    );

    let (target, _) = apply(&rule, &input(&[("status", "inactive".into())]));
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("status".into(), Comparison::Eq, "inactive".into())]
    );
}

#[test]
fn falsy_default_never_fires_on_its_own() {
    for default in [FilterValue::Int(0), FilterValue::from(""), FilterValue::Bool(false)] {
        let mut rule = FilterRule::<RecordingTarget>::new("archived");
        rule.default_value(default);
        let (target, applied) = apply(&rule, &FilterInput::new());
        assert!(applied.is_empty());
        assert!(target.ops.is_empty());
    }
}

#[test]
fn predicate_sees_the_whole_input() {
    let mut rule = FilterRule::<RecordingTarget>::new("visible");
    rule.condition("!=")
        .field("state")
        .default_value("archived")
        .apply_if_not_present(["status"]);

    let (target, applied) = apply(&rule, &FilterInput::new());
    assert_eq!(applied, vec!["visible"]);
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("state".into(), Comparison::NotEq, "archived".into())]
    );

    let (target, applied) = apply(&rule, &input(&[("status", "archived".into())]));
    assert!(applied.is_empty());
    assert!(target.ops.is_empty());
}

#[test]
fn apply_if_present_requires_every_sibling() {
    let mut rule = FilterRule::<RecordingTarget>::new("to");
    rule.condition("<=").apply_if_present(["from"]);

    let (_, applied) = apply(&rule, &input(&[("to", "2024-12-31".into())]));
    assert!(applied.is_empty());

    let both = input(&[("from", "2024-01-01".into()), ("to", "2024-12-31".into())]);
    let (target, applied) = apply(&rule, &both);
    assert_eq!(applied, vec!["to"]);
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("to".into(), Comparison::Lte, "2024-12-31".into())]
    );
}

// ── Operators ───────────────────────────────────────────────────────────

#[test]
fn pattern_family_wraps_wildcards() {
    let cases = [("%like%", "%bob%"), ("like%", "bob%"), ("%like", "%bob"), ("like", "bob")];
    for (op, expected) in cases {
        let mut rule = FilterRule::<RecordingTarget>::new("name");
        rule.condition(op);
        let (target, _) = apply(&rule, &input(&[("name", "bob".into())]));
        assert_eq!(
            target.ops,
            vec![TargetOp::Compare("name".into(), Comparison::Like, expected.into())],
            "operator {op}"
        );
    }
}

#[test]
fn in_rule_splits_scalar_on_semicolon() {
    let mut rule = FilterRule::<RecordingTarget>::new("ids");
    rule.condition("in").field("id");

    let (target, _) = apply(&rule, &input(&[("ids", "1;2;3".into())]));
    assert_eq!(
        target.ops,
        vec![TargetOp::In("id".into(), vec!["1".into(), "2".into(), "3".into()])]
    );

    let (target, _) = apply(&rule, &input(&[("ids", vec!["4", "5"].into())]));
    assert_eq!(
        target.ops,
        vec![TargetOp::In("id".into(), vec!["4".into(), "5".into()])]
    );
}

#[test]
fn unknown_operator_is_recorded_but_skipped() {
    let mut rule = FilterRule::<RecordingTarget>::new("age");
    rule.condition(">");

    let (target, applied) = apply(&rule, &input(&[("age", "30".into())]));
    assert_eq!(applied, vec!["age"]);
    assert!(target.ops.is_empty());
}

#[test]
fn callback_condition_owns_the_mutation() {
    let mut rule = FilterRule::<RecordingTarget>::new("search");
    rule.condition(">=").field("ignored").condition_with(|q, value, rule| {
        q.ops.push(TargetOp::Compare(
            format!("{}_text", rule.name()),
            Comparison::Like,
            FilterValue::from(format!("{value}*")),
        ));
    });

    let (target, applied) = apply(&rule, &input(&[("search", "rust".into())]));
    assert_eq!(applied, vec!["search"]);
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("search_text".into(), Comparison::Like, "rust*".into())]
    );
}

#[test]
fn callback_that_does_nothing_still_counts_as_applied() {
    let mut rule = FilterRule::<RecordingTarget>::new("noop");
    rule.condition_with(|_, _, _| {});

    let (target, applied) = apply(&rule, &input(&[("noop", "1".into())]));
    assert_eq!(applied, vec!["noop"]);
    assert!(target.ops.is_empty());
}

#[test]
fn callback_field_receives_the_shaped_value() {
    let mut rule = FilterRule::<RecordingTarget>::new("name");
    rule.condition("%like%").field_with(|q, value, _| {
        q.ops.push(TargetOp::Compare("lower(name)".into(), Comparison::Like, value.clone()));
    });

    let (target, _) = apply(&rule, &input(&[("name", "ann".into())]));
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("lower(name)".into(), Comparison::Like, "%ann%".into())]
    );
}

#[test]
fn formatter_runs_before_the_operator() {
    let mut rule = FilterRule::<RecordingTarget>::new("email");
    rule.condition("like%")
        .format_value(|v| FilterValue::from(v.to_param_string().to_lowercase()));

    let (target, _) = apply(&rule, &input(&[("email", "Bob".into())]));
    assert_eq!(
        target.ops,
        vec![TargetOp::Compare("email".into(), Comparison::Like, "bob%".into())]
    );
}

// ── FilterSet ───────────────────────────────────────────────────────────

#[test]
fn set_applies_in_declaration_order() {
    let mut set = FilterSet::<RecordingTarget>::new();
    set.add("b");
    set.add_with("a", "!=", "col_a");

    let mut target = RecordingTarget::new();
    let applied = set.apply_conditions(
        &mut target,
        &input(&[("a", "1".into()), ("b", "2".into()), ("c", "3".into())]),
    );

    assert_eq!(applied, vec!["b", "a"]);
    assert_eq!(
        target.ops,
        vec![
            TargetOp::Compare("b".into(), Comparison::Eq, "2".into()),
            TargetOp::Compare("col_a".into(), Comparison::NotEq, "1".into()),
        ]
    );
}

#[test]
fn add_replaces_and_get_or_create_keeps() {
    let mut set = FilterSet::<RecordingTarget>::new();
    set.add("status").field("state");
    set.add("other");

    set.get_or_create("status").condition("!=");
    assert!(matches!(
        set.get("status").unwrap().target_field(),
        resq_core::FilterField::Column(c) if c == "state"
    ));

    set.add("status");
    assert!(matches!(
        set.get("status").unwrap().target_field(),
        resq_core::FilterField::Column(c) if c == "status"
    ));
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["status", "other"]);
}

#[test]
fn lookup_does_not_create_rules() {
    let mut set = FilterSet::<RecordingTarget>::new();
    assert!(set.get("missing").is_none());
    assert!(set.is_empty());

    set.add("a");
    set.add("b");
    assert!(set.contains("a"));
    assert!(set.remove("a").is_some());
    assert!(!set.contains("a"));
    assert_eq!(set.len(), 1);

    set.clear();
    assert!(set.is_empty());
}
