//! Filter rules and the ordered, name-keyed filter set.
//!
//! A [`FilterRule`] decides from the raw filter input whether it fires and how it
//! mutates the query target. A [`FilterSet`] owns its rules outright and applies
//! them in declaration order against one input map.

use std::collections::BTreeMap;
use std::sync::Arc;

use resq_data::{Comparison, FilterValue, QueryTarget};

/// Raw filter values keyed by filter name.
pub type FilterInput = BTreeMap<String, FilterValue>;

/// Delimiter used to split a scalar `in` filter value into a set.
pub const IN_SET_DELIMITER: char = ';';

/// Callback owning a query mutation: `(query, resolved value, rule)`.
pub type FilterCallback<Q> = Arc<dyn Fn(&mut Q, &FilterValue, &FilterRule<Q>) + Send + Sync>;

/// Transform applied to the resolved value before it is used.
pub type ValueFormatter = Arc<dyn Fn(FilterValue) -> FilterValue + Send + Sync>;

/// Predicate over the whole filter input deciding whether a rule may fire.
pub type ApplyPredicate<Q> = Arc<dyn Fn(&FilterInput, &FilterRule<Q>) -> bool + Send + Sync>;

/// Comparison operator vocabulary for declared filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterOrEqual,
    LessOrEqual,
    /// Pattern match with the value used verbatim.
    Like,
    /// `%value%`
    Contains,
    /// `value%`
    StartsWith,
    /// `%value`
    EndsWith,
    /// Set membership; scalar values are split on `;`.
    In,
    /// Unrecognized operator string. Rules carrying it never mutate the query.
    Unknown(String),
}

impl Operator {
    /// Parse an operator from its declaration string.
    pub fn parse(op: &str) -> Self {
        match op {
            "=" => Operator::Equals,
            "!=" | "<>" => Operator::NotEquals,
            ">=" => Operator::GreaterOrEqual,
            "<=" => Operator::LessOrEqual,
            "like" => Operator::Like,
            "%like%" => Operator::Contains,
            "like%" => Operator::StartsWith,
            "%like" => Operator::EndsWith,
            "in" => Operator::In,
            other => Operator::Unknown(other.to_string()),
        }
    }

    /// Shape the resolved value the way this operator consumes it.
    fn shape(&self, value: FilterValue) -> FilterValue {
        match self {
            Operator::Contains => FilterValue::String(format!("%{value}%")),
            Operator::StartsWith => FilterValue::String(format!("{value}%")),
            Operator::EndsWith => FilterValue::String(format!("%{value}")),
            Operator::In => FilterValue::List(value.into_list(IN_SET_DELIMITER)),
            _ => value,
        }
    }
}

impl From<&str> for Operator {
    fn from(op: &str) -> Self {
        Operator::parse(op)
    }
}

/// What a rule does once it is eligible.
pub enum Condition<Q> {
    Operator(Operator),
    Callback(FilterCallback<Q>),
}

impl<Q> Clone for Condition<Q> {
    fn clone(&self) -> Self {
        match self {
            Condition::Operator(op) => Condition::Operator(op.clone()),
            Condition::Callback(cb) => Condition::Callback(Arc::clone(cb)),
        }
    }
}

impl<Q> std::fmt::Debug for Condition<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Operator(op) => f.debug_tuple("Operator").field(op).finish(),
            Condition::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Where an operator condition writes: a column, or a callback that receives
/// the operator-shaped value.
pub enum FilterField<Q> {
    Column(String),
    Callback(FilterCallback<Q>),
}

impl<Q> Clone for FilterField<Q> {
    fn clone(&self) -> Self {
        match self {
            FilterField::Column(c) => FilterField::Column(c.clone()),
            FilterField::Callback(cb) => FilterField::Callback(Arc::clone(cb)),
        }
    }
}

impl<Q> std::fmt::Debug for FilterField<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterField::Column(c) => f.debug_tuple("Column").field(c).finish(),
            FilterField::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// One named, declared filter condition.
///
/// The name is the input key and, until [`field`](Self::field) is called, also
/// the target column. The default condition is equality.
pub struct FilterRule<Q> {
    name: String,
    field: FilterField<Q>,
    condition: Condition<Q>,
    default_value: Option<FilterValue>,
    formatter: Option<ValueFormatter>,
    apply_if: Option<ApplyPredicate<Q>>,
}

impl<Q> Clone for FilterRule<Q> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            field: self.field.clone(),
            condition: self.condition.clone(),
            default_value: self.default_value.clone(),
            formatter: self.formatter.clone(),
            apply_if: self.apply_if.clone(),
        }
    }
}

impl<Q> std::fmt::Debug for FilterRule<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRule")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("condition", &self.condition)
            .field("default_value", &self.default_value)
            .field("formatter", &self.formatter.is_some())
            .field("apply_if", &self.apply_if.is_some())
            .finish()
    }
}

impl<Q: QueryTarget> FilterRule<Q> {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field: FilterField::Column(name.clone()),
            name,
            condition: Condition::Operator(Operator::Equals),
            default_value: None,
            formatter: None,
            apply_if: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_field(&self) -> &FilterField<Q> {
        &self.field
    }

    pub fn get_condition(&self) -> &Condition<Q> {
        &self.condition
    }

    pub fn get_default_value(&self) -> Option<&FilterValue> {
        self.default_value.as_ref()
    }

    /// Target column for operator conditions.
    pub fn field(&mut self, column: impl Into<String>) -> &mut Self {
        self.field = FilterField::Column(column.into());
        self
    }

    /// Hand the operator-shaped value to a callback instead of a column.
    pub fn field_with(
        &mut self,
        callback: impl Fn(&mut Q, &FilterValue, &FilterRule<Q>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.field = FilterField::Callback(Arc::new(callback));
        self
    }

    /// Use an operator from the vocabulary (`=`, `!=`, `<>`, `>=`, `<=`,
    /// `like`, `%like%`, `like%`, `%like`, `in`).
    pub fn condition(&mut self, op: impl Into<Operator>) -> &mut Self {
        self.condition = Condition::Operator(op.into());
        self
    }

    /// Let a callback own the whole mutation. The operator vocabulary and the
    /// target field are ignored.
    pub fn condition_with(
        &mut self,
        callback: impl Fn(&mut Q, &FilterValue, &FilterRule<Q>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.condition = Condition::Callback(Arc::new(callback));
        self
    }

    /// Value used when the input is absent or empty.
    ///
    /// An empty default (`""`, `0`, `false`, …) never makes the rule fire on its own.
    pub fn default_value(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn format_value(
        &mut self,
        formatter: impl Fn(FilterValue) -> FilterValue + Send + Sync + 'static,
    ) -> &mut Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Only fire when `predicate` holds over the entire filter input.
    pub fn apply_if(
        &mut self,
        predicate: impl Fn(&FilterInput, &FilterRule<Q>) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.apply_if = Some(Arc::new(predicate));
        self
    }

    /// Only fire when every named sibling filter has a non-empty value.
    pub fn apply_if_present<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.apply_if(move |input, _| names.iter().all(|n| has_value(input, n)))
    }

    /// Only fire when none of the named sibling filters has a non-empty value.
    pub fn apply_if_not_present<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.apply_if(move |input, _| names.iter().all(|n| !has_value(input, n)))
    }

    /// Whether the rule fires for `input`.
    pub fn should_be_applied(&self, input: &FilterInput) -> bool {
        let has_default = self.default_value.as_ref().is_some_and(|v| !v.is_empty());
        (has_value(input, &self.name) || has_default) && self.is_applicable(input)
    }

    pub fn is_applicable(&self, input: &FilterInput) -> bool {
        self.apply_if
            .as_ref()
            .map_or(true, |predicate| predicate(input, self))
    }

    /// Apply the rule, recording its name in `applied` when it is eligible.
    ///
    /// Returns whether the rule was eligible. Eligibility, not mutation, is what
    /// gets recorded: a callback that does nothing still counts as applied.
    pub fn apply(&self, query: &mut Q, input: &FilterInput, applied: &mut Vec<String>) -> bool {
        if !self.should_be_applied(input) {
            return false;
        }

        let resolved = match input.get(&self.name) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => self.default_value.clone().unwrap_or_default(),
        };
        let value = match &self.formatter {
            Some(format) => format(resolved),
            None => resolved,
        };

        applied.push(self.name.clone());

        match &self.condition {
            Condition::Callback(callback) => callback(query, &value, self),
            Condition::Operator(op) => self.apply_operator(query, op, value),
        }
        true
    }

    fn apply_operator(&self, query: &mut Q, op: &Operator, value: FilterValue) {
        let comparison = match op {
            Operator::Equals => Comparison::Eq,
            Operator::NotEquals => Comparison::NotEq,
            Operator::GreaterOrEqual => Comparison::Gte,
            Operator::LessOrEqual => Comparison::Lte,
            Operator::Like | Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                Comparison::Like
            }
            Operator::In => Comparison::Eq,
            Operator::Unknown(raw) => {
                tracing::warn!(rule = %self.name, operator = %raw, "unknown filter operator, rule skipped");
                return;
            }
        };

        let value = op.shape(value);
        match (&self.field, op) {
            (FilterField::Callback(callback), _) => callback(query, &value, self),
            (FilterField::Column(column), Operator::In) => {
                query.where_in(column, value.as_list().unwrap_or_default())
            }
            (FilterField::Column(column), _) => query.where_cmp(column, comparison, &value),
        }
    }
}

fn has_value(input: &FilterInput, name: &str) -> bool {
    input.get(name).is_some_and(|v| !v.is_empty())
}

/// Ordered, name-keyed collection of filter rules.
///
/// Lookups (`get`, `iter`, `contains`) never create or modify rules; mutation goes
/// through `add`, `get_or_create`, `get_mut`, `remove` and `clear`.
pub struct FilterSet<Q> {
    rules: Vec<FilterRule<Q>>,
}

impl<Q> Clone for FilterSet<Q> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<Q> std::fmt::Debug for FilterSet<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rules.iter()).finish()
    }
}

impl<Q> Default for FilterSet<Q> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<Q: QueryTarget> FilterSet<Q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a rule, replacing any rule with the same name in place.
    pub fn add(&mut self, name: impl Into<String>) -> &mut FilterRule<Q> {
        let rule = FilterRule::new(name);
        match self.position(rule.name()) {
            Some(idx) => {
                self.rules[idx] = rule;
                &mut self.rules[idx]
            }
            None => {
                self.rules.push(rule);
                let last = self.rules.len() - 1;
                &mut self.rules[last]
            }
        }
    }

    /// Declare a rule with an operator and target column in one call.
    pub fn add_with(
        &mut self,
        name: impl Into<String>,
        op: impl Into<Operator>,
        field: impl Into<String>,
    ) -> &mut FilterRule<Q> {
        let rule = self.add(name);
        rule.condition(op).field(field);
        rule
    }

    /// Fetch a rule for further configuration, declaring it if needed.
    pub fn get_or_create(&mut self, name: &str) -> &mut FilterRule<Q> {
        match self.position(name) {
            Some(idx) => &mut self.rules[idx],
            None => self.add(name),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FilterRule<Q>> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FilterRule<Q>> {
        self.rules.iter_mut().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterRule<Q>> {
        self.position(name).map(|idx| self.rules.remove(idx))
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterRule<Q>> {
        self.rules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in declaration order and return the applied names.
    pub fn apply_conditions(&self, query: &mut Q, input: &FilterInput) -> Vec<String> {
        let mut applied = Vec::new();
        for rule in &self.rules {
            rule.apply(query, input, &mut applied);
        }
        applied
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_strings_map_to_vocabulary() {
        assert_eq!(Operator::parse("="), Operator::Equals);
        assert_eq!(Operator::parse("<>"), Operator::NotEquals);
        assert_eq!(Operator::parse("%like%"), Operator::Contains);
        assert_eq!(Operator::parse("like%"), Operator::StartsWith);
        assert_eq!(Operator::parse("%like"), Operator::EndsWith);
        assert_eq!(Operator::parse(">"), Operator::Unknown(">".into()));
    }

    #[test]
    fn pattern_operators_wrap_wildcards() {
        let v = FilterValue::from("bob");
        assert_eq!(Operator::Contains.shape(v.clone()), FilterValue::from("%bob%"));
        assert_eq!(Operator::StartsWith.shape(v.clone()), FilterValue::from("bob%"));
        assert_eq!(Operator::EndsWith.shape(v.clone()), FilterValue::from("%bob"));
        assert_eq!(Operator::Like.shape(v.clone()), v);
    }

    #[test]
    fn in_operator_splits_scalars() {
        let shaped = Operator::In.shape(FilterValue::from("1;2"));
        assert_eq!(shaped, FilterValue::from(vec!["1", "2"]));
    }
}
