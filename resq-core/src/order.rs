//! Ordering rules, the ordered ordering set and the order-token grammar.
//!
//! Tokens arrive as `field:direction`, as sign-prefixed `-field` / `+field` /
//! `^field` / `field`, or as explicit `[field, direction]` pairs.

use std::sync::Arc;

use resq_data::{Direction, FilterValue, QueryTarget};

/// Callback owning an ordering mutation: `(query, final direction)`.
pub type OrderCallback<Q> = Arc<dyn Fn(&mut Q, Direction) + Send + Sync>;

/// `(rule name, resolved direction)` as recorded for one applied ordering.
pub type AppliedOrder = (String, Direction);

/// One requested ordering: a field name and an optional direction.
///
/// A direction is only ever `Some` when the request spelled it exactly
/// (`asc`, `desc`, or a sign prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderToken {
    pub field: String,
    pub direction: Option<Direction>,
}

impl OrderToken {
    pub fn new(field: impl Into<String>, direction: Option<Direction>) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parse a single string token. Returns `None` when no field name remains.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (field, direction) = if let Some((field, dir)) = token.split_once(':') {
            (field.trim(), Direction::parse(dir.trim()))
        } else if let Some(field) = token.strip_prefix('-') {
            (field, Some(Direction::Desc))
        } else if let Some(field) = token.strip_prefix(['+', '^']) {
            (field, Some(Direction::Asc))
        } else {
            (token, None)
        };
        if field.is_empty() {
            return None;
        }
        Some(Self::new(field, direction))
    }

    /// Parse a `[field, direction]` pair.
    fn from_pair(items: &[FilterValue]) -> Option<Self> {
        let field = items.first()?.as_str()?.trim();
        if field.is_empty() {
            return None;
        }
        let direction = items
            .get(1)
            .and_then(FilterValue::as_str)
            .and_then(|d| Direction::parse(d.trim()));
        Some(Self::new(field, direction))
    }

    /// Normalize raw order input into tokens.
    ///
    /// A string is split on `,`; a list may hold string tokens or
    /// `[field, direction]` pairs. Anything that does not parse is dropped.
    pub fn from_input(raw: &FilterValue) -> Vec<Self> {
        let tokens: Vec<Self> = match raw {
            FilterValue::String(s) => s.split(',').filter_map(Self::parse).collect(),
            FilterValue::List(items) => items
                .iter()
                .filter_map(|item| match item {
                    FilterValue::String(s) => Self::parse(s),
                    FilterValue::List(pair) => Self::from_pair(pair),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        tracing::trace!(count = tokens.len(), "parsed order tokens");
        tokens
    }
}

impl std::fmt::Display for OrderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            Some(dir) => write!(f, "{}:{dir}", self.field),
            None => f.write_str(&self.field),
        }
    }
}

/// Where an ordering rule writes: a column, or a callback.
pub enum OrderField<Q> {
    Column(String),
    Callback(OrderCallback<Q>),
}

impl<Q> Clone for OrderField<Q> {
    fn clone(&self) -> Self {
        match self {
            OrderField::Column(c) => OrderField::Column(c.clone()),
            OrderField::Callback(cb) => OrderField::Callback(Arc::clone(cb)),
        }
    }
}

impl<Q> std::fmt::Debug for OrderField<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderField::Column(c) => f.debug_tuple("Column").field(c).finish(),
            OrderField::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// One named, declared sortable field.
pub struct OrderRule<Q> {
    name: String,
    field: OrderField<Q>,
    forced: Option<Direction>,
    default_direction: Direction,
    inverted: bool,
    is_default: bool,
    enabled: bool,
}

impl<Q> Clone for OrderRule<Q> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            field: self.field.clone(),
            forced: self.forced,
            default_direction: self.default_direction,
            inverted: self.inverted,
            is_default: self.is_default,
            enabled: self.enabled,
        }
    }
}

impl<Q> std::fmt::Debug for OrderRule<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderRule")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("forced", &self.forced)
            .field("default_direction", &self.default_direction)
            .field("inverted", &self.inverted)
            .field("is_default", &self.is_default)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<Q: QueryTarget> OrderRule<Q> {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field: OrderField::Column(name.clone()),
            name,
            forced: None,
            default_direction: Direction::Asc,
            inverted: false,
            is_default: false,
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_field(&self) -> &OrderField<Q> {
        &self.field
    }

    pub fn forced_direction(&self) -> Option<Direction> {
        self.forced
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn field(&mut self, column: impl Into<String>) -> &mut Self {
        self.field = OrderField::Column(column.into());
        self
    }

    pub fn field_with(
        &mut self,
        callback: impl Fn(&mut Q, Direction) + Send + Sync + 'static,
    ) -> &mut Self {
        self.field = OrderField::Callback(Arc::new(callback));
        self
    }

    /// Force a direction regardless of what the request asks for.
    pub fn direction(&mut self, direction: Option<Direction>) -> &mut Self {
        self.forced = direction;
        self
    }

    /// Direction used during the default pass when no direction is given.
    pub fn default_order(&mut self, direction: Direction) -> &mut Self {
        self.default_direction = direction;
        self
    }

    /// Swap asc/desc as the final step, after any forced direction.
    pub fn inverted(&mut self, inverted: bool) -> &mut Self {
        self.inverted = inverted;
        self
    }

    /// Include this rule in the default ordering when no explicit default
    /// order list is configured.
    pub fn use_as_default(&mut self, is_default: bool) -> &mut Self {
        self.is_default = is_default;
        self
    }

    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Resolve the direction actually applied for a request.
    pub fn resolve_direction(&self, requested: Option<Direction>, default_pass: bool) -> Direction {
        let baseline = match requested {
            Some(dir) => dir,
            None if default_pass => self.default_direction,
            None => Direction::Asc,
        };
        let direction = self.forced.unwrap_or(baseline);
        if self.inverted {
            direction.reversed()
        } else {
            direction
        }
    }

    /// Apply the rule and return the applied `(name, direction)`, or `None`
    /// when the rule is not applicable.
    pub fn apply(
        &self,
        query: &mut Q,
        requested: Option<Direction>,
        default_pass: bool,
    ) -> Option<AppliedOrder> {
        if !self.is_applicable() {
            return None;
        }
        let direction = self.resolve_direction(requested, default_pass);
        match &self.field {
            OrderField::Callback(callback) => callback(query, direction),
            OrderField::Column(column) => query.order_by(column, direction),
        }
        Some((self.name.clone(), direction))
    }

    /// A disabled rule still counts as a recognized token but applies nothing.
    pub fn is_applicable(&self) -> bool {
        self.enabled
    }
}

/// One entry of the default order list: a rule name with an optional direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultOrder {
    pub name: String,
    pub direction: Option<Direction>,
}

impl From<&str> for DefaultOrder {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: None,
        }
    }
}

impl From<String> for DefaultOrder {
    fn from(name: String) -> Self {
        Self {
            name,
            direction: None,
        }
    }
}

impl<S: Into<String>> From<(S, Direction)> for DefaultOrder {
    fn from((name, direction): (S, Direction)) -> Self {
        Self {
            name: name.into(),
            direction: Some(direction),
        }
    }
}

/// Ordered, name-keyed collection of ordering rules plus the default order.
pub struct OrderSet<Q> {
    rules: Vec<OrderRule<Q>>,
    default_order: Vec<DefaultOrder>,
}

impl<Q> Clone for OrderSet<Q> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            default_order: self.default_order.clone(),
        }
    }
}

impl<Q> std::fmt::Debug for OrderSet<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSet")
            .field("rules", &self.rules)
            .field("default_order", &self.default_order)
            .finish()
    }
}

impl<Q> Default for OrderSet<Q> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_order: Vec::new(),
        }
    }
}

impl<Q: QueryTarget> OrderSet<Q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a rule, or return the existing one untouched.
    pub fn add(&mut self, name: &str) -> &mut OrderRule<Q> {
        match self.position(name) {
            Some(idx) => &mut self.rules[idx],
            None => {
                self.rules.push(OrderRule::new(name));
                let last = self.rules.len() - 1;
                &mut self.rules[last]
            }
        }
    }

    /// Declare or update a rule bound to `column` with an optional forced direction.
    pub fn add_with(
        &mut self,
        name: &str,
        column: impl Into<String>,
        direction: Option<Direction>,
    ) -> &mut OrderRule<Q> {
        let rule = self.add(name);
        rule.field(column).direction(direction);
        rule
    }

    /// Declare a rule, replacing any existing configuration in place.
    pub fn set(&mut self, name: &str) -> &mut OrderRule<Q> {
        let rule = OrderRule::new(name);
        match self.position(name) {
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

    pub fn get_or_create(&mut self, name: &str) -> &mut OrderRule<Q> {
        self.add(name)
    }

    pub fn get(&self, name: &str) -> Option<&OrderRule<Q>> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut OrderRule<Q>> {
        self.rules.iter_mut().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<OrderRule<Q>> {
        self.position(name).map(|idx| self.rules.remove(idx))
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderRule<Q>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replace the default order list.
    pub fn set_default_order<I, D>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DefaultOrder>,
    {
        self.default_order = entries.into_iter().map(Into::into).collect();
        self
    }

    /// The effective default ordering: the explicit list when set, otherwise
    /// every rule marked with [`OrderRule::use_as_default`].
    pub fn default_order(&self) -> Vec<DefaultOrder> {
        if !self.default_order.is_empty() {
            return self.default_order.clone();
        }
        self.rules
            .iter()
            .filter(|r| r.is_default)
            .map(|r| DefaultOrder::from(r.name.clone()))
            .collect()
    }

    /// Apply the requested tokens, or the default order when none of them
    /// names a declared rule. Returns the applied pairs in application order.
    pub fn apply_conditions(&self, query: &mut Q, requested: &[OrderToken]) -> Vec<AppliedOrder> {
        let recognized: Vec<&OrderToken> = requested
            .iter()
            .filter(|token| {
                let known = self.contains(&token.field);
                if !known {
                    tracing::debug!(field = %token.field, "ignoring unknown order field");
                }
                known
            })
            .collect();

        let mut applied = Vec::new();
        if recognized.is_empty() {
            let defaults = self.default_order();
            if !defaults.is_empty() {
                tracing::debug!(count = defaults.len(), "applying default order");
            }
            for entry in defaults {
                match self.get(&entry.name) {
                    Some(rule) => applied.extend(rule.apply(query, entry.direction, true)),
                    None => {
                        tracing::debug!(rule = %entry.name, "default order names an undeclared rule")
                    }
                }
            }
        } else {
            for token in recognized {
                if let Some(rule) = self.get(&token.field) {
                    applied.extend(rule.apply(query, token.direction, false));
                }
            }
        }
        applied
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name == name)
    }
}
