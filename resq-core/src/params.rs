use std::collections::BTreeMap;

use resq_data::FilterValue;

use crate::filter::FilterInput;

/// Name of the body/query field that tunnels the intended HTTP verb through POST.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

/// Deepest bracket nesting accepted in a parameter key. Deeper keys are dropped.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parsed request parameters as a tree of [`FilterValue`]s.
///
/// Keys use bracket nesting the way HTML forms and the JS client encode them:
/// `filters[status]=active`, `filters[tags][]=a`, `filters[tags][1]=b`.
/// Maps whose keys are all indexes become lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    values: BTreeMap<String, FilterValue>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL-encoded query string or form body.
    pub fn from_query_string(query: &str) -> Self {
        Self::from_pairs(
            form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Build from already-decoded `(key, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = BTreeMap::new();
        for (key, value) in pairs {
            let Some((root, path)) = split_key(key.as_ref()) else {
                continue;
            };
            let leaf = FilterValue::String(value.into());
            if path.is_empty() {
                values.insert(root, leaf);
            } else {
                let slot = values.entry(root).or_insert_with(empty_map);
                insert_path(slot, &path, leaf);
            }
        }
        for value in values.values_mut() {
            normalize(value);
        }
        Self { values }
    }

    /// Build from a JSON body. Anything but an object yields no parameters.
    pub fn from_json(body: serde_json::Value) -> Self {
        match body {
            serde_json::Value::Object(map) => Self {
                values: map
                    .into_iter()
                    .map(|(k, v)| (k, FilterValue::from(v)))
                    .collect(),
            },
            _ => Self::default(),
        }
    }

    /// Overlay `other` on top of `self`; keys present in `other` win.
    pub fn merge(&mut self, other: RequestParams) {
        self.values.extend(other.values);
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The verb carried in `_method`, uppercased.
    pub fn method_override(&self) -> Option<String> {
        self.values
            .get(METHOD_OVERRIDE_FIELD)
            .and_then(FilterValue::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_uppercase)
    }

    /// The filter input map: the map under `root`, or the whole tree when no
    /// root is configured. A non-map value under `root` yields no filters.
    pub fn filter_input(&self, root: Option<&str>) -> FilterInput {
        match root {
            Some(root) => self
                .values
                .get(root)
                .and_then(FilterValue::as_map)
                .cloned()
                .unwrap_or_default(),
            None => self.values.clone(),
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, FilterValue> {
        self.values
    }
}

impl From<BTreeMap<String, FilterValue>> for RequestParams {
    fn from(values: BTreeMap<String, FilterValue>) -> Self {
        Self { values }
    }
}

fn empty_map() -> FilterValue {
    FilterValue::Map(BTreeMap::new())
}

/// Split `a[b][]` into `("a", ["b", ""])`. Returns `None` for an empty root
/// or for a key nested deeper than [`MAX_NESTING_DEPTH`].
fn split_key(key: &str) -> Option<(String, Vec<String>)> {
    let (root, mut rest) = match key.find('[') {
        Some(idx) if idx > 0 => (&key[..idx], &key[idx..]),
        Some(_) => return None,
        None => return (!key.is_empty()).then(|| (key.to_string(), Vec::new())),
    };
    let mut path = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(end) = inner.find(']') else {
            break;
        };
        if path.len() == MAX_NESTING_DEPTH {
            tracing::debug!(root, "parameter nested too deeply, dropped");
            return None;
        }
        path.push(inner[..end].to_string());
        rest = &inner[end + 1..];
    }
    if path.is_empty() {
        // Unbalanced brackets: keep the key verbatim.
        return Some((key.to_string(), Vec::new()));
    }
    Some((root.to_string(), path))
}

fn insert_path(slot: &mut FilterValue, path: &[String], leaf: FilterValue) {
    if !matches!(slot, FilterValue::Map(_)) {
        *slot = empty_map();
    }
    let FilterValue::Map(map) = slot else {
        return;
    };
    let (head, tail) = match path.split_first() {
        Some(split) => split,
        None => return,
    };
    let key = if head.is_empty() {
        // No index left past `usize::MAX`: the value is dropped.
        let Some(index) = next_index(map) else {
            return;
        };
        index.to_string()
    } else {
        head.clone()
    };
    if tail.is_empty() {
        map.insert(key, leaf);
    } else {
        let child = map.entry(key).or_insert_with(empty_map);
        insert_path(child, tail, leaf);
    }
}

fn next_index(map: &BTreeMap<String, FilterValue>) -> Option<usize> {
    match map.keys().filter_map(|k| k.parse::<usize>().ok()).max() {
        Some(highest) => highest.checked_add(1),
        None => Some(0),
    }
}

/// Turn maps keyed only by indexes into lists, recursively.
fn normalize(value: &mut FilterValue) {
    if let FilterValue::Map(map) = value {
        for child in map.values_mut() {
            normalize(child);
        }
        let indexed = !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok());
        if indexed {
            let mut entries: Vec<(usize, FilterValue)> = std::mem::take(map)
                .into_iter()
                .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                .collect();
            entries.sort_by_key(|(i, _)| *i);
            *value = FilterValue::List(entries.into_iter().map(|(_, v)| v).collect());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_key_handles_brackets() {
        assert_eq!(split_key("page"), Some(("page".into(), vec![])));
        assert_eq!(
            split_key("filters[tags][]"),
            Some(("filters".into(), vec!["tags".into(), "".into()]))
        );
        assert_eq!(split_key("[x]"), None);
        assert_eq!(split_key("a[b"), Some(("a[b".into(), vec![])));
    }

    #[test]
    fn split_key_stops_at_the_nesting_limit() {
        let at_limit = format!("f{}", "[a]".repeat(MAX_NESTING_DEPTH));
        assert_eq!(split_key(&at_limit).map(|(_, p)| p.len()), Some(MAX_NESTING_DEPTH));

        let too_deep = format!("f{}", "[a]".repeat(MAX_NESTING_DEPTH + 1));
        assert_eq!(split_key(&too_deep), None);
    }

    #[test]
    fn next_index_refuses_to_overflow() {
        let mut map = BTreeMap::new();
        assert_eq!(next_index(&map), Some(0));
        map.insert("4".to_string(), FilterValue::from("x"));
        assert_eq!(next_index(&map), Some(5));
        map.insert(usize::MAX.to_string(), FilterValue::from("y"));
        assert_eq!(next_index(&map), None);
    }

    #[test]
    fn append_segments_pick_next_index() {
        let params = RequestParams::from_query_string("t[]=a&t[]=b&t[5]=c&t[]=d");
        assert_eq!(
            params.get("t"),
            Some(&FilterValue::from(vec!["a", "b", "c", "d"]))
        );
    }
}
