//! Route parameters and the query codec
//!
//! The route name travels inside the location's query string (for example
//! `?route=%2Fusers%2F42&tab=posts`), so the codec here is what turns a
//! location into something the matcher can work with and back.
//!
//! - [`RouteParams`] holds values captured from `:name` segments.
//! - [`QueryParams`] is the parsed query map and its canonical serialization.

use std::collections::{BTreeMap, HashMap};

/// Route parameters extracted from dynamic segments
///
/// # Example
///
/// ```
/// use query_navigator::RouteParams;
///
/// // Pattern: /users/:id
/// // Route name: /users/123
/// let mut params = RouteParams::new();
/// params.insert("id".to_string(), "123".to_string());
///
/// assert_eq!(params.get("id"), Some(&"123".to_string()));
/// assert_eq!(params.get_as::<i32>("id"), Some(123));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create new empty route params
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter value as a string
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Insert a parameter
    pub fn insert(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query map of the current location
///
/// Keys are kept sorted, which makes [`QueryParams::to_query_string`] canonical:
/// two maps with the same content always serialize to the same string. A key
/// holds a single value; when a query string repeats a key the last value wins.
///
/// # Example
///
/// ```
/// use query_navigator::QueryParams;
///
/// let query = QueryParams::from_query_string("?route=%2Fabout&id=7");
///
/// assert_eq!(query.get("route"), Some("/about"));
/// assert_eq!(query.get_as::<u32>("id"), Some(7));
/// assert_eq!(query.to_query_string(), "id=7&route=%2Fabout");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    /// Create new empty query params
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without its leading `?`
    ///
    /// Empty pairs are skipped, `+` decodes to a space and a key without `=`
    /// maps to the empty string.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = BTreeMap::new();

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            if key.is_empty() {
                continue;
            }
            params.insert(key, decode_component(value));
        }

        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a value parsed as `T`
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Insert a value, replacing any previous value for `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.params.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Copy every entry of `overrides` into `self`; on collision the override wins
    pub fn merge(&mut self, overrides: &QueryParams) {
        for (key, value) in &overrides.params {
            self.params.insert(key.clone(), value.clone());
        }
    }

    /// Serialize to the canonical query string (no leading `?`)
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Split a navigation target into its base route name and the query it carries
///
/// A `#fragment` is dropped. Everything before the first `?` is the route name.
///
/// ```
/// use query_navigator::params::split_target;
///
/// let (name, query) = split_target("/users/42?tab=posts#top");
/// assert_eq!(name, "/users/42");
/// assert_eq!(query.get("tab"), Some("posts"));
/// ```
pub fn split_target(target: &str) -> (&str, QueryParams) {
    let target = target.split_once('#').map_or(target, |(head, _)| head);

    match target.split_once('?') {
        Some((name, query)) => (name, QueryParams::from_query_string(query)),
        None => (target, QueryParams::new()),
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        // Malformed escapes are kept verbatim
        Err(_) => spaced,
    }
}
