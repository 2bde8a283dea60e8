//! Per-dispatch request context
//!
//! A [`RouteContext`] is built fresh for every dispatch cycle. Middlewares read
//! it concurrently and hand back patches for [`RouteContext::data`]; the route
//! handler receives it mutably; listeners see the final value.

use crate::params::{QueryParams, RouteParams};
use std::collections::HashMap;

/// Request for one dispatch cycle.
///
/// # Example
///
/// ```
/// use query_navigator::{QueryParams, RouteContext};
///
/// let query = QueryParams::new().with("route", "/about").with("id", "7");
/// let ctx = RouteContext::new("/about", query);
///
/// assert_eq!(ctx.path, "/about");
/// assert_eq!(ctx.query.get("id"), Some("7"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RouteContext {
    /// The requested route name
    pub path: String,

    /// Full query of the location that triggered the cycle
    pub query: QueryParams,

    /// Parameters captured by a dynamic pattern
    pub params: RouteParams,

    /// Pattern the route name resolved to, if any
    pub pattern: Option<String>,

    /// Scratch values attached by middlewares before the handler runs
    pub data: HashMap<String, String>,

    /// Status class of the finished cycle (200, 400, 404 or 500)
    pub status: Option<u16>,
}

impl RouteContext {
    /// Create a context for `path` with the location's query
    pub fn new(path: impl Into<String>, query: QueryParams) -> Self {
        Self {
            path: path.into(),
            query,
            ..Self::default()
        }
    }

    /// Set route parameters
    #[must_use]
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    /// Read a value attached by a middleware
    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Whether the cycle ended in a 200-class outcome
    pub fn succeeded(&self) -> bool {
        self.status == Some(200)
    }
}

impl std::fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteContext")
            .field("path", &self.path)
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = RouteContext::new("/home", QueryParams::new().with("route", "/home"));

        assert_eq!(ctx.path, "/home");
        assert_eq!(ctx.query.get("route"), Some("/home"));
        assert!(ctx.params.is_empty());
        assert!(ctx.pattern.is_none());
        assert!(ctx.status.is_none());
        assert!(!ctx.succeeded());
    }

    #[test]
    fn test_with_params() {
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "9".to_string());

        let ctx = RouteContext::new("/users/9", QueryParams::new()).with_params(params);
        assert_eq!(ctx.params.get_as::<u32>("id"), Some(9));
    }

    #[test]
    fn test_debug_omits_query_and_data() {
        let mut ctx = RouteContext::new("/a", QueryParams::new().with("secret", "x"));
        ctx.data.insert("token".to_string(), "y".to_string());

        let debug = format!("{:?}", ctx);
        assert!(debug.contains("/a"));
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("token"));
    }
}
