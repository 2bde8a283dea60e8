//! Compiled route patterns
//!
//! A pattern is a `/`-separated list of segments. A segment written as `:name`
//! captures exactly one non-empty segment of the route name; every other
//! segment must match literally. Patterns are anchored on both ends, so
//! `/about/:id` accepts `/about/42` but neither `/about` nor `/about/42/`.
//!
//! Dynamic patterns are compiled once, when the route is registered, and the
//! compiled form is stored on the route entry.

use crate::params::RouteParams;

/// A single segment in a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that must match exactly
    Static(String),
    /// Parameter that captures one segment
    Param(String),
}

impl Segment {
    /// Parse a segment from string
    ///
    /// - `"users"` -> `Static("users")`
    /// - `":id"` -> `Param("id")`
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Static(s.to_string()),
        }
    }

    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param(_))
    }
}

/// A compiled route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a pattern string
    ///
    /// Compilation never fails; grammar errors such as empty parameter names are
    /// rejected earlier by [`validate_route_pattern`](crate::route::validate_route_pattern).
    pub fn compile(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            segments: pattern.split('/').map(Segment::parse).collect(),
        }
    }

    /// Whether a pattern string contains at least one `:name` segment
    pub fn is_dynamic_source(pattern: &str) -> bool {
        pattern
            .split('/')
            .any(|segment| segment.len() > 1 && segment.starts_with(':'))
    }

    pub fn is_dynamic(&self) -> bool {
        self.segments.iter().any(Segment::is_param)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameters in declaration order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Match a route name against this pattern
    ///
    /// Returns the captured parameters if the whole name matched.
    pub fn matches(&self, name: &str) -> Option<RouteParams> {
        let mut params = RouteParams::new();
        let mut parts = name.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Static(expected) => {
                    if part != expected {
                        return None;
                    }
                }
                Segment::Param(param) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(param.clone(), part.to_string());
                }
            }
        }

        // Anchored: nothing may be left over
        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_parsing() {
        assert_eq!(Segment::parse("users"), Segment::Static("users".to_string()));
        assert_eq!(Segment::parse(":id"), Segment::Param("id".to_string()));
        assert_eq!(Segment::parse(""), Segment::Static(String::new()));
    }

    #[test]
    fn test_is_dynamic_source() {
        assert!(!RoutePattern::is_dynamic_source("/about"));
        assert!(RoutePattern::is_dynamic_source("/about/:id"));
        assert!(RoutePattern::is_dynamic_source(":slug"));
        assert!(!RoutePattern::is_dynamic_source("/time:12"));
    }

    #[test]
    fn test_static_pattern_matching() {
        let pattern = RoutePattern::compile("/users");

        assert!(!pattern.is_dynamic());
        assert!(pattern.matches("/users").is_some());
        assert!(pattern.matches("/posts").is_none());
        assert!(pattern.matches("/users/123").is_none());
    }

    #[test]
    fn test_dynamic_pattern_matching() {
        let pattern = RoutePattern::compile("/users/:id");

        let params = pattern.matches("/users/123").expect("should match");
        assert_eq!(params.get("id"), Some(&"123".to_string()));

        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/users/123/posts").is_none());
    }

    #[test]
    fn test_param_captures_exactly_one_non_empty_segment() {
        let pattern = RoutePattern::compile("/users/:id");

        assert!(pattern.matches("/users/").is_none());
        assert!(pattern.matches("/users/1/").is_none());
        assert!(pattern.matches("users/1").is_none());
    }

    #[test]
    fn test_multiple_params() {
        let pattern = RoutePattern::compile("/api/users/:userId/posts/:postId");

        let params = pattern.matches("/api/users/42/posts/7").expect("should match");
        assert_eq!(params.get("userId"), Some(&"42".to_string()));
        assert_eq!(params.get("postId"), Some(&"7".to_string()));
        assert_eq!(
            pattern.param_names().collect::<Vec<_>>(),
            vec!["userId", "postId"]
        );
    }

    #[test]
    fn test_pattern_without_leading_slash() {
        let pattern = RoutePattern::compile("article/:slug");

        assert!(pattern.matches("article/hello").is_some());
        assert!(pattern.matches("/article/hello").is_none());
    }
}
