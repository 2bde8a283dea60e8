//! Router configuration

/// Runtime settings of a [`Router`](crate::Router)
///
/// # Example
///
/// ```
/// use query_navigator::RouterConfig;
///
/// let config = RouterConfig::new()
///     .route_key("page")
///     .default_route("/home")
///     .not_found_route("/404");
///
/// assert_eq!(config.route_key, "page");
/// assert_eq!(config.not_found_route.as_deref(), Some("/404"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Query key carrying the route name
    pub route_key: String,
    /// Route name used when the location carries none
    pub default_route: String,
    /// Route dispatched when the requested name doesn't resolve
    pub not_found_route: Option<String>,
    /// Path placed before the query when building URLs for the location provider
    pub base_path: String,
    /// Capacity of the dynamic resolution cache
    #[cfg(feature = "cache")]
    pub cache_capacity: usize,
}

impl RouterConfig {
    pub const DEFAULT_ROUTE_KEY: &'static str = "route";

    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route_key(mut self, key: impl Into<String>) -> Self {
        self.route_key = key.into();
        self
    }

    #[must_use]
    pub fn default_route(mut self, route: impl Into<String>) -> Self {
        self.default_route = route.into();
        self
    }

    #[must_use]
    pub fn not_found_route(mut self, route: impl Into<String>) -> Self {
        self.not_found_route = Some(route.into());
        self
    }

    #[must_use]
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    #[cfg(feature = "cache")]
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Full URL for a canonical query string
    pub fn url_for(&self, query: &str) -> String {
        if query.is_empty() {
            self.base_path.clone()
        } else {
            format!("{}?{}", self.base_path, query)
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            route_key: Self::DEFAULT_ROUTE_KEY.to_string(),
            default_route: "/".to_string(),
            not_found_route: None,
            base_path: "/".to_string(),
            #[cfg(feature = "cache")]
            cache_capacity: crate::cache::RouteCache::DEFAULT_CAPACITY,
        }
    }
}
