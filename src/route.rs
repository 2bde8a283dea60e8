//! Route table, route entries and handlers
//!
//! The table keeps static and dynamic routes apart. A static route name is
//! looked up by exact string equality first; only when that fails are the
//! dynamic patterns tried, in registration order, and the first one that
//! accepts the name wins.

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, RouteCache};
use crate::context::RouteContext;
use crate::debug_log;
use crate::error::{BoxError, NavigationError};
use crate::matcher::RoutePattern;
use crate::middleware::BoxedMiddleware;
use crate::params::RouteParams;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
#[cfg(feature = "cache")]
use std::sync::{Mutex, PoisonError};

// ============================================================================
// Handlers
// ============================================================================

/// Result produced by a route handler
pub type HandlerResult = Result<(), BoxError>;

/// The code that runs once a route is resolved and its middlewares passed.
///
/// Handlers usually hand the context over to a renderer. An `Err` (or a
/// panic) ends the cycle with a 500-class outcome.
pub trait RouteHandler: Send + Sync + 'static {
    fn handle<'a>(&'a self, ctx: &'a mut RouteContext) -> BoxFuture<'a, HandlerResult>;
}

/// Create a handler from a closure
///
/// ```
/// use query_navigator::handler_fn;
///
/// let handler = handler_fn(|ctx| {
///     let id = ctx.params.get("id").cloned();
///     async move {
///         println!("render user {:?}", id);
///         Ok(())
///     }
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(&mut RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler { f }
}

/// Handler created from a closure
pub struct FnHandler<F> {
    f: F,
}

impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(&mut RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle<'a>(&'a self, ctx: &'a mut RouteContext) -> BoxFuture<'a, HandlerResult> {
        (self.f)(ctx).boxed()
    }
}

// ============================================================================
// Route Validation
// ============================================================================

/// Validate a route pattern
///
/// # Validation Rules
///
/// - Pattern must not be empty
/// - No consecutive slashes (`//`)
/// - Parameter names must be non-empty and contain only alphanumerics or `_`
/// - No duplicate parameter names
pub fn validate_route_pattern(pattern: &str) -> Result<(), String> {
    if pattern.is_empty() {
        return Err("route pattern cannot be empty".to_string());
    }

    if pattern.contains("//") {
        return Err("route pattern cannot contain consecutive slashes".to_string());
    }

    let mut param_names = HashSet::new();
    for segment in pattern.split('/') {
        if let Some(param) = segment.strip_prefix(':') {
            if param.is_empty() {
                return Err("route parameter name cannot be empty".to_string());
            }

            if !param.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(format!(
                    "route parameter '{}' must contain only alphanumeric characters and underscores",
                    param
                ));
            }

            if !param_names.insert(param) {
                return Err(format!("duplicate route parameter: '{}'", param));
            }
        }
    }

    Ok(())
}

// ============================================================================
// RouteEntry
// ============================================================================

/// A registered route
pub struct RouteEntry {
    pattern: String,
    handler: Box<dyn RouteHandler>,
    middlewares: Vec<BoxedMiddleware>,
    matcher: Option<RoutePattern>,
}

impl RouteEntry {
    fn new(
        pattern: String,
        handler: Box<dyn RouteHandler>,
        middlewares: Vec<BoxedMiddleware>,
    ) -> Self {
        let matcher = RoutePattern::is_dynamic_source(&pattern)
            .then(|| RoutePattern::compile(&pattern));
        Self {
            pattern,
            handler,
            middlewares,
            matcher,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_dynamic(&self) -> bool {
        self.matcher.is_some()
    }

    /// Compiled matcher, present for dynamic routes only
    pub fn matcher(&self) -> Option<&RoutePattern> {
        self.matcher.as_ref()
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }

    pub fn middlewares(&self) -> &[BoxedMiddleware] {
        &self.middlewares
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern)
            .field("is_dynamic", &self.is_dynamic())
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// A route name resolved to its entry
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub entry: Arc<RouteEntry>,
    pub params: RouteParams,
}

impl ResolvedRoute {
    /// Pattern that matched
    pub fn pattern(&self) -> &str {
        self.entry.pattern()
    }
}

// ============================================================================
// RouteTable
// ============================================================================

/// Registered routes, split into exact-match and pattern-match sets
#[derive(Debug, Default)]
pub struct RouteTable {
    static_routes: HashMap<String, Arc<RouteEntry>>,
    /// Registration order is the match order
    dynamic_routes: Vec<Arc<RouteEntry>>,
    #[cfg(feature = "cache")]
    cache: Mutex<RouteCache>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table whose resolution cache holds `capacity` names
    #[cfg(feature = "cache")]
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(RouteCache::with_capacity(capacity)),
            ..Self::default()
        }
    }

    /// Register `handler` under `pattern`
    ///
    /// Registering a pattern again replaces the previous entry; a dynamic
    /// pattern keeps its original position in the match order.
    pub fn register<H>(
        &mut self,
        pattern: impl Into<String>,
        handler: H,
        middlewares: Vec<BoxedMiddleware>,
    ) -> Result<(), NavigationError>
    where
        H: RouteHandler,
    {
        let pattern = pattern.into();
        if let Err(reason) = validate_route_pattern(&pattern) {
            return Err(NavigationError::InvalidRegistration { pattern, reason });
        }

        let entry = Arc::new(RouteEntry::new(pattern.clone(), Box::new(handler), middlewares));
        debug_log!(
            "Registering {} route '{}'",
            if entry.is_dynamic() { "dynamic" } else { "static" },
            pattern
        );

        if entry.is_dynamic() {
            match self
                .dynamic_routes
                .iter_mut()
                .find(|existing| existing.pattern == pattern)
            {
                Some(existing) => *existing = entry,
                None => self.dynamic_routes.push(entry),
            }
        } else {
            self.static_routes.insert(pattern, entry);
        }

        #[cfg(feature = "cache")]
        self.cache_mut().clear();

        Ok(())
    }

    /// Resolve a route name to its entry and captured parameters
    pub fn resolve(&self, name: &str) -> Option<ResolvedRoute> {
        if let Some(entry) = self.static_routes.get(name) {
            return Some(ResolvedRoute {
                entry: entry.clone(),
                params: RouteParams::new(),
            });
        }

        #[cfg(feature = "cache")]
        {
            let cached = self
                .cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name);
            if let Some(cached) = cached {
                if let Some(entry) = self.dynamic_routes.get(cached.index) {
                    return Some(ResolvedRoute {
                        entry: entry.clone(),
                        params: cached.params,
                    });
                }
            }
        }

        let (index, entry, params) =
            self.dynamic_routes
                .iter()
                .enumerate()
                .find_map(|(index, entry)| {
                    let params = entry.matcher.as_ref()?.matches(name)?;
                    Some((index, entry, params))
                })?;

        #[cfg(feature = "cache")]
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), index, params.clone());
        #[cfg(not(feature = "cache"))]
        let _ = index;

        Some(ResolvedRoute {
            entry: entry.clone(),
            params,
        })
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.static_routes.contains_key(pattern)
            || self
                .dynamic_routes
                .iter()
                .any(|entry| entry.pattern == pattern)
    }

    pub fn len(&self) -> usize {
        self.static_routes.len() + self.dynamic_routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dynamic patterns in match order
    pub fn dynamic_patterns(&self) -> impl Iterator<Item = &str> {
        self.dynamic_routes.iter().map(|entry| entry.pattern())
    }

    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
            .clone()
    }

    #[cfg(feature = "cache")]
    fn cache_mut(&mut self) -> &mut RouteCache {
        self.cache.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{middleware_fn, RouteMiddleware, Verdict};
    use crate::params::QueryParams;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> impl RouteHandler {
        handler_fn(|_ctx| async { Ok(()) })
    }

    fn counting(counter: &Arc<AtomicUsize>) -> impl RouteHandler {
        let counter = counter.clone();
        handler_fn(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
    }

    #[test]
    fn test_validate_route_pattern() {
        assert!(validate_route_pattern("/").is_ok());
        assert!(validate_route_pattern("/users/:id").is_ok());
        assert!(validate_route_pattern("/users/:user_id/posts/:postId").is_ok());

        assert!(validate_route_pattern("").is_err());
        assert!(validate_route_pattern("/users//posts").is_err());
        assert!(validate_route_pattern("/users/:").is_err());
        assert!(validate_route_pattern("/users/:id-x").is_err());
        assert!(validate_route_pattern("/a/:id/b/:id").is_err());
    }

    #[test]
    fn test_invalid_registration() {
        let mut table = RouteTable::new();
        let err = table.register("/a/:", noop(), Vec::new()).unwrap_err();

        assert!(matches!(err, NavigationError::InvalidRegistration { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_static_resolution() {
        let mut table = RouteTable::new();
        table.register("/about", noop(), Vec::new()).unwrap();

        let resolved = table.resolve("/about").expect("registered");
        assert_eq!(resolved.pattern(), "/about");
        assert!(!resolved.entry.is_dynamic());
        assert!(resolved.params.is_empty());

        assert!(table.resolve("/about/").is_none());
        assert!(table.resolve("/missing").is_none());
    }

    #[test]
    fn test_reregistration_replaces_static_entry() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut table = RouteTable::new();
        table.register("/about", counting(&first), Vec::new()).unwrap();
        table.register("/about", counting(&second), Vec::new()).unwrap();
        assert_eq!(table.len(), 1);

        let resolved = table.resolve("/about").unwrap();
        let mut ctx = RouteContext::new("/about", QueryParams::new());
        pollster::block_on(resolved.entry.handler().handle(&mut ctx)).unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_registered_dynamic_pattern_wins() {
        let mut table = RouteTable::new();
        table.register("/about/:id", noop(), Vec::new()).unwrap();
        table.register("/about/:slug", noop(), Vec::new()).unwrap();

        let resolved = table.resolve("/about/42").expect("matches");
        assert_eq!(resolved.pattern(), "/about/:id");
        assert_eq!(resolved.params.get("id"), Some(&"42".to_string()));
        assert!(!resolved.params.contains("slug"));
    }

    #[test]
    fn test_static_beats_dynamic() {
        let mut table = RouteTable::new();
        table.register("/about/:id", noop(), Vec::new()).unwrap();
        table.register("/about/team", noop(), Vec::new()).unwrap();

        assert_eq!(table.resolve("/about/team").unwrap().pattern(), "/about/team");
        assert_eq!(table.resolve("/about/7").unwrap().pattern(), "/about/:id");
    }

    #[test]
    fn test_dynamic_reregistration_keeps_position() {
        let mut table = RouteTable::new();
        table.register("/a/:x", noop(), Vec::new()).unwrap();
        table.register("/a/:y", noop(), Vec::new()).unwrap();
        table
            .register(
                "/a/:x",
                noop(),
                vec![middleware_fn(|_ctx| async { Ok(Verdict::Allow) }).boxed()],
            )
            .unwrap();

        assert_eq!(table.dynamic_patterns().collect::<Vec<_>>(), vec!["/a/:x", "/a/:y"]);
        let resolved = table.resolve("/a/1").unwrap();
        assert_eq!(resolved.pattern(), "/a/:x");
        assert_eq!(resolved.entry.middlewares().len(), 1);
    }

    #[test]
    fn test_entry_caches_compiled_matcher() {
        let mut table = RouteTable::new();
        table.register("/users/:id", noop(), Vec::new()).unwrap();

        let resolved = table.resolve("/users/1").unwrap();
        let matcher = resolved.entry.matcher().expect("dynamic routes are compiled");
        assert_eq!(matcher.source(), "/users/:id");
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_dynamic_resolution_is_cached() {
        let mut table = RouteTable::new();
        table.register("/users/:id", noop(), Vec::new()).unwrap();
        table.register("/home", noop(), Vec::new()).unwrap();

        table.resolve("/users/1").unwrap();
        let again = table.resolve("/users/1").unwrap();
        assert_eq!(again.params.get("id"), Some(&"1".to_string()));

        // static lookups bypass the cache
        table.resolve("/home").unwrap();

        let stats = table.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_registration_invalidates_cache() {
        let mut table = RouteTable::new();
        table.register("/users/:id", noop(), Vec::new()).unwrap();
        table.resolve("/users/1").unwrap();

        table.register("/users/me", noop(), Vec::new()).unwrap();
        assert_eq!(table.resolve("/users/me").unwrap().pattern(), "/users/me");
        assert_eq!(table.cache_stats().invalidations, 2);
    }
}
