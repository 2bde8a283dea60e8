//! Navigation controller
//!
//! [`Router`] ties the pieces together. A navigation builds the target query,
//! pushes it to the location provider, appends a history entry and then runs a
//! dispatch cycle:
//!
//! 1. resolve the route name (static, then dynamic, then the fallback route)
//! 2. mark the route `Loading` and run its middlewares concurrently
//! 3. run the handler
//! 4. record `Success` or `Error`, call the error page handler for non-200
//!    outcomes and notify listeners
//!
//! Only one cycle runs at a time. A navigation attempted while a cycle is in
//! flight is dropped, not queued, and reports [`NavigationResult::Busy`].

#[cfg(feature = "cache")]
use crate::cache::CacheStats;
use crate::config::RouterConfig;
use crate::context::RouteContext;
use crate::error::{BoxError, ErrorHandlers, NavigationError, NavigationResult};
use crate::history::{History, HistoryEntry};
use crate::listeners::{ListenerBus, ListenerId};
use crate::location::LocationProvider;
use crate::middleware::{run_pipeline, BoxedMiddleware};
use crate::params::{split_target, QueryParams};
use crate::route::{ResolvedRoute, RouteHandler, RouteTable};
use crate::state::{NavigationGuard, RouteState, StateTracker, NOT_FOUND_ROUTE};
use crate::{debug_log, error_log, info_log, trace_log, warn_log};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Single-page navigation router
///
/// Routes are registered through `&mut self` before navigation starts; every
/// navigation method takes `&self`, so overlapping calls share one instance and
/// observe the same navigation lock.
///
/// # Example
///
/// ```
/// use query_navigator::{handler_fn, MemoryLocation, QueryParams, Router};
/// use std::sync::Arc;
///
/// let mut router = Router::new(Arc::new(MemoryLocation::new()));
/// router
///     .route("/about", handler_fn(|_ctx| async { Ok(()) }))
///     .unwrap();
///
/// let result = pollster::block_on(router.navigate("/about", QueryParams::new().with("id", "7")));
/// assert!(result.is_success());
/// assert_eq!(
///     router.current_query(),
///     QueryParams::new().with("route", "/about").with("id", "7")
/// );
/// ```
pub struct Router {
    config: RouterConfig,
    routes: RouteTable,
    states: StateTracker,
    history: Mutex<History>,
    listeners: ListenerBus,
    errors: ErrorHandlers,
    location: Arc<dyn LocationProvider>,
}

impl Router {
    /// Create a router with the default configuration
    pub fn new(location: Arc<dyn LocationProvider>) -> Self {
        Self::with_config(location, RouterConfig::default())
    }

    pub fn with_config(location: Arc<dyn LocationProvider>, config: RouterConfig) -> Self {
        #[cfg(feature = "cache")]
        let routes = RouteTable::with_cache_capacity(config.cache_capacity);
        #[cfg(not(feature = "cache"))]
        let routes = RouteTable::new();

        Self {
            config,
            routes,
            states: StateTracker::new(),
            history: Mutex::new(History::new()),
            listeners: ListenerBus::new(),
            errors: ErrorHandlers::new(),
            location,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register a route with its middlewares
    ///
    /// Fails with [`NavigationError::InvalidRegistration`] when the pattern is
    /// malformed. Registering the same pattern again replaces the entry.
    pub fn register<H>(
        &mut self,
        pattern: impl Into<String>,
        handler: H,
        middlewares: Vec<BoxedMiddleware>,
    ) -> Result<(), NavigationError>
    where
        H: RouteHandler,
    {
        self.routes.register(pattern, handler, middlewares)
    }

    /// Register a route without middlewares
    pub fn route<H>(
        &mut self,
        pattern: impl Into<String>,
        handler: H,
    ) -> Result<(), NavigationError>
    where
        H: RouteHandler,
    {
        self.register(pattern, handler, Vec::new())
    }

    /// Register the error page handler for a status class (400, 404, 500)
    pub fn on_error<F>(&mut self, status: u16, handler: F)
    where
        F: Fn(u16, &RouteContext) + Send + Sync + 'static,
    {
        self.errors.on_status(status, handler);
    }

    /// Show the error page for `status`
    ///
    /// Returns `false` when no handler is registered for it. The dispatch cycle
    /// calls this for every non-200 outcome.
    pub fn error(&self, status: u16, ctx: &RouteContext) -> bool {
        let handled = self.errors.handle(status, ctx);
        if !handled {
            trace_log!("no error page for status {}", status);
        }
        handled
    }

    /// Resolve a route name without dispatching
    pub fn resolve(&self, name: &str) -> Option<ResolvedRoute> {
        self.routes.resolve(name)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Navigate to `target`
    ///
    /// `target` is a route name optionally followed by a query
    /// (`/users/42?tab=posts`); `overrides` win over that query on key
    /// collisions. An empty route name keeps the current route.
    pub async fn navigate(&self, target: &str, overrides: QueryParams) -> NavigationResult {
        let (base, mut query) = split_target(target);
        query.merge(&overrides);

        let route = if base.is_empty() {
            self.route_name(&self.location.query())
        } else {
            base.to_string()
        };
        query.insert(self.config.route_key.clone(), route);

        self.commit(query).await
    }

    /// Navigate to the current route with `overrides` merged onto the current query
    ///
    /// The route name can't be changed this way: a different name in
    /// `overrides` is logged and replaced by the current one. Like `navigate`,
    /// a refresh that leaves the canonical query unchanged is a no-op
    /// ([`NavigationResult::Unchanged`]); use [`Router::dispatch`] to run the
    /// current location again.
    pub async fn refresh(&self, overrides: QueryParams) -> NavigationResult {
        let current = self.location.query();
        let route = self.route_name(&current);

        if let Some(requested) = overrides.get(&self.config.route_key) {
            if requested != route {
                warn_log!(
                    "refresh cannot change the route ('{}' requested, staying on '{}')",
                    requested,
                    route
                );
            }
        }

        let mut query = current;
        query.merge(&overrides);
        query.insert(self.config.route_key.clone(), route);

        self.commit(query).await
    }

    /// Run a dispatch cycle for the location as it is now
    ///
    /// Call this when the location changed from the outside, e.g. after a
    /// back/forward move. It honors the navigation lock like `navigate`.
    pub async fn dispatch(&self) -> NavigationResult {
        let Some(guard) = self.states.try_lock() else {
            debug_log!("dispatch dropped: a navigation is already in flight");
            return NavigationResult::Busy;
        };
        self.run_cycle(guard).await
    }

    async fn commit(&self, query: QueryParams) -> NavigationResult {
        let Some(guard) = self.states.try_lock() else {
            debug_log!(
                "navigation to '{}' dropped: a navigation is already in flight",
                query.get(&self.config.route_key).unwrap_or_default()
            );
            return NavigationResult::Busy;
        };

        let canonical = query.to_query_string();
        if canonical == self.location.query().to_query_string() {
            trace_log!("navigation to '{}' is a no-op", canonical);
            return NavigationResult::Unchanged;
        }

        self.location.set_query(&self.config.url_for(&canonical), true);
        self.history_lock().push(query);

        self.run_cycle(guard).await
    }

    /// One dispatch cycle; the guard is released exactly once when it returns or unwinds
    async fn run_cycle(&self, guard: NavigationGuard<'_>) -> NavigationResult {
        let query = self.location.query();
        let route = self.route_name(&query);
        debug_log!("dispatching '{}'", route);

        let mut ctx = RouteContext::new(route, query);
        let result = self.dispatch_route(&mut ctx).await;
        ctx.status = result.status_code();

        if let Some(status) = ctx.status.filter(|status| *status != 200) {
            self.error(status, &ctx);
        }
        self.listeners.notify(&ctx);

        drop(guard);
        result
    }

    async fn dispatch_route(&self, ctx: &mut RouteContext) -> NavigationResult {
        let route = ctx.path.clone();

        let resolved = match self.routes.resolve(&route) {
            Some(resolved) => resolved,
            None => {
                self.states.set_state(NOT_FOUND_ROUTE, RouteState::Error);
                match self.fallback() {
                    Some(fallback) => {
                        debug_log!("'{}' not found, using '{}'", route, fallback.pattern());
                        fallback
                    }
                    None => {
                        info_log!("no route matches '{}'", route);
                        return NavigationResult::NotFound { route };
                    }
                }
            }
        };

        ctx.pattern = Some(resolved.pattern().to_string());
        ctx.params = resolved.params.clone();
        self.states.set_state(&route, RouteState::Loading);

        let outcome = run_pipeline(resolved.entry.middlewares(), ctx).await;
        if !outcome.passed() {
            info_log!(
                "navigation to '{}' rejected by {} middleware(s)",
                route,
                outcome.blocked
            );
            self.states.set_state(&route, RouteState::Error);
            return NavigationResult::Rejected { route };
        }
        merge_patch(ctx, outcome.data);

        let handled = AssertUnwindSafe(async { resolved.entry.handler().handle(ctx).await })
            .catch_unwind()
            .await;

        let source: BoxError = match handled {
            Ok(Ok(())) => {
                self.states.set_state(&route, RouteState::Success);
                info_log!("navigated to '{}'", route);
                return NavigationResult::Success { route };
            }
            Ok(Err(err)) => err,
            Err(payload) => panic_message(payload.as_ref()).into(),
        };

        self.report_failure(&route, &source);
        self.states.set_state(&route, RouteState::Error);
        NavigationResult::Failed(NavigationError::HandlerFailed { route, source })
    }

    fn fallback(&self) -> Option<ResolvedRoute> {
        let name = self.config.not_found_route.as_deref()?;
        self.routes.resolve(name)
    }

    fn report_failure(&self, route: &str, source: &BoxError) {
        error_log!("handler for '{}' failed: {}", route, source);
    }

    /// Route name carried by `query`, or the configured default
    fn route_name(&self, query: &QueryParams) -> String {
        query
            .get(&self.config.route_key)
            .unwrap_or(self.config.default_route.as_str())
            .to_string()
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    /// Subscribe to finished dispatch cycles
    pub fn on_change<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&RouteContext) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Copy of the navigation audit log
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history_lock().entries().to_vec()
    }

    pub fn current_query(&self) -> QueryParams {
        self.location.query()
    }

    pub fn current_route(&self) -> String {
        self.route_name(&self.location.query())
    }

    pub fn route_state(&self, route: &str) -> RouteState {
        self.states.state(route)
    }

    pub fn route_states(&self) -> HashMap<String, RouteState> {
        self.states.snapshot()
    }

    /// Whether a dispatch cycle holds the navigation lock
    pub fn is_navigating(&self) -> bool {
        self.states.is_navigating()
    }

    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.routes.cache_stats()
    }

    fn history_lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("navigating", &self.is_navigating())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

fn merge_patch(ctx: &mut RouteContext, patch: HashMap<String, String>) {
    ctx.data.extend(patch);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", message)
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::MemoryLocation;
    use crate::route::handler_fn;

    fn router() -> Router {
        let mut router = Router::new(Arc::new(MemoryLocation::new()));
        router.route("/", handler_fn(|_ctx| async { Ok(()) })).unwrap();
        router.route("/about", handler_fn(|_ctx| async { Ok(()) })).unwrap();
        router
    }

    #[test]
    fn test_route_name_defaults() {
        let router = router();
        assert_eq!(router.current_route(), "/");
    }

    #[test]
    fn test_navigate_pushes_canonical_url() {
        let location = Arc::new(MemoryLocation::new());
        let mut router = Router::new(location.clone());
        router.route("/about", handler_fn(|_ctx| async { Ok(()) })).unwrap();

        let overrides = QueryParams::new().with("a", "1");
        let result = pollster::block_on(router.navigate("/about?b=2", overrides));

        assert!(result.is_success());
        assert_eq!(location.url(), "/?a=1&b=2&route=%2Fabout");
        assert_eq!(location.len(), 2);
    }

    #[test]
    fn test_empty_target_keeps_current_route() {
        let router = router();
        pollster::block_on(router.navigate("/about", QueryParams::new()));

        let result = pollster::block_on(router.navigate("?tab=team", QueryParams::new()));

        assert!(result.is_success());
        assert_eq!(router.current_query().get("route"), Some("/about"));
        assert_eq!(router.current_query().get("tab"), Some("team"));
    }

    #[test]
    fn test_route_key_in_overrides_is_stamped_over() {
        let router = router();
        pollster::block_on(router.navigate("/about", QueryParams::new().with("route", "/evil")));
        assert_eq!(router.current_route(), "/about");
    }

    #[test]
    fn test_custom_route_key_and_base_path() {
        let location = Arc::new(MemoryLocation::new());
        let config = RouterConfig::new().route_key("page").base_path("/app");
        let mut router = Router::with_config(location.clone(), config);
        router.route("/home", handler_fn(|_ctx| async { Ok(()) })).unwrap();

        pollster::block_on(router.navigate("/home", QueryParams::new()));

        assert_eq!(location.url(), "/app?page=%2Fhome");
        assert_eq!(router.current_route(), "/home");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "handler panicked: boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "handler panicked: bang");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "handler panicked");
    }
}
