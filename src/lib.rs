//! # Query Navigator
//!
//! The routing core of a single-page client. The route name is carried as one
//! parameter of the location's query (`?route=%2Fusers%2F42&tab=posts`) rather
//! than as the path itself.
//!
//! - **Query Codec** - parse a location query and serialize it canonically
//! - **Route Table & Matcher** - static routes by exact name, dynamic
//!   `:param` routes in registration order, compiled once at registration
//! - **Middleware Pipeline** - all of a route's middlewares run concurrently;
//!   the navigation passes only if every one allows it
//! - **Navigation Controller** - single-flight navigation, audit history and
//!   the dispatch cycle
//! - **State Tracker** - last known lifecycle state per route name
//! - **Listeners** - callbacks after every dispatch cycle
//!
//! # Quick Start
//!
//! ```
//! use query_navigator::*;
//! use std::sync::Arc;
//!
//! let location = Arc::new(MemoryLocation::new());
//! let mut router = Router::new(location.clone());
//!
//! router.route("/", handler_fn(|_ctx| async { Ok(()) })).unwrap();
//! router
//!     .register(
//!         "/users/:id",
//!         handler_fn(|ctx| {
//!             let id = ctx.params.get("id").cloned();
//!             async move {
//!                 println!("render user {:?}", id);
//!                 Ok(())
//!             }
//!         }),
//!         vec![middleware_fn(|ctx| {
//!             let signed_in = ctx.query.get("session").is_some();
//!             async move { Ok(Verdict::from(signed_in)) }
//!         })
//!         .boxed()],
//!     )
//!     .unwrap();
//!
//! router.on_change(|ctx| println!("{} -> {:?}", ctx.path, ctx.status));
//!
//! let result = pollster::block_on(
//!     router.navigate("/users/42", QueryParams::new().with("session", "abc")),
//! );
//! assert!(result.is_success());
//! assert_eq!(router.route_state("/users/42"), RouteState::Success);
//! assert_eq!(location.url(), "/?route=%2Fusers%2F42&session=abc");
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - log through the `log` crate
//! - `tracing` - log through `tracing` instead (mutually exclusive with `log`)
//! - `cache` (default) - LRU cache for dynamic route resolution

#![doc(html_root_url = "https://docs.rs/query-navigator/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

#[cfg(feature = "cache")]
pub mod cache;

// Core routing modules
pub mod matcher;
pub mod middleware;
pub mod params;
pub mod route;

// Navigation
pub mod config;
pub mod context;
pub mod history;
pub mod listeners;
pub mod location;
pub mod router;
pub mod state;

pub mod error;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, RouteCache};
pub use config::RouterConfig;
pub use context::RouteContext;
pub use error::{BoxError, ErrorHandler, ErrorHandlers, NavigationError, NavigationResult};
pub use history::{History, HistoryEntry};
pub use listeners::{Listener, ListenerBus, ListenerId};
pub use location::{LocationProvider, MemoryLocation};
pub use matcher::{RoutePattern, Segment};
pub use middleware::{
    middleware_fn, run_pipeline, BoxedMiddleware, MiddlewareResult, PipelineOutcome,
    RouteMiddleware, Verdict,
};
pub use params::{QueryParams, RouteParams};
pub use route::{
    handler_fn, validate_route_pattern, HandlerResult, ResolvedRoute, RouteEntry, RouteHandler,
    RouteTable,
};
pub use router::Router;
pub use state::{NavigationGuard, RouteState, StateTracker, NOT_FOUND_ROUTE};
