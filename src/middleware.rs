//! Route middleware and the concurrent pipeline
//!
//! Every middleware of a route runs concurrently against the same read-only
//! [`RouteContext`]. The pipeline waits for all of them to settle; it does not
//! short-circuit on the first blocking verdict. Navigation passes only if every
//! middleware allowed it.
//!
//! Middlewares don't write to the context directly. A middleware that wants to
//! attach data returns [`Verdict::Patch`], and the pipeline merges all patches
//! into [`RouteContext::data`] after the join, in registration order, so a
//! later middleware wins a key collision no matter which future finished first.
//!
//! # Example
//!
//! ```
//! use query_navigator::{middleware_fn, RouteMiddleware, Verdict};
//!
//! let auth = middleware_fn(|ctx| {
//!     let signed_in = ctx.query.get("session").is_some();
//!     async move { Ok(Verdict::from(signed_in)) }
//! })
//! .named("auth")
//! .boxed();
//!
//! assert_eq!(auth.name(), "auth");
//! ```

use crate::context::RouteContext;
use crate::error::BoxError;
use crate::{trace_log, warn_log};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// What a middleware decided about a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the navigation proceed
    Allow,
    /// Let it proceed and attach these values to the context
    Patch(HashMap<String, String>),
    /// Block the navigation
    Block,
}

impl Verdict {
    /// Allow with a single attached value
    pub fn patch(key: impl Into<String>, value: impl Into<String>) -> Self {
        Verdict::Patch(HashMap::from([(key.into(), value.into())]))
    }

    pub fn allows(&self) -> bool {
        !matches!(self, Verdict::Block)
    }
}

impl From<bool> for Verdict {
    fn from(allow: bool) -> Self {
        if allow {
            Verdict::Allow
        } else {
            Verdict::Block
        }
    }
}

/// Result produced by a middleware
pub type MiddlewareResult = Result<Verdict, BoxError>;

/// Middleware that decides whether a navigation may reach its handler.
///
/// An `Err` (or a panic) counts as [`Verdict::Block`]; it is logged and does
/// not affect sibling middlewares.
pub trait RouteMiddleware: Send + Sync + 'static {
    /// Inspect the request and produce a verdict
    fn handle<'a>(&'a self, ctx: &'a RouteContext) -> BoxFuture<'a, MiddlewareResult>;

    /// Middleware name for logs
    fn name(&self) -> &str {
        "RouteMiddleware"
    }

    /// Erase the concrete type
    fn boxed(self) -> BoxedMiddleware
    where
        Self: Sized,
    {
        Box::new(self)
    }
}

/// Type-erased middleware for dynamic dispatch
pub type BoxedMiddleware = Box<dyn RouteMiddleware>;

/// Create middleware from a closure
///
/// The closure borrows the context synchronously and returns an owned future,
/// so copy what the future needs out of `ctx` first.
pub fn middleware_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(&RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    FnMiddleware {
        f,
        name: "middleware_fn".to_string(),
    }
}

/// Middleware created from a closure
pub struct FnMiddleware<F> {
    f: F,
    name: String,
}

impl<F> FnMiddleware<F> {
    /// Give the middleware a name for logs
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F, Fut> RouteMiddleware for FnMiddleware<F>
where
    F: Fn(&RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    fn handle<'a>(&'a self, ctx: &'a RouteContext) -> BoxFuture<'a, MiddlewareResult> {
        (self.f)(ctx).boxed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Aggregated result of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Number of middlewares that blocked, failed or panicked
    pub blocked: usize,
    /// Patches merged in registration order
    pub data: HashMap<String, String>,
}

impl PipelineOutcome {
    pub fn passed(&self) -> bool {
        self.blocked == 0
    }
}

/// Run every middleware concurrently and wait for all of them.
///
/// An empty middleware list passes.
pub async fn run_pipeline(middlewares: &[BoxedMiddleware], ctx: &RouteContext) -> PipelineOutcome {
    let runs = middlewares.iter().map(|middleware| {
        // The closure's synchronous part runs on first poll, inside the unwind boundary
        AssertUnwindSafe(async move { middleware.handle(ctx).await })
            .catch_unwind()
            .map(move |settled| (middleware.name(), settled))
    });

    let mut outcome = PipelineOutcome::default();
    for (name, settled) in join_all(runs).await {
        match settled {
            Ok(Ok(Verdict::Allow)) => {}
            Ok(Ok(Verdict::Patch(patch))) => outcome.data.extend(patch),
            Ok(Ok(Verdict::Block)) => {
                trace_log!("middleware '{}' blocked '{}'", name, ctx.path);
                outcome.blocked += 1;
            }
            Ok(Err(err)) => {
                warn_log!("middleware '{}' failed on '{}': {}", name, ctx.path, err);
                outcome.blocked += 1;
            }
            Err(_) => {
                warn_log!("middleware '{}' panicked on '{}'", name, ctx.path);
                outcome.blocked += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QueryParams;
    use futures::channel::oneshot;
    use std::sync::{Arc, Mutex};

    fn allow() -> BoxedMiddleware {
        middleware_fn(|_ctx| async { Ok(Verdict::Allow) }).boxed()
    }

    fn block() -> BoxedMiddleware {
        middleware_fn(|_ctx| async { Ok(Verdict::Block) }).boxed()
    }

    fn ctx() -> RouteContext {
        RouteContext::new("/test", QueryParams::new())
    }

    #[test]
    fn test_empty_pipeline_passes() {
        let outcome = pollster::block_on(run_pipeline(&[], &ctx()));
        assert!(outcome.passed());
    }

    #[test]
    fn test_all_allow_passes() {
        let outcome = pollster::block_on(run_pipeline(&[allow(), allow()], &ctx()));
        assert!(outcome.passed());
    }

    #[test]
    fn test_true_and_false_fails() {
        let outcome = pollster::block_on(run_pipeline(&[allow(), block()], &ctx()));
        assert!(!outcome.passed());
        assert_eq!(outcome.blocked, 1);
    }

    #[test]
    fn test_error_is_blocking_and_siblings_still_run() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let log = calls.clone();
        let failing = middleware_fn(|_ctx| async { Err::<Verdict, BoxError>("db down".into()) })
            .named("failing")
            .boxed();
        let recording = middleware_fn(move |ctx| {
            log.lock().unwrap().push(ctx.path.clone());
            async { Ok(Verdict::Allow) }
        })
        .boxed();

        let outcome = pollster::block_on(run_pipeline(&[failing, recording], &ctx()));

        assert!(!outcome.passed());
        assert_eq!(*calls.lock().unwrap(), vec!["/test".to_string()]);
    }

    #[test]
    fn test_panic_is_blocking() {
        let panicking = middleware_fn(|ctx| {
            let path = ctx.path.clone();
            async move {
                if path == "/test" {
                    panic!("middleware bug");
                }
                Ok(Verdict::Allow)
            }
        })
        .boxed();

        let outcome = pollster::block_on(run_pipeline(&[allow(), panicking], &ctx()));
        assert_eq!(outcome.blocked, 1);
    }

    #[test]
    fn test_middlewares_run_concurrently() {
        // The first middleware can only finish once the second one has started.
        let (tx, rx) = oneshot::channel::<()>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        let tx = Arc::new(Mutex::new(Some(tx)));

        let waiting = middleware_fn(move |_ctx| {
            let rx = rx.lock().unwrap().take();
            async move {
                match rx {
                    Some(rx) => Ok(Verdict::from(rx.await.is_ok())),
                    None => Ok(Verdict::Block),
                }
            }
        })
        .boxed();
        let signalling = middleware_fn(move |_ctx| {
            let tx = tx.lock().unwrap().take();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(());
                }
                Ok(Verdict::Allow)
            }
        })
        .boxed();

        let outcome = pollster::block_on(run_pipeline(&[waiting, signalling], &ctx()));
        assert!(outcome.passed());
    }

    #[test]
    fn test_patches_merge_in_registration_order() {
        let first = middleware_fn(|_ctx| async {
            Ok(Verdict::Patch(HashMap::from([
                ("user".to_string(), "ann".to_string()),
                ("role".to_string(), "admin".to_string()),
            ])))
        })
        .boxed();
        let second = middleware_fn(|_ctx| async { Ok(Verdict::patch("user", "bob")) }).boxed();

        let outcome = pollster::block_on(run_pipeline(&[first, second], &ctx()));

        assert!(outcome.passed());
        assert_eq!(outcome.data.get("user"), Some(&"bob".to_string()));
        assert_eq!(outcome.data.get("role"), Some(&"admin".to_string()));
    }

    #[test]
    fn test_verdict_from_bool() {
        assert_eq!(Verdict::from(true), Verdict::Allow);
        assert_eq!(Verdict::from(false), Verdict::Block);
        assert!(Verdict::patch("a", "b").allows());
        assert!(!Verdict::Block.allows());
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(allow().name(), "middleware_fn");
        let named = middleware_fn(|_ctx| async { Ok(Verdict::Allow) }).named("auth");
        assert_eq!(named.name(), "auth");
    }
}
