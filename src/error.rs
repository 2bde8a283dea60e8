//! Error handling for the router
//!
//! Only [`NavigationError::InvalidRegistration`] is ever returned as an `Err`.
//! Every other failure is folded into a [`NavigationResult`] and into the
//! per-route state, so a navigation call never fails from the caller's side.

use crate::context::RouteContext;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by handlers and middlewares
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Navigation Result Types
// ============================================================================

/// Outcome of `navigate`, `refresh` or `dispatch`
#[derive(Debug)]
pub enum NavigationResult {
    /// Handler ran to completion (200)
    Success { route: String },
    /// No route matched and no fallback was usable (404)
    NotFound { route: String },
    /// A middleware blocked the navigation (400)
    Rejected { route: String },
    /// The handler failed (500)
    Failed(NavigationError),
    /// Another dispatch cycle held the navigation lock; the call was dropped
    Busy,
    /// The canonical query equals the current one; nothing happened
    Unchanged,
}

impl NavigationResult {
    /// HTTP-like status class, `None` when no dispatch cycle ran
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NavigationResult::Success { .. } => Some(200),
            NavigationResult::Rejected { .. } => Some(400),
            NavigationResult::NotFound { .. } => Some(404),
            NavigationResult::Failed(_) => Some(500),
            NavigationResult::Busy | NavigationResult::Unchanged => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, NavigationResult::Success { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NavigationResult::NotFound { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, NavigationResult::Rejected { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NavigationResult::Failed(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, NavigationResult::Busy)
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, NavigationResult::Unchanged)
    }

    /// Whether a dispatch cycle actually ran
    pub fn dispatched(&self) -> bool {
        self.status_code().is_some()
    }

    /// The error behind a non-success cycle
    pub fn error(&self) -> Option<NavigationError> {
        match self {
            NavigationResult::NotFound { route } => Some(NavigationError::NotFound {
                route: route.clone(),
            }),
            NavigationResult::Rejected { route } => Some(NavigationError::MiddlewareRejected {
                route: route.clone(),
            }),
            NavigationResult::Failed(error) => Some(error.shallow_clone()),
            _ => None,
        }
    }
}

/// Errors that can occur while registering or dispatching routes
#[derive(Debug, Error)]
pub enum NavigationError {
    /// No route matches and no fallback is configured
    #[error("route not found: {route}")]
    NotFound { route: String },

    /// A middleware returned a blocking verdict or failed
    #[error("navigation to {route} rejected by middleware")]
    MiddlewareRejected { route: String },

    /// The matched handler failed
    #[error("handler for {route} failed: {source}")]
    HandlerFailed {
        route: String,
        #[source]
        source: BoxError,
    },

    /// Bad arguments to `register`
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidRegistration { pattern: String, reason: String },
}

impl NavigationError {
    /// Status class matching this error
    pub fn status_code(&self) -> u16 {
        match self {
            NavigationError::NotFound { .. } => 404,
            NavigationError::MiddlewareRejected { .. }
            | NavigationError::InvalidRegistration { .. } => 400,
            NavigationError::HandlerFailed { .. } => 500,
        }
    }

    /// Clone everything but the boxed source, which is flattened to its message
    fn shallow_clone(&self) -> Self {
        match self {
            NavigationError::NotFound { route } => NavigationError::NotFound {
                route: route.clone(),
            },
            NavigationError::MiddlewareRejected { route } => NavigationError::MiddlewareRejected {
                route: route.clone(),
            },
            NavigationError::HandlerFailed { route, source } => NavigationError::HandlerFailed {
                route: route.clone(),
                source: source.to_string().into(),
            },
            NavigationError::InvalidRegistration { pattern, reason } => {
                NavigationError::InvalidRegistration {
                    pattern: pattern.clone(),
                    reason: reason.clone(),
                }
            }
        }
    }
}

// ============================================================================
// Error Handlers
// ============================================================================

/// Application hook that renders an error page for a status class
pub type ErrorHandler = Arc<dyn Fn(u16, &RouteContext) + Send + Sync>;

/// Error page handlers keyed by status class
#[derive(Clone, Default)]
pub struct ErrorHandlers {
    handlers: HashMap<u16, ErrorHandler>,
}

impl ErrorHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handler for `status`, replacing any previous one
    pub fn on_status<F>(&mut self, status: u16, handler: F)
    where
        F: Fn(u16, &RouteContext) + Send + Sync + 'static,
    {
        self.handlers.insert(status, Arc::new(handler));
    }

    pub fn contains(&self, status: u16) -> bool {
        self.handlers.contains_key(&status)
    }

    /// Run the handler for `status`; returns `false` when none is registered
    pub fn handle(&self, status: u16, ctx: &RouteContext) -> bool {
        match self.handlers.get(&status) {
            Some(handler) => {
                handler(status, ctx);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut statuses: Vec<_> = self.handlers.keys().collect();
        statuses.sort();
        f.debug_struct("ErrorHandlers")
            .field("statuses", &statuses)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
