//! Route lifecycle state and the navigation lock

use crate::trace_log;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Pseudo-route name recorded when a route name can't be resolved
pub const NOT_FOUND_ROUTE: &str = "not-found";

/// Last known lifecycle state of a route
///
/// Within one dispatch cycle a route moves `Idle -> Loading -> Success | Error`;
/// the value then stays until the next cycle for the same route name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RouteState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl RouteState {
    /// Whether the route is in a terminal state for its last cycle
    pub fn is_settled(self) -> bool {
        matches!(self, RouteState::Success | RouteState::Error)
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RouteState::Idle => "idle",
            RouteState::Loading => "loading",
            RouteState::Success => "success",
            RouteState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Per-route states plus the single-flight navigation lock
#[derive(Debug, Default)]
pub struct StateTracker {
    states: Mutex<HashMap<String, RouteState>>,
    navigating: AtomicBool,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the state of `route`
    pub fn set_state(&self, route: &str, state: RouteState) {
        trace_log!("route '{}' -> {}", route, state);
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route.to_string(), state);
    }

    /// State of `route`, `Idle` if it never ran
    pub fn state(&self, route: &str) -> RouteState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(route)
            .copied()
            .unwrap_or_default()
    }

    /// Copy of every recorded state
    pub fn snapshot(&self) -> HashMap<String, RouteState> {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating.load(Ordering::Acquire)
    }

    /// Take the navigation lock, or `None` if a cycle is already in flight
    ///
    /// The lock is released when the returned guard is dropped.
    pub fn try_lock(&self) -> Option<NavigationGuard<'_>> {
        self.navigating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| NavigationGuard { tracker: self })
    }
}

/// Holds the navigation lock for one dispatch cycle
#[must_use = "the navigation lock is released as soon as the guard is dropped"]
pub struct NavigationGuard<'a> {
    tracker: &'a StateTracker,
}

impl Drop for NavigationGuard<'_> {
    fn drop(&mut self) {
        self.tracker.navigating.store(false, Ordering::Release);
    }
}

impl fmt::Debug for NavigationGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationGuard").finish()
    }
}
