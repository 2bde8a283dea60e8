//! Location providers
//!
//! The router never owns the location. It reads the current query from a
//! [`LocationProvider`] and asks it to push or replace a URL. When the
//! location changes from the outside (back/forward), the embedding calls
//! [`Router::dispatch`](crate::Router::dispatch) to run a cycle for it.
//!
//! [`MemoryLocation`] is a self-contained provider with a back/forward stack,
//! used for headless embedding and tests.

use crate::params::QueryParams;
use crate::trace_log;
use std::sync::{Mutex, PoisonError};

/// Source of truth for the current navigation target
pub trait LocationProvider: Send + Sync {
    /// Query of the current location
    fn query(&self) -> QueryParams;

    /// Move to `url`, pushing a new entry or replacing the current one
    fn set_query(&self, url: &str, push: bool);
}

#[derive(Debug)]
struct Stack {
    entries: Vec<String>,
    current: usize,
}

/// In-memory location with a browser-like back/forward stack
///
/// ```
/// use query_navigator::{LocationProvider, MemoryLocation};
///
/// let location = MemoryLocation::new();
/// location.set_query("/?route=%2Fa", true);
/// location.set_query("/?route=%2Fb", true);
///
/// assert!(location.back());
/// assert_eq!(location.query().get("route"), Some("/a"));
/// ```
#[derive(Debug)]
pub struct MemoryLocation {
    stack: Mutex<Stack>,
}

impl MemoryLocation {
    /// Start at `/` with an empty query
    pub fn new() -> Self {
        Self::with_url("/")
    }

    /// Start at `url`
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            stack: Mutex::new(Stack {
                entries: vec![url.into()],
                current: 0,
            }),
        }
    }

    /// Current full URL
    pub fn url(&self) -> String {
        let stack = self.lock();
        stack.entries[stack.current].clone()
    }

    /// Go back one entry; `false` at the start of the stack
    pub fn back(&self) -> bool {
        let mut stack = self.lock();
        if stack.current == 0 {
            return false;
        }
        stack.current -= 1;
        trace_log!("location back to '{}'", stack.entries[stack.current]);
        true
    }

    /// Go forward one entry; `false` at the end of the stack
    pub fn forward(&self) -> bool {
        let mut stack = self.lock();
        if stack.current + 1 >= stack.entries.len() {
            return false;
        }
        stack.current += 1;
        trace_log!("location forward to '{}'", stack.entries[stack.current]);
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.lock().current > 0
    }

    pub fn can_go_forward(&self) -> bool {
        let stack = self.lock();
        stack.current + 1 < stack.entries.len()
    }

    /// Number of entries in the stack
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Stack> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationProvider for MemoryLocation {
    fn query(&self) -> QueryParams {
        let url = self.url();
        let without_fragment = url.split_once('#').map_or(url.as_str(), |(head, _)| head);
        match without_fragment.split_once('?') {
            Some((_, query)) => QueryParams::from_query_string(query),
            None => QueryParams::new(),
        }
    }

    fn set_query(&self, url: &str, push: bool) {
        let mut stack = self.lock();
        if push {
            // Pushing drops any forward entries
            let keep = stack.current + 1;
            stack.entries.truncate(keep);
            stack.entries.push(url.to_string());
            stack.current += 1;
        } else {
            let current = stack.current;
            stack.entries[current] = url.to_string();
        }
    }
}
