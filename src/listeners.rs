//! Navigation listeners
//!
//! Listeners are called synchronously, in subscription order, after every
//! dispatch cycle with the final [`RouteContext`]. A panicking listener is not
//! caught: it unwinds into the caller of the navigation.

use crate::context::RouteContext;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Callback invoked after each dispatch cycle
pub type Listener = Arc<dyn Fn(&RouteContext) + Send + Sync>;

/// Handle returned by [`ListenerBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Insertion-ordered list of listeners
#[derive(Default)]
pub struct ListenerBus {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ListenerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener
    pub fn subscribe<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&RouteContext) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove one listener; returns whether it was subscribed
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Call every listener in subscription order
    ///
    /// The list is copied first, so a listener may subscribe or clear without
    /// deadlocking; such changes apply from the next notification.
    pub fn notify(&self, ctx: &RouteContext) {
        let listeners: Vec<Listener> = self
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(ctx);
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ListenerBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerBus")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QueryParams;

    fn ctx(path: &str) -> RouteContext {
        RouteContext::new(path, QueryParams::new())
    }

    #[test]
    fn test_notify_in_subscription_order() {
        let bus = ListenerBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let calls = calls.clone();
            bus.subscribe(move |ctx| calls.lock().unwrap().push(format!("{}:{}", tag, ctx.path)));
        }

        bus.notify(&ctx("/a"));

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first:/a", "second:/a", "third:/a"]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let bus = ListenerBus::new();
        let id = bus.subscribe(|_| {});
        bus.subscribe(|_| {});

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_clear() {
        let bus = ListenerBus::new();
        bus.subscribe(|_| {});
        bus.subscribe(|_| {});

        bus.clear();
        assert!(bus.is_empty());
    }

    #[test]
    fn test_panicking_listener_propagates() {
        let bus = ListenerBus::new();
        bus.subscribe(|_| panic!("listener bug"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bus.notify(&ctx("/a"));
        }));

        assert!(result.is_err());
        // The bus stays usable
        bus.clear();
        assert!(bus.is_empty());
    }

    #[test]
    fn test_listener_can_clear_during_notify() {
        let bus = Arc::new(ListenerBus::new());
        let inner = bus.clone();
        bus.subscribe(move |_| inner.clear());

        bus.notify(&ctx("/a"));
        assert!(bus.is_empty());
    }
}
