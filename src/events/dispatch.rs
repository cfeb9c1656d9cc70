//! Priority-ordered shortcut subscriptions.
//!
//! The registry is shared by every control in the process. Each subscriber
//! registers a stable [`HandlerId`] for a [`Shortcut`] at a priority; a key is
//! offered to subscribers from the highest priority down until one consumes
//! it. Among equal priorities the most recent subscriber goes first.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::Shortcut;

/// Priority used by typeahead controls.
pub const TYPEAHEAD_PRIORITY: u8 = 3;

/// Priority used by host-level fallback handlers.
pub const HOST_PRIORITY: u8 = 1;

/// Stable identity of a shortcut handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Debug, Clone)]
struct Subscription {
    shortcut: Shortcut,
    handler: HandlerId,
    priority: u8,
    seq: u64,
}

#[derive(Debug, Default)]
struct RegistryInner {
    subscriptions: Vec<Subscription>,
    next_handler: u64,
    next_seq: u64,
}

/// Shared registry of shortcut subscriptions.
#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ShortcutRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new handler identity.
    pub fn register_handler(&self) -> HandlerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_handler += 1;
        HandlerId(inner.next_handler)
    }

    /// Subscribe `handler` to `shortcut`.
    ///
    /// Subscribing the same pair twice keeps a single subscription with the
    /// latest priority.
    pub fn subscribe(&self, shortcut: Shortcut, handler: HandlerId, priority: u8) {
        let mut inner = self.inner.borrow_mut();
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner
            .subscriptions
            .retain(|s| !(s.shortcut == shortcut && s.handler == handler));
        inner.subscriptions.push(Subscription {
            shortcut,
            handler,
            priority,
            seq,
        });
        trace!(?shortcut, ?handler, priority, "Subscribed shortcut");
    }

    /// Remove one subscription. Returns `true` if it existed.
    pub fn unsubscribe(&self, shortcut: Shortcut, handler: HandlerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscriptions.len();
        inner
            .subscriptions
            .retain(|s| !(s.shortcut == shortcut && s.handler == handler));
        before != inner.subscriptions.len()
    }

    /// Remove every subscription of `handler`. Returns how many were removed.
    pub fn unsubscribe_all(&self, handler: HandlerId) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscriptions.len();
        inner.subscriptions.retain(|s| s.handler != handler);
        before - inner.subscriptions.len()
    }

    /// Get the handlers subscribed to `shortcut`, in dispatch order.
    pub fn subscribers(&self, shortcut: Shortcut) -> Vec<HandlerId> {
        let inner = self.inner.borrow();
        let mut matching: Vec<&Subscription> = inner
            .subscriptions
            .iter()
            .filter(|s| s.shortcut == shortcut)
            .collect();
        matching.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.seq.cmp(&a.seq)));
        matching.into_iter().map(|s| s.handler).collect()
    }

    /// Offer `shortcut` to subscribers in order until `handle` returns `true`.
    ///
    /// The subscriber list is captured before the first call, so handlers may
    /// subscribe or unsubscribe while being dispatched to. Returns the
    /// handler that consumed the shortcut.
    pub fn dispatch<F>(&self, shortcut: Shortcut, mut handle: F) -> Option<HandlerId>
    where
        F: FnMut(HandlerId) -> bool,
    {
        for handler in self.subscribers(shortcut) {
            if handle(handler) {
                trace!(?shortcut, ?handler, "Shortcut consumed");
                return Some(handler);
            }
        }
        None
    }

    /// Get the total number of subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Get the number of subscriptions held by `handler`.
    pub fn handler_subscription_count(&self, handler: HandlerId) -> usize {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .filter(|s| s.handler == handler)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_priority_first() {
        let registry = ShortcutRegistry::new();
        let host = registry.register_handler();
        let control = registry.register_handler();

        registry.subscribe(Shortcut::Tab, control, TYPEAHEAD_PRIORITY);
        registry.subscribe(Shortcut::Tab, host, HOST_PRIORITY);

        assert_eq!(registry.subscribers(Shortcut::Tab), vec![control, host]);
    }

    #[test]
    fn test_equal_priority_latest_first() {
        let registry = ShortcutRegistry::new();
        let first = registry.register_handler();
        let second = registry.register_handler();

        registry.subscribe(Shortcut::Enter, first, TYPEAHEAD_PRIORITY);
        registry.subscribe(Shortcut::Enter, second, TYPEAHEAD_PRIORITY);

        assert_eq!(registry.subscribers(Shortcut::Enter), vec![second, first]);
    }

    #[test]
    fn test_dispatch_stops_at_consumer() {
        let registry = ShortcutRegistry::new();
        let host = registry.register_handler();
        let control = registry.register_handler();
        registry.subscribe(Shortcut::Escape, host, HOST_PRIORITY);
        registry.subscribe(Shortcut::Escape, control, TYPEAHEAD_PRIORITY);

        let mut offered = Vec::new();
        let consumed = registry.dispatch(Shortcut::Escape, |handler| {
            offered.push(handler);
            true
        });

        assert_eq!(consumed, Some(control));
        assert_eq!(offered, vec![control]);
    }

    #[test]
    fn test_dispatch_falls_through_to_lower_priority() {
        let registry = ShortcutRegistry::new();
        let host = registry.register_handler();
        let control = registry.register_handler();
        registry.subscribe(Shortcut::Tab, host, HOST_PRIORITY);
        registry.subscribe(Shortcut::Tab, control, TYPEAHEAD_PRIORITY);

        let consumed = registry.dispatch(Shortcut::Tab, |handler| handler == host);
        assert_eq!(consumed, Some(host));
    }

    #[test]
    fn test_dispatch_unhandled() {
        let registry = ShortcutRegistry::new();
        assert_eq!(registry.dispatch(Shortcut::MoveUp, |_| true), None);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_dispatch() {
        let registry = ShortcutRegistry::new();
        let control = registry.register_handler();
        registry.subscribe(Shortcut::Enter, control, TYPEAHEAD_PRIORITY);

        let consumed = registry.dispatch(Shortcut::Enter, |handler| {
            registry.unsubscribe_all(handler);
            true
        });

        assert_eq!(consumed, Some(control));
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn test_resubscribe_does_not_duplicate() {
        let registry = ShortcutRegistry::new();
        let control = registry.register_handler();
        registry.subscribe(Shortcut::MoveDown, control, TYPEAHEAD_PRIORITY);
        registry.subscribe(Shortcut::MoveDown, control, TYPEAHEAD_PRIORITY);
        assert_eq!(registry.subscription_count(), 1);
    }

    #[test]
    fn test_unsubscribe_is_symmetric() {
        let registry = ShortcutRegistry::new();
        let control = registry.register_handler();
        let other = registry.register_handler();
        for shortcut in Shortcut::ALL {
            registry.subscribe(shortcut, control, TYPEAHEAD_PRIORITY);
        }
        registry.subscribe(Shortcut::Tab, other, HOST_PRIORITY);

        assert!(registry.unsubscribe(Shortcut::Tab, control));
        assert!(!registry.unsubscribe(Shortcut::Tab, control));
        assert_eq!(registry.unsubscribe_all(control), 4);
        assert_eq!(registry.handler_subscription_count(control), 0);
        assert_eq!(registry.handler_subscription_count(other), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ShortcutRegistry::new();
        let shared = registry.clone();
        let control = registry.register_handler();
        shared.subscribe(Shortcut::Escape, control, TYPEAHEAD_PRIORITY);
        assert_eq!(registry.subscribers(Shortcut::Escape), vec![control]);
        assert_ne!(shared.register_handler(), control);
    }
}
