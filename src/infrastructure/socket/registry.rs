use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::ports::{SocketEvent, SocketEventKind, SocketHandler};

/// Inbound handlers keyed by event kind.
///
/// Removal compares `Arc` identity, so a closure that was re-created is never
/// mistaken for the registered one.
#[derive(Default)]
pub struct ListenerRegistry {
    handlers: RwLock<HashMap<SocketEventKind, Vec<SocketHandler>>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: SocketEventKind, handler: SocketHandler) {
        self.handlers.write().entry(kind).or_default().push(handler);
    }

    /// Removes one registration of `handler`. Returns `false` if it was not
    /// registered for `kind`.
    pub fn off(&self, kind: SocketEventKind, handler: &SocketHandler) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            handlers.remove(&kind);
        }
        true
    }

    /// Invokes every handler registered for the event's kind. Handlers run
    /// outside the lock so they may register or remove listeners.
    pub fn dispatch(&self, event: &SocketEvent) -> usize {
        let targets: Vec<SocketHandler> = self
            .handlers
            .read()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        for handler in &targets {
            handler(event.clone());
        }
        targets.len()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.handlers.read().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn count_for(&self, kind: SocketEventKind) -> usize {
        self.handlers.read().get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{PresenceStatus, UserId};
    use crate::domain::ports::StatusChange;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn status_event() -> SocketEvent {
        SocketEvent::UserStatusChanged(StatusChange {
            user_id: UserId::from("bob"),
            status: PresenceStatus::Online,
        })
    }

    fn counting_handler(counter: &Arc<AtomicUsize>) -> SocketHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_dispatch_reaches_matching_kind_only() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        registry.on(SocketEventKind::UserStatusChanged, counting_handler(&hits));
        registry.on(SocketEventKind::MessageReceived, counting_handler(&hits));

        assert_eq!(registry.dispatch(&status_event()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_requires_same_arc() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&hits);
        let lookalike = counting_handler(&hits);
        registry.on(SocketEventKind::UserStatusChanged, Arc::clone(&handler));

        assert!(!registry.off(SocketEventKind::UserStatusChanged, &lookalike));
        assert!(!registry.off(SocketEventKind::UserTyping, &handler));
        assert!(registry.off(SocketEventKind::UserStatusChanged, &handler));

        assert_eq!(registry.count(), 0);
        assert_eq!(registry.dispatch(&status_event()), 0);
    }

    #[test]
    fn test_counts() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for kind in SocketEventKind::ALL {
            registry.on(kind, counting_handler(&hits));
        }

        assert_eq!(registry.count(), 6);
        assert_eq!(registry.count_for(SocketEventKind::UserTyping), 1);
    }
}
