//! Per-kind fan-out of pushed protocol events.

use super::{EventHandler, EventKind, ProtocolEvent};
use crate::lock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type SharedHandler = Arc<dyn Fn(&ProtocolEvent) + Send + Sync>;

/// Handle returned by a subscription, used to remove the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Handler table shared by protocol client implementations.
///
/// Handlers run in registration order. The table lock is released before a
/// handler runs, so handlers may subscribe or unsubscribe handlers.
#[derive(Default)]
pub struct EventDispatcher {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<EventKind, Vec<(SubscriptionId, SharedHandler)>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.handlers)
            .entry(kind)
            .or_default()
            .push((id, Arc::from(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was already gone.
    ///
    /// A dispatch already in progress may still call it once.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = lock(&self.handlers);
        for list in handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(existing, _)| *existing == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// Returns the number of handlers that ran.
    pub fn dispatch(&self, event: &ProtocolEvent) -> usize {
        let handlers: Vec<SharedHandler> = lock(&self.handlers)
            .get(&event.kind())
            .map(|list| list.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        lock(&self.handlers).get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = lock(&self.handlers);
        let mut map = f.debug_map();
        for (kind, list) in handlers.iter() {
            map.entry(kind, &list.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_only_matching_kind() {
        let dispatcher = EventDispatcher::new();
        let resumed = Arc::new(AtomicUsize::new(0));
        let counter = resumed.clone();
        dispatcher.subscribe(
            EventKind::Resumed,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(dispatcher.dispatch(&ProtocolEvent::ExecutionContextsCleared), 0);
        assert_eq!(dispatcher.dispatch(&ProtocolEvent::Resumed), 1);
        assert_eq!(resumed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            dispatcher.subscribe(
                EventKind::Resumed,
                Box::new(move |_| order.lock().unwrap().push(i)),
            );
        }

        dispatcher.dispatch(&ProtocolEvent::Resumed);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(dispatcher.handler_count(EventKind::Resumed), 3);
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let inner = dispatcher.clone();
        dispatcher.subscribe(
            EventKind::ExecutionContextsCleared,
            Box::new(move |_| {
                inner.subscribe(EventKind::Resumed, Box::new(|_| {}));
            }),
        );

        dispatcher.dispatch(&ProtocolEvent::ExecutionContextsCleared);
        assert_eq!(dispatcher.handler_count(EventKind::Resumed), 1);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_handler() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let ids: Vec<SubscriptionId> = (0..3)
            .map(|i| {
                let order = order.clone();
                dispatcher.subscribe(
                    EventKind::Resumed,
                    Box::new(move |_| order.lock().unwrap().push(i)),
                )
            })
            .collect();

        assert!(dispatcher.unsubscribe(ids[1]));
        assert!(!dispatcher.unsubscribe(ids[1]));
        assert_eq!(dispatcher.dispatch(&ProtocolEvent::Resumed), 2);
        assert_eq!(*order.lock().unwrap(), vec![0, 2]);
        assert_eq!(dispatcher.handler_count(EventKind::Resumed), 2);
    }
}
