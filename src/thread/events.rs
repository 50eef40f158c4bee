//! Notifications emitted when pause state or name changes.

use super::{Thread, ThreadId};
use crate::lock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// The three things a thread tells its observers about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadNotificationKind {
    NameChanged,
    Paused,
    Resumed,
}

/// A notification delivered synchronously to observers.
///
/// By the time `Paused` is delivered, [`Thread::paused_state`] already
/// returns the new payload.
#[derive(Debug, Clone, Copy)]
pub enum ThreadNotification<'a> {
    NameChanged(&'a Thread),
    Paused(&'a Thread),
    Resumed(&'a Thread),
}

impl<'a> ThreadNotification<'a> {
    pub fn kind(&self) -> ThreadNotificationKind {
        match self {
            Self::NameChanged(_) => ThreadNotificationKind::NameChanged,
            Self::Paused(_) => ThreadNotificationKind::Paused,
            Self::Resumed(_) => ThreadNotificationKind::Resumed,
        }
    }

    pub fn thread(&self) -> &'a Thread {
        match *self {
            Self::NameChanged(thread) | Self::Paused(thread) | Self::Resumed(thread) => thread,
        }
    }
}

/// Receiver of thread notifications.
///
/// Called on the thread that produced the change, with no thread locks held,
/// so observers may read the thread freely.
pub trait ThreadObserver: Send + Sync {
    fn notify(&self, notification: &ThreadNotification<'_>);
}

/// Owned snapshot of a notification, sent to broadcast subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ThreadEvent {
    NameChanged { thread_id: ThreadId, name: String },
    Paused { thread_id: ThreadId, reason: String },
    Resumed { thread_id: ThreadId },
}

impl ThreadEvent {
    pub(crate) fn snapshot(notification: &ThreadNotification<'_>) -> Self {
        let thread = notification.thread();
        let thread_id = thread.id();
        match notification {
            ThreadNotification::NameChanged(_) => Self::NameChanged {
                thread_id,
                name: thread.name(),
            },
            ThreadNotification::Paused(_) => Self::Paused {
                thread_id,
                reason: thread
                    .paused_state()
                    .map(|p| p.reason)
                    .unwrap_or_default(),
            },
            ThreadNotification::Resumed(_) => Self::Resumed { thread_id },
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        match self {
            Self::NameChanged { thread_id, .. } => *thread_id,
            Self::Paused { thread_id, .. } => *thread_id,
            Self::Resumed { thread_id } => *thread_id,
        }
    }

    pub fn kind(&self) -> ThreadNotificationKind {
        match self {
            Self::NameChanged { .. } => ThreadNotificationKind::NameChanged,
            Self::Paused { .. } => ThreadNotificationKind::Paused,
            Self::Resumed { .. } => ThreadNotificationKind::Resumed,
        }
    }
}

/// Handle returned by [`Thread::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers of one thread.
#[derive(Default)]
pub(crate) struct ObserverList {
    next_id: Mutex<u64>,
    observers: Mutex<Vec<(ObserverId, Arc<dyn ThreadObserver>)>>,
}

impl ObserverList {
    pub fn add(&self, observer: Arc<dyn ThreadObserver>) -> ObserverId {
        let id = {
            let mut next = lock(&self.next_id);
            *next += 1;
            ObserverId(*next)
        };
        lock(&self.observers).push((id, observer));
        id
    }

    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = lock(&self.observers);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Call every observer with the list lock released.
    pub fn notify(&self, notification: &ThreadNotification<'_>) {
        let observers: Vec<_> = lock(&self.observers)
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer.notify(notification);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.observers).len()
    }
}
