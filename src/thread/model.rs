//! Thread identifier and mutable state.

use crate::protocol::{PausedEvent, ScriptId};
use crate::source::Source;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Process-wide unique identifier for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(pub u64);

impl ThreadId {
    /// Take the next id from the process-wide counter.
    ///
    /// Ids are strictly increasing in allocation order. Threads are created
    /// from the event loop, so allocation order is construction order.
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything about a thread that changes after construction.
#[derive(Debug, Default)]
pub(crate) struct ThreadState {
    pub name: String,
    /// Payload of the last `Debugger.paused`; `None` while running.
    pub paused: Option<PausedEvent>,
    pub scripts: HashMap<ScriptId, Arc<Source>>,
    pub disposed: bool,
}
