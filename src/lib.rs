// ── debug-thread ────────────────────────────────────────────────────────────
//
// Execution-thread model for a remote debugging session: pause state,
// parsed scripts, lazy script content and source map resolution, wired to
// a protocol client and a shared source registry.

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod replay;
pub mod source;
pub mod target;
pub mod thread;
pub mod urls;

pub use config::ThreadConfig;
pub use error::{ProtocolError, Result};
pub use protocol::{MemoryProtocol, ProtocolClient, ScriptId};
pub use source::{Source, SourceContainer, SourceRegistry};
pub use target::{StaticTarget, Target};
pub use thread::{
    Thread, ThreadEvent, ThreadId, ThreadNotification, ThreadNotificationKind, ThreadObserver,
};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
