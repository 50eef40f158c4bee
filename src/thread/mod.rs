//! Debuggee threads.
//!
//! A [`Thread`] mirrors one execution context of a debugging session:
//! - pause state, taken from `Debugger.paused` / `Debugger.resumed`
//! - the scripts parsed into it, each registered with the target's shared
//!   source container and fetched lazily
//! - source maps, resolved against the target's document URL
//!
//! Changes are reported to [`ThreadObserver`]s and to broadcast subscribers.

mod context;
mod events;
mod model;

pub use context::Thread;
pub use events::{ObserverId, ThreadEvent, ThreadNotification, ThreadNotificationKind, ThreadObserver};
pub use model::ThreadId;
