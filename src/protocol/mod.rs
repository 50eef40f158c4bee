//! Remote debugging protocol surface used by a thread.
//!
//! A [`ProtocolClient`] exposes the handful of one-shot commands a thread
//! issues (domain activation, resume, script source retrieval) and push
//! subscriptions for the four events it reacts to. Connection management
//! belongs to whoever implements the trait.

mod dispatcher;
mod events;
mod memory;

pub use dispatcher::{EventDispatcher, SubscriptionId};
pub use events::{EventKind, PausedEvent, ProtocolEvent, ScriptId, ScriptParsedEvent};
pub use memory::{MemoryProtocol, ProtocolCall};

use crate::error::Result;
use async_trait::async_trait;

/// Callback invoked for each pushed event of the subscribed kind.
pub type EventHandler = Box<dyn Fn(&ProtocolEvent) + Send + Sync>;

/// Protocol domains a thread activates during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Execution-context lifecycle.
    Runtime,
    /// Script and pause events.
    Debugger,
}

impl Domain {
    pub fn name(self) -> &'static str {
        match self {
            Self::Runtime => "Runtime",
            Self::Debugger => "Debugger",
        }
    }

    /// Method name of the command that activates this domain.
    pub fn enable_method(self) -> &'static str {
        match self {
            Self::Runtime => "Runtime.enable",
            Self::Debugger => "Debugger.enable",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub const RESUME_METHOD: &str = "Debugger.resume";
pub const GET_SCRIPT_SOURCE_METHOD: &str = "Debugger.getScriptSource";

/// Command and event access to one debugging session.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Activate a protocol domain. Resolves once the remote acknowledges.
    async fn enable(&self, domain: Domain) -> Result<()>;

    /// Ask the debuggee to continue execution.
    async fn resume(&self) -> Result<()>;

    /// Fetch the text of a parsed script.
    async fn get_script_source(&self, script_id: &ScriptId) -> Result<String>;

    /// Register a handler for a push event. It stays registered until
    /// [`unsubscribe`](Self::unsubscribe) is called with the returned id.
    fn subscribe(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId;

    /// Drop a handler registered with [`subscribe`](Self::subscribe).
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
