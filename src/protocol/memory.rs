//! In-process protocol client.
//!
//! Records every command and subscription in call order, answers
//! `getScriptSource` from a preloaded table, and dispatches events injected
//! through [`MemoryProtocol::emit`]. Backs the replay command and tests.
//! After [`MemoryProtocol::disconnect`] every command fails with
//! [`ProtocolError::Disconnected`], as it would once a socket closes.

use super::{
    Domain, EventDispatcher, EventHandler, EventKind, GET_SCRIPT_SOURCE_METHOD, ProtocolClient,
    ProtocolEvent, RESUME_METHOD, ScriptId, SubscriptionId,
};
use crate::error::{ProtocolError, Result};
use crate::lock;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// One interaction recorded by [`MemoryProtocol`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolCall {
    Subscribe(EventKind),
    Enable(Domain),
    Resume,
    GetScriptSource(ScriptId),
}

#[derive(Debug, Default)]
pub struct MemoryProtocol {
    dispatcher: EventDispatcher,
    calls: Mutex<Vec<ProtocolCall>>,
    sources: Mutex<HashMap<ScriptId, String>>,
    failures: Mutex<HashMap<String, String>>,
    closed: AtomicBool,
}

impl MemoryProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `getScriptSource` answer `source` for `script_id`.
    pub fn set_script_source(&self, script_id: impl Into<ScriptId>, source: impl Into<String>) {
        lock(&self.sources).insert(script_id.into(), source.into());
    }

    /// Make every later call of `method` fail with `message`.
    pub fn fail_command(&self, method: impl Into<String>, message: impl Into<String>) {
        lock(&self.failures).insert(method.into(), message.into());
    }

    /// Close the session. Commands issued afterwards fail with
    /// [`ProtocolError::Disconnected`]; subscriptions stay in place.
    pub fn disconnect(&self) {
        debug!("Memory protocol disconnected");
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Number of live handlers for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.dispatcher.handler_count(kind)
    }

    /// Deliver an event to subscribed handlers. Returns how many ran.
    pub fn emit(&self, event: ProtocolEvent) -> usize {
        trace!(method = event.kind().method(), "Emitting protocol event");
        self.dispatcher.dispatch(&event)
    }

    /// Decode and deliver a raw `{ method, params }` notification.
    pub fn emit_message(&self, method: &str, params: Value) -> Result<usize> {
        Ok(self.emit(ProtocolEvent::from_message(method, params)?))
    }

    /// All recorded interactions, oldest first.
    pub fn calls(&self) -> Vec<ProtocolCall> {
        lock(&self.calls).clone()
    }

    pub fn count_calls(&self, call: &ProtocolCall) -> usize {
        lock(&self.calls).iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: ProtocolCall) {
        lock(&self.calls).push(call);
    }

    fn check(&self, method: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(ProtocolError::Disconnected);
        }
        match lock(&self.failures).get(method) {
            Some(message) => Err(ProtocolError::command_failed(method, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProtocolClient for MemoryProtocol {
    async fn enable(&self, domain: Domain) -> Result<()> {
        self.record(ProtocolCall::Enable(domain));
        // Acknowledgement arrives on a later tick, as it would over a socket.
        tokio::task::yield_now().await;
        self.check(domain.enable_method())
    }

    async fn resume(&self) -> Result<()> {
        self.record(ProtocolCall::Resume);
        tokio::task::yield_now().await;
        self.check(RESUME_METHOD)
    }

    async fn get_script_source(&self, script_id: &ScriptId) -> Result<String> {
        self.record(ProtocolCall::GetScriptSource(script_id.clone()));
        tokio::task::yield_now().await;
        self.check(GET_SCRIPT_SOURCE_METHOD)?;
        lock(&self.sources).get(script_id).cloned().ok_or_else(|| {
            ProtocolError::command_failed(
                GET_SCRIPT_SOURCE_METHOD,
                format!("No script for id: {script_id}"),
            )
        })
    }

    fn subscribe(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.record(ProtocolCall::Subscribe(kind));
        self.dispatcher.subscribe(kind, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }
}
