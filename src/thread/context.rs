//! A debuggee execution thread.

use super::events::ObserverList;
use super::model::ThreadState;
use super::{ObserverId, ThreadEvent, ThreadId, ThreadNotification, ThreadObserver};
use crate::config::ThreadConfig;
use crate::error::Result;
use crate::lock;
use crate::protocol::{
    Domain, EventHandler, EventKind, PausedEvent, ProtocolEvent, ScriptId, ScriptParsedEvent,
    SubscriptionId,
};
use crate::source::{ContentGetter, Source};
use crate::target::Target;
use crate::urls::resolve_source_map_url;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};

/// One execution context of a debugging session.
///
/// Tracks whether the context is paused, which scripts were parsed into it,
/// and keeps the target's shared source container in step with its own
/// script table. Cloning gives another handle to the same thread.
#[derive(Clone)]
pub struct Thread {
    inner: Arc<ThreadInner>,
}

struct ThreadInner {
    id: ThreadId,
    target: Arc<dyn Target>,
    config: ThreadConfig,
    state: Mutex<ThreadState>,
    observers: ObserverList,
    events_tx: broadcast::Sender<ThreadEvent>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl ThreadInner {
    /// Remove every protocol handler this thread registered.
    fn unsubscribe_all(&self) {
        let ids = std::mem::take(&mut *lock(&self.subscriptions));
        if ids.is_empty() {
            return;
        }
        let protocol = self.target.protocol();
        for id in &ids {
            protocol.unsubscribe(*id);
        }
        trace!(thread = %self.id, handlers = ids.len(), "Protocol handlers removed");
    }
}

impl Drop for ThreadInner {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

impl Thread {
    pub fn new(target: Arc<dyn Target>) -> Self {
        Self::with_config(target, ThreadConfig::default())
    }

    pub fn with_config(target: Arc<dyn Target>, config: ThreadConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.notification_capacity.max(1));
        let id = ThreadId::next();
        trace!(thread = %id, "Thread created");
        Self {
            inner: Arc::new(ThreadInner {
                id,
                target,
                config,
                state: Mutex::new(ThreadState::default()),
                observers: ObserverList::default(),
                events_tx,
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn id(&self) -> ThreadId {
        self.inner.id
    }

    pub fn name(&self) -> String {
        lock(&self.inner.state).name.clone()
    }

    /// Payload of the pause the thread is stopped in, `None` while running.
    pub fn paused_state(&self) -> Option<PausedEvent> {
        lock(&self.inner.state).paused.clone()
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.inner.state).paused.is_some()
    }

    /// Snapshot of the scripts parsed into this thread.
    pub fn scripts(&self) -> HashMap<ScriptId, Arc<Source>> {
        lock(&self.inner.state).scripts.clone()
    }

    pub fn script(&self, script_id: &ScriptId) -> Option<Arc<Source>> {
        lock(&self.inner.state).scripts.get(script_id).cloned()
    }

    pub fn target(&self) -> &Arc<dyn Target> {
        &self.inner.target
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.inner.config
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.inner.state).disposed
    }

    // ── Observers ───────────────────────────────────────────────────────────

    pub fn add_observer(&self, observer: Arc<dyn ThreadObserver>) -> ObserverId {
        self.inner.observers.add(observer)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.inner.observers.remove(id)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Subscribe to owned snapshots of every notification.
    pub fn subscribe(&self) -> broadcast::Receiver<ThreadEvent> {
        self.inner.events_tx.subscribe()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Subscribe to protocol events and activate the `Runtime` and
    /// `Debugger` domains.
    ///
    /// Each handler is registered before the domain that produces its
    /// events is enabled, so nothing pushed right after activation is lost.
    #[instrument(skip(self), fields(thread = %self.id()))]
    pub async fn initialize(&self) -> Result<()> {
        let protocol = self.inner.target.protocol();
        let subscribe = |kind: EventKind, handler: EventHandler| {
            let id = protocol.subscribe(kind, handler);
            lock(&self.inner.subscriptions).push(id);
        };

        subscribe(
            EventKind::ExecutionContextsCleared,
            self.handler(|thread, _| thread.reset()),
        );
        protocol.enable(Domain::Runtime).await?;

        subscribe(
            EventKind::Paused,
            self.handler(|thread, event| {
                if let ProtocolEvent::Paused(paused) = event {
                    thread.on_paused(paused.clone());
                }
            }),
        );
        subscribe(
            EventKind::Resumed,
            self.handler(|thread, _| thread.on_resumed()),
        );
        subscribe(
            EventKind::ScriptParsed,
            self.handler(|thread, event| {
                if let ProtocolEvent::ScriptParsed(parsed) = event {
                    thread.on_script_parsed(parsed);
                }
            }),
        );
        protocol.enable(Domain::Debugger).await?;

        info!("Thread initialized");
        Ok(())
    }

    /// Ask the debuggee to continue. Local state changes only when the
    /// matching `Debugger.resumed` arrives.
    pub async fn resume(&self) -> Result<()> {
        debug!(thread = %self.id(), "Requesting resume");
        self.inner.target.protocol().resume().await
    }

    /// Drop every script from this thread and the shared container, and
    /// remove the thread's protocol handlers. Events already in flight are
    /// ignored.
    pub fn dispose(&self) {
        let removed = {
            let mut state = lock(&self.inner.state);
            if state.disposed {
                return;
            }
            state.disposed = true;
            Self::clear(&mut state)
        };
        self.unregister(removed);
        self.inner.unsubscribe_all();
        info!(thread = %self.id(), "Thread disposed");
    }

    pub fn set_thread_name(&self, name: impl Into<String>) {
        lock(&self.inner.state).name = name.into();
        self.emit(ThreadNotification::NameChanged(self));
    }

    // ── Event handling ──────────────────────────────────────────────────────

    /// Wrap a handler so it holds the thread weakly and skips disposed threads.
    fn handler<F>(&self, f: F) -> EventHandler
    where
        F: Fn(&Thread, &ProtocolEvent) + Send + Sync + 'static,
    {
        let weak: Weak<ThreadInner> = Arc::downgrade(&self.inner);
        Box::new(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let thread = Thread { inner };
            if thread.is_disposed() {
                trace!(thread = %thread.id(), method = event.kind().method(), "Event after dispose ignored");
                return;
            }
            f(&thread, event);
        })
    }

    /// Execution contexts were cleared; forget every script.
    fn reset(&self) {
        let removed = Self::clear(&mut lock(&self.inner.state));
        self.unregister(removed);
    }

    /// Empty the script table and pause state, returning the scripts that
    /// were registered.
    fn clear(state: &mut ThreadState) -> Vec<Arc<Source>> {
        state.paused = None;
        std::mem::take(&mut state.scripts).into_values().collect()
    }

    /// Remove a cleared snapshot from the shared container. Called with the
    /// state lock released so the container may read the thread.
    fn unregister(&self, removed: Vec<Arc<Source>>) {
        self.inner
            .target
            .source_container()
            .remove_sources(&removed);
        debug!(thread = %self.id(), removed = removed.len(), "Thread reset");
    }

    fn on_paused(&self, paused: PausedEvent) {
        debug!(thread = %self.id(), reason = %paused.reason, "Paused");
        lock(&self.inner.state).paused = Some(paused);
        self.emit(ThreadNotification::Paused(self));
    }

    fn on_resumed(&self) {
        debug!(thread = %self.id(), "Resumed");
        lock(&self.inner.state).paused = None;
        self.emit(ThreadNotification::Resumed(self));
    }

    fn on_script_parsed(&self, event: &ScriptParsedEvent) {
        let script_id = &event.script_id;
        let display_url = if event.url.is_empty() {
            self.inner.config.synthetic_url(script_id.as_str())
        } else {
            event.url.clone()
        };
        let source = Arc::new(Source::new(display_url, self.content_getter(script_id.clone())));
        let container = self.inner.target.source_container();

        let previous = lock(&self.inner.state)
            .scripts
            .insert(script_id.clone(), source.clone());
        if let Some(previous) = previous {
            warn!(thread = %self.id(), script_id = %script_id, "Script reported twice, replacing");
            container.remove_sources(&[previous]);
        }
        container.add_source(source.clone());
        debug!(thread = %self.id(), script_id = %script_id, url = source.url(), "Script parsed");

        let Some(source_map_url) = event.source_map_url.as_deref().filter(|u| !u.is_empty()) else {
            return;
        };
        if !self.inner.config.attach_source_maps {
            return;
        }

        // Resolved once against the current document; later navigations do
        // not re-resolve maps that were already attached.
        let document_url = self.inner.target.url();
        match resolve_source_map_url(Some(&document_url), &event.url, source_map_url) {
            Some(resolved) => {
                debug!(script_id = %script_id, map = %resolved, "Attaching source map");
                container.attach_source_map(&source, resolved);
            }
            None => debug!(
                script_id = %script_id,
                source_map_url,
                "Source map URL not resolvable, skipping"
            ),
        }
    }

    /// Content getter that asks the protocol for the script text on demand.
    fn content_getter(&self, script_id: ScriptId) -> ContentGetter {
        let protocol = self.inner.target.protocol();
        Box::new(move || {
            let protocol = protocol.clone();
            let script_id = script_id.clone();
            async move { protocol.get_script_source(&script_id).await }.boxed()
        })
    }

    fn emit(&self, notification: ThreadNotification<'_>) {
        self.inner.observers.notify(&notification);
        // No subscribers is fine.
        let _ = self.inner.events_tx.send(ThreadEvent::snapshot(&notification));
    }
}

impl std::fmt::Debug for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("Thread")
            .field("id", &self.inner.id)
            .field("name", &state.name)
            .field("paused", &state.paused.is_some())
            .field("scripts", &state.scripts.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Thread {}
