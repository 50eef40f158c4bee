//! Replay a recorded protocol event log through a thread.
//!
//! The log is newline-delimited JSON, one `{ "method", "params" }`
//! notification per line as captured from a DevTools session. Events the
//! thread does not model are counted and skipped, except
//! `Page.frameNavigated` for the main frame, which updates the document URL
//! scripts are resolved against.

use crate::config::ThreadConfig;
use crate::error::ProtocolError;
use crate::lock;
use crate::protocol::MemoryProtocol;
use crate::source::SourceRegistry;
use crate::target::StaticTarget;
use crate::thread::{Thread, ThreadEvent, ThreadNotification, ThreadObserver};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::BufRead;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Document URL before any recorded navigation
    pub document_url: Option<String>,
    pub thread_name: Option<String>,
    pub config: ThreadConfig,
}

/// A script left registered when the log ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRow {
    pub script_id: String,
    pub url: String,
    pub source_map_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub thread_id: u64,
    pub name: String,
    pub events: Vec<ThreadEvent>,
    pub scripts: Vec<ScriptRow>,
    pub paused: bool,
    /// Lines that were read
    pub lines: usize,
    /// Lines with a method the thread does not handle
    pub skipped: usize,
}

#[derive(Deserialize)]
struct Message {
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Default)]
struct EventLog(Mutex<Vec<ThreadEvent>>);

impl ThreadObserver for EventLog {
    fn notify(&self, notification: &ThreadNotification<'_>) {
        lock(&self.0).push(ThreadEvent::snapshot(notification));
    }
}

/// Feed every line of `reader` to a fresh thread and report the outcome.
pub async fn replay(reader: impl BufRead, options: ReplayOptions) -> Result<ReplayReport> {
    let protocol = Arc::new(MemoryProtocol::new());
    let registry = Arc::new(SourceRegistry::new());
    let target = Arc::new(StaticTarget::new(protocol.clone(), registry.clone()));
    if let Some(url) = &options.document_url {
        target.set_url(url.as_str());
    }

    let thread = Thread::with_config(target.clone(), options.config);
    let log = Arc::new(EventLog::default());
    thread.add_observer(log.clone());
    if let Some(name) = options.thread_name {
        thread.set_thread_name(name);
    }
    thread.initialize().await?;

    let mut lines = 0;
    let mut skipped = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read event log")?;
        if line.trim().is_empty() {
            continue;
        }
        lines += 1;

        let message: Message = serde_json::from_str(&line)
            .with_context(|| format!("Line {}: not a protocol notification", index + 1))?;

        if message.method == "Page.frameNavigated" {
            if let Some(url) = main_frame_url(&message.params) {
                debug!(url, "Document navigated");
                target.set_url(url);
            }
            continue;
        }

        match protocol.emit_message(&message.method, message.params) {
            Ok(_) => {}
            Err(ProtocolError::UnknownEvent(method)) => {
                debug!(method = %method, "Skipping unhandled event");
                skipped += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Line {}", index + 1));
            }
        }
    }

    let mut scripts: Vec<ScriptRow> = thread
        .scripts()
        .into_iter()
        .map(|(script_id, source)| ScriptRow {
            script_id: script_id.0,
            url: source.url().to_string(),
            source_map_url: registry.source_map_url(source.id()).map(|u| u.to_string()),
        })
        .collect();
    scripts.sort_by(|a, b| natural_id_order(&a.script_id, &b.script_id));

    if skipped > 0 {
        warn!(skipped, "Some events were not handled by the thread");
    }

    let events = std::mem::take(&mut *lock(&log.0));
    Ok(ReplayReport {
        thread_id: thread.id().0,
        name: thread.name(),
        events,
        scripts,
        paused: thread.is_paused(),
        lines,
        skipped,
    })
}

/// URL of a `Page.frameNavigated` frame when it is the top-level frame.
fn main_frame_url(params: &Value) -> Option<&str> {
    let frame = params.get("frame")?;
    if frame.get("parentId").is_some() {
        return None;
    }
    frame.get("url")?.as_str()
}

/// Numeric script ids sort numerically, anything else lexically after them.
fn natural_id_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
