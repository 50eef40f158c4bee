//! Protocol push events consumed by a thread.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol-assigned identifier of a parsed script, unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptId(pub String);

impl ScriptId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScriptId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ScriptId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Payload of `Debugger.paused`.
///
/// Call frames and auxiliary data are kept as raw JSON; inspecting them is
/// the frontend's business. Keys not modelled here (`asyncStackTraceId`,
/// `asyncCallStackTraceId`, newer protocol additions) land in `extra` and
/// serialize back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedEvent {
    #[serde(default)]
    pub call_frames: Vec<Value>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_breakpoints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_stack_trace: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Payload of `Debugger.scriptParsed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedEvent {
    pub script_id: ScriptId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub start_line: u32,
    #[serde(default)]
    pub start_column: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub end_column: u32,
    #[serde(default)]
    pub execution_context_id: i64,
    #[serde(default)]
    pub hash: String,
    #[serde(rename = "sourceMapURL", default, skip_serializing_if = "Option::is_none")]
    pub source_map_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_module: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

impl ScriptParsedEvent {
    /// Minimal event carrying only an id and a url.
    pub fn new(script_id: impl Into<ScriptId>, url: impl Into<String>) -> Self {
        Self {
            script_id: script_id.into(),
            url: url.into(),
            start_line: 0,
            start_column: 0,
            end_line: 0,
            end_column: 0,
            execution_context_id: 0,
            hash: String::new(),
            source_map_url: None,
            is_module: None,
            length: None,
        }
    }

    pub fn with_source_map_url(mut self, source_map_url: impl Into<String>) -> Self {
        self.source_map_url = Some(source_map_url.into());
        self
    }
}

/// The push notifications a thread subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ExecutionContextsCleared,
    Paused,
    Resumed,
    ScriptParsed,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        Self::ExecutionContextsCleared,
        Self::Paused,
        Self::Resumed,
        Self::ScriptParsed,
    ];

    /// Wire method name of the event.
    pub fn method(self) -> &'static str {
        match self {
            Self::ExecutionContextsCleared => "Runtime.executionContextsCleared",
            Self::Paused => "Debugger.paused",
            Self::Resumed => "Debugger.resumed",
            Self::ScriptParsed => "Debugger.scriptParsed",
        }
    }

    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.method() == method)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method())
    }
}

/// A decoded push event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    ExecutionContextsCleared,
    Paused(PausedEvent),
    Resumed,
    ScriptParsed(ScriptParsedEvent),
}

impl ProtocolEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ExecutionContextsCleared => EventKind::ExecutionContextsCleared,
            Self::Paused(_) => EventKind::Paused,
            Self::Resumed => EventKind::Resumed,
            Self::ScriptParsed(_) => EventKind::ScriptParsed,
        }
    }

    /// Decode a raw `{ method, params }` notification.
    pub fn from_message(method: &str, params: Value) -> Result<Self> {
        let kind = EventKind::from_method(method)
            .ok_or_else(|| ProtocolError::UnknownEvent(method.to_string()))?;
        let invalid = |source| ProtocolError::InvalidParams {
            method: method.to_string(),
            source,
        };

        Ok(match kind {
            EventKind::ExecutionContextsCleared => Self::ExecutionContextsCleared,
            EventKind::Resumed => Self::Resumed,
            EventKind::Paused => Self::Paused(serde_json::from_value(params).map_err(invalid)?),
            EventKind::ScriptParsed => {
                Self::ScriptParsed(serde_json::from_value(params).map_err(invalid)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_script_parsed() {
        let event = ProtocolEvent::from_message(
            "Debugger.scriptParsed",
            json!({
                "scriptId": "42",
                "url": "https://x/app.js",
                "startLine": 0,
                "startColumn": 0,
                "endLine": 10,
                "endColumn": 3,
                "executionContextId": 1,
                "hash": "abc",
                "sourceMapURL": "app.js.map"
            }),
        )
        .unwrap();

        let ProtocolEvent::ScriptParsed(parsed) = event else {
            panic!("expected scriptParsed");
        };
        assert_eq!(parsed.script_id, ScriptId::from("42"));
        assert_eq!(parsed.url, "https://x/app.js");
        assert_eq!(parsed.end_line, 10);
        assert_eq!(parsed.source_map_url.as_deref(), Some("app.js.map"));
    }

    #[test]
    fn test_decode_script_parsed_missing_fields_default() {
        let event =
            ProtocolEvent::from_message("Debugger.scriptParsed", json!({ "scriptId": "7" })).unwrap();
        let ProtocolEvent::ScriptParsed(parsed) = event else {
            panic!("expected scriptParsed");
        };
        assert_eq!(parsed.url, "");
        assert!(parsed.source_map_url.is_none());
    }

    #[test]
    fn test_decode_paused_keeps_payload() {
        let params = json!({
            "callFrames": [{ "callFrameId": "0", "functionName": "main" }],
            "reason": "other",
            "hitBreakpoints": ["1:10:0"]
        });
        let event = ProtocolEvent::from_message("Debugger.paused", params).unwrap();
        let ProtocolEvent::Paused(paused) = event else {
            panic!("expected paused");
        };
        assert_eq!(paused.reason, "other");
        assert_eq!(paused.call_frames.len(), 1);
        assert_eq!(paused.hit_breakpoints, Some(vec!["1:10:0".to_string()]));
    }

    #[test]
    fn test_paused_unmodelled_fields_round_trip() {
        let params = json!({
            "callFrames": [],
            "reason": "other",
            "asyncStackTraceId": { "id": "7", "debuggerId": "d" },
            "asyncCallStackTraceId": { "id": "8" }
        });
        let event = ProtocolEvent::from_message("Debugger.paused", params.clone()).unwrap();
        let ProtocolEvent::Paused(paused) = event else {
            panic!("expected paused");
        };
        assert_eq!(paused.extra["asyncStackTraceId"]["id"], "7");
        assert_eq!(serde_json::to_value(&paused).unwrap(), params);
    }

    #[test]
    fn test_decode_parameterless_events() {
        assert_eq!(
            ProtocolEvent::from_message("Debugger.resumed", Value::Null).unwrap(),
            ProtocolEvent::Resumed
        );
        assert_eq!(
            ProtocolEvent::from_message("Runtime.executionContextsCleared", json!({})).unwrap(),
            ProtocolEvent::ExecutionContextsCleared
        );
    }

    #[test]
    fn test_decode_unknown_method() {
        let err = ProtocolEvent::from_message("Page.loadEventFired", json!({})).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(m) if m == "Page.loadEventFired"));
    }

    #[test]
    fn test_decode_script_parsed_without_id_is_invalid() {
        let err = ProtocolEvent::from_message("Debugger.scriptParsed", json!({ "url": "a.js" }))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParams { .. }));
    }

    #[test]
    fn test_event_kind_method_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_method(kind.method()), Some(kind));
        }
    }
}
