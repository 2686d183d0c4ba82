//! Wire encoding for events.

use super::types::{Event, Payload};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Kind written when a frame has no usable kind
pub const DEFAULT_KIND: &str = "message";

/// Serializes events into `event: <kind>\ndata: <payload>\n` frames.
///
/// Output is deterministic: object keys are written in sorted order and
/// without insignificant whitespace, so encoding an already-normalized payload
/// reproduces it byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventEncoder;

impl EventEncoder {
    /// Encode an orchestrator event
    pub fn encode(event: &Event) -> String {
        Self::encode_parts(event.kind().as_str(), &event.payload())
    }

    /// Encode an arbitrary frame.
    ///
    /// A blank `kind` is written as `message`. Text payloads that are a JSON
    /// object literal are re-serialized compactly; each line of any other text
    /// becomes its own `data:` line.
    pub fn encode_parts(kind: &str, payload: &Payload) -> String {
        let kind = match kind.trim() {
            "" => DEFAULT_KIND,
            kind => kind,
        };
        let data = match payload {
            Payload::Text(text) => normalize_text(text),
            Payload::Json(value) => value.to_string(),
            Payload::Empty => String::new(),
        };

        let mut frame = String::with_capacity(kind.len() + data.len() + 16);
        frame.push_str("event: ");
        frame.push_str(kind);
        frame.push('\n');
        for line in data.split('\n') {
            frame.push_str("data: ");
            frame.push_str(line.strip_suffix('\r').unwrap_or(line));
            frame.push('\n');
        }
        frame
    }

    /// SSE comment frame used by the transport for keep-alive pings
    pub fn keep_alive(now: DateTime<Utc>) -> String {
        format!(": ping - {}\n", now.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return value.to_string();
        }
    }
    text.to_string()
}
