//! Tool call accumulator.

use super::types::{StreamDelta, ToolCall, ToolUseNotice};
use std::collections::HashMap;

#[derive(Debug)]
struct PendingToolCall {
    index: usize,
    id: String,
    name: String,
    argument_buffer: String,
    announced: bool,
}

/// Reassembles tool calls from fragments spread over many stream deltas.
///
/// Slots are keyed by call index, so sparse indices are fine (Anthropic-style
/// streams put a tool call at index 1 after a text block at index 0). A
/// fragment whose call id already belongs to another slot is routed there,
/// which keeps calls apart even if a provider interleaves them out of index
/// order. `finish` returns calls in the arrival order of their first fragment.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    slots: Vec<PendingToolCall>,
    by_index: HashMap<usize, usize>,
}

impl ToolCallAccumulator {
    /// Create a new accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delta.
    ///
    /// Content deltas are ignored. Returns a notice the first time a call's
    /// name is known.
    pub fn accumulate(&mut self, delta: &StreamDelta) -> Option<ToolUseNotice> {
        let StreamDelta::ToolCallFragment {
            index,
            id,
            name,
            arguments_delta,
        } = delta
        else {
            return None;
        };

        let slot = self.slot_for(*index, id.as_deref());
        let pending = &mut self.slots[slot];

        if let Some(id_value) = id {
            if pending.id.is_empty() {
                pending.id = id_value.clone();
            }
        }
        if let Some(name_value) = name {
            if pending.name.is_empty() {
                pending.name = name_value.clone();
            }
        }
        if let Some(args_delta) = arguments_delta {
            pending.argument_buffer.push_str(args_delta);
        }

        if pending.announced || pending.name.is_empty() {
            return None;
        }
        pending.announced = true;
        Some(ToolUseNotice {
            index: pending.index,
            name: pending.name.clone(),
            parameters: parse_best_effort(&pending.argument_buffer),
        })
    }

    /// Number of calls seen so far (named or not)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Close the accumulator and return the completed calls.
    ///
    /// Slots that never received a name are dropped. A missing provider id is
    /// replaced with `call_<index>` so the follow-up transcript can still
    /// reference the call.
    pub fn finish(self) -> Vec<ToolCall> {
        self.slots
            .into_iter()
            .filter(|pending| !pending.name.is_empty())
            .map(|pending| ToolCall {
                id: if pending.id.is_empty() {
                    format!("call_{}", pending.index)
                } else {
                    pending.id
                },
                name: pending.name,
                arguments: pending.argument_buffer,
            })
            .collect()
    }

    /// Accumulate an entire delta stream into completed calls
    ///
    /// This is a convenience method for callers that do not need per-delta
    /// events.
    pub async fn accumulate_stream<S, E>(mut stream: S) -> Result<Vec<ToolCall>, E>
    where
        S: futures_util::Stream<Item = Result<StreamDelta, E>> + Unpin,
    {
        use futures_util::StreamExt;

        let mut accumulator = Self::new();
        while let Some(delta) = stream.next().await {
            accumulator.accumulate(&delta?);
        }
        Ok(accumulator.finish())
    }

    fn slot_for(&mut self, index: usize, id: Option<&str>) -> usize {
        let id = id.filter(|id| !id.is_empty());

        if let Some(id) = id {
            if let Some(pos) = self.slots.iter().position(|s| s.id == id) {
                return pos;
            }
        }

        if let Some(&pos) = self.by_index.get(&index) {
            let current = &self.slots[pos];
            // Same index, different call id: a new call reusing the index.
            let reused = matches!(id, Some(id) if !current.id.is_empty() && current.id != id);
            if !reused {
                return pos;
            }
        }

        self.slots.push(PendingToolCall {
            index,
            id: String::new(),
            name: String::new(),
            argument_buffer: String::new(),
            announced: false,
        });
        let pos = self.slots.len() - 1;
        self.by_index.insert(index, pos);
        pos
    }
}

/// Parse argument text if it is already a JSON object, otherwise `{}`.
pub(crate) fn parse_best_effort(raw: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(raw.trim()) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => serde_json::Value::Object(serde_json::Map::new()),
    }
}
