//! Streaming delta types and tool call reassembly.
//!
//! Providers stream tool calls as fragments: an id and a name once, then the
//! JSON arguments a few characters at a time. [`ToolCallAccumulator`] turns
//! those fragments back into whole [`ToolCall`]s.

mod accumulator;
mod types;

pub use accumulator::ToolCallAccumulator;
pub(crate) use accumulator::parse_best_effort;
pub use types::{StreamDelta, ToolCall, ToolUseNotice};
