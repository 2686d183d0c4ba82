//! Output events and their wire encoding
//!
//! The orchestrator produces [`Event`]s; the transport writes them with
//! [`EventEncoder`].
//!
//! ## Event Kinds
//!
//! | kind          | data                                   |
//! |---------------|----------------------------------------|
//! | `chunk`       | raw text                               |
//! | `tool_use`    | `{"name", "parameters"}`               |
//! | `tool_output` | `{"name", "output", "success"}`        |
//! | `error`       | `{"error"}`                            |
//! | `end`         | empty                                  |
//!
//! ## Usage
//!
//! ```rust
//! use toolstream::events::{Event, EventEncoder};
//!
//! let frame = EventEncoder::encode(&Event::chunk("Hello"));
//! assert_eq!(frame, "event: chunk\ndata: Hello\n");
//! ```

mod encoder;
mod types;

pub use encoder::{EventEncoder, DEFAULT_KIND};
pub use types::{Event, EventKind, Payload};
