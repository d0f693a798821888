//! The agent subprocess surface (§6): an opaque CLI emitting line-delimited
//! JSON events, modeled as a pull-style event stream.

mod error;
mod events;
mod extract;
mod process;
mod transcript;

pub use error::AgentError;
pub use events::{parse_event_line, AgentEvent};
pub use extract::extract_code;
pub use process::{run_agent, AgentRunResult, AgentRunState};
pub use transcript::TranscriptWriter;
