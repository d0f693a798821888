//! Exploration stage (§4.2): classify a source before any code generation
//! is attempted, and (for directory-like sources) collect outbound links.

mod api_discovery;
mod directory;
mod search_terms;
mod stage;

pub use directory::{cap_links, extract_directory_links, is_directory, MAX_EXTERNAL_LINKS, MAX_INTERNAL_LINKS};
pub use search_terms::derive_search_terms;
pub use stage::{explore, ExplorationOutcome};
