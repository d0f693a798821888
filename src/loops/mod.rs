//! The three auxiliary periodic loops (§4.7-§4.9) plus the shared
//! non-reentrant scheduling trait they implement.

mod contact;
mod directory;
mod discovery;
mod periodic;

pub use contact::ContactLoop;
pub use directory::DirectoryLoop;
pub use discovery::DiscoveryLoop;
pub use periodic::PeriodicLoop;
