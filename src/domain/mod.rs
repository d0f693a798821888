//! Domain types: the daemon's in-process view of backend-owned state.
//!
//! The daemon itself is stateless; these types mirror records that really
//! live behind the [`crate::backend::Backend`] RPC surface.

mod exploration;
mod id;
mod queue;
mod request;
mod worker;

pub use exploration::{DirectoryLink, DiscoveredApi, Location, SiteExploration};
pub use id::{CityId, OrgId, QueueItemId, RequestId, TaskId, WorkerId};
pub use queue::{
    ContactExtractionTarget, DirectoryCompletion, DirectoryQueueItem, DiscoveryCompletion, DiscoveryTask,
    DiscoveryTaskStatus, QueueItemStatus,
};
pub use request::{DevelopmentRequest, FeedbackEntry, RequestStatus};
pub use worker::WorkerState;
