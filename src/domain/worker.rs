//! In-process worker state, owned by the [`crate::supervisor::Supervisor`].

use super::id::{RequestId, WorkerId};

#[derive(Debug, Clone)]
pub struct WorkerState {
    pub id: WorkerId,
    pub busy: bool,
    pub current_request: Option<RequestId>,
    pub child_pid: Option<u32>,
}

impl WorkerState {
    pub fn idle(id: WorkerId) -> Self {
        Self {
            id,
            busy: false,
            current_request: None,
            child_pid: None,
        }
    }

    pub fn mark_busy(&mut self, request_id: RequestId) {
        self.busy = true;
        self.current_request = Some(request_id);
    }

    pub fn mark_idle(&mut self) {
        self.busy = false;
        self.current_request = None;
        self.child_pid = None;
    }
}
