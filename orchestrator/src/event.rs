use crate::{resource::ResourceId, task::TaskId};

/// A lifecycle notification from the resource provider.
#[derive(Debug)]
pub enum ProviderEvent {
    Allocated(ResourceId),
    AllocationFailed(String),
    ContextActive(ResourceId),
    TaskRunning {
        resource: ResourceId,
        task_id: TaskId,
    },
    TaskCompleted {
        resource: ResourceId,
        task_id: TaskId,
        payload: Vec<u8>,
    },
    TaskFailed {
        resource: ResourceId,
        task_id: TaskId,
        reason: String,
    },
}
