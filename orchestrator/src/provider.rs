use crate::{error::Result, resource::ResourceId, task::Task};

/// A batch allocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRequest {
    pub count: usize,
    pub memory_mb: usize,
    pub cores: usize,
}

/// The capability to allocate compute resources and run tasks on them.
///
/// Every operation only issues the command, its outcome is reported later as a
/// `ProviderEvent` on the provider's event queue.
#[allow(unused)]
#[trait_variant::make(ResourceProvider: Send)]
pub trait ResourceProviderTemplate {
    /// Asks for `request.count` resources at once.
    ///
    /// # Returns
    /// An error if the request couldn't be issued at all, an unsatisfiable request is
    /// reported as `ProviderEvent::AllocationFailed` instead.
    async fn request(&mut self, request: ResourceRequest) -> Result<()>;

    /// Prepares an execution context on an allocated resource.
    async fn submit_context(&mut self, resource: ResourceId) -> Result<()>;

    /// Starts `task` on a resource with an active context.
    async fn submit_task(&mut self, resource: ResourceId, task: Task) -> Result<()>;

    /// Gives a resource back, stopping whatever still runs on it.
    async fn release(&mut self, resource: ResourceId) -> Result<()>;
}
