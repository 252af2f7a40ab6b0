use std::collections::BTreeMap;

use comms::group::ArrivalBarrier;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    error::{OrchestratorError, Result},
    event::ProviderEvent,
    provider::{ResourceProvider, ResourceRequest},
    resource::{ResourceHandle, ResourceId, ResourceState, Role},
    task::{Task, TaskId, TaskSet},
};

/// Turns "N workers and one controller" into running tasks and a single result.
///
/// Events are handled one at a time in arrival order. The controller is only submitted once
/// every worker has been observed running, and every resource is released exactly once
/// whichever way the run ends.
pub struct Coordinator<P> {
    provider: P,
    memory_mb: usize,
    cores: usize,
    tasks: TaskSet,
    resources: BTreeMap<ResourceId, ResourceHandle>,
    workers_assigned: usize,
    controller: Option<ResourceId>,
    barrier: ArrivalBarrier<TaskId>,
    controller_submitted: bool,
    result: Option<Vec<u8>>,
    failure: Option<OrchestratorError>,
}

impl<P: ResourceProvider> Coordinator<P> {
    /// Creates a new `Coordinator`.
    ///
    /// # Arguments
    /// * `provider` - Where resources come from.
    /// * `tasks` - The tasks to bind, its worker count sets the barrier size.
    /// * `memory_mb` - The memory asked for every resource.
    /// * `cores` - The cores asked for every resource.
    pub fn new(provider: P, tasks: TaskSet, memory_mb: usize, cores: usize) -> Self {
        let workers = tasks.workers();

        Self {
            provider,
            memory_mb,
            cores,
            tasks,
            resources: BTreeMap::new(),
            workers_assigned: 0,
            controller: None,
            barrier: ArrivalBarrier::new(workers),
            controller_submitted: false,
            result: None,
            failure: None,
        }
    }

    fn workers(&self) -> usize {
        self.barrier.expected()
    }

    /// Drives the run from the initial request until every resource is released.
    ///
    /// # Arguments
    /// * `events` - The provider's event queue.
    ///
    /// # Returns
    /// The controller's result payload, or the first failure of the run.
    pub async fn run(mut self, mut events: UnboundedReceiver<ProviderEvent>) -> Result<Vec<u8>> {
        self.on_start().await?;

        while !self.is_finished() {
            let Some(event) = events.recv().await else {
                self.fail(OrchestratorError::Provider(
                    "event queue closed mid run".into(),
                ))
                .await;
                break;
            };

            self.handle(event).await;
        }

        match (self.failure, self.result) {
            (Some(e), _) => Err(e),
            (None, Some(payload)) => Ok(payload),
            (None, None) => Err(OrchestratorError::MissingResult),
        }
    }

    /// Issues the single batch request for every worker plus the controller.
    pub async fn on_start(&mut self) -> Result<()> {
        let request = ResourceRequest {
            count: self.workers() + 1,
            memory_mb: self.memory_mb,
            cores: self.cores,
        };

        info!(
            count = request.count,
            memory_mb = request.memory_mb,
            cores = request.cores;
            "requesting resources"
        );
        self.provider.request(request).await
    }

    /// Whether the run is over, every resource it got being released.
    pub fn is_finished(&self) -> bool {
        let all_released = self.resources.values().all(ResourceHandle::is_released);

        if self.failure.is_some() {
            return all_released;
        }

        self.result.is_some() && all_released && self.resources.len() == self.workers() + 1
    }

    /// Dispatches a single event, turning any error into a failed run.
    pub async fn handle(&mut self, event: ProviderEvent) {
        let res = match event {
            ProviderEvent::Allocated(resource) => self.on_allocated(resource).await,
            ProviderEvent::AllocationFailed(reason) => Err(OrchestratorError::Allocation(reason)),
            ProviderEvent::ContextActive(resource) => self.on_context_active(resource).await,
            ProviderEvent::TaskRunning { resource, task_id } => {
                self.on_task_running(resource, task_id).await
            }
            ProviderEvent::TaskCompleted {
                resource,
                task_id,
                payload,
            } => self.on_task_completed(resource, task_id, payload).await,
            ProviderEvent::TaskFailed {
                resource,
                task_id,
                reason,
            } => self.on_task_failed(resource, task_id, reason).await,
        };

        if let Err(e) = res {
            self.fail(e).await;
        }
    }

    async fn on_allocated(&mut self, resource: ResourceId) -> Result<()> {
        if self.resources.contains_key(&resource) {
            warn!(resource = resource.0; "duplicate allocation ignored");
            return Ok(());
        }

        let role = if self.workers_assigned < self.workers() {
            self.workers_assigned += 1;
            Role::Worker(self.workers_assigned - 1)
        } else if self.controller.is_none() {
            self.controller = Some(resource);
            Role::Controller
        } else {
            warn!(resource = resource.0; "allocation beyond the request, giving it back");
            self.provider.release(resource).await?;

            return Err(OrchestratorError::BarrierViolation(format!(
                "{resource} exceeds the {} requested resources",
                self.workers() + 1
            )));
        };

        let mut handle = ResourceHandle::new(resource, role);
        handle.advance(ResourceState::Allocated)?;
        self.resources.insert(resource, handle);
        debug!(resource = resource.0; "bound to {role:?}");

        if self.failure.is_some() {
            return self.release(resource).await;
        }

        self.provider.submit_context(resource).await
    }

    async fn on_context_active(&mut self, resource: ResourceId) -> Result<()> {
        let Some(handle) = self.live_handle(resource) else {
            return Ok(());
        };
        handle.advance(ResourceState::ContextActive)?;

        match handle.role() {
            Role::Worker(i) => {
                let task = self.tasks.take_worker(i).ok_or_else(|| {
                    OrchestratorError::Provider(format!("no task left for worker {i}"))
                })?;
                self.submit(resource, task).await
            }
            Role::Controller if self.barrier.is_fired() => self.submit_controller().await,
            Role::Controller => {
                debug!(resource = resource.0; "controller context ready, waiting on workers");
                Ok(())
            }
        }
    }

    async fn on_task_running(&mut self, resource: ResourceId, task_id: TaskId) -> Result<()> {
        let Some(handle) = self.live_handle(resource) else {
            return Ok(());
        };

        if handle.state() != ResourceState::Running {
            handle.advance(ResourceState::Running)?;
        }

        let Role::Worker(_) = handle.role() else {
            info!(task = task_id.as_str(); "controller running");
            return Ok(());
        };

        if self.barrier.has_arrived(&task_id) && !self.barrier.is_fired() {
            debug!(task = task_id.as_str(); "repeated running report ignored");
            return Ok(());
        }

        let fired = self
            .barrier
            .record_arrival(task_id)
            .map_err(|e| OrchestratorError::BarrierViolation(e.to_string()))?;

        debug!(
            running = self.barrier.arrived(),
            expected = self.barrier.expected();
            "worker running"
        );

        if !fired {
            return Ok(());
        }

        info!(workers = self.workers(); "every worker is running");
        let controller_ready = self
            .controller
            .and_then(|id| self.resources.get(&id))
            .is_some_and(|handle| handle.state() == ResourceState::ContextActive);

        if controller_ready {
            self.submit_controller().await
        } else {
            debug!("controller context not active yet");
            Ok(())
        }
    }

    async fn on_task_completed(
        &mut self,
        resource: ResourceId,
        task_id: TaskId,
        payload: Vec<u8>,
    ) -> Result<()> {
        let Some(handle) = self.live_handle(resource) else {
            return Ok(());
        };

        handle.advance(ResourceState::Completed)?;
        if handle.role() == Role::Controller {
            info!(task = task_id.as_str(), bytes = payload.len(); "result received");
            self.result = Some(payload);
        } else {
            debug!(task = task_id.as_str(); "task completed");
        }

        self.release(resource).await
    }

    async fn on_task_failed(
        &mut self,
        resource: ResourceId,
        task_id: TaskId,
        reason: String,
    ) -> Result<()> {
        let Some(handle) = self.live_handle(resource) else {
            return Ok(());
        };

        handle.advance(ResourceState::Failed)?;
        Err(OrchestratorError::TaskFailure { task_id, reason })
    }

    /// The handle of a known, unreleased resource.
    fn live_handle(&mut self, resource: ResourceId) -> Option<&mut ResourceHandle> {
        match self.resources.get_mut(&resource) {
            Some(handle) if !handle.is_released() => Some(handle),
            Some(_) => {
                debug!(resource = resource.0; "event for released resource ignored");
                None
            }
            None => {
                warn!(resource = resource.0; "event for unknown resource ignored");
                None
            }
        }
    }

    async fn submit(&mut self, resource: ResourceId, task: Task) -> Result<()> {
        debug!(resource = resource.0, task = task.id().as_str(); "submitting task");
        if let Some(handle) = self.resources.get_mut(&resource) {
            handle.advance(ResourceState::TaskSubmitted)?;
        }

        self.provider.submit_task(resource, task).await
    }

    async fn submit_controller(&mut self) -> Result<()> {
        if self.controller_submitted {
            return Err(OrchestratorError::BarrierViolation(
                "controller submitted twice".into(),
            ));
        }

        let resource = self.controller.ok_or_else(|| {
            OrchestratorError::Provider("no resource reserved for the controller".into())
        })?;
        let task = self.tasks.take_controller().ok_or_else(|| {
            OrchestratorError::Provider("controller task already handed out".into())
        })?;

        self.controller_submitted = true;
        info!(resource = resource.0; "submitting controller");
        self.submit(resource, task).await
    }

    /// Releases `resource` if it isn't already.
    async fn release(&mut self, resource: ResourceId) -> Result<()> {
        let Some(handle) = self.resources.get_mut(&resource) else {
            return Ok(());
        };

        if handle.is_released() {
            return Ok(());
        }

        handle.advance(ResourceState::Released)?;
        self.provider.release(resource).await
    }

    /// Records the run's failure and releases everything still held.
    async fn fail(&mut self, e: OrchestratorError) {
        match &self.failure {
            None => {
                error!("run failed: {e}");
                self.failure = Some(e);
            }
            Some(_) => warn!("further failure while aborting: {e}"),
        }

        let live: Vec<_> = self
            .resources
            .values()
            .filter(|h| !h.is_released())
            .map(ResourceHandle::id)
            .collect();

        for resource in live {
            if let Err(e) = self.release(resource).await {
                warn!(resource = resource.0; "release failed: {e}");
            }
        }
    }
}
