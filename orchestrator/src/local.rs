use std::collections::HashMap;

use log::{debug, warn};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{
    error::{OrchestratorError, Result},
    event::ProviderEvent,
    provider::{ResourceProvider, ResourceRequest},
    resource::ResourceId,
    task::Task,
};

#[derive(Default)]
struct Slot {
    context: bool,
    task: Option<JoinHandle<()>>,
}

/// A provider running every task on the current tokio runtime.
pub struct LocalProvider {
    capacity: usize,
    next_id: usize,
    slots: HashMap<ResourceId, Slot>,
    events: UnboundedSender<ProviderEvent>,
}

impl LocalProvider {
    /// Creates a new `LocalProvider`.
    ///
    /// # Arguments
    /// * `capacity` - The maximum amount of resources live at once.
    ///
    /// # Returns
    /// The provider and the queue its events are delivered on.
    pub fn new(capacity: usize) -> (Self, UnboundedReceiver<ProviderEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let provider = Self {
            capacity,
            next_id: 0,
            slots: HashMap::new(),
            events,
        };

        (provider, rx)
    }

    /// The amount of resources currently handed out.
    pub fn live(&self) -> usize {
        self.slots.len()
    }

    fn emit(&self, event: ProviderEvent) {
        if self.events.send(event).is_err() {
            debug!("event queue closed, dropping event");
        }
    }

    fn slot(&mut self, resource: ResourceId) -> Result<&mut Slot> {
        self.slots
            .get_mut(&resource)
            .ok_or_else(|| OrchestratorError::Provider(format!("unknown {resource}")))
    }
}

impl ResourceProvider for LocalProvider {
    async fn request(&mut self, request: ResourceRequest) -> Result<()> {
        let ResourceRequest {
            count,
            memory_mb,
            cores,
        } = request;

        if memory_mb == 0 || cores == 0 {
            self.emit(ProviderEvent::AllocationFailed(format!(
                "can't allocate {memory_mb} MB and {cores} cores"
            )));
            return Ok(());
        }

        if self.slots.len() + count > self.capacity {
            self.emit(ProviderEvent::AllocationFailed(format!(
                "{count} resources requested, {} available",
                self.capacity - self.slots.len()
            )));
            return Ok(());
        }

        for _ in 0..count {
            let id = ResourceId(self.next_id);
            self.next_id += 1;
            self.slots.insert(id, Slot::default());
            self.emit(ProviderEvent::Allocated(id));
        }

        Ok(())
    }

    async fn submit_context(&mut self, resource: ResourceId) -> Result<()> {
        self.slot(resource)?.context = true;
        self.emit(ProviderEvent::ContextActive(resource));
        Ok(())
    }

    async fn submit_task(&mut self, resource: ResourceId, task: Task) -> Result<()> {
        let events = self.events.clone();
        let slot = self.slot(resource)?;

        if !slot.context {
            return Err(OrchestratorError::Provider(format!(
                "{resource} has no active context"
            )));
        }

        if slot.task.is_some() {
            return Err(OrchestratorError::Provider(format!(
                "{resource} already runs a task"
            )));
        }

        let handle = tokio::spawn(async move {
            let task_id = task.id().clone();
            let _ = events.send(ProviderEvent::TaskRunning {
                resource,
                task_id: task_id.clone(),
            });

            let event = match task.run().await {
                Ok(payload) => ProviderEvent::TaskCompleted {
                    resource,
                    task_id,
                    payload,
                },
                Err(reason) => ProviderEvent::TaskFailed {
                    resource,
                    task_id,
                    reason,
                },
            };

            let _ = events.send(event);
        });

        slot.task = Some(handle);
        Ok(())
    }

    async fn release(&mut self, resource: ResourceId) -> Result<()> {
        let slot = self
            .slots
            .remove(&resource)
            .ok_or_else(|| OrchestratorError::Provider(format!("unknown {resource}")))?;

        if let Some(task) = slot.task {
            if !task.is_finished() {
                warn!(resource = resource.0; "aborting task still running on released resource");
            }
            task.abort();
        }

        Ok(())
    }
}
