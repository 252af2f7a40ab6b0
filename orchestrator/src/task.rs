use std::fmt;

use comms::{
    VectorCodec,
    group::{LocalLeaf, LocalRoot, local_group},
};
use controller::Controller;
use log::debug;
use machine_learning::LinearSgd;
use worker::Worker;

/// Identifies a task across its lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn worker(id: usize) -> Self {
        Self(format!("worker-{id}"))
    }

    pub fn controller() -> Self {
        Self("controller".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of work bound to one resource, together with its end of the group.
pub enum Task {
    Worker {
        id: TaskId,
        worker: Worker,
        leaf: LocalLeaf,
    },
    Controller {
        id: TaskId,
        controller: Controller,
        root: LocalRoot,
    },
}

impl Task {
    pub fn id(&self) -> &TaskId {
        match self {
            Task::Worker { id, .. } | Task::Controller { id, .. } => id,
        }
    }

    /// Runs the task to completion.
    ///
    /// # Returns
    /// The task's opaque result payload. For the controller it's the text report, for a
    /// worker its last contribution in wire format.
    pub async fn run(self) -> Result<Vec<u8>, String> {
        match self {
            Task::Worker {
                id,
                worker,
                mut leaf,
            } => {
                let contribution = worker.run(&mut leaf).await.map_err(|e| e.to_string())?;

                let mut payload = Vec::with_capacity(VectorCodec::encoded_len(contribution.len()));
                VectorCodec
                    .encode(&contribution, &mut payload)
                    .map_err(|e| e.to_string())?;

                debug!(task = id.as_str(); "worker task done");
                Ok(payload)
            }
            Task::Controller {
                id,
                controller,
                mut root,
            } => {
                let report = controller.run(&mut root).await.map_err(|e| e.to_string())?;
                debug!(task = id.as_str(); "controller task done");
                Ok(report.to_string().into_bytes())
            }
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Task").field(self.id()).finish()
    }
}

/// The tasks of one run, wired together over an in-memory group and handed out by role.
pub struct TaskSet {
    workers: Vec<Option<Task>>,
    controller: Option<Task>,
}

impl TaskSet {
    /// Creates the tasks of a run with `workers` workers.
    ///
    /// # Arguments
    /// * `workers` - The group size.
    /// * `sgd` - Every worker's local step.
    /// * `controller` - The root of the computation.
    /// * `link_capacity` - The buffer size in bytes of every link direction.
    pub fn local(
        workers: usize,
        sgd: LinearSgd,
        controller: Controller,
        link_capacity: usize,
    ) -> Self {
        let (root, leaves) = local_group(workers, link_capacity);

        let workers = leaves
            .into_iter()
            .enumerate()
            .map(|(i, leaf)| {
                Some(Task::Worker {
                    id: TaskId::worker(i),
                    worker: Worker::new(i, sgd),
                    leaf,
                })
            })
            .collect();

        let controller = Some(Task::Controller {
            id: TaskId::controller(),
            controller,
            root,
        });

        Self {
            workers,
            controller,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Hands out worker `i`'s task, at most once.
    pub fn take_worker(&mut self, i: usize) -> Option<Task> {
        self.workers.get_mut(i).and_then(Option::take)
    }

    /// Hands out the controller's task, at most once.
    pub fn take_controller(&mut self) -> Option<Task> {
        self.controller.take()
    }
}
