use std::fmt;

use log::debug;

use crate::error::{OrchestratorError, Result};

/// Identifies a compute resource handed out by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub usize);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource-{}", self.0)
    }
}

/// What a resource is used for, fixed once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Controller,
    /// A worker and its position in the group.
    Worker(usize),
}

/// The lifecycle of a single resource.
///
/// ```text
/// Requested -> Allocated -> ContextActive -> TaskSubmitted -> Running -> Completed -> Released
///                                                 \             \
///                                                  +-------------+-> Failed -> Released
/// ```
///
/// Any state but `Released` may also go straight to `Released` when the run is aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Requested,
    Allocated,
    ContextActive,
    TaskSubmitted,
    Running,
    Completed,
    Failed,
    Released,
}

impl ResourceState {
    /// Whether `self -> to` is a legal transition.
    pub fn can_advance(self, to: ResourceState) -> bool {
        use ResourceState::*;

        matches!(
            (self, to),
            (Requested, Allocated)
                | (Allocated, ContextActive)
                | (ContextActive, TaskSubmitted)
                | (TaskSubmitted, Running)
                | (Running, Completed)
                | (TaskSubmitted | Running, Failed)
        ) || (self != Released && to == Released)
    }
}

/// The coordinator's view of an allocated resource.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    id: ResourceId,
    role: Role,
    state: ResourceState,
}

impl ResourceHandle {
    /// Creates a new `ResourceHandle` in the `Requested` state.
    pub fn new(id: ResourceId, role: Role) -> Self {
        Self {
            id,
            role,
            state: ResourceState::Requested,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn is_released(&self) -> bool {
        self.state == ResourceState::Released
    }

    /// Moves the handle to `to`.
    ///
    /// # Errors
    /// `OrchestratorError::InvalidTransition` if the lifecycle doesn't allow it, the state is
    /// left untouched.
    pub fn advance(&mut self, to: ResourceState) -> Result<()> {
        if !self.state.can_advance(to) {
            return Err(OrchestratorError::InvalidTransition {
                resource: self.id,
                from: self.state,
                to,
            });
        }

        debug!(resource = self.id.0; "{:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }
}
