// src/graph/task.rs

//! Task identity, kinds, backends and computations.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::{ComputeError, Value};

/// Task identifier, unique and strictly increasing within its owning graph.
pub type TaskId = u64;

/// Per-task routing hint. Only the hybrid executor distinguishes the two;
/// the homogeneous executors run everything on their single pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Thread,
    Process,
}

/// Discriminant for the four task variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// Interior computation node.
    Plain,
    /// Root whose value list is supplied externally by position.
    PositionalInput,
    /// Root whose value list is supplied externally by name.
    NamedInput,
    /// Terminal node whose value is part of the run's result.
    Return,
}

impl TaskKind {
    pub fn is_input(self) -> bool {
        matches!(self, TaskKind::PositionalInput | TaskKind::NamedInput)
    }

    pub fn is_named_input(self) -> bool {
        matches!(self, TaskKind::NamedInput)
    }

    pub fn is_return(self) -> bool {
        matches!(self, TaskKind::Return)
    }
}

/// The unit of computation wrapped by a task.
///
/// Arguments arrive in the task's parent declaration order; input tasks
/// receive the externally supplied value list instead.
pub type Computation = Arc<dyn Fn(&[Value]) -> Result<Value, ComputeError> + Send + Sync>;

/// Registration token returned by the graph construction calls.
///
/// Carries the owning graph's identity so that handles from one graph are
/// rejected as parents in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    pub(crate) graph_id: u64,
    pub(crate) task_id: TaskId,
}

impl TaskHandle {
    /// The task's id within its owning graph.
    pub fn id(&self) -> TaskId {
        self.task_id
    }
}

/// A graph node: one computation plus its dependency links.
///
/// Tasks are owned by their graph; `parents` / `children` are ids within
/// the same graph, in wiring order. Duplicates are allowed (a task may
/// consume the same parent twice) and the scheduling counters stay
/// consistent with that.
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) kind: TaskKind,
    pub(crate) backend: Backend,
    pub(crate) name: Option<String>,
    pub(crate) computation: Computation,
    pub(crate) parents: Vec<TaskId>,
    pub(crate) children: Vec<TaskId>,
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Name, present for named inputs and returns.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parents(&self) -> &[TaskId] {
        &self.parents
    }

    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub(crate) fn computation(&self) -> &Computation {
        &self.computation
    }

    /// Invoke the wrapped computation.
    pub(crate) fn call(&self, inputs: &[Value]) -> Result<Value, ComputeError> {
        invoke(&self.computation, inputs)
    }
}

/// Call a computation behind its `Arc`.
pub(crate) fn invoke(computation: &Computation, inputs: &[Value]) -> Result<Value, ComputeError> {
    let f: &(dyn Fn(&[Value]) -> Result<Value, ComputeError> + Send + Sync) =
        computation.as_ref();
    f(inputs)
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("backend", &self.backend)
            .field("name", &self.name)
            .field("parents", &self.parents)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
