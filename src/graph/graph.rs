// src/graph/graph.rs

//! Graph construction and registration invariants.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::errors::{FlowdagError, Result};
use crate::graph::task::{Backend, Computation, Task, TaskHandle, TaskId, TaskKind};

/// Process-unique graph identities, used to reject handles from foreign
/// graphs at registration time.
static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// An owned collection of tasks with registration invariants and designated
/// inputs / returns.
///
/// The graph itself is the construction context: every construction call is
/// a method taking `&mut self`, so nothing is ambient and two graphs built
/// with the same call sequence are fully independent.
#[derive(Debug)]
pub struct Graph {
    name: String,
    graph_id: u64,
    next_task_id: TaskId,
    /// Id-keyed task index; iteration order equals registration order.
    tasks: BTreeMap<TaskId, Task>,
    positional_inputs: Vec<TaskId>,
    named_inputs: HashMap<String, TaskId>,
    returns: Vec<TaskId>,
    roots: Vec<TaskId>,
    frozen: bool,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph_id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            next_task_id: 0,
            tasks: BTreeMap::new(),
            positional_inputs: Vec::new(),
            named_inputs: HashMap::new(),
            returns: Vec::new(),
            roots: Vec::new(),
            frozen: false,
        }
    }

    /// Register a positional input task. Its external value list is matched
    /// by construction order at run time.
    pub fn input(&mut self, computation: Computation, backend: Backend) -> Result<TaskHandle> {
        self.register(TaskKind::PositionalInput, None, computation, &[], backend)
    }

    /// Register a named input task. The name must be unique among named
    /// inputs of this graph.
    pub fn named_input(
        &mut self,
        name: impl Into<String>,
        computation: Computation,
        backend: Backend,
    ) -> Result<TaskHandle> {
        self.register(TaskKind::NamedInput, Some(name.into()), computation, &[], backend)
    }

    /// Register an interior task depending on the given parents.
    pub fn task(
        &mut self,
        computation: Computation,
        parents: &[TaskHandle],
        backend: Backend,
    ) -> Result<TaskHandle> {
        self.register(TaskKind::Plain, None, computation, parents, backend)
    }

    /// Register a return task. Terminal: it can never be used as a parent.
    /// The name must be unique among returns of this graph; outputs surface
    /// in return registration order.
    pub fn ret(
        &mut self,
        name: impl Into<String>,
        computation: Computation,
        parents: &[TaskHandle],
        backend: Backend,
    ) -> Result<TaskHandle> {
        self.register(TaskKind::Return, Some(name.into()), computation, parents, backend)
    }

    /// Lock the graph against any further registration.
    pub fn freeze(&mut self) {
        self.frozen = true;
        debug!(graph = %self.name, tasks = self.tasks.len(), "graph frozen");
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// All registered tasks, in registration (id) order. External
    /// collaborators (visualizers, compilers) build on this plus
    /// [`Task::children`].
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Tasks with no parents, in registration order.
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    /// Positional input tasks, in construction order.
    pub fn positional_inputs(&self) -> &[TaskId] {
        &self.positional_inputs
    }

    /// Named input tasks by name.
    pub fn named_inputs(&self) -> &HashMap<String, TaskId> {
        &self.named_inputs
    }

    /// Return tasks, in construction order.
    pub fn returns(&self) -> &[TaskId] {
        &self.returns
    }

    /// Position of a positional input task in the declaration order.
    pub(crate) fn positional_index(&self, id: TaskId) -> Option<usize> {
        self.positional_inputs.iter().position(|&input| input == id)
    }

    /// Validate the construction invariants, then assign the next id, index
    /// the task and wire the parent/child links. All side effects stay
    /// inside this graph.
    fn register(
        &mut self,
        kind: TaskKind,
        name: Option<String>,
        computation: Computation,
        parents: &[TaskHandle],
        backend: Backend,
    ) -> Result<TaskHandle> {
        if self.frozen {
            return Err(FlowdagError::GraphFrozen(self.name.clone()));
        }

        if let Some(ref name) = name {
            match kind {
                TaskKind::NamedInput if self.named_inputs.contains_key(name) => {
                    return Err(FlowdagError::DuplicateInputName(name.clone()));
                }
                TaskKind::Return => {
                    let duplicate = self
                        .returns
                        .iter()
                        .filter_map(|id| self.tasks[id].name())
                        .any(|existing| existing == name);
                    if duplicate {
                        return Err(FlowdagError::DuplicateReturnName(name.clone()));
                    }
                }
                _ => {}
            }
        }

        for handle in parents {
            if handle.graph_id != self.graph_id {
                return Err(FlowdagError::ForeignParent(handle.task_id));
            }
            let parent = self
                .tasks
                .get(&handle.task_id)
                .ok_or(FlowdagError::UnknownParent(handle.task_id))?;
            if parent.kind.is_return() {
                return Err(FlowdagError::ReturnAsParent(handle.task_id));
            }
        }

        self.next_task_id += 1;
        let id = self.next_task_id;

        let task = Task {
            id,
            kind,
            backend,
            name,
            computation,
            parents: parents.iter().map(|h| h.task_id).collect(),
            children: Vec::new(),
        };

        match kind {
            TaskKind::PositionalInput => self.positional_inputs.push(id),
            TaskKind::NamedInput => {
                // Uniqueness was checked above; names of named inputs index
                // the external value map at run time.
                let name = task.name.clone().unwrap_or_default();
                self.named_inputs.insert(name, id);
            }
            TaskKind::Return => self.returns.push(id),
            TaskKind::Plain => {}
        }

        if parents.is_empty() {
            self.roots.push(id);
        } else {
            for handle in parents {
                // Parent presence was validated above.
                if let Some(parent) = self.tasks.get_mut(&handle.task_id) {
                    parent.children.push(id);
                }
            }
        }

        debug!(
            graph = %self.name,
            task = id,
            kind = ?kind,
            backend = ?backend,
            parents = parents.len(),
            "registered task"
        );

        self.tasks.insert(id, task);
        Ok(TaskHandle {
            graph_id: self.graph_id,
            task_id: id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;

    #[test]
    fn ids_are_assigned_in_registration_order_from_one() {
        let mut g = Graph::new("ids");
        let a = g.input(ops::echo(), Backend::Thread).unwrap();
        let b = g.input(ops::echo(), Backend::Thread).unwrap();
        let c = g.task(ops::add(), &[a, b], Backend::Thread).unwrap();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert_eq!(c.id(), 3);
    }

    #[test]
    fn bookkeeping_tracks_roots_inputs_and_returns() {
        let mut g = Graph::new("bookkeeping");
        let a = g.input(ops::echo(), Backend::Thread).unwrap();
        let b = g.named_input("b", ops::echo(), Backend::Thread).unwrap();
        let sum = g.task(ops::add(), &[a, b], Backend::Thread).unwrap();
        let out = g.ret("sum", ops::echo(), &[sum], Backend::Thread).unwrap();

        assert_eq!(g.roots(), &[a.id(), b.id()]);
        assert_eq!(g.positional_inputs(), &[a.id()]);
        assert_eq!(g.named_inputs()["b"], b.id());
        assert_eq!(g.returns(), &[out.id()]);
        assert_eq!(g.get(a.id()).unwrap().children(), &[sum.id()]);
        assert_eq!(g.get(out.id()).unwrap().parents(), &[sum.id()]);
    }

    #[test]
    fn duplicate_named_input_is_rejected() {
        let mut g = Graph::new("dup");
        g.named_input("x", ops::echo(), Backend::Thread).unwrap();
        let err = g.named_input("x", ops::echo(), Backend::Thread).unwrap_err();
        assert!(matches!(err, FlowdagError::DuplicateInputName(name) if name == "x"));
    }

    #[test]
    fn duplicate_return_name_is_rejected() {
        let mut g = Graph::new("dup_ret");
        let a = g.input(ops::echo(), Backend::Thread).unwrap();
        g.ret("out", ops::echo(), &[a], Backend::Thread).unwrap();
        let err = g.ret("out", ops::echo(), &[a], Backend::Thread).unwrap_err();
        assert!(matches!(err, FlowdagError::DuplicateReturnName(name) if name == "out"));
    }

    #[test]
    fn return_task_cannot_be_a_parent() {
        let mut g = Graph::new("terminal");
        let a = g.input(ops::echo(), Backend::Thread).unwrap();
        let r = g.ret("out", ops::echo(), &[a], Backend::Thread).unwrap();
        let err = g.task(ops::echo(), &[r], Backend::Thread).unwrap_err();
        assert!(matches!(err, FlowdagError::ReturnAsParent(id) if id == r.id()));
    }

    #[test]
    fn handle_from_another_graph_is_rejected() {
        let mut g1 = Graph::new("one");
        let mut g2 = Graph::new("two");
        let foreign = g1.input(ops::echo(), Backend::Thread).unwrap();
        let err = g2.task(ops::echo(), &[foreign], Backend::Thread).unwrap_err();
        assert!(matches!(err, FlowdagError::ForeignParent(id) if id == foreign.id()));
    }

    #[test]
    fn frozen_graph_rejects_registration() {
        let mut g = Graph::new("frozen");
        g.input(ops::echo(), Backend::Thread).unwrap();
        g.freeze();
        let err = g.input(ops::echo(), Backend::Thread).unwrap_err();
        assert!(matches!(err, FlowdagError::GraphFrozen(_)));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn duplicate_parent_wires_both_edges() {
        let mut g = Graph::new("dup_edge");
        let a = g.input(ops::echo(), Backend::Thread).unwrap();
        let twice = g.task(ops::add(), &[a, a], Backend::Thread).unwrap();
        assert_eq!(g.get(a.id()).unwrap().children(), &[twice.id(), twice.id()]);
        assert_eq!(g.get(twice.id()).unwrap().parents(), &[a.id(), a.id()]);
    }
}
