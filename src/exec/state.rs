// src/exec/state.rs

//! Shared scheduling skeleton used by all four executor variants.
//!
//! One [`RunState`] per run owns:
//! - the dependency-countdown table (`waiting`): remaining unresolved
//!   parents per non-root task;
//! - the ready queue, seeded with the graph roots in registration order;
//! - the reference-counted store of intermediate results, keyed by task id.
//!
//! A store entry's consumer count is fixed at creation to the task's child
//! count; each consumption decrements it and the entry is evicted the moment
//! the count reaches zero. Entries created with zero consumers (returns and
//! childless sinks) are never decremented and survive until final assembly.
//! Peak memory is therefore bounded by the live frontier of the DAG, not by
//! the whole graph's output set.
//!
//! The state is owned and mutated by exactly one dispatching context; the
//! pooled executors never share it with their workers.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::errors::{FlowdagError, Result};
use crate::graph::{Graph, Task, TaskId, TaskKind};
use crate::value::Value;

/// An intermediate result plus the number of consumers it still has to feed.
#[derive(Debug)]
struct Stored {
    value: Value,
    remaining: usize,
}

#[derive(Debug)]
pub(crate) struct RunState {
    waiting: HashMap<TaskId, usize>,
    ready: VecDeque<TaskId>,
    store: HashMap<TaskId, Stored>,
}

impl RunState {
    pub(crate) fn new(graph: &Graph) -> Self {
        let waiting = graph
            .tasks()
            .filter(|task| !task.is_root())
            .map(|task| (task.id(), task.parents().len()))
            .collect();

        Self {
            waiting,
            ready: graph.roots().iter().copied().collect(),
            store: HashMap::new(),
        }
    }

    /// Pop the earliest-ready task, FIFO.
    pub(crate) fn next_ready(&mut self) -> Option<TaskId> {
        self.ready.pop_front()
    }

    /// Gather the task's arguments.
    ///
    /// Input tasks read the external value lists; everything else consumes
    /// its parents' store entries in parent order, decrementing each entry
    /// and evicting it once its last consumer is satisfied.
    pub(crate) fn inputs_for(
        &mut self,
        graph: &Graph,
        task: &Task,
        positional: &[Vec<Value>],
        named: &HashMap<String, Vec<Value>>,
    ) -> Result<Vec<Value>> {
        match task.kind() {
            TaskKind::PositionalInput => {
                let index = graph
                    .positional_index(task.id())
                    .ok_or_else(|| internal(task.id(), "positional input not indexed"))?;
                Ok(positional[index].clone())
            }
            TaskKind::NamedInput => {
                // Presence was checked by `validate_inputs`.
                let name = task.name().unwrap_or_default();
                named
                    .get(name)
                    .cloned()
                    .ok_or_else(|| FlowdagError::MissingNamedInput(name.to_string()))
            }
            TaskKind::Plain | TaskKind::Return => {
                let mut inputs = Vec::with_capacity(task.parents().len());
                for &parent in task.parents() {
                    inputs.push(self.consume(parent, task.id())?);
                }
                Ok(inputs)
            }
        }
    }

    /// Read one parent value, decrement its consumer count and evict the
    /// entry when the count reaches zero.
    fn consume(&mut self, parent: TaskId, consumer: TaskId) -> Result<Value> {
        let entry = self
            .store
            .get_mut(&parent)
            .ok_or_else(|| internal(consumer, "parent value missing from store"))?;
        let value = entry.value.clone();
        entry.remaining -= 1;
        if entry.remaining == 0 {
            self.store.remove(&parent);
            trace!(task = parent, "evicted store entry after last consumer");
        }
        Ok(value)
    }

    /// Record a completed task's value and promote children whose waiting
    /// count has reached zero to the ready queue.
    pub(crate) fn record(&mut self, graph: &Graph, id: TaskId, value: Value) -> Result<()> {
        let task = graph
            .get(id)
            .ok_or_else(|| internal(id, "completed task not in graph"))?;

        self.store.insert(
            id,
            Stored {
                value,
                remaining: task.children().len(),
            },
        );

        for &child in task.children() {
            if let Some(count) = self.waiting.get_mut(&child) {
                *count -= 1;
                if *count == 0 {
                    self.waiting.remove(&child);
                    self.ready.push_back(child);
                    debug!(task = child, "all parents resolved; task ready");
                }
            }
        }
        Ok(())
    }

    /// Assemble the return tasks' values in declaration order and drop
    /// whatever is left in the store.
    pub(crate) fn assemble(mut self, graph: &Graph) -> Result<Vec<Value>> {
        let mut outputs = Vec::with_capacity(graph.returns().len());
        for &id in graph.returns() {
            let entry = self
                .store
                .remove(&id)
                .ok_or_else(|| internal(id, "return task produced no value"))?;
            outputs.push(entry.value);
        }
        Ok(outputs)
    }

    #[cfg(test)]
    pub(crate) fn store_len(&self) -> usize {
        self.store.len()
    }

    #[cfg(test)]
    pub(crate) fn store_contains(&self, id: TaskId) -> bool {
        self.store.contains_key(&id)
    }

    #[cfg(test)]
    pub(crate) fn into_store_ids(self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.store.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Check the external inputs against the graph's declared input slots before
/// any task runs: one value list per positional input, every named input
/// present, no stray names.
pub(crate) fn validate_inputs(
    graph: &Graph,
    positional: &[Vec<Value>],
    named: &HashMap<String, Vec<Value>>,
) -> Result<()> {
    if positional.len() != graph.positional_inputs().len() {
        return Err(FlowdagError::PositionalArity {
            expected: graph.positional_inputs().len(),
            got: positional.len(),
        });
    }
    for name in graph.named_inputs().keys() {
        if !named.contains_key(name) {
            return Err(FlowdagError::MissingNamedInput(name.clone()));
        }
    }
    for name in named.keys() {
        if !graph.named_inputs().contains_key(name) {
            return Err(FlowdagError::UnexpectedNamedInput(name.clone()));
        }
    }
    Ok(())
}

/// Scheduling invariant violation. Reachable only through a bug in the
/// dispatch loop, never through user input.
fn internal(id: TaskId, msg: &str) -> FlowdagError {
    FlowdagError::Other(anyhow::anyhow!("task {id}: {msg}"))
}
