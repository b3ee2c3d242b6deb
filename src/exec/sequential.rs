// src/exec/sequential.rs

//! Single-threaded executor: a synchronous topological worklist.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::{FlowdagError, Result};
use crate::exec::state::{RunState, validate_inputs};
use crate::exec::{BoxedRun, Executor};
use crate::graph::Graph;
use crate::value::Value;

/// Runs every task inline, earliest-ready first. Each computation finishes
/// before the next one is even considered, so the loop never suspends.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous entry point; [`Executor::run`] wraps this.
    pub fn run_blocking(
        &self,
        graph: &Graph,
        positional: &[Vec<Value>],
        named: &HashMap<String, Vec<Value>>,
    ) -> Result<Vec<Value>> {
        validate_inputs(graph, positional, named)?;
        let mut state = RunState::new(graph);

        while let Some(id) = state.next_ready() {
            let task = graph
                .get(id)
                .ok_or_else(|| FlowdagError::Other(anyhow::anyhow!("task {id} not in graph")))?;
            let inputs = state.inputs_for(graph, task, positional, named)?;
            let value = task
                .call(&inputs)
                .map_err(|source| FlowdagError::Compute { id, source })?;
            state.record(graph, id, value)?;
        }

        debug!(graph = %graph.name(), "sequential run complete");
        state.assemble(graph)
    }
}

impl Executor for SequentialExecutor {
    fn run<'a>(
        &'a self,
        graph: &'a Graph,
        positional: &'a [Vec<Value>],
        named: &'a HashMap<String, Vec<Value>>,
    ) -> BoxedRun<'a> {
        Box::pin(async move { self.run_blocking(graph, positional, named) })
    }
}
