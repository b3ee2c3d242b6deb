// src/exec/pooled.rs

//! Pool-backed executors: thread, process, and hybrid.
//!
//! All three share one dispatch loop. The loop owns the scheduling state
//! exclusively: workers only run computations and report back through the
//! `JoinSet`, so no locking is needed on the waiting table or the store.
//! `join_next().await` is the loop's only suspension point.
//!
//! Routing is the only behavioral difference between the variants: the
//! homogeneous executors send every task to their single pool; the hybrid
//! executor inspects each task's backend tag.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{FlowdagError, Result};
use crate::exec::pool::{Completion, PoolMode, WorkerPool};
use crate::exec::state::{RunState, validate_inputs};
use crate::exec::{BoxedRun, Executor};
use crate::graph::{Backend, Graph, Task};
use crate::value::Value;

/// Homogeneous pool of thread-like workers.
#[derive(Debug)]
pub struct ThreadExecutor {
    pool: WorkerPool,
}

impl ThreadExecutor {
    pub fn new(worker_count: usize) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new(worker_count, PoolMode::InProcess)?,
        })
    }
}

impl Executor for ThreadExecutor {
    fn run<'a>(
        &'a self,
        graph: &'a Graph,
        positional: &'a [Vec<Value>],
        named: &'a HashMap<String, Vec<Value>>,
    ) -> BoxedRun<'a> {
        Box::pin(run_pooled(graph, positional, named, |_| self.pool.clone()))
    }
}

/// Homogeneous pool of process-like workers; every edge payload crosses a
/// serialization boundary.
#[derive(Debug)]
pub struct ProcessExecutor {
    pool: WorkerPool,
}

impl ProcessExecutor {
    pub fn new(worker_count: usize) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new(worker_count, PoolMode::Isolated)?,
        })
    }
}

impl Executor for ProcessExecutor {
    fn run<'a>(
        &'a self,
        graph: &'a Graph,
        positional: &'a [Vec<Value>],
        named: &'a HashMap<String, Vec<Value>>,
    ) -> BoxedRun<'a> {
        Box::pin(run_pooled(graph, positional, named, |_| self.pool.clone()))
    }
}

/// Two pools; each task is routed by its backend tag.
#[derive(Debug)]
pub struct HybridExecutor {
    thread_pool: WorkerPool,
    process_pool: WorkerPool,
}

impl HybridExecutor {
    pub fn new(thread_worker_count: usize, process_worker_count: usize) -> Result<Self> {
        Ok(Self {
            thread_pool: WorkerPool::new(thread_worker_count, PoolMode::InProcess)?,
            process_pool: WorkerPool::new(process_worker_count, PoolMode::Isolated)?,
        })
    }
}

impl Executor for HybridExecutor {
    fn run<'a>(
        &'a self,
        graph: &'a Graph,
        positional: &'a [Vec<Value>],
        named: &'a HashMap<String, Vec<Value>>,
    ) -> BoxedRun<'a> {
        Box::pin(run_pooled(graph, positional, named, |task| {
            match task.backend() {
                Backend::Thread => self.thread_pool.clone(),
                Backend::Process => self.process_pool.clone(),
            }
        }))
    }
}

/// Shared dispatch loop.
///
/// Roots are submitted immediately with their external inputs; afterwards
/// the loop blocks on the next completion, records it, and submits every
/// child whose waiting count hit zero. A failed computation aborts the run:
/// dropping the `JoinSet` on the error path detaches whatever is still
/// running and discards its result.
async fn run_pooled<R>(
    graph: &Graph,
    positional: &[Vec<Value>],
    named: &HashMap<String, Vec<Value>>,
    route: R,
) -> Result<Vec<Value>>
where
    R: Fn(&Task) -> WorkerPool,
{
    validate_inputs(graph, positional, named)?;
    info!(graph = %graph.name(), tasks = graph.len(), "starting pooled run");

    let mut state = RunState::new(graph);
    let mut workers: JoinSet<Completion> = JoinSet::new();

    submit_ready(graph, &mut state, &mut workers, &route, positional, named)?;

    while let Some(joined) = workers.join_next().await {
        let (id, result) = joined?;
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                warn!(task = id, error = %err, "task failed; aborting run");
                return Err(err);
            }
        };
        debug!(task = id, "task completed");
        state.record(graph, id, value)?;
        submit_ready(graph, &mut state, &mut workers, &route, positional, named)?;
    }

    debug!(graph = %graph.name(), "pooled run complete");
    state.assemble(graph)
}

/// Drain the ready queue: gather each task's inputs and hand it to its pool.
fn submit_ready<R>(
    graph: &Graph,
    state: &mut RunState,
    workers: &mut JoinSet<Completion>,
    route: &R,
    positional: &[Vec<Value>],
    named: &HashMap<String, Vec<Value>>,
) -> Result<()>
where
    R: Fn(&Task) -> WorkerPool,
{
    while let Some(id) = state.next_ready() {
        let task = graph
            .get(id)
            .ok_or_else(|| FlowdagError::Other(anyhow::anyhow!("task {id} not in graph")))?;
        let inputs = state.inputs_for(graph, task, positional, named)?;
        debug!(task = id, backend = ?task.backend(), "submitting task");
        route(task).submit(workers, id, Arc::clone(task.computation()), inputs);
    }
    Ok(())
}
