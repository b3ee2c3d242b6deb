// src/exec/pool.rs

//! Worker pools for the pooled executors.
//!
//! A [`WorkerPool`] bounds concurrency with a semaphore of `worker_count`
//! permits; each submission acquires a permit and runs the computation on
//! the blocking thread pool (computations are synchronous and may be
//! CPU-bound). Completions surface through the caller's `JoinSet`, which is
//! the single completion stream the dispatch loop blocks on — and which
//! aborts whatever is still in flight when the run exits early.
//!
//! The process-like pool additionally round-trips the input slice and the
//! output value through serde across the submission boundary. Arbitrary
//! closures cannot be shipped to another OS process, but the payload
//! contract they would have to satisfy can be enforced: every value entering
//! or leaving a process-routed task is encoded and decoded, exactly as a
//! real process boundary would require.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::trace;

use crate::errors::{FlowdagError, Result};
use crate::graph::task::invoke;
use crate::graph::{Computation, TaskId};
use crate::value::Value;

/// What crossing the submission boundary costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PoolMode {
    /// Thread-like: values move by ownership, no encoding.
    InProcess,
    /// Process-like: values round-trip through serde.
    Isolated,
}

/// Completion message: which task finished and how.
pub(crate) type Completion = (TaskId, Result<Value>);

#[derive(Debug, Clone)]
pub(crate) struct WorkerPool {
    permits: Arc<Semaphore>,
    mode: PoolMode,
}

impl WorkerPool {
    /// Acquire a pool of `worker_count` workers. Zero workers is a
    /// construction error, not a hang at run time.
    pub(crate) fn new(worker_count: usize, mode: PoolMode) -> Result<Self> {
        if worker_count == 0 {
            return Err(FlowdagError::EmptyPool);
        }
        Ok(Self {
            permits: Arc::new(Semaphore::new(worker_count)),
            mode,
        })
    }

    /// Submit one computation. The spawned worker waits for a free permit,
    /// runs the computation and reports `(task_id, result)` through the set.
    pub(crate) fn submit(
        &self,
        workers: &mut JoinSet<Completion>,
        id: TaskId,
        computation: Computation,
        inputs: Vec<Value>,
    ) {
        let permits = Arc::clone(&self.permits);
        let mode = self.mode;

        workers.spawn(async move {
            let permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed while a run is in flight.
                Err(_) => {
                    return (
                        id,
                        Err(FlowdagError::Other(anyhow::anyhow!("worker pool closed"))),
                    );
                }
            };
            trace!(task = id, ?mode, "worker picked up task");

            let result = match mode {
                PoolMode::InProcess => run_in_process(id, computation, inputs).await,
                PoolMode::Isolated => run_isolated(id, computation, inputs).await,
            };

            drop(permit);
            (id, result)
        });
    }
}

async fn run_in_process(id: TaskId, computation: Computation, inputs: Vec<Value>) -> Result<Value> {
    let output = tokio::task::spawn_blocking(move || invoke(&computation, &inputs)).await?;
    output.map_err(|source| FlowdagError::Compute { id, source })
}

async fn run_isolated(id: TaskId, computation: Computation, inputs: Vec<Value>) -> Result<Value> {
    let payload =
        serde_json::to_vec(&inputs).map_err(|source| FlowdagError::Encode { id, source })?;

    let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let inputs: Vec<Value> = serde_json::from_slice(&payload)
            .map_err(|source| FlowdagError::Decode { id, source })?;
        let value =
            invoke(&computation, &inputs).map_err(|source| FlowdagError::Compute { id, source })?;
        serde_json::to_vec(&value).map_err(|source| FlowdagError::Encode { id, source })
    })
    .await??;

    serde_json::from_slice(&encoded).map_err(|source| FlowdagError::Decode { id, source })
}
