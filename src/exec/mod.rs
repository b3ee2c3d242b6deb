// src/exec/mod.rs

//! The executor family.
//!
//! Four interchangeable strategies consume a built [`Graph`] plus concrete
//! input values and produce the return tasks' values in declaration order:
//!
//! - [`SequentialExecutor`]: single-threaded topological worklist.
//! - [`ThreadExecutor`] / [`ProcessExecutor`]: one homogeneous worker pool.
//! - [`HybridExecutor`]: two pools, with per-task routing by backend tag.
//!
//! All four share the scheduling skeleton in `state`: a dependency
//! countdown, a FIFO ready queue and a reference-counted store of
//! intermediate results. For a fixed graph and fixed inputs, the four
//! strategies produce identical outputs.

pub(crate) mod pool;
pub mod pooled;
pub mod sequential;
pub(crate) mod state;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::graph::Graph;
use crate::value::Value;

/// Future returned by [`Executor::run`].
pub type BoxedRun<'a> = Pin<Box<dyn Future<Output = Result<Vec<Value>>> + Send + 'a>>;

/// Common executor contract.
///
/// `positional` supplies one value list per positional input task in
/// declaration order; `named` supplies a value list per named input task.
/// Outputs are the return tasks' values in their declaration order.
///
/// Boxed-future form so executors can be used as trait objects.
pub trait Executor: Send + Sync {
    fn run<'a>(
        &'a self,
        graph: &'a Graph,
        positional: &'a [Vec<Value>],
        named: &'a HashMap<String, Vec<Value>>,
    ) -> BoxedRun<'a>;
}

pub use pooled::{HybridExecutor, ProcessExecutor, ThreadExecutor};
pub use sequential::SequentialExecutor;
