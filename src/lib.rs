// src/lib.rs

//! flowdag — an embeddable task-graph execution runtime.
//!
//! Callers declaratively build a directed acyclic graph of computation
//! nodes with explicit dependencies, typed input slots and designated
//! output nodes, then execute it under one of four interchangeable
//! concurrency strategies.
//!
//! This wires together:
//! - the graph/task model with its construction invariants ([`graph`])
//! - the runtime [`value::Value`] type and stock computations ([`ops`])
//! - the executor family sharing one scheduling skeleton ([`exec`])
//!
//! ```no_run
//! use std::collections::HashMap;
//! use flowdag::{Backend, Graph, SequentialExecutor, Value, ops};
//!
//! # fn main() -> flowdag::Result<()> {
//! let mut graph = Graph::new("arith");
//! let a = graph.input(ops::echo(), Backend::Thread)?;
//! let b = graph.input(ops::echo(), Backend::Thread)?;
//! graph.ret("sum", ops::add(), &[a, b], Backend::Thread)?;
//! graph.freeze();
//!
//! let executor = SequentialExecutor::new();
//! let positional = vec![vec![Value::Int(2)], vec![Value::Int(1)]];
//! let outputs = executor.run_blocking(&graph, &positional, &HashMap::new())?;
//! assert_eq!(outputs, vec![Value::Int(3)]);
//! # Ok(())
//! # }
//! ```
//!
//! Dependency order is the only ordering guarantee: a task never runs
//! before all of its parents have produced values, and independent branches
//! complete in any relative order. Intermediate results are evicted as soon
//! as their last consumer has read them.

pub mod errors;
pub mod exec;
pub mod graph;
pub mod ops;
pub mod value;

pub use errors::{FlowdagError, Result};
pub use exec::{
    BoxedRun, Executor, HybridExecutor, ProcessExecutor, SequentialExecutor, ThreadExecutor,
};
pub use graph::{Backend, Computation, Graph, Task, TaskHandle, TaskId, TaskKind};
pub use value::{ComputeError, Value};
