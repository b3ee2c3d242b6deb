// src/graph/mod.rs

//! Graph and task model.
//!
//! - [`task`] defines task identity, the kind discriminant, backend tags and
//!   the computation type.
//! - [`graph`] owns registered tasks and enforces the construction
//!   invariants (visibility, name uniqueness, terminal returns, freezing).

pub mod graph;
pub mod task;

pub use graph::Graph;
pub use task::{Backend, Computation, Task, TaskHandle, TaskId, TaskKind};
