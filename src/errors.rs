// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::graph::TaskId;
use crate::value::ComputeError;

#[derive(Error, Debug)]
pub enum FlowdagError {
    #[error("duplicated named input '{0}'")]
    DuplicateInputName(String),

    #[error("duplicated return name '{0}'")]
    DuplicateReturnName(String),

    #[error("parent task {0} is not registered in this graph")]
    UnknownParent(TaskId),

    #[error("parent task {0} belongs to a different graph")]
    ForeignParent(TaskId),

    #[error("return task {0} is terminal and cannot be used as a parent")]
    ReturnAsParent(TaskId),

    #[error("graph '{0}' is frozen; no further registration is allowed")]
    GraphFrozen(String),

    #[error("expected {expected} positional input lists, got {got}")]
    PositionalArity { expected: usize, got: usize },

    #[error("missing value list for named input '{0}'")]
    MissingNamedInput(String),

    #[error("unexpected named input '{0}'")]
    UnexpectedNamedInput(String),

    #[error("task {id} failed: {source}")]
    Compute {
        id: TaskId,
        #[source]
        source: ComputeError,
    },

    #[error("worker pool needs at least one worker")]
    EmptyPool,

    #[error("encoding payload for process-routed task {id}: {source}")]
    Encode {
        id: TaskId,
        #[source]
        source: serde_json::Error,
    },

    #[error("decoding payload for process-routed task {id}: {source}")]
    Decode {
        id: TaskId,
        #[source]
        source: serde_json::Error,
    },

    #[error("worker task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowdagError>;
