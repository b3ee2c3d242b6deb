// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use tracing_subscriber::{EnvFilter, fmt};

use flowdag::{Backend, Computation, Graph, Value, ops};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Uses `with_test_writer()`, so logs are captured per-test and only printed
/// for failing tests (unless run with `-- --nocapture`). Enable levels with
/// e.g. `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Arithmetic DAG: positional inputs `a`, `b`; returns `add`, `sub`, `mul`,
/// `div` (integer division), with `mul` and `div` process-routed.
pub fn arithmetic_graph() -> Graph {
    let mut g = Graph::new("arith");
    let a = g.input(ops::echo(), Backend::Thread).unwrap();
    let b = g.input(ops::echo(), Backend::Thread).unwrap();
    g.ret("add", ops::add(), &[a, b], Backend::Thread).unwrap();
    g.ret("sub", ops::sub(), &[a, b], Backend::Thread).unwrap();
    g.ret("mul", ops::mul(), &[a, b], Backend::Process).unwrap();
    g.ret("div", ops::floor_div(), &[a, b], Backend::Process)
        .unwrap();
    g.freeze();
    g
}

/// Inputs for [`arithmetic_graph`]: a = 2, b = 1.
pub fn arithmetic_inputs() -> Vec<Vec<Value>> {
    vec![vec![Value::Int(2)], vec![Value::Int(1)]]
}

/// Expected outputs for [`arithmetic_graph`] with [`arithmetic_inputs`].
pub fn arithmetic_outputs() -> Vec<Value> {
    vec![Value::Int(3), Value::Int(1), Value::Int(2), Value::Int(2)]
}

/// Shared, thread-safe log of computation invocations.
pub type CallLog = Arc<Mutex<Vec<Vec<Value>>>>;

/// A computation that records its argument list into `log`, then yields
/// `Unit`.
pub fn recording(log: &CallLog) -> Computation {
    let log = Arc::clone(log);
    ops::computation(move |args| {
        log.lock().unwrap().push(args.to_vec());
        Ok(Value::Unit)
    })
}

/// Shared, thread-safe log of task labels, for ordering assertions.
pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

/// A computation that records `label` when invoked, then forwards its first
/// argument (or `Unit` when it has none).
pub fn labelled(log: &EventLog, label: &'static str) -> Computation {
    let log = Arc::clone(log);
    ops::computation(move |args| {
        log.lock().unwrap().push(label);
        Ok(args.first().cloned().unwrap_or(Value::Unit))
    })
}
