// tests/property_determinism.rs

//! Property test: for randomly generated DAGs the pooled executors must
//! produce exactly what the sequential executor produces.

mod common;

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use flowdag::{
    Backend, Executor, Graph, HybridExecutor, ProcessExecutor, SequentialExecutor, ThreadExecutor,
    Value, ops,
};

#[derive(Debug, Clone)]
struct NodeSpec {
    op: u8,
    left: usize,
    right: usize,
    process: bool,
}

/// Acyclic by construction: node N may only reference nodes 0..N-1
/// (indices are sanitized with a modulus when the graph is built).
fn plan_strategy() -> impl Strategy<Value = (Vec<i64>, Vec<NodeSpec>)> {
    let inputs = proptest::collection::vec(-50i64..50, 1..=3);
    let nodes = proptest::collection::vec(
        (any::<u8>(), any::<usize>(), any::<usize>(), any::<bool>()).prop_map(
            |(op, left, right, process)| NodeSpec {
                op,
                left,
                right,
                process,
            },
        ),
        1..=10,
    );
    (inputs, nodes)
}

fn build_graph(input_values: &[i64], nodes: &[NodeSpec]) -> (Graph, Vec<Vec<Value>>) {
    let mut g = Graph::new("random");
    let mut handles = Vec::new();
    let mut positional = Vec::new();

    for value in input_values {
        handles.push(g.input(ops::echo(), Backend::Thread).unwrap());
        positional.push(vec![Value::Int(*value)]);
    }

    let mut used_as_parent = HashSet::new();
    for spec in nodes {
        let left = handles[spec.left % handles.len()];
        let right = handles[spec.right % handles.len()];
        let op = match spec.op % 3 {
            0 => ops::add(),
            1 => ops::sub(),
            _ => ops::mul(),
        };
        let backend = if spec.process {
            Backend::Process
        } else {
            Backend::Thread
        };
        let node = g.task(op, &[left, right], backend).unwrap();
        used_as_parent.insert(left.id());
        used_as_parent.insert(right.id());
        handles.push(node);
    }

    // Expose every leaf as a return; the last node is always one.
    for (i, handle) in handles.iter().enumerate() {
        if !used_as_parent.contains(&handle.id()) {
            g.ret(format!("out{i}"), ops::echo(), &[*handle], Backend::Thread)
                .unwrap();
        }
    }
    g.freeze();
    (g, positional)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pooled_executors_match_sequential((input_values, nodes) in plan_strategy()) {
        let (graph, positional) = build_graph(&input_values, &nodes);
        let named = HashMap::new();

        let sequential = SequentialExecutor::new().run_blocking(&graph, &positional, &named);

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap();

        let pooled: Vec<Box<dyn Executor>> = vec![
            Box::new(ThreadExecutor::new(3).unwrap()),
            Box::new(ProcessExecutor::new(2).unwrap()),
            Box::new(HybridExecutor::new(2, 2).unwrap()),
        ];
        for executor in &pooled {
            let outcome = rt.block_on(executor.run(&graph, &positional, &named));
            match (&sequential, &outcome) {
                (Ok(expected), Ok(got)) => prop_assert_eq!(expected, got),
                // Overflow on the same task fails every strategy alike.
                (Err(_), Err(_)) => {}
                _ => prop_assert!(
                    false,
                    "executors disagreed: {:?} vs {:?}",
                    sequential,
                    outcome
                ),
            }
        }
    }
}
