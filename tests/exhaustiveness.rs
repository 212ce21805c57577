mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;
use solver::SatSolver;
use symtest::{explore, replay, ExplorerConfig, Program, TestVector, VectorEntry};

/// Classifies a byte `x` by `x < below` and `x == equal`. Each of the four leaves returns a
/// distinct value.
fn classifier(below: u8, equal: u8) -> Program {
    let json = format!(
        r#"{{
            "name": "classifier",
            "memory_size": 1,
            "instructions": [
                {{ "op": "MAKE_SYMBOLIC", "name": "x", "inputs": ["const:0x0#8", "const:0x1#8"] }},
                {{ "op": "INT_LESS", "output": "tmp:0#1", "inputs": ["ram:0#1", "const:{below}#1"] }},
                {{ "op": "CBRANCH", "inputs": ["const:7#8", "tmp:0#1"] }},
                {{ "op": "INT_EQUAL", "output": "tmp:1#1", "inputs": ["ram:0#1", "const:{equal}#1"] }},
                {{ "op": "CBRANCH", "inputs": ["const:6#8", "tmp:1#1"] }},
                {{ "op": "RETURN", "inputs": ["const:4#1"] }},
                {{ "op": "RETURN", "inputs": ["const:3#1"] }},
                {{ "op": "INT_EQUAL", "output": "tmp:1#1", "inputs": ["ram:0#1", "const:{equal}#1"] }},
                {{ "op": "CBRANCH", "inputs": ["const:10#8", "tmp:1#1"] }},
                {{ "op": "RETURN", "inputs": ["const:2#1"] }},
                {{ "op": "RETURN", "inputs": ["const:1#1"] }}
            ]
        }}"#
    );

    Program::from_json(&json).expect("classifier should be valid")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn paths_partition_the_input_space(below in any::<u8>(), equal in any::<u8>()) {
        common::initialize_logger();
        let program = classifier(below, equal);

        let tests = explore(&program, SatSolver::new(), ExplorerConfig::default())
            .collect::<Result<Vec<_>, _>>()
            .expect("exploration should succeed");

        let explored: Vec<_> = tests.iter().map(|(_, outcome)| outcome.clone()).collect();
        let distinct: BTreeSet<_> = explored.iter().cloned().collect();
        prop_assert_eq!(explored.len(), distinct.len(), "two vectors took the same path");

        let reachable: BTreeSet<_> = (0..=u8::MAX)
            .map(|x| {
                let vector = TestVector::new(0, vec![VectorEntry::new("x", [x])]);
                replay(&program, &vector).expect("replay should succeed")
            })
            .collect();
        prop_assert_eq!(&distinct, &reachable);

        for (vector, outcome) in &tests {
            prop_assert_eq!(&replay(&program, vector).expect("replay should succeed"), outcome);
        }
    }
}
