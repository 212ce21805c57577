mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use ktest::KTest;
use solver::SatSolver;
use symtest::output::{OutputDirectory, RunInfo, TestRecord, INFO_FILE};
use symtest::{explore, replay, ExecutionOutcome, ExplorerConfig, TestVector};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Explores a demo into `dir` through the library API.
fn explore_into(name: &str, dir: &TempDir) -> Result<OutputDirectory, Box<dyn std::error::Error>> {
    let program = common::demo(name);
    let output = OutputDirectory::create(dir.child("out").path())?;
    let args = [program.name.clone()];
    let config = ExplorerConfig::default();

    let mut tests = Vec::new();
    let mut exploration = explore(&program, SatSolver::new(), config.clone());
    for result in exploration.by_ref() {
        let (vector, outcome) = result?;
        output.write_test(&vector, &outcome, &args)?;
        tests.push(TestRecord {
            file: vector.file_name(),
            exit_status: outcome.exit_status(),
            outcome,
        });
    }

    output.write_info(&RunInfo {
        program: program.name.clone(),
        solver: String::from("sat"),
        config,
        stats: exploration.stats(),
        tests,
        errors: Vec::new(),
    })?;

    Ok(output)
}

#[test]
fn written_tests_replay() -> TestResult {
    common::initialize_logger();
    let dir = TempDir::new()?;
    let output = explore_into("get_sign", &dir)?;
    let program = common::demo("get_sign");

    let info: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.path().join(INFO_FILE))?)?;
    let records = info["tests"].as_array().cloned().unwrap_or_default();
    assert_eq!(records.len(), 3);

    for record in records {
        let file = record["file"].as_str().unwrap_or_default();
        let vector = TestVector::load(output.path().join(file))?;
        let recorded: ExecutionOutcome = serde_json::from_value(record["outcome"].clone())?;
        assert_eq!(replay(&program, &vector)?, recorded);

        let ktest = KTest::from_file(output.path().join(file))?;
        assert_eq!(ktest.args, ["get_sign"]);
    }

    Ok(())
}

#[test]
fn abort_files() -> TestResult {
    common::initialize_logger();
    let dir = TempDir::new()?;
    let output = explore_into("checked_add", &dir)?;

    let mut aborts = 0;
    for entry in std::fs::read_dir(output.path())? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if let Some(stem) = name.strip_suffix(".abort.err") {
            aborts += 1;
            let message = std::fs::read_to_string(&path)?;
            assert!(message.contains("addition overflowed"));
            assert!(output.path().join(format!("{stem}.ktest")).exists());
        }
    }

    assert_eq!(aborts, 1);
    Ok(())
}

#[test]
fn sum_first_elements() -> TestResult {
    common::initialize_logger();
    let dir = TempDir::new()?;
    let output = explore_into("sum_first_elements", &dir)?;
    let program = common::demo("sum_first_elements");

    let mut lengths = Vec::new();
    for ordinal in 1..=5 {
        let vector = TestVector::load(output.path().join(format!("test{ordinal:06}.ktest")))?;
        assert_eq!(vector.ordinal, ordinal);

        let arr = &vector.entry("arr").ok_or("missing arr")?.bytes;
        let n = vector.entry("n").ok_or("missing n")?.bytes[0];
        lengths.push(n);

        let sum = arr[..n as usize]
            .iter()
            .fold(0u8, |sum, x| sum.wrapping_add(*x));
        assert_eq!(
            replay(&program, &vector)?,
            ExecutionOutcome::Exit(i64::from(sum as i8))
        );
    }

    lengths.sort();
    assert_eq!(lengths, [0, 1, 2, 3, 4]);
    assert!(!output.path().join("test000006.ktest").exists());
    Ok(())
}
