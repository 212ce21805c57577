use assert_fs::prelude::*;
use assert_fs::TempDir;
use ktest::KTest;

use crate::explorer::{ExplorationStats, ExplorerConfig};
use crate::outcome::{ExecutionOutcome, ExitStatus};
use crate::output::*;
use crate::vector::{TestVector, VectorEntry};

fn vector(ordinal: usize) -> TestVector {
    TestVector::new(ordinal, vec![VectorEntry::new("a", [0xffu8; 4])])
}

#[test]
fn next_free_directory() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let first = OutputDirectory::create_next(temp.path())?;
    let second = OutputDirectory::create_next(temp.path())?;

    assert_eq!(first.path(), temp.child("symtest-out-0").path());
    assert_eq!(second.path(), temp.child("symtest-out-1").path());

    #[cfg(unix)]
    assert_eq!(
        std::fs::read_link(temp.child(LAST_LINK).path())?,
        std::path::PathBuf::from("symtest-out-1")
    );
    Ok(())
}

#[test]
fn explicit_directory_must_not_exist() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = temp.child("nested").child("out");
    OutputDirectory::create(path.path())?;
    assert!(path.path().is_dir());

    assert!(matches!(
        OutputDirectory::create(path.path()),
        Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::AlreadyExists
    ));
    Ok(())
}

#[test]
fn write_tests() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = OutputDirectory::create(temp.child("out").path())?;
    let args = [String::from("get_sign")];

    let exit = output.write_test(&vector(1), &ExecutionOutcome::Exit(-1), &args)?;
    assert_eq!(exit, temp.child("out/test000001.ktest").path());
    let ktest = KTest::from_file(&exit)?;
    assert_eq!(ktest.args, args);
    assert_eq!(ktest.object("a").map(|o| o.bytes.clone()), Some(vec![0xff; 4]));
    assert!(!temp.child("out/test000001.abort.err").path().exists());

    let abort = ExecutionOutcome::Abort(String::from("overflow"));
    output.write_test(&vector(2), &abort, &args)?;
    assert!(temp.child("out/test000002.ktest").path().exists());
    let message = std::fs::read_to_string(temp.child("out/test000002.abort.err").path())?;
    assert!(message.contains("overflow"));
    Ok(())
}

#[test]
fn write_info() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = OutputDirectory::create(temp.child("out").path())?;
    let info = RunInfo {
        program: String::from("get_sign"),
        solver: String::from("sat"),
        config: ExplorerConfig::default(),
        stats: ExplorationStats {
            completed_paths: 1,
            generated_tests: 1,
            ..Default::default()
        },
        tests: vec![TestRecord {
            file: String::from("test000001.ktest"),
            outcome: ExecutionOutcome::Exit(-1),
            exit_status: ExitStatus(255),
        }],
        errors: Vec::new(),
    };
    output.write_info(&info)?;

    let json = std::fs::read_to_string(temp.child("out").child(INFO_FILE).path())?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["program"], "get_sign");
    assert_eq!(value["stats"]["generated_tests"], 1);
    assert_eq!(value["tests"][0]["outcome"]["exit"], -1);
    assert_eq!(value["tests"][0]["exit_status"], 255);
    Ok(())
}
