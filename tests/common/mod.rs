#![allow(dead_code)]

use std::path::PathBuf;

use symtest::Program;

pub fn initialize_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn demo_path(name: &str) -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../demos")).join(format!("{name}.json"))
}

pub fn demo(name: &str) -> Program {
    let path = demo_path(name);
    Program::from_file(&path)
        .unwrap_or_else(|err| panic!("failed to load {}: {err}", path.display()))
}
