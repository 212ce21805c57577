use assert_fs::prelude::*;
use assert_fs::TempDir;

use crate::vector::*;

fn vector() -> TestVector {
    TestVector::new(
        3,
        vec![
            VectorEntry::new("a", vec![1, 2, 3, 4]),
            VectorEntry::new("b", vec![0xff]),
        ],
    )
}

#[test]
fn file_name() {
    assert_eq!(vector().file_name(), "test000003.ktest");
    assert_eq!(TestVector::new(1234567, Vec::new()).file_name(), "test1234567.ktest");
}

#[test]
fn entry_lookup() {
    let vector = vector();
    assert_eq!(vector.entry("b").map(|e| e.bytes.as_slice()), Some(&[0xff][..]));
    assert!(vector.entry("c").is_none());
}

#[test]
fn ktest_conversion() {
    let vector = vector();
    let ktest = vector.to_ktest(vec![String::from("get_sign")]);
    assert_eq!(ktest.args, ["get_sign"]);
    assert_eq!(ktest.objects.len(), 2);
    assert_eq!(ktest.objects[0].name, "a");
    assert_eq!(ktest.objects[1].bytes, [0xff]);

    assert_eq!(TestVector::from_ktest(3, ktest), vector);
}

#[test]
fn load_recovers_ordinal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let vector = vector();

    let file = dir.child(vector.file_name());
    vector.to_ktest(Vec::new()).to_file(file.path())?;
    assert_eq!(TestVector::load(file.path())?, vector);

    let renamed = dir.child("custom.ktest");
    vector.to_ktest(Vec::new()).to_file(renamed.path())?;
    assert_eq!(TestVector::load(renamed.path())?.ordinal, 0);
    Ok(())
}

#[test]
fn load_missing_file() {
    assert!(matches!(
        TestVector::load("/nonexistent/test000001.ktest"),
        Err(ktest::Error::Io(_))
    ));
}
