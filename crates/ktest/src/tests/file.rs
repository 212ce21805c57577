use assert_fs::prelude::*;

use crate::*;

fn get_sign_test() -> KTest {
    KTest {
        args: vec![String::from("get_sign.json")],
        sym_argvs: 0,
        sym_argv_len: 0,
        objects: vec![KTestObject::new("a", 0xffffffffu32.to_le_bytes())],
    }
}

fn encode(ktest: &KTest) -> Vec<u8> {
    let mut buffer = Vec::new();
    ktest.write_to(&mut buffer).expect("failed to write ktest");
    buffer
}

#[test]
fn write_layout() {
    let bytes = encode(&get_sign_test());

    let mut expected = Vec::new();
    expected.extend_from_slice(b"KTEST");
    expected.extend_from_slice(&3u32.to_be_bytes());
    expected.extend_from_slice(&1u32.to_be_bytes());
    expected.extend_from_slice(&13u32.to_be_bytes());
    expected.extend_from_slice(b"get_sign.json");
    expected.extend_from_slice(&0u32.to_be_bytes());
    expected.extend_from_slice(&0u32.to_be_bytes());
    expected.extend_from_slice(&1u32.to_be_bytes());
    expected.extend_from_slice(&1u32.to_be_bytes());
    expected.extend_from_slice(b"a");
    expected.extend_from_slice(&4u32.to_be_bytes());
    expected.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);

    assert_eq!(bytes, expected);
}

#[test]
fn read_written() {
    let ktest = get_sign_test();
    let bytes = encode(&ktest);
    let read = KTest::read_from(bytes.as_slice()).expect("failed to read ktest");
    assert_eq!(read, ktest);
    assert_eq!(read.object("a").map(|o| o.bytes.len()), Some(4));
    assert!(read.object("b").is_none());
}

#[test]
fn read_version_one() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"BOUT\n");
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(b"x");
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.push(7);

    let ktest = KTest::read_from(bytes.as_slice()).expect("failed to read ktest");
    assert!(ktest.args.is_empty());
    assert_eq!(ktest.sym_argvs, 0);
    assert_eq!(ktest.objects, vec![KTestObject::new("x", [7])]);
}

#[test]
fn bad_magic() {
    let mut bytes = encode(&get_sign_test());
    bytes[0] = b'X';
    let err = KTest::read_from(bytes.as_slice()).unwrap_err();
    assert!(matches!(err, Error::BadMagic(magic) if &magic == b"XTEST"));
}

#[test]
fn unsupported_version() {
    let mut bytes = encode(&get_sign_test());
    bytes[5..9].copy_from_slice(&4u32.to_be_bytes());
    let err = KTest::read_from(bytes.as_slice()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion(4)));

    bytes[5..9].copy_from_slice(&0u32.to_be_bytes());
    let err = KTest::read_from(bytes.as_slice()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion(0)));
}

#[test]
fn truncated() {
    let bytes = encode(&get_sign_test());
    let err = KTest::read_from(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, Error::Truncated("object bytes")));

    let err = KTest::read_from(&bytes[..3]).unwrap_err();
    assert!(matches!(err, Error::Truncated("magic")));
}

#[test]
fn corrupt_length_is_truncation() {
    let mut bytes = encode(&get_sign_test());
    let len = bytes.len();
    bytes[len - 8..len - 4].copy_from_slice(&u32::MAX.to_be_bytes());
    let err = KTest::read_from(bytes.as_slice()).unwrap_err();
    assert!(matches!(err, Error::Truncated("object bytes")));
}

#[test]
fn invalid_utf8_name() {
    let ktest = KTest::new(vec![KTestObject::new("a", [0])]);
    let mut bytes = encode(&ktest);
    let name_offset = bytes.len() - 6;
    bytes[name_offset] = 0xff;
    let err = KTest::read_from(bytes.as_slice()).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidUtf8 {
            field: "object name"
        }
    ));
}

#[test]
fn file_round_trip() {
    let dir = assert_fs::TempDir::new().expect("failed to create temp dir");
    let file = dir.child("test000001.ktest");
    let ktest = get_sign_test();
    ktest.to_file(file.path()).expect("failed to write file");
    assert!(file.path().exists());

    let read = KTest::from_file(file.path()).expect("failed to read file");
    assert_eq!(read, ktest);
}

#[test]
fn missing_file() {
    let dir = assert_fs::TempDir::new().expect("failed to create temp dir");
    let err = KTest::from_file(dir.child("missing.ktest").path()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
