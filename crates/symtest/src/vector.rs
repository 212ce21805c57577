use std::path::Path;

use ktest::{KTest, KTestObject};
use serde::{Deserialize, Serialize};

/// Concrete bytes for one symbolic region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl VectorEntry {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Concrete assignment of every symbolic region declared along one path. Entries are kept in
/// declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestVector {
    /// 1-based position in the order tests were generated. Zero when unknown.
    pub ordinal: usize,
    pub entries: Vec<VectorEntry>,
}

impl TestVector {
    pub fn new(ordinal: usize, entries: Vec<VectorEntry>) -> Self {
        Self { ordinal, entries }
    }

    pub fn entry(&self, name: &str) -> Option<&VectorEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Name of the KTEST file for this vector, e.g. `test000001.ktest`.
    pub fn file_name(&self) -> String {
        format!("test{:06}.ktest", self.ordinal)
    }

    pub fn to_ktest(&self, args: Vec<String>) -> KTest {
        KTest {
            args,
            objects: self
                .entries
                .iter()
                .map(|entry| KTestObject::new(entry.name.clone(), entry.bytes.clone()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn from_ktest(ordinal: usize, ktest: KTest) -> Self {
        Self {
            ordinal,
            entries: ktest
                .objects
                .into_iter()
                .map(|object| VectorEntry::new(object.name, object.bytes))
                .collect(),
        }
    }

    /// Reads a KTEST file. The ordinal is recovered from a `testNNNNNN.ktest` file name.
    pub fn load(path: impl AsRef<Path>) -> ktest::Result<Self> {
        let path = path.as_ref();
        let ktest = KTest::from_file(path)?;
        Ok(Self::from_ktest(ordinal_from_path(path).unwrap_or(0), ktest))
    }
}

fn ordinal_from_path(path: &Path) -> Option<usize> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("test")?
        .parse()
        .ok()
}
