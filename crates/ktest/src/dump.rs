use std::fmt::Write;

use serde::Serialize;

use crate::{KTest, KTestObject};

/// Human-readable view of a [KTest], printed in the layout of `ktest-tool` or serialized as
/// JSON.
#[derive(Clone, Debug, Serialize)]
pub struct KTestReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub args: Vec<String>,
    pub sym_argvs: u32,
    pub sym_argv_len: u32,
    pub objects: Vec<ObjectReport>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ObjectReport {
    pub name: String,
    pub size: usize,
    pub data: String,
    pub hex: String,

    /// Little-endian signed reading, present for 1, 2, 4 and 8 byte objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uint: Option<u64>,

    /// Bytes with non-printable characters replaced by `.`
    pub text: String,
}

impl KTestReport {
    pub fn new(ktest: &KTest, file: Option<String>) -> Self {
        Self {
            file,
            args: ktest.args.clone(),
            sym_argvs: ktest.sym_argvs,
            sym_argv_len: ktest.sym_argv_len,
            objects: ktest.objects.iter().map(ObjectReport::new).collect(),
        }
    }
}

impl ObjectReport {
    pub fn new(object: &KTestObject) -> Self {
        let bytes = &object.bytes;
        let (int, uint) = match *bytes.as_slice() {
            [b0] => (Some(b0 as i8 as i64), Some(b0 as u64)),
            [b0, b1] => {
                let raw = [b0, b1];
                (
                    Some(i16::from_le_bytes(raw) as i64),
                    Some(u16::from_le_bytes(raw) as u64),
                )
            }
            [b0, b1, b2, b3] => {
                let raw = [b0, b1, b2, b3];
                (
                    Some(i32::from_le_bytes(raw) as i64),
                    Some(u32::from_le_bytes(raw) as u64),
                )
            }
            [b0, b1, b2, b3, b4, b5, b6, b7] => {
                let raw = [b0, b1, b2, b3, b4, b5, b6, b7];
                (Some(i64::from_le_bytes(raw)), Some(u64::from_le_bytes(raw)))
            }
            _ => (None, None),
        };

        Self {
            name: object.name.clone(),
            size: bytes.len(),
            data: escaped(bytes),
            hex: hex(bytes),
            int,
            uint,
            text: bytes
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect(),
        }
    }
}

fn escaped(bytes: &[u8]) -> String {
    let mut data = String::from("b'");
    for &b in bytes {
        match b {
            b'\'' => data.push_str("\\'"),
            b'\\' => data.push_str("\\\\"),
            b if b.is_ascii_graphic() || b == b' ' => data.push(b as char),
            b => {
                let _ = write!(data, "\\x{b:02x}");
            }
        }
    }
    data.push('\'');
    data
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::from("0x"), |mut hex, b| {
            let _ = write!(hex, "{b:02x}");
            hex
        })
}

impl std::fmt::Display for KTestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            writeln!(f, "ktest file : '{file}'")?;
        }

        let args = self
            .args
            .iter()
            .map(|arg| format!("'{arg}'"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "args       : [{args}]")?;
        writeln!(f, "num objects: {}", self.objects.len())?;

        for (i, object) in self.objects.iter().enumerate() {
            writeln!(f, "object {i}: name: '{}'", object.name)?;
            writeln!(f, "object {i}: size: {}", object.size)?;
            writeln!(f, "object {i}: data: {}", object.data)?;
            writeln!(f, "object {i}: hex : {}", object.hex)?;
            if let Some(int) = object.int {
                writeln!(f, "object {i}: int : {int}")?;
            }
            if let Some(uint) = object.uint {
                writeln!(f, "object {i}: uint: {uint}")?;
            }
            writeln!(f, "object {i}: text: {}", object.text)?;
        }

        Ok(())
    }
}
