use std::io::{Read, Write};
use std::path::Path;

pub const MAGIC: &[u8; 5] = b"KTEST";

/// Magic used by files predating [MAGIC]. Only readable as version 1.
pub const LEGACY_MAGIC: &[u8; 5] = b"BOUT\n";

/// Version written by [KTest::write_to].
pub const VERSION: u32 = 3;

/// Codec result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a ktest file: bad magic {0:?}")]
    BadMagic([u8; 5]),

    #[error("unsupported ktest version {0}")]
    UnsupportedVersion(u32),

    /// The file ended in the middle of the named field
    #[error("ktest file truncated while reading {0}")]
    Truncated(&'static str),

    #[error("{field} is not valid utf-8")]
    InvalidUtf8 { field: &'static str },

    /// A length does not fit in the 32-bit fields of the format
    #[error("{field} is too large to encode: {len} bytes")]
    TooLarge { field: &'static str, len: usize },
}

/// A named object and its concrete bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KTestObject {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl KTestObject {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Contents of one KTEST file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KTest {
    pub args: Vec<String>,
    pub sym_argvs: u32,
    pub sym_argv_len: u32,
    pub objects: Vec<KTestObject>,
}

impl KTest {
    pub fn new(objects: Vec<KTestObject>) -> Self {
        Self {
            objects,
            ..Default::default()
        }
    }

    /// First object with the given name.
    pub fn object(&self, name: &str) -> Option<&KTestObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::read_from(bytes.as_slice())
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        std::fs::write(path, buffer)?;
        Ok(())
    }

    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut magic = [0u8; 5];
        read_exact(&mut reader, &mut magic, "magic")?;
        let legacy = &magic == LEGACY_MAGIC;
        if &magic != MAGIC && !legacy {
            return Err(Error::BadMagic(magic));
        }

        let version = read_u32(&mut reader, "version")?;
        if version == 0 || version > VERSION || (legacy && version != 1) {
            return Err(Error::UnsupportedVersion(version));
        }

        let num_args = read_u32(&mut reader, "argument count")?;
        let args = (0..num_args)
            .map(|_| read_string(&mut reader, "argument"))
            .collect::<Result<Vec<_>>>()?;

        let (sym_argvs, sym_argv_len) = if version >= 2 {
            (
                read_u32(&mut reader, "sym_argvs")?,
                read_u32(&mut reader, "sym_argv_len")?,
            )
        } else {
            (0, 0)
        };

        let num_objects = read_u32(&mut reader, "object count")?;
        let objects = (0..num_objects)
            .map(|_| {
                let name = read_string(&mut reader, "object name")?;
                let bytes = read_bytes(&mut reader, "object bytes")?;
                Ok(KTestObject { name, bytes })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            args,
            sym_argvs,
            sym_argv_len,
            objects,
        })
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_be_bytes())?;

        write_len(&mut writer, self.args.len(), "argument count")?;
        for arg in &self.args {
            write_bytes(&mut writer, arg.as_bytes(), "argument")?;
        }

        writer.write_all(&self.sym_argvs.to_be_bytes())?;
        writer.write_all(&self.sym_argv_len.to_be_bytes())?;

        write_len(&mut writer, self.objects.len(), "object count")?;
        for object in &self.objects {
            write_bytes(&mut writer, object.name.as_bytes(), "object name")?;
            write_bytes(&mut writer, &object.bytes, "object bytes")?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn read_exact(reader: &mut impl Read, buffer: &mut [u8], field: &'static str) -> Result<()> {
    reader.read_exact(buffer).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Truncated(field)
        } else {
            Error::Io(err)
        }
    })
}

fn read_u32(reader: &mut impl Read, field: &'static str) -> Result<u32> {
    let mut buffer = [0u8; 4];
    read_exact(reader, &mut buffer, field)?;
    Ok(u32::from_be_bytes(buffer))
}

fn read_bytes(reader: &mut impl Read, field: &'static str) -> Result<Vec<u8>> {
    let len = read_u32(reader, field)? as u64;

    // Read through a limit rather than preallocating so a corrupt length cannot exhaust memory
    let mut bytes = Vec::new();
    reader.take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(Error::Truncated(field));
    }

    Ok(bytes)
}

fn read_string(reader: &mut impl Read, field: &'static str) -> Result<String> {
    String::from_utf8(read_bytes(reader, field)?).map_err(|_| Error::InvalidUtf8 { field })
}

fn write_len(writer: &mut impl Write, len: usize, field: &'static str) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| Error::TooLarge { field, len })?;
    writer.write_all(&len.to_be_bytes())?;
    Ok(())
}

fn write_bytes(writer: &mut impl Write, bytes: &[u8], field: &'static str) -> Result<()> {
    write_len(writer, bytes.len(), field)?;
    writer.write_all(bytes)?;
    Ok(())
}
