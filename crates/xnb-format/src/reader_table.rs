//! Type-reader table: tells the runtime which deserializer builds each object.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XnbFormatError};
use crate::varint::{ReadVarIntExt, WriteVarIntExt};

/// Reader for the root `Song` object.
pub const SONG_READER: &str = "Microsoft.Xna.Framework.Content.SongReader";

/// Reader for the embedded duration field.
pub const INT32_READER: &str = "Microsoft.Xna.Framework.Content.Int32Reader";

/// 1-based selector of [`SONG_READER`] in a Song table.
pub const SONG_READER_INDEX: u8 = 1;

/// 1-based selector of [`INT32_READER`] in a Song table.
pub const INT32_READER_INDEX: u8 = 2;

/// Upper bound on table entries accepted when parsing.
pub const MAX_READER_COUNT: u64 = 64;

/// A named, versioned type reader entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeReaderDescriptor {
    /// Dotted type identifier.
    pub name: String,
    pub version: i32,
}

impl TypeReaderDescriptor {
    pub fn new(name: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Last dotted segment of the name, e.g. `SongReader`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// The fixed table every Song container carries: SongReader then Int32Reader.
pub fn song_reader_table() -> [TypeReaderDescriptor; 2] {
    [
        TypeReaderDescriptor::new(SONG_READER, 0),
        TypeReaderDescriptor::new(INT32_READER, 0),
    ]
}

/// Write the reader count followed by each entry.
pub fn write_reader_table<W: Write>(writer: &mut W, readers: &[TypeReaderDescriptor]) -> Result<()> {
    writer.write_7bit(readers.len() as u64)?;
    for reader in readers {
        writer.write_prefixed_str(&reader.name)?;
        writer.write_i32::<LittleEndian>(reader.version)?;
    }
    Ok(())
}

/// Read a reader table.
pub fn read_reader_table<R: Read>(reader: &mut R) -> Result<Vec<TypeReaderDescriptor>> {
    let count = reader.read_7bit()?;
    if count > MAX_READER_COUNT {
        return Err(XnbFormatError::Encoding(format!(
            "type reader count {count} exceeds limit of {MAX_READER_COUNT}"
        )));
    }
    let mut readers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = reader.read_prefixed_str()?;
        let version = reader.read_i32::<LittleEndian>()?;
        readers.push(TypeReaderDescriptor { name, version });
    }
    Ok(readers)
}
