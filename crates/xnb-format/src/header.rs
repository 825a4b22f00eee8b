//! XNB file header: the first 10 bytes of every `.xnb` file.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XnbFormatError};

/// Format identifier: `XNB`.
pub const XNB_MAGIC: [u8; 3] = *b"XNB";

/// Target platform tag for desktop Windows builds.
pub const PLATFORM_WINDOWS: u8 = b'w';

/// The one content-pipeline format version this encoder targets.
pub const XNB_VERSION: u8 = 5;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 10;

/// Header flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XnbFlags(pub u8);

impl XnbFlags {
    /// Content was built for the HiDef profile.
    pub const HIDEF: u8 = 0x01;
    /// Payload is LZX compressed.
    pub const COMPRESSED: u8 = 0x80;

    pub fn has(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

/// The fixed-size header at the beginning of every `.xnb` file.
///
/// Layout (10 bytes):
/// - `[0..3]` magic: `XNB`
/// - `[3]`    platform tag
/// - `[4]`    format version
/// - `[5]`    flags
/// - `[6..10]` total file size: i32 LE, header included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XnbHeader {
    pub platform: u8,
    pub version: u8,
    pub flags: XnbFlags,
    /// Declared size of the whole file in bytes.
    pub file_size: i32,
}

impl XnbHeader {
    /// Header for an uncompressed Windows container of `file_size` bytes.
    pub fn new(file_size: i32) -> Self {
        Self {
            platform: PLATFORM_WINDOWS,
            version: XNB_VERSION,
            flags: XnbFlags::default(),
            file_size,
        }
    }

    /// Platform tag as a character, for display.
    pub fn platform_char(&self) -> char {
        char::from(self.platform)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&XNB_MAGIC)?;
        writer.write_u8(self.platform)?;
        writer.write_u8(self.version)?;
        writer.write_u8(self.flags.0)?;
        writer.write_i32::<LittleEndian>(self.file_size)?;
        Ok(())
    }

    /// Read and validate a header.
    ///
    /// Only uncompressed version-5 containers are accepted.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 3];
        reader.read_exact(&mut magic)?;
        if magic != XNB_MAGIC {
            return Err(XnbFormatError::InvalidMagic(magic));
        }
        let platform = reader.read_u8()?;
        let version = reader.read_u8()?;
        if version != XNB_VERSION {
            return Err(XnbFormatError::UnsupportedVersion(version));
        }
        let flags = XnbFlags(reader.read_u8()?);
        if flags.0 != 0 {
            return Err(XnbFormatError::UnsupportedFlags(flags.0));
        }
        let file_size = reader.read_i32::<LittleEndian>()?;
        Ok(Self {
            platform,
            version,
            flags,
            file_size,
        })
    }
}
