//! 7-bit variable-length integers and length-prefixed strings.
//!
//! Each byte carries 7 data bits, least-significant group first. The high bit
//! (`0x80`) is set on every byte except the last. Values `0..=127` take a
//! single byte.
//!
//! ```
//! use xnb_format::varint::{decode_7bit, encode_7bit};
//!
//! assert_eq!(encode_7bit(128).unwrap(), vec![0x80, 0x01]);
//! assert_eq!(decode_7bit(&[0x80, 0x01]).unwrap(), (128, 2));
//! ```

use std::io::{self, Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{Result, XnbFormatError};

/// Maximum encoded length of a `u64` (ceil(64 / 7)).
pub const MAX_VARINT_LEN: usize = 10;

/// Upper bound on a length-prefixed string read from a container.
pub const MAX_STRING_BYTES: u64 = 64 * 1024;

/// Encode a non-negative integer.
///
/// # Errors
///
/// Returns [`XnbFormatError::InvalidArgument`] for negative values; the format
/// has no representation for negative lengths.
pub fn encode_7bit(value: i64) -> Result<Vec<u8>> {
    let value = u64::try_from(value).map_err(|_| {
        XnbFormatError::InvalidArgument(format!(
            "cannot 7-bit encode negative value {value}"
        ))
    })?;
    Ok(encode_7bit_u64(value))
}

/// Encode an unsigned integer. Infallible counterpart of [`encode_7bit`].
pub fn encode_7bit_u64(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out
}

/// Decode a 7-bit integer from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_7bit(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_VARINT_LEN) {
        let group = u64::from(byte & 0x7F);
        // Tenth group only has room for the top bit of a u64.
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(XnbFormatError::MalformedVarInt { offset: i });
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(XnbFormatError::MalformedVarInt {
        offset: bytes.len().min(MAX_VARINT_LEN),
    })
}

/// Writing 7-bit integers and length-prefixed strings to any [`Write`].
pub trait WriteVarIntExt: Write {
    /// Write `value` as a 7-bit encoded integer.
    fn write_7bit(&mut self, value: u64) -> io::Result<()> {
        self.write_all(&encode_7bit_u64(value))
    }

    /// Write a UTF-8 string prefixed with its byte length.
    fn write_prefixed_str(&mut self, s: &str) -> io::Result<()> {
        self.write_7bit(s.len() as u64)?;
        self.write_all(s.as_bytes())
    }
}

impl<W: Write + ?Sized> WriteVarIntExt for W {}

/// Reading 7-bit integers and length-prefixed strings from any [`Read`].
pub trait ReadVarIntExt: Read {
    /// Read a 7-bit encoded integer.
    fn read_7bit(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let group = u64::from(byte & 0x7F);
            if i == MAX_VARINT_LEN - 1 && group > 1 {
                return Err(XnbFormatError::MalformedVarInt { offset: i });
            }
            value |= group << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(XnbFormatError::MalformedVarInt {
            offset: MAX_VARINT_LEN,
        })
    }

    /// Read a string prefixed with its 7-bit encoded byte length.
    fn read_prefixed_str(&mut self) -> Result<String> {
        let len = self.read_7bit()?;
        if len > MAX_STRING_BYTES {
            return Err(XnbFormatError::Encoding(format!(
                "string length {len} exceeds limit of {MAX_STRING_BYTES} bytes"
            )));
        }
        let mut buf = vec![0u8; len as usize];
        self.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl<R: Read + ?Sized> ReadVarIntExt for R {}
