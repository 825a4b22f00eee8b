//! Error types for the XNB format crate.

use thiserror::Error;

/// Errors that can occur when encoding or parsing Song XNB files.
#[derive(Error, Debug)]
pub enum XnbFormatError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed 7-bit encoded integer: invalid continuation at byte {offset}")]
    MalformedVarInt { offset: usize },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Verification failed for {path}: {reason}")]
    VerificationFailed { path: String, reason: String },

    #[error("Invalid magic bytes: expected XNB, got {0:?}")]
    InvalidMagic([u8; 3]),

    #[error("Unsupported XNB format version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unsupported flag bits: {0:#04x} (compressed or HiDef content is not handled)")]
    UnsupportedFlags(u8),

    #[error("Declared file size {declared} does not match actual size {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("Type reader index {index} out of range (table has {count} entries)")]
    InvalidReaderIndex { index: u8, count: usize },

    #[error("Unexpected type reader at position {position}: {name}")]
    UnexpectedReader { position: usize, name: String },

    #[error("Invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, XnbFormatError>;
