//! # xnb-format
//!
//! The XNB container format as used for `Song` assets. Handles writing and
//! reading `.xnb` files that reference an externally streamed audio file.
//!
//! ## Format Overview
//!
//! A Song `.xnb` file consists of:
//! - **Header** (10 bytes): `XNB`, platform tag, format version, flags, file size
//! - **Type reader table**: 7-bit count, then name + version per reader
//! - **Shared resource count**
//! - **Song object**: streamed file name and duration in milliseconds
//!
//! Strings are UTF-8, prefixed with their byte length as a 7-bit integer.
//!
//! ## Example
//! ```rust,no_run
//! use std::path::Path;
//! use xnb_format::{SongXnbWriter, XnbReader};
//!
//! // Writing
//! let writer = SongXnbWriter::new("track.wav", 3000).unwrap();
//! writer.finalize(Path::new("track.xnb")).unwrap();
//!
//! // Reading
//! let song = XnbReader::open(Path::new("track.xnb")).unwrap();
//! println!("{} ({} ms)", song.file_name, song.duration_ms);
//! ```

pub mod error;
pub mod header;
pub mod reader;
pub mod reader_table;
pub mod varint;
pub mod writer;

pub use error::XnbFormatError;
pub use header::*;
pub use reader::{SongXnb, XnbReader};
pub use reader_table::*;
pub use writer::{encode_song, output_path, SongXnbWriter, XNB_EXTENSION};
