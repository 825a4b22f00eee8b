//! Song XNB writer: serializes a streamed-song reference into the `.xnb` container.
//!
//! The container is produced in two passes: the body (reader table and Song
//! object) is serialized into memory first, its length is measured, and only
//! then is the header written with the true total file size.
//!
//! # Binary Layout
//!
//! - **Header** (10 bytes): `XNB`, platform tag, version 5, flags 0, file size
//! - **Reader table**: 7-bit count (2), SongReader v0, Int32Reader v0
//! - **Shared resource count**: i32 LE, always 0
//! - **Root object**: marker byte 0, reader index 1, length-prefixed file name,
//!   reader index 2, duration in milliseconds (i32 LE)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xnb_format::encode_song;
//!
//! let written = encode_song(Path::new("music/track.wav"), 3000).unwrap();
//! assert_eq!(written, Path::new("music/track.xnb"));
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Result, XnbFormatError};
use crate::header::{XnbHeader, HEADER_SIZE};
use crate::reader_table::{
    song_reader_table, write_reader_table, INT32_READER_INDEX, SONG_READER_INDEX,
};
use crate::varint::WriteVarIntExt;

/// Extension given to every written container.
pub const XNB_EXTENSION: &str = "xnb";

/// Shared resources carried by a Song container.
pub const SHARED_RESOURCE_COUNT: i32 = 0;

/// Object marker preceding the root reader index ("no type-id override").
pub const OBJECT_MARKER: u8 = 0;

/// Builder for a single Song `.xnb` file.
///
/// A Song stores no audio. It names the streamed audio file that sits next to
/// the container and records its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongXnbWriter {
    file_name: String,
    duration_ms: i32,
}

impl SongXnbWriter {
    /// Create a writer for the streamed file `file_name` lasting `duration_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`XnbFormatError::Encoding`] if the duration is negative or
    /// does not fit the 32-bit duration field.
    pub fn new(file_name: impl Into<String>, duration_ms: i64) -> Result<Self> {
        let duration_ms = i32::try_from(duration_ms)
            .ok()
            .filter(|ms| *ms >= 0)
            .ok_or_else(|| {
                XnbFormatError::Encoding(format!(
                    "duration {duration_ms} ms is outside 0..={}",
                    i32::MAX
                ))
            })?;
        Ok(Self {
            file_name: file_name.into(),
            duration_ms,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn duration_ms(&self) -> i32 {
        self.duration_ms
    }

    /// Serialize everything that follows the header.
    fn body_bytes(&self) -> Result<Vec<u8>> {
        // table (~100) + fixed fields (11) + name
        let mut body = Vec::with_capacity(112 + self.file_name.len());

        write_reader_table(&mut body, &song_reader_table())?;
        body.write_i32::<LittleEndian>(SHARED_RESOURCE_COUNT)?;

        body.write_u8(OBJECT_MARKER)?;
        body.write_u8(SONG_READER_INDEX)?;
        body.write_prefixed_str(&self.file_name)?;
        body.write_u8(INT32_READER_INDEX)?;
        body.write_i32::<LittleEndian>(self.duration_ms)?;

        Ok(body)
    }

    /// Serialize the complete container into memory.
    ///
    /// The header's size field is the measured length of the returned buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = self.body_bytes()?;
        let total = HEADER_SIZE + body.len();
        let file_size = i32::try_from(total).map_err(|_| {
            XnbFormatError::Encoding(format!("container size {total} exceeds i32 range"))
        })?;

        let mut out = Vec::with_capacity(total);
        XnbHeader::new(file_size).write_to(&mut out)?;
        out.extend_from_slice(&body);

        tracing::debug!(
            file_name = %self.file_name,
            duration_ms = self.duration_ms,
            body_len = body.len(),
            file_size,
            "Serialized Song XNB"
        );
        Ok(out)
    }

    /// Write the container to `path` and verify it landed on disk.
    ///
    /// A file this call created but could not finish is removed before the
    /// error is returned. An existing file that cannot be opened is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`XnbFormatError::Io`] if the file cannot be created or
    /// written, and [`XnbFormatError::VerificationFailed`] if the file is
    /// missing, empty, or has the wrong length afterwards.
    pub fn finalize(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Writing Song XNB");

        let bytes = self.to_bytes()?;
        let file = write_output(path, &bytes, |p: &Path| File::create(p))?;
        if let Err(e) = file.sync_all() {
            drop(file);
            remove_partial(path);
            return Err(e.into());
        }

        verify_written(path, bytes.len() as u64)?;

        tracing::info!(
            path = %path.display(),
            file_size = bytes.len(),
            duration_ms = self.duration_ms,
            "Song XNB written successfully"
        );
        Ok(())
    }
}

/// Open `path` with `open` and write `bytes` through a buffer, returning the
/// flushed sink.
///
/// If `open` fails, whatever already sits at `path` is left alone. Once the
/// sink is open the file is ours, and a failed write removes it.
fn write_output<W: Write>(
    path: &Path,
    bytes: &[u8],
    open: impl FnOnce(&Path) -> io::Result<W>,
) -> io::Result<W> {
    let sink = open(path)?;
    let mut writer = BufWriter::new(sink);

    if let Err(e) = writer.write_all(bytes) {
        drop(writer);
        remove_partial(path);
        return Err(e);
    }
    match writer.into_inner() {
        Ok(sink) => Ok(sink),
        Err(e) => {
            let e = e.into_error();
            remove_partial(path);
            Err(e)
        }
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove partial XNB file"
        );
    }
}

fn verify_written(path: &Path, expected: u64) -> Result<()> {
    let failed = |reason: String| XnbFormatError::VerificationFailed {
        path: path.display().to_string(),
        reason,
    };

    let meta = std::fs::metadata(path).map_err(|e| failed(format!("output not found: {e}")))?;
    match meta.len() {
        0 => Err(failed("output is empty".to_string())),
        len if len != expected => Err(failed(format!(
            "output is {len} bytes, expected {expected}"
        ))),
        _ => Ok(()),
    }
}

/// Output path for `input`: same directory and stem, `.xnb` extension.
pub fn output_path(input: &Path) -> PathBuf {
    input.with_extension(XNB_EXTENSION)
}

/// Encode a Song XNB for the audio file at `input`.
///
/// Writes `<input stem>.xnb` next to the input and returns its path. The
/// container references the input by its base name.
///
/// # Errors
///
/// Returns [`XnbFormatError::InvalidArgument`] when the input has no file
/// name or is itself an `.xnb` file, [`XnbFormatError::Encoding`] for a
/// non-UTF-8 name or out-of-range duration, and the errors of
/// [`SongXnbWriter::finalize`].
pub fn encode_song(input: &Path, duration_ms: i64) -> Result<PathBuf> {
    let name = input.file_name().ok_or_else(|| {
        XnbFormatError::InvalidArgument(format!("{} has no file name", input.display()))
    })?;
    if input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(XNB_EXTENSION))
    {
        return Err(XnbFormatError::InvalidArgument(format!(
            "{} is already an XNB container",
            input.display()
        )));
    }
    let name = name.to_str().ok_or_else(|| {
        XnbFormatError::Encoding(format!("file name of {} is not valid UTF-8", input.display()))
    })?;

    let output = output_path(input);
    SongXnbWriter::new(name, duration_ms)?.finalize(&output)?;
    Ok(output)
}
