//! Song XNB reader: parses a `.xnb` Song container back for inspection.
//!
//! Only the uncompressed, version-5 Song layout written by
//! [`SongXnbWriter`](crate::SongXnbWriter) is understood. The reader checks
//! that the declared size matches the data, that both reader indices point
//! into the table, and that nothing trails the duration field.

use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XnbFormatError};
use crate::header::XnbHeader;
use crate::reader_table::{
    read_reader_table, TypeReaderDescriptor, INT32_READER, INT32_READER_INDEX, SONG_READER,
    SONG_READER_INDEX,
};
use crate::varint::ReadVarIntExt;

/// Largest container the reader will load (Song files are a few hundred bytes).
const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// A parsed Song container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongXnb {
    pub header: XnbHeader,
    pub readers: Vec<TypeReaderDescriptor>,
    pub shared_resource_count: i32,
    /// Base name of the streamed audio file.
    pub file_name: String,
    pub duration_ms: i32,
}

/// Reader for Song `.xnb` files.
pub struct XnbReader;

impl XnbReader {
    /// Open and parse a Song container from disk.
    pub fn open(path: &Path) -> Result<SongXnb> {
        tracing::info!("Opening XNB file: {}", path.display());

        let len = std::fs::metadata(path)?.len();
        if len > MAX_FILE_SIZE {
            return Err(XnbFormatError::Encoding(format!(
                "{len} bytes is too large for a Song container"
            )));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a Song container held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<SongXnb> {
        let mut cur = Cursor::new(bytes);

        let header = XnbHeader::read_from(&mut cur)?;
        let actual = bytes.len() as u64;
        if u64::try_from(header.file_size).ok() != Some(actual) {
            return Err(XnbFormatError::SizeMismatch {
                declared: header.file_size.max(0) as u64,
                actual,
            });
        }

        let readers = read_reader_table(&mut cur)?;
        Self::check_song_readers(&readers)?;

        let shared_resource_count = cur.read_i32::<LittleEndian>()?;
        let _marker = cur.read_u8()?;

        Self::expect_reader_index(&mut cur, SONG_READER_INDEX, readers.len())?;
        let file_name = cur.read_prefixed_str()?;
        Self::expect_reader_index(&mut cur, INT32_READER_INDEX, readers.len())?;
        let duration_ms = cur.read_i32::<LittleEndian>()?;

        let mut trailing = Vec::new();
        cur.read_to_end(&mut trailing)?;
        if !trailing.is_empty() {
            return Err(XnbFormatError::Encoding(format!(
                "{} unexpected bytes after duration field",
                trailing.len()
            )));
        }

        tracing::debug!(
            file_name = %file_name,
            duration_ms,
            readers = readers.len(),
            "Parsed Song XNB"
        );

        Ok(SongXnb {
            header,
            readers,
            shared_resource_count,
            file_name,
            duration_ms,
        })
    }

    fn check_song_readers(readers: &[TypeReaderDescriptor]) -> Result<()> {
        for (position, expected) in [SONG_READER, INT32_READER].iter().enumerate() {
            match readers.get(position) {
                Some(r) if r.name == *expected => {}
                Some(r) => {
                    return Err(XnbFormatError::UnexpectedReader {
                        position,
                        name: r.name.clone(),
                    })
                }
                None => {
                    return Err(XnbFormatError::UnexpectedReader {
                        position,
                        name: "<missing>".to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn expect_reader_index<R: Read>(reader: &mut R, expected: u8, count: usize) -> Result<()> {
        let index = reader.read_u8()?;
        if index == 0 || index as usize > count || index != expected {
            return Err(XnbFormatError::InvalidReaderIndex { index, count });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;
    use crate::writer::SongXnbWriter;

    fn sample() -> Vec<u8> {
        SongXnbWriter::new("track.wav", 3000)
            .unwrap()
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn test_parse_written_song() {
        let song = XnbReader::from_bytes(&sample()).unwrap();
        assert_eq!(song.header.platform_char(), 'w');
        assert_eq!(song.header.version, 5);
        assert_eq!(song.readers.len(), 2);
        assert_eq!(song.readers[0].name, SONG_READER);
        assert_eq!(song.readers[1].name, INT32_READER);
        assert_eq!(song.shared_resource_count, 0);
        assert_eq!(song.file_name, "track.wav");
        assert_eq!(song.duration_ms, 3000);
    }

    #[test]
    fn test_open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.xnb");
        std::fs::write(&path, sample()).unwrap();
        assert_eq!(XnbReader::open(&path).unwrap().duration_ms, 3000);
    }

    #[test]
    fn test_size_mismatch() {
        let mut bytes = sample();
        bytes.push(0);
        let err = XnbReader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, XnbFormatError::SizeMismatch { .. }));
    }

    #[test]
    fn test_legacy_formula_size_is_rejected() {
        // Filename length + 114 undercounts the shared resource field.
        let mut bytes = sample();
        let legacy = ("track.wav".len() + 114) as i32;
        bytes[6..10].copy_from_slice(&legacy.to_le_bytes());
        let err = XnbReader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, XnbFormatError::SizeMismatch { .. }));
    }

    #[test]
    fn test_swapped_reader_index() {
        let mut bytes = sample();
        // marker + index follow table and shared resource count
        let index_at = bytes.len() - 4 - 1 - "track.wav".len() - 1 - 1;
        assert_eq!(bytes[index_at], SONG_READER_INDEX);
        bytes[index_at] = 3;
        let err = XnbReader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, XnbFormatError::InvalidReaderIndex { index: 3, count: 2 }));
    }

    #[test]
    fn test_wrong_reader_name() {
        // Swap the first letter of "Microsoft" in the first reader name.
        let mut patched = sample();
        patched[HEADER_SIZE + 2] = b'N';
        let err = XnbReader::from_bytes(&patched).unwrap_err();
        assert!(matches!(err, XnbFormatError::UnexpectedReader { position: 0, .. }));
    }

    #[test]
    fn test_truncated() {
        let bytes = sample();
        let mut cut = bytes[..bytes.len() - 2].to_vec();
        let len = cut.len() as i32;
        cut[6..10].copy_from_slice(&len.to_le_bytes());
        let err = XnbReader::from_bytes(&cut).unwrap_err();
        assert!(matches!(err, XnbFormatError::Io(_)));
    }
}
