//! Memory-mapped input and typed record reads

use crate::types::{Endian, RawError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Map a whole input file read-only.
///
/// The file size is checked first so a missing file and an unreadable one
/// report different errors.
pub fn map_file(path: &Path) -> Result<Mmap> {
    let stat = fs::metadata(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => RawError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => RawError::StatFailed {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    debug!(path = %path.display(), bytes = stat.len(), "Input mapped");
    Ok(mmap)
}

/// Sequential reader over a byte slice with a fixed byte order
pub struct MmapReader<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> MmapReader<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            pos: 0,
            endian,
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(RawError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "Unexpected end of file",
            )));
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.read_bytes(8)?;
        Ok(match self.endian {
            Endian::Little => LittleEndian::read_f64(bytes),
            Endian::Big => BigEndian::read_f64(bytes),
        })
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(match self.endian {
            Endian::Little => LittleEndian::read_f32(bytes),
            Endian::Big => BigEndian::read_f32(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_both_orders() {
        let mut data = 1.5f64.to_be_bytes().to_vec();
        data.extend_from_slice(&(-0.25f32).to_be_bytes());

        let mut reader = MmapReader::new(&data, Endian::Big);
        assert_eq!(reader.read_f64().unwrap(), 1.5);
        assert_eq!(reader.read_f32().unwrap(), -0.25);
        assert_eq!(reader.remaining(), 0);

        let data = 2.0f32.to_le_bytes();
        let mut reader = MmapReader::new(&data, Endian::Little);
        assert_eq!(reader.read_f32().unwrap(), 2.0);
    }

    #[test]
    fn test_short_read() {
        let data = [0u8; 6];
        let mut reader = MmapReader::new(&data, Endian::Little);
        assert!(reader.read_f64().is_err());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_map_missing_file() {
        let err = map_file(Path::new("/nonexistent/dir/file.raw")).unwrap_err();
        assert!(matches!(err, RawError::FileNotFound { .. }));
    }
}
