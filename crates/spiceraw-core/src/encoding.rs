//! Header encoding detection and line iteration over the mapped file
//!
//! LTspice writes RAW headers as UTF-16LE, ngspice and most other simulators
//! as plain 8-bit text. The encoding is decided from the first six bytes and
//! then applies to the header and to ASCII sample data alike.

use crate::types::{RawError, Result};
use encoding_rs::{UTF_16LE, UTF_8};

/// Number of bytes inspected by [`TextEncoding::detect`]
pub const PROBE_LEN: usize = 6;

const TITLE_PROBE: &[u8] = b"Title:";
const UTF16_TITLE_PROBE: &str = "Tit";

/// Text encoding of a RAW header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// ASCII / UTF-8 compatible
    SingleByte,
    Utf16Le,
}

impl TextEncoding {
    /// Classify a file from its leading bytes.
    pub fn detect(probe: &[u8]) -> Result<Self> {
        let probe = probe.get(..PROBE_LEN).ok_or(RawError::UnrecognizedFormat)?;

        if probe == TITLE_PROBE {
            return Ok(TextEncoding::SingleByte);
        }

        let (text, had_errors) = UTF_16LE.decode_without_bom_handling(probe);
        if !had_errors && text == UTF16_TITLE_PROBE {
            return Ok(TextEncoding::Utf16Le);
        }

        Err(RawError::UnrecognizedFormat)
    }

    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::SingleByte => "single-byte",
            TextEncoding::Utf16Le => "UTF-16LE",
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        let (text, _) = match self {
            TextEncoding::SingleByte => UTF_8.decode_without_bom_handling(bytes),
            TextEncoding::Utf16Le => UTF_16LE.decode_without_bom_handling(bytes),
        };
        text.into_owned()
    }

    /// Locate the next line terminator, returning (content length, consumed bytes).
    fn split_line(self, rest: &[u8]) -> (usize, usize) {
        let found = match self {
            TextEncoding::SingleByte => rest.iter().position(|&b| b == b'\n'),
            TextEncoding::Utf16Le => rest
                .chunks_exact(2)
                .position(|unit| unit[0] == b'\n' && unit[1] == 0)
                .map(|i| i * 2),
        };

        match (self, found) {
            (TextEncoding::SingleByte, Some(i)) => (i, i + 1),
            (TextEncoding::Utf16Le, Some(i)) => (i, i + 2),
            (_, None) => (rest.len(), rest.len()),
        }
    }
}

/// Line cursor over encoded bytes
///
/// Tracks the exact byte offset past each consumed line so the header parser
/// can hand the data start to the sample decoder.
pub struct LineCursor<'a> {
    data: &'a [u8],
    pos: usize,
    encoding: TextEncoding,
    line_number: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(data: &'a [u8], encoding: TextEncoding) -> Self {
        Self::at(data, 0, encoding)
    }

    /// Start reading at a byte offset (e.g. the data start of a RAW file)
    pub fn at(data: &'a [u8], offset: usize, encoding: TextEncoding) -> Self {
        Self {
            data,
            pos: offset.min(data.len()),
            encoding,
            line_number: 0,
        }
    }

    /// Byte offset just past the last line returned
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 1-based number of the last line returned
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next line without its terminator (a trailing `\r` is dropped).
    pub fn next_line(&mut self) -> Option<String> {
        if self.pos >= self.data.len() {
            return None;
        }

        let rest = &self.data[self.pos..];
        let (content_len, consumed) = self.encoding.split_line(rest);

        let mut line = self.encoding.decode(&rest[..content_len]);
        if line.ends_with('\r') {
            line.pop();
        }

        self.pos += consumed;
        self.line_number += 1;
        Some(line)
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}
