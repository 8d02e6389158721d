//! RAW header section parser
//!
//! The header is a sequence of `Name: value` lines. Lines that do not start a
//! section continue the one above (the `Variables:` table being the main
//! example). Parsing stops at `Values:` or `Binary:`.

use crate::encoding::{LineCursor, TextEncoding};
use crate::types::{FileType, RawError, Result};
use regex::Regex;
use std::sync::LazyLock;

static SECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][^:]+):\s*(.*)").expect("section pattern is valid")
});

/// A named header section and its values in file order
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSection {
    pub name: String,
    pub values: Vec<String>,
}

impl MetadataSection {
    #[inline]
    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Where the sample region starts and how it is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSection {
    pub file_type: FileType,
    /// Byte offset of the first sample byte
    pub offset: usize,
}

/// Parsed but unvalidated header
#[derive(Debug, Clone)]
pub struct RawHeader {
    pub encoding: TextEncoding,
    pub sections: Vec<MetadataSection>,
    /// `None` when the file ended before a data section
    pub data: Option<DataSection>,
}

impl RawHeader {
    /// First section with the given (case-sensitive) name
    pub fn section(&self, name: &str) -> Option<&MetadataSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.section(name).and_then(MetadataSection::first)
    }
}

/// Parse header sections from the start of `data`.
pub fn parse_header(data: &[u8], encoding: TextEncoding) -> Result<RawHeader> {
    let mut cursor = LineCursor::new(data, encoding);
    let mut sections: Vec<MetadataSection> = Vec::new();

    while let Some(line) = cursor.next_line() {
        if let Some(caps) = SECTION_PATTERN.captures(&line) {
            let name = caps[1].trim();
            let inline = caps[2].trim();

            if let Some(file_type) = FileType::from_section(name) {
                return Ok(RawHeader {
                    encoding,
                    sections,
                    data: Some(DataSection {
                        file_type,
                        offset: cursor.position(),
                    }),
                });
            }

            let mut values = Vec::new();
            if !inline.is_empty() {
                values.push(inline.to_string());
            }
            sections.push(MetadataSection {
                name: name.to_string(),
                values,
            });
            continue;
        }

        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        match sections.last_mut() {
            Some(section) => section.values.push(value.to_string()),
            None => {
                return Err(RawError::OrphanData {
                    line: cursor.line_number(),
                })
            }
        }
    }

    Ok(RawHeader {
        encoding,
        sections,
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Title: * rc.cir\n\
        Date: Thu Jan  4 10:11:12 2024\n\
        Plotname: Transient Analysis\n\
        Flags: real\n\
        No. Variables: 2\n\
        No. Points: 3\n\
        Variables:\n\
        \t0\ttime\ttime\n\
        \t1\tv(out)\tvoltage\n\
        Binary:\n";

    #[test]
    fn test_sections_and_data_start() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 16]);

        let header = parse_header(&bytes, TextEncoding::SingleByte).unwrap();
        assert_eq!(
            header.data,
            Some(DataSection {
                file_type: FileType::Binary,
                offset: HEADER.len()
            })
        );
        assert_eq!(header.first_value("Date"), Some("Thu Jan  4 10:11:12 2024"));
        assert_eq!(header.first_value("No. Points"), Some("3"));

        let vars = header.section("Variables").unwrap();
        assert_eq!(vars.values, vec!["0\ttime\ttime", "1\tv(out)\tvoltage"]);
        assert!(header.section("Binary").is_none());
    }

    #[test]
    fn test_values_section_is_ascii() {
        let header = parse_header(b"Title: t\nValues:\n0\t0.0\n", TextEncoding::SingleByte).unwrap();
        assert_eq!(header.data.unwrap().file_type, FileType::Ascii);
        assert_eq!(header.data.unwrap().offset, 17);
    }

    #[test]
    fn test_orphan_line_before_first_section() {
        let err = parse_header(b"\n  stray\nTitle: t\n", TextEncoding::SingleByte).unwrap_err();
        assert!(matches!(err, RawError::OrphanData { line: 2 }));
    }

    #[test]
    fn test_missing_data_section() {
        let header = parse_header(b"Title: t\nPlotname: x\n", TextEncoding::SingleByte).unwrap();
        assert!(header.data.is_none());
        assert_eq!(header.sections.len(), 2);
    }

    #[test]
    fn test_colon_inside_value() {
        let header = parse_header(
            b"Title: * C:\\sim\\rc.asc\nDate: 12:00:01\nValues:\n",
            TextEncoding::SingleByte,
        )
        .unwrap();
        assert_eq!(header.first_value("Title"), Some("* C:\\sim\\rc.asc"));
        assert_eq!(header.first_value("Date"), Some("12:00:01"));
    }
}
