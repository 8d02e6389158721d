//! Reader for simulator "Export data as text" files
//!
//! The first line lists the column titles. Data rows are whitespace or TAB
//! separated numbers that may carry SPICE engineering suffixes (`1.5k`,
//! `10pF`). Stepped exports precede each run with a marker line:
//!
//! ```text
//! Step Information: Rload=1k Cload=10p  (Run: 2/4)
//! ```

use crate::columns::ColumnSet;
use crate::config::ExportConfig;
use crate::encoding::{LineCursor, TextEncoding};
use crate::reader::map_file;
use crate::types::{RawError, Result, Value};
use crate::writer::write_lines;
use memmap2::Mmap;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

const STEP_MARKER: &str = "Step Information:";
const UTF16_BOM: &[u8] = &[0xFF, 0xFE];

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:e[+-]?\d+)?)(meg|mil|[fpnumkgt])?[a-z]*$")
        .expect("number pattern is valid")
});

/// Decimal scale of a SPICE engineering suffix (case-insensitive).
pub fn si_scale(suffix: &str) -> Option<f64> {
    let scale = match suffix.to_ascii_lowercase().as_str() {
        "f" => 1e-15,
        "p" => 1e-12,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "meg" => 1e6,
        "g" => 1e9,
        "t" => 1e12,
        "mil" => 25.4e-6,
        _ => return None,
    };
    Some(scale)
}

/// Parse a numeric token such as `4.7k`, `1.5Meg`, `-2e-3` or `10pF`.
pub fn parse_si_number(token: &str) -> Option<f64> {
    let caps = NUMBER_PATTERN.captures(token.trim())?;
    let mantissa: f64 = caps[1].parse().ok()?;
    let scale = match caps.get(2) {
        Some(suffix) => si_scale(suffix.as_str())?,
        None => 1.0,
    };
    Some(mantissa * scale)
}

/// A parsed `Step Information:` marker
#[derive(Debug, Clone, PartialEq)]
pub struct StepInformation {
    /// `name=value` pairs in line order
    pub parameters: Vec<(String, String)>,
    /// Run label, e.g. `2/4`
    pub run: Option<String>,
}

impl StepInformation {
    /// Parse a marker line; returns `None` for anything else.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim_start().strip_prefix(STEP_MARKER)?;

        let (params, run) = match rest.find('(') {
            Some(open) => {
                let inner = rest[open + 1..].trim_end().trim_end_matches(')');
                let run = inner
                    .trim()
                    .strip_prefix("Run:")
                    .map(|r| r.trim().to_string());
                (&rest[..open], run)
            }
            None => (rest, None),
        };

        let parameters = params
            .split_whitespace()
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Some(Self { parameters, run })
    }
}

/// An opened export file
pub struct ExportReader {
    mmap: Mmap,
    encoding: TextEncoding,
    /// Byte offset of the title line
    text_start: usize,
    titles: Vec<String>,
    /// Byte offset just past the title line
    body_start: usize,
    stepped: bool,
}

impl ExportReader {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mmap = map_file(path.as_ref())?;

        let (encoding, text_start) = if mmap.starts_with(UTF16_BOM) {
            (TextEncoding::Utf16Le, UTF16_BOM.len())
        } else {
            (TextEncoding::SingleByte, 0)
        };

        let mut cursor = LineCursor::at(&mmap, text_start, encoding);
        let titles: Vec<String> = cursor
            .by_ref()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let body_start = cursor.position();

        let stepped = cursor.any(|line| line.trim_start().starts_with(STEP_MARKER));

        info!(
            columns = titles.len(),
            stepped,
            encoding = encoding.name(),
            "Export file opened"
        );

        Ok(Self {
            mmap,
            encoding,
            text_start,
            titles,
            body_start,
            stepped,
        })
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn is_stepped(&self) -> bool {
        self.stepped
    }

    /// Iterate over data rows as canonical tuples.
    pub fn rows(&self) -> ExportRows<'_> {
        let mut lines = LineCursor::at(&self.mmap, self.text_start, self.encoding);
        // Skip up to and including the title line so line numbers stay absolute
        while lines.position() < self.body_start && lines.next_line().is_some() {}

        ExportRows {
            lines,
            width: self.titles.len(),
            markers: 0,
            index: 0,
        }
    }
}

/// Data rows of an export file as `[stp, idx, col0, ...]`
pub struct ExportRows<'a> {
    lines: LineCursor<'a>,
    width: usize,
    /// Step markers seen so far
    markers: u64,
    index: u64,
}

impl<'a> ExportRows<'a> {
    fn parse_row(&self, line: &str) -> Result<Vec<Value>> {
        let mut tuple = Vec::with_capacity(self.width + 2);
        tuple.push(Value::Count(self.markers.saturating_sub(1)));
        tuple.push(Value::Count(self.index));

        for token in line.split_whitespace() {
            let value = parse_si_number(token).ok_or_else(|| RawError::InvalidNumber {
                line: self.lines.line_number(),
                token: token.to_string(),
            })?;
            tuple.push(Value::Double(value));
        }

        if tuple.len() != self.width + 2 {
            return Err(RawError::MalformedPoint {
                point: self.index as usize,
                expected: self.width,
                found: tuple.len() - 2,
            });
        }
        Ok(tuple)
    }
}

impl<'a> Iterator for ExportRows<'a> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next_line()?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(step) = StepInformation::parse(trimmed) {
                self.markers += 1;
                debug!(run = ?step.run, parameters = ?step.parameters, "Step marker");
                continue;
            }

            let row = self.parse_row(trimmed);
            self.index += 1;
            return Some(row);
        }
    }
}

/// Export an exported-text waveform file through the same column and line
/// machinery as RAW files.
#[instrument(skip_all, fields(input = %path.as_ref().display()))]
pub fn export_text<P: AsRef<Path>, W: Write>(
    path: P,
    config: &ExportConfig,
    sink: W,
) -> Result<usize> {
    config.validate()?;

    let reader = ExportReader::open(path)?;
    let columns = ColumnSet::new(
        reader.titles().iter().map(String::as_str),
        reader.is_stepped(),
        config,
    );
    let projection = columns.resolve(config.columns.as_deref())?;

    let limit = config.point_limit(usize::MAX);
    let written = write_lines(sink, config, &projection, limit, || Ok(reader.rows()))?;

    info!(lines = written, "Export complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_si_number() {
        assert_eq!(parse_si_number("42"), Some(42.0));
        assert_eq!(parse_si_number("4.7k"), Some(4700.0));
        assert_eq!(parse_si_number("4.7K"), Some(4700.0));
        assert_eq!(parse_si_number("1.5Meg"), Some(1.5e6));
        assert_eq!(parse_si_number("2m"), Some(2e-3));
        assert_eq!(parse_si_number("2M"), Some(2e-3));
        assert_eq!(parse_si_number("10pF"), Some(10.0 * 1e-12));
        assert_eq!(parse_si_number("3mil"), Some(3.0 * 25.4e-6));
        assert_eq!(parse_si_number("-1.25e-3"), Some(-1.25e-3));
        assert_eq!(parse_si_number(".5u"), Some(0.5 * 1e-6));
        assert_eq!(parse_si_number("1T"), Some(1e12));
    }

    #[test]
    fn test_parse_si_number_rejects() {
        assert_eq!(parse_si_number(""), None);
        assert_eq!(parse_si_number("abc"), None);
        assert_eq!(parse_si_number("1.2.3"), None);
        assert_eq!(parse_si_number("1k5"), None);
    }

    #[test]
    fn test_step_information() {
        let step =
            StepInformation::parse("Step Information: Rload=1k Cload=10p  (Run: 2/4)").unwrap();
        assert_eq!(
            step.parameters,
            vec![
                ("Rload".to_string(), "1k".to_string()),
                ("Cload".to_string(), "10p".to_string())
            ]
        );
        assert_eq!(step.run.as_deref(), Some("2/4"));

        let bare = StepInformation::parse("Step Information: x=1").unwrap();
        assert_eq!(bare.run, None);
        assert!(StepInformation::parse("time\tV(out)").is_none());
    }
}
