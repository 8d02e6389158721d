//! Delimited text writer

use crate::columns::{ColumnSet, Projection};
use crate::config::ExportConfig;
use crate::stream::read_raw;
use crate::types::{Result, Value};
use std::fmt::Write as _;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Writes one separator-joined line per sample
pub struct LineWriter<W: Write> {
    writer: BufWriter<W>,
    separator: char,
    line: String,
    data_lines: usize,
}

impl<W: Write> LineWriter<W> {
    pub fn new(sink: W, separator: char) -> Self {
        Self {
            writer: BufWriter::new(sink),
            separator,
            line: String::new(),
            data_lines: 0,
        }
    }

    /// Write the header line. Titles are written verbatim.
    pub fn write_titles(&mut self, titles: &[String]) -> Result<()> {
        self.line.clear();
        for (i, title) in titles.iter().enumerate() {
            if i > 0 {
                self.line.push(self.separator);
            }
            self.line.push_str(title);
        }
        writeln!(self.writer, "{}", self.line)?;
        Ok(())
    }

    /// Write the projected fields of one sample tuple.
    pub fn write_sample(&mut self, projection: &Projection, tuple: &[Value]) -> Result<()> {
        self.line.clear();
        for (i, value) in projection.apply(self.data_lines, tuple)?.enumerate() {
            if i > 0 {
                self.line.push(self.separator);
            }
            write!(self.line, "{}", value)?;
        }
        writeln!(self.writer, "{}", self.line)?;
        self.data_lines += 1;
        Ok(())
    }

    /// Flush and return the number of data lines written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.data_lines)
    }
}

/// Emit the header (when enabled) and up to `limit` projected samples.
pub fn write_lines<W, I>(
    sink: W,
    config: &ExportConfig,
    projection: &Projection,
    limit: usize,
    samples: impl FnOnce() -> Result<I>,
) -> Result<usize>
where
    W: Write,
    I: Iterator<Item = Result<Vec<Value>>>,
{
    let mut writer = LineWriter::new(sink, config.separator);

    if config.print_titles {
        writer.write_titles(&projection.titles)?;
    }

    if limit > 0 {
        for tuple in samples()?.take(limit) {
            writer.write_sample(projection, &tuple?)?;
        }
    }

    writer.finish()
}

/// Export the transient data of a RAW file as delimited text.
///
/// # Arguments
/// * `path` - Path to the `.raw` file
/// * `config` - Export options, validated before the file is opened
/// * `sink` - Destination of the text lines
///
/// # Returns
/// * `Ok(usize)` - Number of data lines written
/// * `Err(RawError)` - The first fatal condition encountered
#[instrument(skip_all, fields(input = %path.as_ref().display()))]
pub fn export_raw<P: AsRef<Path>, W: Write>(path: P, config: &ExportConfig, sink: W) -> Result<usize> {
    config.validate()?;

    let reader = read_raw(path)?;
    let meta = reader.metadata();

    let columns = ColumnSet::new(meta.variable_names(), meta.is_stepped, config);
    let projection = columns.resolve(config.columns.as_deref())?;
    debug!(columns = ?projection.titles, indices = ?projection.indices, "Columns resolved");

    let limit = config.point_limit(meta.point_count);
    let written = write_lines(sink, config, &projection, limit, || {
        reader.samples(config, limit)
    })?;

    info!(lines = written, "Export complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Projection {
        Projection {
            titles: vec!["idx".into(), "v(a;b)".into()],
            indices: vec![1, 2],
        }
    }

    fn tuples(n: u64) -> Vec<Result<Vec<Value>>> {
        (0..n)
            .map(|i| Ok(vec![Value::Count(0), Value::Count(i), Value::Double(i as f64 * 0.5)]))
            .collect()
    }

    fn render(config: &ExportConfig, limit: usize, n: u64) -> (String, usize) {
        let mut out = Vec::new();
        let written = write_lines(&mut out, config, &projection(), limit, || {
            Ok(tuples(n).into_iter())
        })
        .unwrap();
        (String::from_utf8(out).unwrap(), written)
    }

    #[test]
    fn test_titles_and_rows() {
        let config = ExportConfig::default().with_titles(true);
        let (text, written) = render(&config, 3, 3);
        assert_eq!(text, "idx,v(a;b)\n0,0\n1,0.5\n2,1\n");
        assert_eq!(written, 3);
    }

    #[test]
    fn test_limit_and_separator() {
        let config = ExportConfig::default().with_separator('\t');
        let (text, written) = render(&config, 1, 3);
        assert_eq!(text, "0\t0\n");
        assert_eq!(written, 1);
    }

    #[test]
    fn test_zero_limit_never_pulls_samples() {
        let config = ExportConfig::default().with_titles(true);
        let mut out = Vec::new();
        let written = write_lines(&mut out, &config, &projection(), 0, || {
            Err::<std::vec::IntoIter<Result<Vec<Value>>>, _>(crate::types::RawError::NoDataSection)
        })
        .unwrap();
        assert_eq!(written, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "idx,v(a;b)\n");
    }

    #[test]
    fn test_short_tuple_is_malformed() {
        let config = ExportConfig::default();
        let mut out = Vec::new();
        let err = write_lines(&mut out, &config, &projection(), 2, || {
            Ok(vec![Ok(vec![Value::Count(0), Value::Count(0)])].into_iter())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            crate::types::RawError::MalformedPoint { point: 0, expected: 3, found: 2 }
        ));
    }
}
