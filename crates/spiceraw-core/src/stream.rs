//! Streaming sample decoder for RAW files
//!
//! Design principles:
//! - Only the header is parsed at open() time
//! - Samples are decoded one point at a time during iteration
//! - Peak memory is O(variables), not O(file_size)
//! - A decoder never reads past the last requested point

use crate::config::ExportConfig;
use crate::encoding::{LineCursor, TextEncoding};
use crate::header::parse_header;
use crate::metadata::FileMetadata;
use crate::reader::{map_file, MmapReader};
use crate::types::*;
use memmap2::Mmap;
use std::path::Path;
use tracing::{debug, info, instrument, trace, warn};

/// An opened and validated RAW file
pub struct RawReader {
    /// Memory-mapped file data
    mmap: Mmap,
    /// Validated header metadata
    metadata: FileMetadata,
}

impl RawReader {
    /// Open a RAW file and validate its header.
    ///
    /// Only parses the header. Samples are read on demand.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mmap = map_file(path.as_ref())?;

        let encoding = TextEncoding::detect(&mmap)?;
        let header = parse_header(&mmap, encoding)?;
        let metadata = FileMetadata::from_header(header)?;

        Ok(Self { mmap, metadata })
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// Total file size in bytes
    pub fn file_size(&self) -> usize {
        self.mmap.len()
    }

    /// Start decoding at most `limit` points.
    pub fn samples(&self, config: &ExportConfig, limit: usize) -> Result<SampleStream<'_>> {
        let meta = &self.metadata;
        let limit = limit.min(meta.point_count);

        match meta.file_type {
            FileType::Ascii => Ok(SampleStream::Ascii(AsciiSamples::new(
                &self.mmap, meta, limit,
            ))),
            FileType::Binary => {
                let layout = BinaryLayout::infer(meta, self.mmap.len(), config)?;
                Ok(SampleStream::Binary(BinarySamples::new(
                    &self.mmap, meta, layout, limit,
                )))
            }
        }
    }
}

// ============================================================================
// Binary layout
// ============================================================================

/// Record layout of a binary sample region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryLayout {
    pub width: FloatWidth,
    pub endian: Endian,
    /// Bytes per point: the 8-byte time channel plus the other variables
    pub record_size: usize,
}

impl BinaryLayout {
    /// Decide value width and byte order for a binary file of `file_size` bytes.
    ///
    /// Without an override the width is estimated from the size of the data
    /// region; the estimate must come out as 4 or 8 bytes.
    pub fn infer(meta: &FileMetadata, file_size: usize, config: &ExportConfig) -> Result<Self> {
        let data_len = file_size.saturating_sub(meta.data_start);
        let others = meta.variable_count.saturating_sub(1);

        let width = match config.width {
            Some(width) => width,
            None if others == 0 || meta.point_count == 0 => FloatWidth::Double,
            None => {
                let per_point = data_len / meta.point_count;
                let estimate = per_point.saturating_sub(TIME_FIELD_SIZE) / others;
                debug!(data_len, per_point, estimate, "Estimated sample width");
                FloatWidth::from_size(estimate)
                    .ok_or(RawError::UnsupportedSampleWidth { width: estimate })?
            }
        };

        let layout = Self {
            width,
            endian: config.byte_order()?,
            record_size: TIME_FIELD_SIZE + others * width.size(),
        };

        let expected = layout.record_size * meta.point_count;
        if data_len % layout.record_size != 0 || data_len < expected {
            warn!(
                data_len,
                record_size = layout.record_size,
                expected,
                "Binary data size does not match the record layout"
            );
        }

        debug!(
            width = width.size(),
            endian = %layout.endian,
            record_size = layout.record_size,
            data_len,
            "Binary layout"
        );

        Ok(layout)
    }
}

// ============================================================================
// Decoders
// ============================================================================

/// Samples of an ASCII (`Values:`) RAW file
///
/// Each point is `index<TAB>time` followed by one line per remaining
/// variable. Values are passed through as text.
pub struct AsciiSamples<'a> {
    lines: LineCursor<'a>,
    variable_count: usize,
    stepped: bool,
    remaining: usize,
    point: usize,
    step: u64,
    /// Time token of the first point, the sweep restart marker
    first_time: Option<String>,
}

impl<'a> AsciiSamples<'a> {
    pub fn new(data: &'a [u8], meta: &FileMetadata, limit: usize) -> Self {
        Self {
            lines: LineCursor::at(data, meta.data_start, meta.encoding),
            variable_count: meta.variable_count,
            stepped: meta.is_stepped,
            remaining: limit,
            point: 0,
            step: 0,
            first_time: None,
        }
    }

    fn next_point(&mut self) -> Result<Vec<Value>> {
        let line = loop {
            match self.lines.next_line() {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
                None => return Err(RawError::TruncatedData { point: self.point }),
            }
        };

        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();

        if let Some(time) = tokens.get(1) {
            match &self.first_time {
                None => self.first_time = Some(time.clone()),
                Some(first) if self.stepped && first == time => {
                    self.step += 1;
                    debug!(step = self.step, point = self.point, "Sweep restarted");
                }
                Some(_) => {}
            }
        }

        let mut tuple = Vec::with_capacity(self.variable_count + 2);
        tuple.push(Value::Count(self.step));
        tuple.extend(tokens.into_iter().map(Value::Text));

        for _ in 1..self.variable_count {
            let line = self
                .lines
                .next_line()
                .ok_or(RawError::TruncatedData { point: self.point })?;
            tuple.push(Value::Text(line.trim().to_string()));
        }

        if tuple.len() != self.variable_count + 2 {
            return Err(RawError::MalformedPoint {
                point: self.point,
                expected: self.variable_count + 1,
                found: tuple.len() - 1,
            });
        }

        Ok(tuple)
    }
}

impl<'a> Iterator for AsciiSamples<'a> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.next_point() {
            Ok(tuple) => {
                trace!(point = self.point, "ASCII point decoded");
                self.remaining -= 1;
                self.point += 1;
                Some(Ok(tuple))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Samples of a binary (`Binary:`) RAW file
///
/// Records are fixed width. The step number is carried as-is: binary data
/// does not reveal sweep restarts by value repetition here.
pub struct BinarySamples<'a> {
    reader: MmapReader<'a>,
    layout: BinaryLayout,
    variable_count: usize,
    time_offset: Option<f64>,
    remaining: usize,
    point: u64,
    step: u64,
}

impl<'a> BinarySamples<'a> {
    pub fn new(data: &'a [u8], meta: &FileMetadata, layout: BinaryLayout, limit: usize) -> Self {
        if meta.is_stepped {
            warn!("Stepped binary file: step numbers are not derived for binary data");
        }

        let start = meta.data_start.min(data.len());
        Self {
            reader: MmapReader::new(&data[start..], layout.endian),
            layout,
            variable_count: meta.variable_count,
            time_offset: meta.time_offset,
            remaining: limit,
            point: 0,
            step: 0,
        }
    }

    pub fn layout(&self) -> BinaryLayout {
        self.layout
    }

    /// Bytes of the data region consumed so far
    #[inline]
    pub fn bytes_consumed(&self) -> usize {
        self.reader.position()
    }

    fn next_record(&mut self) -> Result<Vec<Value>> {
        if self.reader.remaining() < self.layout.record_size {
            return Err(RawError::TruncatedData {
                point: self.point as usize,
            });
        }

        let mut tuple = Vec::with_capacity(self.variable_count + 2);
        tuple.push(Value::Count(self.step));
        tuple.push(Value::Count(self.point));

        let time = self.reader.read_f64()? + self.time_offset.unwrap_or(0.0);
        tuple.push(Value::Double(time));

        for _ in 1..self.variable_count {
            let value = match self.layout.width {
                FloatWidth::Single => Value::Single(self.reader.read_f32()?),
                FloatWidth::Double => Value::Double(self.reader.read_f64()?),
            };
            tuple.push(value);
        }

        Ok(tuple)
    }
}

impl<'a> Iterator for BinarySamples<'a> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.next_record() {
            Ok(tuple) => {
                trace!(point = self.point, "Binary record decoded");
                self.remaining -= 1;
                self.point += 1;
                Some(Ok(tuple))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Decoder for either data layout
pub enum SampleStream<'a> {
    Ascii(AsciiSamples<'a>),
    Binary(BinarySamples<'a>),
}

impl<'a> Iterator for SampleStream<'a> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SampleStream::Ascii(samples) => samples.next(),
            SampleStream::Binary(samples) => samples.next(),
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Open a RAW file, logging its metadata summary.
pub fn read_raw<P: AsRef<Path>>(path: P) -> Result<RawReader> {
    let reader = RawReader::open(path)?;
    info!(
        size = reader.file_size(),
        data_start = reader.metadata().data_start,
        "RAW file opened"
    );
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_header;

    fn binary_meta(variables: usize, points: usize) -> FileMetadata {
        let mut text = format!(
            "Title: t\nPlotname: Transient Analysis\nNo. Variables: {variables}\n\
             No. Points: {points}\nVariables:\n\t0\ttime\ttime\n"
        );
        for i in 1..variables {
            text.push_str(&format!("\t{i}\tv{i}\tvoltage\n"));
        }
        text.push_str("Binary:\n");
        let header = parse_header(text.as_bytes(), TextEncoding::SingleByte).unwrap();
        FileMetadata::from_header(header).unwrap()
    }

    #[test]
    fn test_infer_single_width() {
        let meta = binary_meta(3, 10);
        let size = meta.data_start + 10 * (8 + 2 * 4);
        let layout = BinaryLayout::infer(&meta, size, &ExportConfig::default()).unwrap();
        assert_eq!(layout.width, FloatWidth::Single);
        assert_eq!(layout.record_size, 16);
    }

    #[test]
    fn test_infer_double_width() {
        let meta = binary_meta(3, 10);
        let size = meta.data_start + 10 * 24;
        let layout = BinaryLayout::infer(&meta, size, &ExportConfig::default()).unwrap();
        assert_eq!(layout.width, FloatWidth::Double);
        assert_eq!(layout.record_size, 24);
    }

    #[test]
    fn test_infer_rejects_odd_width() {
        let meta = binary_meta(3, 10);
        let size = meta.data_start + 10 * (8 + 2 * 6);
        let err = BinaryLayout::infer(&meta, size, &ExportConfig::default()).unwrap_err();
        assert!(matches!(err, RawError::UnsupportedSampleWidth { width: 6 }));
    }

    #[test]
    fn test_override_skips_estimate() {
        let meta = binary_meta(2, 4);
        let config = ExportConfig::default()
            .with_width(Some(FloatWidth::Double))
            .with_endian(Some("big".into()));
        let layout = BinaryLayout::infer(&meta, meta.data_start + 3, &config).unwrap();
        assert_eq!(layout.record_size, 16);
        assert_eq!(layout.endian, Endian::Big);
    }

    #[test]
    fn test_binary_samples_apply_offset_and_stop() {
        let mut meta = binary_meta(2, 3);
        meta.time_offset = Some(10.0);

        let mut data = vec![0u8; meta.data_start];
        for (t, v) in [(0.0f64, 1.0f32), (1.0, 2.0), (2.0, 3.0)] {
            data.extend_from_slice(&t.to_le_bytes());
            data.extend_from_slice(&v.to_le_bytes());
        }
        let layout = BinaryLayout {
            width: FloatWidth::Single,
            endian: Endian::Little,
            record_size: 12,
        };

        let mut samples = BinarySamples::new(&data, &meta, layout, 2);
        let first = samples.next().unwrap().unwrap();
        assert_eq!(
            first,
            vec![
                Value::Count(0),
                Value::Count(0),
                Value::Double(10.0),
                Value::Single(1.0)
            ]
        );
        let second = samples.next().unwrap().unwrap();
        assert_eq!(second[1], Value::Count(1));
        assert!(samples.next().is_none());
        assert_eq!(samples.bytes_consumed(), 24);
    }

    #[test]
    fn test_binary_truncated() {
        let meta = binary_meta(2, 2);
        let mut data = vec![0u8; meta.data_start];
        data.extend_from_slice(&[0u8; 20]);
        let layout = BinaryLayout {
            width: FloatWidth::Double,
            endian: Endian::Little,
            record_size: 16,
        };

        let results: Vec<_> = BinarySamples::new(&data, &meta, layout, 2).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(RawError::TruncatedData { point: 1 })
        ));
    }
}
