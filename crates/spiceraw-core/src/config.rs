//! Export configuration
//!
//! A single immutable value threaded through the column projector, the
//! sample decoder and the line emitter.

use crate::types::{
    Endian, FloatWidth, RawError, Result, DEFAULT_PLACEHOLDER, DEFAULT_SEPARATOR,
};
use tracing::level_filters::LevelFilter;

/// Options controlling how a RAW file is turned into delimited text.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Field separator of emitted lines
    pub separator: char,
    /// Replaces `separator` inside variable names
    pub placeholder: char,
    /// Emit a header line of column names
    pub print_titles: bool,
    /// Cap on emitted lines; one slot is always reserved for the header
    pub max_lines: Option<usize>,
    /// Requested columns; `None` selects the default set
    pub columns: Option<Vec<String>>,
    /// Byte order override, `big` or `little`
    pub endian: Option<String>,
    /// Float width override for binary data
    pub width: Option<FloatWidth>,
    /// Diagnostic verbosity (0 silent, 1 errors, 5 summary, 10 full detail)
    pub verbosity: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            placeholder: DEFAULT_PLACEHOLDER,
            print_titles: false,
            max_lines: None,
            columns: None,
            endian: None,
            width: None,
            verbosity: 1,
        }
    }
}

impl ExportConfig {
    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = placeholder;
        self
    }

    #[must_use]
    pub fn with_titles(mut self, enable: bool) -> Self {
        self.print_titles = enable;
        self
    }

    #[must_use]
    pub fn with_max_lines(mut self, max_lines: Option<usize>) -> Self {
        self.max_lines = max_lines;
        self
    }

    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_endian(mut self, endian: Option<String>) -> Self {
        self.endian = endian;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: Option<FloatWidth>) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Reject inconsistent options. Runs before the input file is opened.
    pub fn validate(&self) -> Result<()> {
        if self.separator == self.placeholder {
            return Err(RawError::ConflictingSeparators(self.separator));
        }
        self.byte_order()?;
        Ok(())
    }

    /// Resolved byte order: the override if given, otherwise the host order.
    pub fn byte_order(&self) -> Result<Endian> {
        match self.endian.as_deref() {
            Some(name) => name.parse(),
            None => Ok(Endian::native()),
        }
    }

    /// Number of data lines to emit for a file declaring `declared` points.
    ///
    /// A cap below 2 leaves room for the header only.
    pub fn point_limit(&self, declared: usize) -> usize {
        match self.max_lines {
            Some(cap) if cap < 2 => 0,
            Some(cap) => declared.min(cap - 1),
            None => declared,
        }
    }

    /// Tracing level matching the verbosity scale.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::OFF,
            1..=4 => LevelFilter::WARN,
            5..=9 => LevelFilter::INFO,
            10..=19 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.separator, ',');
        assert_eq!(config.placeholder, ';');
        assert!(config.validate().is_ok());
        assert_eq!(config.byte_order().unwrap(), Endian::native());
    }

    #[test]
    fn test_conflicting_separators() {
        let config = ExportConfig::default().with_placeholder(',');
        assert!(matches!(
            config.validate(),
            Err(RawError::ConflictingSeparators(','))
        ));
    }

    #[test]
    fn test_invalid_endianness() {
        let config = ExportConfig::default().with_endian(Some("middle".into()));
        assert!(matches!(
            config.validate(),
            Err(RawError::InvalidEndianness(s)) if s == "middle"
        ));

        let config = ExportConfig::default().with_endian(Some("big".into()));
        assert_eq!(config.byte_order().unwrap(), Endian::Big);
    }

    #[test]
    fn test_point_limit() {
        let config = ExportConfig::default();
        assert_eq!(config.point_limit(10), 10);
        assert_eq!(config.clone().with_max_lines(Some(0)).point_limit(10), 0);
        assert_eq!(config.clone().with_max_lines(Some(1)).point_limit(10), 0);
        assert_eq!(config.clone().with_max_lines(Some(4)).point_limit(10), 3);
        assert_eq!(config.with_max_lines(Some(100)).point_limit(10), 10);
    }

    #[test]
    fn test_log_level() {
        let level = |v| ExportConfig::default().with_verbosity(v).log_level();
        assert_eq!(level(0), LevelFilter::OFF);
        assert_eq!(level(1), LevelFilter::WARN);
        assert_eq!(level(5), LevelFilter::INFO);
        assert_eq!(level(10), LevelFilter::DEBUG);
        assert_eq!(level(25), LevelFilter::TRACE);
    }
}
