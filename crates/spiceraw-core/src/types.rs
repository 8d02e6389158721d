//! Common types, errors, and constants for RAW file operations

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Section names that end the header and start the data region
pub const SECTION_VALUES: &str = "Values";
pub const SECTION_BINARY: &str = "Binary";

pub const SECTION_PLOTNAME: &str = "Plotname";
pub const SECTION_VARIABLES: &str = "Variables";
pub const SECTION_NUM_VARIABLES: &str = "No. Variables";
pub const SECTION_NUM_POINTS: &str = "No. Points";
pub const SECTION_FLAGS: &str = "Flags";
pub const SECTION_COMMAND: &str = "Command";
pub const SECTION_OFFSET: &str = "Offset";
pub const SECTION_TITLE: &str = "Title";
pub const SECTION_DATE: &str = "Date";

/// The only analysis this crate extracts
pub const TRANSIENT_PLOTNAME: &str = "Transient Analysis";

pub const FLAG_FASTACCESS: &str = "fastaccess";
pub const FLAG_STEPPED: &str = "stepped";
pub const FLAG_NOCOMPRESSION: &str = "nocompression";
pub const LTSPICE_MARKER: &str = "LTspice";

/// Synthetic column titles prepended to every sample tuple
pub const STEP_TITLE: &str = "stp";
pub const INDEX_TITLE: &str = "idx";

/// The time channel of a binary record is always a double
pub const TIME_FIELD_SIZE: usize = 8;

pub const DEFAULT_SEPARATOR: char = ',';
pub const DEFAULT_PLACEHOLDER: char = ';';

// ============================================================================
// Enums
// ============================================================================

/// Byte order of binary sample data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the host this binary was compiled for
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

impl FromStr for Endian {
    type Err = RawError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "big" => Ok(Endian::Big),
            "little" => Ok(Endian::Little),
            other => Err(RawError::InvalidEndianness(other.to_string())),
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => write!(f, "little"),
            Endian::Big => write!(f, "big"),
        }
    }
}

/// Width of the non-time values in a binary record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    /// 4-byte float32 (LTspice default)
    Single,
    /// 8-byte float64 (ngspice, LTspice `.option numdgt>6`)
    Double,
}

impl FloatWidth {
    #[inline]
    pub fn size(self) -> usize {
        match self {
            FloatWidth::Single => 4,
            FloatWidth::Double => 8,
        }
    }

    pub fn from_size(size: usize) -> Option<Self> {
        match size {
            4 => Some(FloatWidth::Single),
            8 => Some(FloatWidth::Double),
            _ => None,
        }
    }

    /// Interpret a user override: `double` selects 8 bytes, anything else 4.
    pub fn from_override(name: &str) -> Self {
        if name == "double" {
            FloatWidth::Double
        } else {
            FloatWidth::Single
        }
    }
}

/// Layout of the sample region, named by the terminal header section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// `Values:` section, one textual value per line
    Ascii,
    /// `Binary:` section, fixed-width records
    Binary,
}

impl FileType {
    pub fn from_section(name: &str) -> Option<Self> {
        match name {
            SECTION_VALUES => Some(FileType::Ascii),
            SECTION_BINARY => Some(FileType::Binary),
            _ => None,
        }
    }
}

/// A single field of a sample tuple
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Step number or point index
    Count(u64),
    Double(f64),
    Single(f32),
    /// ASCII data is passed through untouched
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Count(n) => write!(f, "{}", n),
            Value::Double(v) => write_float(f, *v, v.abs()),
            Value::Single(v) => write_float(f, *v, v.abs() as f64),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip rendering, exponent form for very small or large magnitudes.
fn write_float<T: fmt::Display + fmt::LowerExp>(
    f: &mut fmt::Formatter<'_>,
    value: T,
    magnitude: f64,
) -> fmt::Result {
    if magnitude == 0.0 || !magnitude.is_finite() || (1e-4..1e16).contains(&magnitude) {
        write!(f, "{}", value)
    } else {
        write!(f, "{:e}", value)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for RAW reading and export operations
#[derive(Error, Debug)]
pub enum RawError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("formatting error: {0}")]
    Format(#[from] fmt::Error),

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("cannot stat {}: {source}", path.display())]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open output {}: {source}", path.display())]
    OutputOpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized format: file does not start with a RAW 'Title:' header")]
    UnrecognizedFormat,

    #[error("line {line}: data before any header section")]
    OrphanData { line: usize },

    #[error("no 'Values:' or 'Binary:' section found")]
    NoDataSection,

    #[error("unsupported analysis '{0}', only 'Transient Analysis' can be extracted")]
    UnsupportedAnalysis(String),

    #[error("missing 'Variables:' section")]
    MissingVariables,

    #[error("missing or invalid 'No. Variables:' section")]
    MissingVariableCount,

    #[error("missing or invalid 'No. Points:' section")]
    MissingPointCount,

    #[error("header declares {declared} variables but lists {found}")]
    VariableCountMismatch { declared: usize, found: usize },

    #[error("FastAccess RAW files are not supported")]
    FastAccessUnsupported,

    #[error("compressed LTspice RAW files are not supported")]
    CompressedUnsupported,

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("invalid endianness '{0}', expected 'big' or 'little'")]
    InvalidEndianness(String),

    #[error("separator and placeholder are both '{0}'")]
    ConflictingSeparators(char),

    #[error("cannot infer sample width: computed {width} bytes per value")]
    UnsupportedSampleWidth { width: usize },

    #[error("point {point}: expected {expected} values, found {found}")]
    MalformedPoint {
        point: usize,
        expected: usize,
        found: usize,
    },

    #[error("data ends before point {point}")]
    TruncatedData { point: usize },

    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },
}

pub type Result<T> = std::result::Result<T, RawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endian_from_str() {
        assert_eq!("big".parse::<Endian>().unwrap(), Endian::Big);
        assert_eq!("little".parse::<Endian>().unwrap(), Endian::Little);
        assert!(matches!(
            "Big".parse::<Endian>(),
            Err(RawError::InvalidEndianness(s)) if s == "Big"
        ));
    }

    #[test]
    fn test_float_width_override() {
        assert_eq!(FloatWidth::from_override("double"), FloatWidth::Double);
        assert_eq!(FloatWidth::from_override("single"), FloatWidth::Single);
        assert_eq!(FloatWidth::from_override("anything"), FloatWidth::Single);
        assert_eq!(FloatWidth::from_size(8), Some(FloatWidth::Double));
        assert_eq!(FloatWidth::from_size(6), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Count(7).to_string(), "7");
        assert_eq!(Value::Double(0.0).to_string(), "0");
        assert_eq!(Value::Double(0.25).to_string(), "0.25");
        assert_eq!(Value::Double(1e-6).to_string(), "1e-6");
        assert_eq!(Value::Double(-2.5e-9).to_string(), "-2.5e-9");
        assert_eq!(Value::Single(0.1).to_string(), "0.1");
        assert_eq!(Value::Text("1.0e-03".into()).to_string(), "1.0e-03");
    }
}
