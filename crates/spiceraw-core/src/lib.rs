//! # SPICE RAW Transient Extractor - Core Library
//!
//! Reads transient-analysis waveforms from SPICE RAW files and re-emits them
//! as delimited text.
//!
//! ## Supported Formats
//!
//! - ngspice / SPICE3 raw, ASCII (`Values:`) and binary (`Binary:`)
//! - LTspice raw with UTF-16LE headers, uncompressed (`nocompression`)
//! - LTspice "Export data as text" files with engineering suffixes
//!
//! FastAccess and compressed LTspice files are detected and rejected, as are
//! analyses other than `Transient Analysis`.
//!
//! ## Features
//!
//! - Memory-mapped input, one point decoded at a time
//! - Binary value width (float32/float64) inferred from the file size
//! - Big/little endian data with host order as default
//! - Case-insensitive column selection over `stp`, `idx` and the variables
//! - Structured logging via `tracing` for diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spiceraw_core::{export_raw, ExportConfig};
//!
//! let config = ExportConfig::default()
//!     .with_titles(true)
//!     .with_columns(["time", "V(out)"]);
//!
//! let lines = export_raw("rc.raw", &config, std::io::stdout().lock()).unwrap();
//! eprintln!("{} points written", lines);
//! ```
//!
//! ## Reading Samples Directly
//!
//! ```rust,no_run
//! use spiceraw_core::{read_raw, ExportConfig};
//!
//! let reader = read_raw("rc.raw").unwrap();
//! let meta = reader.metadata();
//! println!("{} variables, {} points", meta.variable_count, meta.point_count);
//!
//! for tuple in reader.samples(&ExportConfig::default(), meta.point_count).unwrap() {
//!     let tuple = tuple.unwrap();
//!     println!("step {} point {}: {}", tuple[0], tuple[1], tuple[2]);
//! }
//! ```
//!
//! ## Enabling Logging
//!
//! This library uses `tracing` for structured logging. Metadata summaries are
//! logged at `info`, raw header sections and binary sizing at `debug`:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! let lines = spiceraw_core::export_raw("rc.raw", &config, sink)?;
//! ```

mod columns;
mod config;
mod encoding;
mod export;
mod header;
mod metadata;
mod reader;
mod stream;
mod types;
mod writer;

// Re-export public types
pub use types::{
    // Layout
    Endian,
    FileType,
    FloatWidth,
    // Errors
    RawError,
    Result,
    Value,
    // Constants
    DEFAULT_PLACEHOLDER,
    DEFAULT_SEPARATOR,
    INDEX_TITLE,
    STEP_TITLE,
};

pub use columns::{sanitize_title, ColumnSet, Projection};
pub use config::ExportConfig;
pub use encoding::{LineCursor, TextEncoding};
pub use header::{parse_header, DataSection, MetadataSection, RawHeader};
pub use metadata::{FileMetadata, VariableDescriptor};

// Re-export streaming types
pub use stream::{read_raw, AsciiSamples, BinaryLayout, BinarySamples, RawReader, SampleStream};

// Re-export writers
pub use writer::{export_raw, write_lines, LineWriter};

// Re-export the exported-text collaborator
pub use export::{
    export_text, parse_si_number, si_scale, ExportReader, ExportRows, StepInformation,
};
