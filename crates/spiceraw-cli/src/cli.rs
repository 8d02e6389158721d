//! CLI argument definitions for the RAW exporter.

use std::path::PathBuf;

use clap::Parser;
use spiceraw_core::{ExportConfig, FloatWidth, DEFAULT_PLACEHOLDER, DEFAULT_SEPARATOR};

#[derive(Parser, Debug)]
#[command(
    name = "spiceraw",
    version,
    about = "Export SPICE RAW transient waveforms as delimited text",
    long_about = "Export transient-analysis waveforms from SPICE RAW files as delimited text.\n\n\
                  Reads ASCII and binary RAW files (ngspice, LTspice uncompressed) and\n\
                  LTspice \"Export data as text\" files with --export."
)]
pub struct Cli {
    /// Input RAW (or exported text) file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output file, `-` for standard output.
    #[arg(short = 'o', long = "output", value_name = "PATH", default_value = "-")]
    pub output: PathBuf,

    /// Diagnostic verbosity: 0 silent, 1 errors, 5 metadata summary,
    /// 10 raw metadata and binary sizing, 20 per-point trace.
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value_t = 1)]
    pub debug: u8,

    /// Print a header line with the column names.
    #[arg(short = 't', long = "titles")]
    pub titles: bool,

    /// Maximum number of output lines, header slot included.
    #[arg(short = 'n', long = "max-lines", value_name = "N")]
    pub max_lines: Option<usize>,

    /// Columns to export (case-insensitive, repeatable or comma-separated).
    #[arg(short = 'c', long = "columns", value_name = "NAME", value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Field separator.
    #[arg(short = 's', long = "separator", value_name = "CHAR", default_value_t = DEFAULT_SEPARATOR)]
    pub separator: char,

    /// Replacement for the separator inside variable names.
    #[arg(short = 'p', long = "placeholder", value_name = "CHAR", default_value_t = DEFAULT_PLACEHOLDER)]
    pub placeholder: char,

    /// Byte order of binary data (big or little); host order by default.
    #[arg(short = 'e', long = "endian", value_name = "ORDER")]
    pub endian: Option<String>,

    /// Float width of binary data (single or double); inferred by default.
    #[arg(short = 'w', long = "width", value_name = "WIDTH")]
    pub width: Option<String>,

    /// Treat the input as an exported text file.
    #[arg(long = "export")]
    pub export: bool,
}

impl Cli {
    /// Export options carried by the arguments.
    pub fn export_config(&self) -> ExportConfig {
        let config = ExportConfig::default()
            .with_separator(self.separator)
            .with_placeholder(self.placeholder)
            .with_titles(self.titles)
            .with_max_lines(self.max_lines)
            .with_endian(self.endian.clone())
            .with_width(self.width.as_deref().map(FloatWidth::from_override))
            .with_verbosity(self.debug);

        if self.columns.is_empty() {
            config
        } else {
            config.with_columns(self.columns.iter().map(|c| c.trim().to_string()))
        }
    }

    /// Whether output goes to standard output.
    pub fn writes_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}
