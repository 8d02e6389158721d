//! SPICE RAW transient exporter.

use clap::Parser;
use spiceraw_core::{export_raw, export_text, ExportConfig, RawError, Result};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use tracing::{error, info};

mod cli;
mod logging;

use crate::cli::Cli;
use crate::logging::{init_logging, LogConfig};

fn main() {
    let cli = Cli::parse();
    let config = cli.export_config();

    let log_config = LogConfig::default()
        .with_level(config.log_level())
        .with_ansi(io::stderr().is_terminal());
    init_logging(&log_config);

    let exit_code = match run(&cli, &config) {
        Ok(lines) => {
            info!(lines, "Done");
            0
        }
        Err(err) => {
            error!("{err}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Validate options, open the sink and export the input.
fn run(cli: &Cli, config: &ExportConfig) -> Result<usize> {
    config.validate()?;

    let sink: Box<dyn Write> = if cli.writes_stdout() {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(&cli.output).map_err(|source| RawError::OutputOpenFailed {
            path: cli.output.clone(),
            source,
        })?;
        Box::new(file)
    };

    if cli.export {
        export_text(&cli.file, config, sink)
    } else {
        export_raw(&cli.file, config, sink)
    }
}
