//! excel-exporter - export an Excel workbook's sheets, VBA and ribbon XML

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use excel_exporter_com::{ExcelBridge, ExcelBridgeConfig};
use excel_exporter_core::args::{resolve, CommandRegistry};
use excel_exporter_core::{ExportOptions, Exporter, OutputLayout, ParsedConfiguration};
use tracing_subscriber::EnvFilter;

const BANNER: &str = "\
Excel Exporter - Command Line Interface
====================================
A tool for exporting data to Excel files
";

fn main() -> ExitCode {
    setup_logging();
    println!("{BANNER}");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let resolution = resolve(&args, &CommandRegistry::standard());

    let log = resolution.message_log();
    if !log.is_empty() {
        println!("{log}");
    }
    if resolution.is_stop() {
        return ExitCode::SUCCESS;
    }
    if !resolution.is_success() {
        return ExitCode::FAILURE;
    }

    match run(&resolution.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(config: &ParsedConfiguration) -> Result<()> {
    let input = config
        .input_path()
        .context("No input file specified")?;
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }

    let layout = OutputLayout::new(config)?;
    layout
        .create()
        .with_context(|| format!("Failed to create '{}'", layout.root().display()))?;
    tracing::debug!(root = %layout.root().display(), "output layout ready");

    let bridge = ExcelBridge::start(ExcelBridgeConfig::from_env())
        .context("Failed to start the Excel bridge")?;

    let result = Exporter::new(&bridge, ExportOptions::default()).run(config, &layout);

    if let Err(e) = bridge.shutdown() {
        tracing::warn!("Bridge did not shut down cleanly: {e}");
    }

    let summary = result.with_context(|| format!("Failed to export '{}'", input.display()))?;
    for warning in &summary.warnings {
        println!("Warning: {warning}");
    }
    println!(
        "Exported {} worksheet(s), {} file(s) written to {}",
        summary.sheets_exported,
        summary.files_written.len(),
        layout.root().display()
    );

    Ok(())
}
