//! Command-line EDF → WFDB converter.
//!
//! Thin wrapper around the library: resolves the input/output pair from the
//! positional arguments and runs one conversion.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use edf2wfdb::{EdfReader, WfdbWriter};

const DEFAULT_INPUT: &str = "03215_hr.edf";

/// Convert an EDF biosignal recording into a WFDB record (.hea/.dat pair)
#[derive(Parser)]
#[command(name = "edf2wfdb")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input EDF file (defaults to 03215_hr.edf)
    input: Option<PathBuf>,

    /// Output base name, .hea and .dat are appended (defaults to the input
    /// name with its .edf extension stripped)
    output: Option<PathBuf>,
}

/// Derives the output base name from the input path by cutting at the
/// `.edf` extension; names without one are used whole.
fn output_base(input: &Path) -> PathBuf {
    let name = input.to_string_lossy();
    match name.find(".edf") {
        Some(end) => PathBuf::from(&name[..end]),
        None => input.to_path_buf(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let input = cli.input.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
    let output = cli.output.unwrap_or_else(|| output_base(&input));

    let mut reader = EdfReader::open(&input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let writer = WfdbWriter::create(&output)
        .with_context(|| format!("failed to create output pair {}", output.display()))?;

    writer.convert(&mut reader)
        .with_context(|| format!("conversion of {} failed", input.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_base_strips_edf_extension() {
        assert_eq!(output_base(Path::new("foo.edf")), PathBuf::from("foo"));
        assert_eq!(output_base(Path::new("data/03215_hr.edf")), PathBuf::from("data/03215_hr"));
    }

    #[test]
    fn test_output_base_without_extension() {
        assert_eq!(output_base(Path::new("foo")), PathBuf::from("foo"));
    }
}
