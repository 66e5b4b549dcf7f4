//! # mzdb
//!
//! A command-line tool for inspecting mzDB mass spectrometry files.
//!
//! ## Usage
//!
//! ```bash
//! # File summary
//! mzdb info run.mzDB
//!
//! # Peaks of spectrum 42 as TSV
//! mzdb spectrum run.mzDB 42
//!
//! # First 100 MS2 spectra as JSON lines
//! mzdb dump run.mzDB --ms-level 2 --limit 100 --json
//!
//! # Ion chromatogram at m/z 524.26 within 5 ppm
//! mzdb xic run.mzDB 524.26 --ppm 5
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
