use anyhow::{Context, Result};
use log::info;
use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;

use mzdb::reader::MzDbReader;

use super::config::Config;

/// Stream spectra to stdout, one line each
pub fn run(
    file: PathBuf,
    ms_level: Option<i64>,
    limit: Option<usize>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let reader = MzDbReader::open_with_config(&file, config.reader_config())
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut written = 0usize;

    reader.for_each_spectrum(ms_level, |spectrum| -> Result<ControlFlow<()>> {
        if limit.map_or(false, |limit| written >= limit) {
            return Ok(ControlFlow::Break(()));
        }

        if json {
            serde_json::to_writer(&mut out, &spectrum)?;
            writeln!(out)?;
        } else {
            let header = spectrum.header();
            writeln!(
                out,
                "{}\tMS{}\t{:.3}\t{}\t{:.4}\t{:.1}",
                header.id,
                header.ms_level,
                header.time,
                spectrum.data().peaks_count(),
                header.base_peak_mz,
                header.tic
            )?;
        }
        written += 1;
        Ok(ControlFlow::Continue(()))
    })?;

    out.flush()?;
    info!("Dumped {} spectra", written);
    Ok(())
}
