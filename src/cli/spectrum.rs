use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use mzdb::reader::MzDbReader;

use super::config::Config;

/// Print one spectrum as TSV (`mz<TAB>intensity`) or JSON
pub fn run(file: PathBuf, id: i64, json: bool, config: &Config) -> Result<()> {
    let reader = MzDbReader::open_with_config(&file, config.reader_config())
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let spectrum = reader
        .get_spectrum(id)
        .with_context(|| format!("Failed to read spectrum {}", id))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if json {
        serde_json::to_writer_pretty(&mut out, &spectrum)?;
        writeln!(out)?;
    } else {
        let header = spectrum.header();
        writeln!(
            out,
            "# spectrum {} ({}) MS{} time={:.3}s peaks={}",
            header.id,
            header.title,
            header.ms_level,
            header.time,
            spectrum.data().peaks_count()
        )?;
        if let Some(mz) = header.precursor_mz {
            writeln!(
                out,
                "# precursor m/z={:.4} charge={}",
                mz,
                header.precursor_charge.map_or("?".to_string(), |z| z.to_string())
            )?;
        }
        for [mz, intensity] in spectrum.data().as_matrix() {
            writeln!(out, "{}\t{}", mz, intensity)?;
        }
    }

    out.flush()?;
    Ok(())
}
