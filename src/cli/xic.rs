use anyhow::{Context, Result};
use log::info;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use mzdb::model::XicMethod;
use mzdb::reader::MzDbReader;

use super::config::Config;

const DEFAULT_PPM: f64 = 10.0;

/// Print an extracted ion chromatogram as TSV (`time<TAB>mz<TAB>intensity<TAB>spectrum`)
pub fn run(
    file: PathBuf,
    mz: f64,
    ppm: Option<f64>,
    min_time: Option<f32>,
    max_time: Option<f32>,
    method: Option<XicMethod>,
    config: &Config,
) -> Result<()> {
    let ppm = ppm.or(config.xic.ppm).unwrap_or(DEFAULT_PPM);
    let method = method.or(config.xic.method).unwrap_or_default();
    if ppm <= 0.0 {
        anyhow::bail!("Tolerance must be positive, got {} ppm", ppm);
    }

    let reader = MzDbReader::open_with_config(&file, config.reader_config())
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let points = reader
        .get_xic(mz, ppm, min_time, max_time, method)
        .with_context(|| format!("Failed to extract XIC at m/z {}", mz))?;
    info!("XIC at m/z {} ({} ppm, {:?}): {} points", mz, ppm, method, points.len());

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "time\tmz\tintensity\tspectrum_id")?;
    for point in points {
        writeln!(
            out,
            "{:.4}\t{:.6}\t{}\t{}",
            point.time, point.mz, point.intensity, point.spectrum_id
        )?;
    }
    out.flush()?;
    Ok(())
}
