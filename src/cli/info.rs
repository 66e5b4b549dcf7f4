use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mzdb::reader::MzDbReader;

use super::config::Config;

/// Display information about an mzDB file
pub fn run(file: PathBuf, config: &Config) -> Result<()> {
    let reader = MzDbReader::open_with_config(&file, config.reader_config())
        .with_context(|| format!("Failed to open {}", file.display()))?;
    info!("Opened {}", file.display());

    let summary = reader.summary().context("Failed to summarize file")?;

    println!("File: {}", file.display());
    println!();
    print!("{}", summary);

    let chromatograms = reader.param_tree_chromatogram()?;
    if !chromatograms.is_empty() {
        println!("Chromatograms: {}", chromatograms.len());
    }

    let software = reader.software_list()?;
    if !software.is_empty() {
        println!();
        println!("Software:");
        for entry in &software {
            println!("  {} {}", entry.name, entry.version);
        }
    }

    if reader.is_dia_data()? {
        let windows = reader
            .isolation_windows()
            .context("Failed to read isolation windows")?;
        println!();
        println!("DIA isolation windows: {}", windows.len());
        for window in &windows {
            println!("  {:>10.4} - {:<10.4}", window.min_mz, window.max_mz);
        }
    }

    println!();
    println!("Run slices:");
    for slice in reader.run_slices()? {
        println!(
            "  #{:<5} MS{}  {:>10.4} - {:<10.4}  {} bounding boxes",
            slice.id,
            slice.ms_level,
            slice.begin_mz,
            slice.end_mz,
            reader.run_slice_bounding_boxes_count(slice.id)?
        );
    }

    Ok(())
}
