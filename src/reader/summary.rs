use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{MzDbReader, ReaderError};

/// Summary statistics about an mzDB file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    /// mzDB format version
    pub mzdb_version: String,
    /// Version of the writing software, if recorded
    pub writer_version: Option<String>,
    /// Number of spectra
    pub num_spectra: i64,
    /// Number of spectra per MS level
    pub spectra_per_ms_level: BTreeMap<i64, i64>,
    /// Total number of peaks over all spectra
    pub total_peaks: i64,
    /// Number of bounding boxes
    pub num_bounding_boxes: i64,
    /// Number of run slices
    pub num_run_slices: usize,
    /// Number of data encodings
    pub num_data_encodings: i64,
    /// Retention time range (min, max) in seconds
    pub rt_range: Option<(f32, f32)>,
    /// m/z range covered by the run slices (min, max)
    pub mz_range: Option<(f64, f64)>,
}

impl MzDbReader {
    /// Get summary statistics about the file
    pub fn summary(&self) -> Result<FileSummary, ReaderError> {
        let headers = self.spectrum_headers()?;

        let mut spectra_per_ms_level = BTreeMap::new();
        for header in headers {
            *spectra_per_ms_level.entry(header.ms_level).or_insert(0) += 1;
        }

        let rt_range = if !headers.is_empty() {
            let min_rt = headers.iter().map(|h| h.time).fold(f32::MAX, f32::min);
            let max_rt = headers.iter().map(|h| h.time).fold(f32::MIN, f32::max);
            Some((min_rt, max_rt))
        } else {
            None
        };

        let run_slices = self.run_slices()?;
        let mz_range = if !run_slices.is_empty() {
            let min_mz = run_slices.iter().map(|s| s.begin_mz).fold(f64::MAX, f64::min);
            let max_mz = run_slices.iter().map(|s| s.end_mz).fold(f64::MIN, f64::max);
            Some((min_mz, max_mz))
        } else {
            None
        };

        let writer_version = match self.pwiz_mzdb_version() {
            Ok(version) => Some(version),
            Err(ReaderError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };

        Ok(FileSummary {
            mzdb_version: self.mzdb_version()?,
            writer_version,
            num_spectra: headers.len() as i64,
            spectra_per_ms_level,
            total_peaks: headers.iter().map(|h| h.peaks_count).sum(),
            num_bounding_boxes: self.bounding_boxes_count()?,
            num_run_slices: run_slices.len(),
            num_data_encodings: self.data_encoding_count()?,
            rt_range,
            mz_range,
        })
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mzDB File Summary")?;
        writeln!(f, "=================")?;
        writeln!(f, "mzDB version: {}", self.mzdb_version)?;
        if let Some(version) = &self.writer_version {
            writeln!(f, "Writer version: {}", version)?;
        }
        writeln!(f, "Total spectra: {}", self.num_spectra)?;
        for (ms_level, count) in &self.spectra_per_ms_level {
            writeln!(f, "  MS{} spectra: {}", ms_level, count)?;
        }
        writeln!(f, "Total peaks: {}", self.total_peaks)?;
        writeln!(f, "Bounding boxes: {}", self.num_bounding_boxes)?;
        writeln!(f, "Run slices: {}", self.num_run_slices)?;
        writeln!(f, "Data encodings: {}", self.num_data_encodings)?;
        if let Some((min_rt, max_rt)) = self.rt_range {
            writeln!(f, "RT range: {:.2} - {:.2} sec", min_rt, max_rt)?;
        }
        if let Some((min_mz, max_mz)) = self.mz_range {
            writeln!(f, "m/z range: {:.4} - {:.4}", min_mz, max_mz)?;
        }
        Ok(())
    }
}
