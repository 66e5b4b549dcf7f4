use serde::{Deserialize, Serialize};

/// One row of the `spectrum` table
///
/// Parameter trees and the scan/precursor/product lists are kept as the raw
/// XML strings stored in the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumHeader {
    /// Spectrum identifier (1-based, ascending in acquisition order)
    pub id: i64,
    /// Identifier assigned by the instrument or the converter
    pub initial_id: i64,
    /// Native spectrum title
    pub title: String,
    /// Acquisition cycle number
    pub cycle: i64,
    /// Retention time in seconds
    pub time: f32,
    /// MS level (1 = full scan)
    pub ms_level: i64,
    /// Activation type (CID, HCD, ETD...), absent for MS1
    pub activation_type: Option<String>,
    /// Total ion current
    pub tic: f32,
    /// Base peak m/z
    pub base_peak_mz: f64,
    /// Base peak intensity
    pub base_peak_intensity: f32,
    /// Main precursor m/z, only for `ms_level > 1`
    pub precursor_mz: Option<f64>,
    /// Main precursor charge, only for `ms_level > 1`
    pub precursor_charge: Option<i32>,
    /// Number of peaks stored for this spectrum
    pub peaks_count: i64,
    /// Raw parameter tree
    pub param_tree: String,
    /// Raw scan list
    pub scan_list: Option<String>,
    /// Raw precursor list
    pub precursor_list: Option<String>,
    /// Raw product list
    pub product_list: Option<String>,
    /// Shared parameter tree reference
    pub shared_param_tree_id: Option<i64>,
    /// Instrument configuration reference
    pub instrument_configuration_id: Option<i64>,
    /// Source file reference
    pub source_file_id: Option<i64>,
    /// Run reference
    pub run_id: i64,
    /// Data processing reference
    pub data_processing_id: Option<i64>,
    /// Data encoding of the peaks
    pub data_encoding_id: i64,
    /// First spectrum id of the bounding box group holding the peaks
    pub bb_first_spectrum_id: i64,
}

/// Decoded peaks of one spectrum
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectrumData {
    mz_list: Vec<f64>,
    intensity_list: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    left_hwhm_list: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    right_hwhm_list: Option<Vec<f32>>,
}

impl SpectrumData {
    pub(crate) fn from_parts(
        mz_list: Vec<f64>,
        intensity_list: Vec<f64>,
        left_hwhm_list: Option<Vec<f32>>,
        right_hwhm_list: Option<Vec<f32>>,
    ) -> Self {
        Self {
            mz_list,
            intensity_list,
            left_hwhm_list,
            right_hwhm_list,
        }
    }

    /// Number of peaks
    pub fn peaks_count(&self) -> usize {
        self.mz_list.len()
    }

    /// True if the spectrum has no peaks
    pub fn is_empty(&self) -> bool {
        self.mz_list.is_empty()
    }

    /// m/z values in non-decreasing order
    pub fn mz_list(&self) -> &[f64] {
        &self.mz_list
    }

    /// Intensities matching [`SpectrumData::mz_list`]
    pub fn intensity_list(&self) -> &[f64] {
        &self.intensity_list
    }

    /// Left half-widths at half-maximum (fitted encodings only)
    pub fn left_hwhm_list(&self) -> Option<&[f32]> {
        self.left_hwhm_list.as_deref()
    }

    /// Right half-widths at half-maximum (fitted encodings only)
    pub fn right_hwhm_list(&self) -> Option<&[f32]> {
        self.right_hwhm_list.as_deref()
    }

    /// Two-column view: one `[mz, intensity]` row per peak
    pub fn as_matrix(&self) -> Vec<[f64; 2]> {
        self.mz_list
            .iter()
            .zip(self.intensity_list.iter())
            .map(|(&mz, &intensity)| [mz, intensity])
            .collect()
    }
}

/// A spectrum header together with its decoded peaks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    header: SpectrumHeader,
    data: SpectrumData,
}

impl Spectrum {
    /// Pair a header with its peaks
    pub fn new(header: SpectrumHeader, data: SpectrumData) -> Self {
        Self { header, data }
    }

    /// Spectrum metadata
    pub fn header(&self) -> &SpectrumHeader {
        &self.header
    }

    /// Spectrum peaks
    pub fn data(&self) -> &SpectrumData {
        &self.data
    }

    /// Spectrum id, shorthand for `header().id`
    pub fn id(&self) -> i64 {
        self.header.id
    }
}
