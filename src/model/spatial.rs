use serde::{Deserialize, Serialize};

/// A stored chunk of peak data for a group of consecutive spectra
///
/// The rectangle `[min_mz, max_mz] x [min_time, max_time]` is the box's
/// footprint in the m/z x retention-time plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Primary key (shared with the R-tree entry)
    pub id: i64,
    /// First spectrum stored in the payload
    pub first_spectrum_id: i64,
    /// Last spectrum stored in the payload
    pub last_spectrum_id: i64,
    /// Lower m/z bound
    pub min_mz: f64,
    /// Upper m/z bound
    pub max_mz: f64,
    /// Lower retention time bound (seconds)
    pub min_time: f64,
    /// Upper retention time bound (seconds)
    pub max_time: f64,
    /// MS level of the run slice
    pub ms_level: i64,
    /// Run slice the box belongs to
    pub run_slice_id: i64,
    /// Data encoding of the payload
    pub data_encoding_id: i64,
    /// Raw payload as stored in the container
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl BoundingBox {
    /// True if `spectrum_id` falls within the box's declared spectrum range
    pub fn covers_spectrum(&self, spectrum_id: i64) -> bool {
        spectrum_id >= self.first_spectrum_id && spectrum_id <= self.last_spectrum_id
    }

    /// True if the box overlaps the given m/z window
    pub fn overlaps_mz(&self, min_mz: f64, max_mz: f64) -> bool {
        self.max_mz >= min_mz && self.min_mz <= max_mz
    }
}

/// One row of the `run_slice` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSliceHeader {
    /// Primary key
    pub id: i64,
    /// MS level of every bounding box in the slice
    pub ms_level: i64,
    /// Slice number (ordering by m/z within the run)
    pub number: i64,
    /// Lower m/z bound
    pub begin_mz: f64,
    /// Upper m/z bound
    pub end_mz: f64,
    /// Run reference
    pub run_id: i64,
}

/// One entry of the MSn R-tree (`bounding_box_msn_rtree`)
///
/// Values are read back from the R-tree, which stores 32-bit floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MsnRTreeEntry {
    /// Bounding box id
    pub id: i64,
    /// Lowest MS level in the box
    pub min_ms_level: i64,
    /// Highest MS level in the box
    pub max_ms_level: i64,
    /// Lower bound of the precursor (parent) m/z window
    pub min_parent_mz: f64,
    /// Upper bound of the precursor (parent) m/z window
    pub max_parent_mz: f64,
    /// Lower fragment m/z bound
    pub min_mz: f64,
    /// Upper fragment m/z bound
    pub max_mz: f64,
    /// Lower retention time bound (seconds)
    pub min_time: f64,
    /// Upper retention time bound (seconds)
    pub max_time: f64,
}

/// A precursor m/z window, `[min_mz, max_mz]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsolationWindow {
    /// Lower m/z bound
    pub min_mz: f64,
    /// Upper m/z bound
    pub max_mz: f64,
}

impl IsolationWindow {
    /// True if `mz` lies inside the window
    pub fn contains(&self, mz: f64) -> bool {
        mz >= self.min_mz && mz <= self.max_mz
    }

    /// Width of the window in m/z
    pub fn width(&self) -> f64 {
        self.max_mz - self.min_mz
    }
}

/// One point of an extracted ion chromatogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XicPeak {
    /// Spectrum the peak was taken from
    pub spectrum_id: i64,
    /// Observed m/z
    pub mz: f64,
    /// Observed intensity
    pub intensity: f64,
    /// Retention time of the spectrum (seconds)
    pub time: f32,
}

/// Peak selection rule when several peaks fall inside the tolerance window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XicMethod {
    /// Most intense peak
    #[default]
    Max,
    /// Peak closest to the target m/z
    Nearest,
}
