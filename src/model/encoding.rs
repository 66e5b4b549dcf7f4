use serde::{Deserialize, Serialize};

/// Acquisition mode of the peaks stored under a data encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// Continuous profile data
    Profile,
    /// Centroided peaks
    Centroid,
    /// Fitted peaks carrying left/right half-widths at half-maximum
    Fitted,
}

impl DataMode {
    /// Parse the `mode` column of the `data_encoding` table (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "profile" => Some(DataMode::Profile),
            "centroid" => Some(DataMode::Centroid),
            "fitted" => Some(DataMode::Fitted),
            _ => None,
        }
    }
}

/// Floating point width of one stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// 32-bit IEEE-754 float
    Float32,
    /// 64-bit IEEE-754 float
    Float64,
}

impl Precision {
    /// Map a bit width (`32` or `64`) to a precision
    pub fn from_bits(bits: i64) -> Option<Self> {
        match bits {
            32 => Some(Precision::Float32),
            64 => Some(Precision::Float64),
            _ => None,
        }
    }

    /// Get the byte size per value
    pub fn byte_size(&self) -> usize {
        match self {
            Precision::Float32 => 4,
            Precision::Float64 => 8,
        }
    }
}

/// Whole-payload compression applied to bounding box blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Raw payload
    #[default]
    None,
    /// zlib stream (deflate with zlib header and checksum)
    Zlib,
    /// Raw deflate stream
    Deflate,
}

impl Compression {
    /// Parse the `compression` column; `NULL` and empty strings mean no compression
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let value = match value {
            None => return Some(Compression::None),
            Some(v) => v.trim().to_ascii_lowercase(),
        };
        match value.as_str() {
            "" | "none" => Some(Compression::None),
            "zlib" => Some(Compression::Zlib),
            "deflate" => Some(Compression::Deflate),
            _ => None,
        }
    }
}

/// Byte order of integers and floats inside a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Least significant byte first
    #[default]
    LittleEndian,
    /// Most significant byte first
    BigEndian,
}

impl ByteOrder {
    /// Parse the `byte_order` column; `NULL` defaults to little-endian
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let value = match value {
            None => return Some(ByteOrder::LittleEndian),
            Some(v) => v.trim().to_ascii_lowercase(),
        };
        match value.as_str() {
            "little_endian" | "little-endian" | "le" => Some(ByteOrder::LittleEndian),
            "big_endian" | "big-endian" | "be" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }
}

/// Arrangement of peak values inside one spectrum slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakLayout {
    /// `mz, intensity[, left_hwhm, right_hwhm]` repeated per peak
    #[default]
    Interleaved,
    /// All m/z values, then all intensities (then all left and right half-widths)
    Separate,
}

impl PeakLayout {
    /// Parse the optional `peak_layout` column; `NULL` means interleaved
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let value = match value {
            None => return Some(PeakLayout::Interleaved),
            Some(v) => v.trim().to_ascii_lowercase(),
        };
        match value.as_str() {
            "" | "interleaved" => Some(PeakLayout::Interleaved),
            "separate" | "separated" => Some(PeakLayout::Separate),
            _ => None,
        }
    }
}

/// Describes how peaks of a bounding box payload are laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEncoding {
    /// Primary key in the `data_encoding` table
    pub id: i64,
    /// Profile, centroid or fitted
    pub mode: DataMode,
    /// Width of m/z values
    pub mz_precision: Precision,
    /// Width of intensity values
    pub intensity_precision: Precision,
    /// Whole-payload compression
    pub compression: Compression,
    /// Byte order of every numeric field in the payload
    pub byte_order: ByteOrder,
    /// Interleaved or separate value runs
    pub peak_layout: PeakLayout,
}

impl DataEncoding {
    /// Number of bytes occupied by one peak
    pub fn peak_size(&self) -> usize {
        let size = self.mz_precision.byte_size() + self.intensity_precision.byte_size();
        if self.is_fitted() {
            size + 8
        } else {
            size
        }
    }

    /// True when peaks carry half-width values
    pub fn is_fitted(&self) -> bool {
        self.mode == DataMode::Fitted
    }
}
