use super::DecodeError;
use crate::model::{ByteOrder, Compression, DataEncoding, DataMode, PeakLayout, Precision};

/// Untyped `data_encoding` row as read from SQLite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataEncoding {
    /// Primary key
    pub id: i64,
    /// `mode` column
    pub mode: String,
    /// `compression` column
    pub compression: Option<String>,
    /// `byte_order` column
    pub byte_order: Option<String>,
    /// `mz_precision` column (bits)
    pub mz_precision: i64,
    /// `intensity_precision` column (bits)
    pub intensity_precision: i64,
    /// Optional `peak_layout` column
    pub peak_layout: Option<String>,
}

/// Turn a raw `data_encoding` row into a typed [`DataEncoding`]
///
/// Any value this crate cannot read yields [`DecodeError::UnsupportedEncoding`]
/// naming the offending column.
pub fn decode_data_encoding(raw: &RawDataEncoding) -> Result<DataEncoding, DecodeError> {
    let unsupported = |column: &str, value: &str| {
        DecodeError::UnsupportedEncoding(format!(
            "data encoding {}: {} '{}'",
            raw.id, column, value
        ))
    };

    let mode = DataMode::parse(&raw.mode).ok_or_else(|| unsupported("mode", &raw.mode))?;
    let mz_precision = Precision::from_bits(raw.mz_precision)
        .ok_or_else(|| unsupported("mz_precision", &raw.mz_precision.to_string()))?;
    let intensity_precision = Precision::from_bits(raw.intensity_precision)
        .ok_or_else(|| unsupported("intensity_precision", &raw.intensity_precision.to_string()))?;
    let compression = Compression::parse(raw.compression.as_deref()).ok_or_else(|| {
        unsupported("compression", raw.compression.as_deref().unwrap_or_default())
    })?;
    let byte_order = ByteOrder::parse(raw.byte_order.as_deref()).ok_or_else(|| {
        unsupported("byte_order", raw.byte_order.as_deref().unwrap_or_default())
    })?;
    let peak_layout = PeakLayout::parse(raw.peak_layout.as_deref()).ok_or_else(|| {
        unsupported("peak_layout", raw.peak_layout.as_deref().unwrap_or_default())
    })?;

    Ok(DataEncoding {
        id: raw.id,
        mode,
        mz_precision,
        intensity_precision,
        compression,
        byte_order,
        peak_layout,
    })
}
