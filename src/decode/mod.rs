//! Binary decoding for mzDB records
//!
//! mzDB stores peaks as bounding box blobs, optionally compressed as a whole.
//! Each blob is a run of spectrum slices:
//!
//! ```text
//! i32 spectrum_id | i32 peaks_count | peaks_count x peak
//! ```
//!
//! The decoding pipeline is:
//!
//! 1. Decompress the blob if the data encoding says so (zlib or raw deflate)
//! 2. Index the slice headers to find every spectrum's byte range
//! 3. Interpret the peak bytes as 32- or 64-bit floats in the encoding's byte
//!    order, either interleaved per peak or as separate value runs
//!
//! Header rows and data encoding rows are decoded from SQLite rows by column
//! name. Parameter trees are passed through untouched; only the isolation
//! window is read out of precursor lists.

mod encoding;
mod header;
mod isolation;
mod payload;

pub use encoding::{decode_data_encoding, RawDataEncoding};
pub use header::{decode_header, SPECTRUM_HEADER_COLUMNS};
pub use isolation::decode_isolation_window;
pub use payload::{
    decode_bounding_box, decode_slice, decompress, index_payload, SliceIndex, SpectrumSlice,
};

/// Errors that can occur during binary decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The data encoding uses a mode, precision, compression or layout this crate cannot read
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The compressed stream could not be inflated
    #[error("Decompression error: {0}")]
    Decompression(#[from] std::io::Error),

    /// The payload ends before a declared field or peak run
    #[error("Truncated payload: need {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        /// Byte offset where the read started
        offset: usize,
        /// Bytes required from `offset`
        needed: usize,
        /// Bytes available from `offset`
        available: usize,
    },

    /// A slice header holds a value that cannot be valid
    #[error("Invalid spectrum slice at offset {offset}: {reason}")]
    InvalidSlice {
        /// Byte offset of the slice header
        offset: usize,
        /// What is wrong with it
        reason: String,
    },

    /// An XML list stored with a spectrum is not well-formed
    #[error("Invalid XML: {0}")]
    InvalidXml(String),
}

/// Pass a raw parameter tree through; `NULL` becomes an empty string
pub fn decode_param_tree(raw: Option<String>) -> String {
    raw.unwrap_or_default()
}
