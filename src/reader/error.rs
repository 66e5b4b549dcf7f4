use std::fmt;

use crate::decode::DecodeError;

/// Errors that can occur during reading
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The file, table row or entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The file is not an mzDB container or its schema is damaged
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    /// A data encoding uses values this crate cannot decode
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Decoded peaks disagree with the spectrum header
    #[error(
        "Decoding inconsistency for spectrum {spectrum_id}: header declares {expected} peaks, decoded {actual}"
    )]
    DecodingInconsistency {
        /// Spectrum being assembled
        spectrum_id: i64,
        /// `data_points_count` from the header
        expected: i64,
        /// Number of peaks actually decoded
        actual: usize,
    },

    /// The reader was closed before the call
    #[error("Reader used after close")]
    UseAfterClose,

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bounding box payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(DecodeError),
}

impl From<DecodeError> for ReaderError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedEncoding(msg) => ReaderError::UnsupportedEncoding(msg),
            other => ReaderError::Decode(other),
        }
    }
}

/// Stable classification of a [`ReaderError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing file, row or entity
    NotFound,
    /// Not an mzDB container, damaged schema or damaged payload
    CorruptContainer,
    /// Data encoding cannot be decoded
    UnsupportedEncoding,
    /// Peaks disagree with the header
    DecodingInconsistency,
    /// Call on a closed reader
    UseAfterClose,
    /// Underlying SQLite or I/O failure
    Storage,
}

impl ErrorKind {
    /// Short identifier of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::CorruptContainer => "corrupt_container",
            ErrorKind::UnsupportedEncoding => "unsupported_encoding",
            ErrorKind::DecodingInconsistency => "decoding_inconsistency",
            ErrorKind::UseAfterClose => "use_after_close",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ReaderError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReaderError::NotFound(_) => ErrorKind::NotFound,
            ReaderError::CorruptContainer(_) | ReaderError::Decode(_) => {
                ErrorKind::CorruptContainer
            }
            ReaderError::UnsupportedEncoding(_) => ErrorKind::UnsupportedEncoding,
            ReaderError::DecodingInconsistency { .. } => ErrorKind::DecodingInconsistency,
            ReaderError::UseAfterClose => ErrorKind::UseAfterClose,
            ReaderError::Sqlite(_) | ReaderError::Io(_) => ErrorKind::Storage,
        }
    }
}
