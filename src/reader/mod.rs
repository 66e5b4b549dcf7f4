//! # mzDB Reader Module
//!
//! This module provides read access to mzDB files: SQLite containers holding
//! spectrum headers and peak lists grouped into bounding boxes.
//!
//! ## Features
//!
//! - **Random Access**: Fetch a spectrum by id, or bounding boxes by id and region
//! - **Streaming Iteration**: Forward-only iteration that decodes each bounding box group once
//! - **Metadata Access**: Versions, raw parameter trees, table counts and acquisition rows
//! - **DIA Support**: Isolation windows and MSn bounding boxes by precursor window
//! - **Chromatograms**: Extracted ion chromatograms over MS1 spectra
//!
//! ## Example
//!
//! ```rust,no_run
//! use mzdb::reader::MzDbReader;
//!
//! // Open a file
//! let reader = MzDbReader::open("data.mzDB")?;
//!
//! println!("mzDB version: {}", reader.mzdb_version()?);
//!
//! // Get a specific spectrum by id
//! let spectrum = reader.get_spectrum(42)?;
//! println!("Spectrum 42 has {} peaks", spectrum.data().peaks_count());
//!
//! // Iterate over MS1 spectra
//! for spectrum in reader.iter_spectra(Some(1))? {
//!     let spectrum = spectrum?;
//!     println!("{} @ {:.2}s", spectrum.id(), spectrum.header().time);
//! }
//! # Ok::<(), mzdb::reader::ReaderError>(())
//! ```

mod cache;
mod config;
mod error;
mod index;
mod iter;
mod metadata;
mod open;
mod spectra;
mod summary;
mod utils;
mod xic;


pub use config::ReaderConfig;
pub use error::{ErrorKind, ReaderError};
pub use iter::SpectrumIterator;
pub use summary::FileSummary;

use std::path::{Path, PathBuf};

use log::debug;
use rusqlite::Connection;

use cache::EntityCache;

/// Reader for mzDB files
///
/// Owns a read-only SQLite connection and the entity cache built at open.
/// The connection is released by [`MzDbReader::close`] or on drop; every call
/// after `close` fails with [`ReaderError::UseAfterClose`].
pub struct MzDbReader {
    path: PathBuf,
    config: ReaderConfig,
    connection: Option<Connection>,
    cache: EntityCache,
}

impl MzDbReader {
    /// Path the reader was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration the reader was opened with
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// True once [`MzDbReader::close`] succeeded
    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Release the SQLite connection
    ///
    /// If SQLite refuses to close, the connection is kept and the reader stays usable.
    pub fn close(&mut self) -> Result<(), ReaderError> {
        let connection = self.connection.take().ok_or(ReaderError::UseAfterClose)?;
        match connection.close() {
            Ok(()) => {
                debug!("Closed {}", self.path.display());
                Ok(())
            }
            Err((connection, err)) => {
                self.connection = Some(connection);
                Err(err.into())
            }
        }
    }

    pub(crate) fn conn(&self) -> Result<&Connection, ReaderError> {
        self.connection.as_ref().ok_or(ReaderError::UseAfterClose)
    }

    pub(crate) fn cache(&self) -> Result<&EntityCache, ReaderError> {
        if self.is_closed() {
            return Err(ReaderError::UseAfterClose);
        }
        Ok(&self.cache)
    }
}

impl std::fmt::Debug for MzDbReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MzDbReader")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .field("spectra", &self.cache.headers.len())
            .finish()
    }
}
