//! # mzdb - Reader for the mzDB Mass Spectrometry Format
//!
//! `mzdb` reads mzDB files: SQLite containers storing an LC-MS acquisition as
//! spectrum headers plus peak lists grouped into *bounding boxes*, indexed by
//! an R-tree over the m/z x retention-time plane.
//!
//! ## Key Features
//!
//! - **Random Access**: Decode any spectrum by id through the bounding box index.
//!
//! - **Streaming Iteration**: Walk spectra in acquisition order; every bounding
//!   box group is fetched and decompressed once, not once per spectrum.
//!
//! - **All Peak Encodings**: 32/64-bit m/z and intensities, little and big
//!   endian, zlib or raw deflate compression, fitted peaks with half-widths.
//!
//! - **Spatial Queries**: Bounding boxes by m/z x time region, MSn boxes by
//!   precursor window for DIA data, and extracted ion chromatograms.
//!
//! - **Read-Only**: Files are opened read-only and never modified.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzdb::prelude::*;
//!
//! let reader = MzDbReader::open("run.mzDB")?;
//! println!("{}", reader.summary()?);
//!
//! let spectrum = reader.get_spectrum(1)?;
//! for [mz, intensity] in spectrum.data().as_matrix() {
//!     println!("{mz}\t{intensity}");
//! }
//!
//! let xic = reader.get_xic(524.26, 10.0, None, None, XicMethod::Max)?;
//! println!("XIC has {} points", xic.len());
//! # Ok::<(), mzdb::reader::ReaderError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`model`]: Plain records (spectra, headers, bounding boxes, data encodings)
//! - [`decode`]: Pure decoders for header rows, data encodings and peak payloads
//! - [`reader`]: The [`MzDbReader`](reader::MzDbReader) handle, random access and iteration
//!
//! ## File Layout
//!
//! | Table | Content |
//! |-------|---------|
//! | `mzdb` | Format version and file-level parameter tree |
//! | `spectrum` | One header row per spectrum |
//! | `data_encoding` | Peak encodings (mode, precisions, byte order, compression) |
//! | `run_slice` | m/z windows per MS level |
//! | `bounding_box` | Encoded peaks of consecutive spectra within one run slice |
//! | `bounding_box_rtree` | Spatial index of MS1 bounding boxes |
//! | `bounding_box_msn_rtree` | Spatial index of MSn bounding boxes |
//! | `run`, `software`, `source_file`, `instrument_configuration` | Acquisition metadata |

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod decode;
pub mod model;
pub mod reader;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::model::{
        BoundingBox, DataEncoding, DataMode, InstrumentConfiguration, IsolationWindow,
        MsnRTreeEntry, Run, RunSliceHeader, SourceFile, Software, Spectrum, SpectrumData,
        SpectrumHeader, XicMethod, XicPeak,
    };
    pub use crate::reader::{
        ErrorKind, FileSummary, MzDbReader, ReaderConfig, ReaderError, SpectrumIterator,
    };
}
