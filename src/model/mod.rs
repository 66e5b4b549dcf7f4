//! # mzDB Data Model
//!
//! Typed records produced by the reader. All of them are plain values: they
//! hold no reference back to the [`MzDbReader`](crate::reader::MzDbReader)
//! that produced them.

mod encoding;
mod metadata;
mod spatial;
mod spectrum;

pub use encoding::{ByteOrder, Compression, DataEncoding, DataMode, PeakLayout, Precision};
pub use metadata::{InstrumentConfiguration, Run, SourceFile, Software};
pub use spatial::{
    BoundingBox, IsolationWindow, MsnRTreeEntry, RunSliceHeader, XicMethod, XicPeak,
};
pub use spectrum::{Spectrum, SpectrumData, SpectrumHeader};
