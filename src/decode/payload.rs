use std::borrow::Cow;
use std::io::Read;

use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};
use flate2::read::{DeflateDecoder, ZlibDecoder};

use super::DecodeError;
use crate::model::{ByteOrder, Compression, DataEncoding, PeakLayout, Precision};

/// Size of the `spectrum_id | peaks_count` header preceding every slice
const SLICE_HEADER_SIZE: usize = 8;

/// Location of one spectrum slice inside a decompressed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceIndex {
    /// Spectrum the slice belongs to
    pub spectrum_id: i64,
    /// Byte offset of the first peak (just past the slice header)
    pub peaks_offset: usize,
    /// Number of peaks in the slice
    pub peaks_count: usize,
}

/// Peaks of one spectrum inside one bounding box
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectrumSlice {
    /// Spectrum the peaks belong to
    pub spectrum_id: i64,
    /// m/z values in payload order
    pub mz: Vec<f64>,
    /// Intensities in payload order
    pub intensity: Vec<f64>,
    /// Left half-widths (fitted encodings only)
    pub left_hwhm: Option<Vec<f32>>,
    /// Right half-widths (fitted encodings only)
    pub right_hwhm: Option<Vec<f32>>,
}

impl SpectrumSlice {
    /// Number of peaks in the slice
    pub fn peaks_count(&self) -> usize {
        self.mz.len()
    }
}

/// Undo whole-payload compression
///
/// Uncompressed payloads are borrowed, compressed ones are inflated into a new buffer.
pub fn decompress<'a>(
    payload: &'a [u8],
    encoding: &DataEncoding,
) -> Result<Cow<'a, [u8]>, DecodeError> {
    if payload.is_empty() {
        return Ok(Cow::Borrowed(payload));
    }

    match encoding.compression {
        Compression::None => Ok(Cow::Borrowed(payload)),
        Compression::Zlib => {
            let mut decoder = ZlibDecoder::new(payload);
            let mut uncompressed = Vec::with_capacity(payload.len() * 2);
            decoder.read_to_end(&mut uncompressed)?;
            Ok(Cow::Owned(uncompressed))
        }
        Compression::Deflate => {
            let mut decoder = DeflateDecoder::new(payload);
            let mut uncompressed = Vec::with_capacity(payload.len() * 2);
            decoder.read_to_end(&mut uncompressed)?;
            Ok(Cow::Owned(uncompressed))
        }
    }
}

/// Walk the slice headers of a decompressed payload
///
/// Every declared peak run must fit in the buffer and the slices must consume
/// it exactly; anything else is reported as truncation.
pub fn index_payload(bytes: &[u8], encoding: &DataEncoding) -> Result<Vec<SliceIndex>, DecodeError> {
    match encoding.byte_order {
        ByteOrder::LittleEndian => index_with::<LittleEndian>(bytes, encoding.peak_size()),
        ByteOrder::BigEndian => index_with::<BigEndian>(bytes, encoding.peak_size()),
    }
}

fn index_with<B: Endian>(bytes: &[u8], peak_size: usize) -> Result<Vec<SliceIndex>, DecodeError> {
    let mut slices = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let header = checked_range(bytes, offset, SLICE_HEADER_SIZE)?;
        let spectrum_id = B::read_i32(&header[0..4]);
        let peaks_count = B::read_i32(&header[4..8]);

        if peaks_count < 0 {
            return Err(DecodeError::InvalidSlice {
                offset,
                reason: format!("negative peaks count {}", peaks_count),
            });
        }

        let peaks_count = peaks_count as usize;
        let peaks_offset = offset + SLICE_HEADER_SIZE;
        let peaks_len = peaks_count
            .checked_mul(peak_size)
            .ok_or_else(|| DecodeError::InvalidSlice {
                offset,
                reason: format!("peaks count {} overflows", peaks_count),
            })?;
        checked_range(bytes, peaks_offset, peaks_len)?;

        slices.push(SliceIndex {
            spectrum_id: i64::from(spectrum_id),
            peaks_offset,
            peaks_count,
        });
        offset = peaks_offset + peaks_len;
    }

    Ok(slices)
}

/// Decode the peaks of one indexed slice
pub fn decode_slice(
    bytes: &[u8],
    slice: &SliceIndex,
    encoding: &DataEncoding,
) -> Result<SpectrumSlice, DecodeError> {
    let peaks_len = slice
        .peaks_count
        .checked_mul(encoding.peak_size())
        .ok_or_else(|| DecodeError::InvalidSlice {
            offset: slice.peaks_offset,
            reason: format!("peaks count {} overflows", slice.peaks_count),
        })?;
    let peaks = checked_range(bytes, slice.peaks_offset, peaks_len)?;

    let mut decoded = match encoding.byte_order {
        ByteOrder::LittleEndian => read_peaks::<LittleEndian>(peaks, slice.peaks_count, encoding),
        ByteOrder::BigEndian => read_peaks::<BigEndian>(peaks, slice.peaks_count, encoding),
    };
    decoded.spectrum_id = slice.spectrum_id;

    Ok(decoded)
}

/// Decode every spectrum slice of a raw bounding box payload, in payload order
pub fn decode_bounding_box(
    payload: &[u8],
    encoding: &DataEncoding,
) -> Result<Vec<SpectrumSlice>, DecodeError> {
    let bytes = decompress(payload, encoding)?;
    let index = index_payload(&bytes, encoding)?;
    index
        .iter()
        .map(|slice| decode_slice(&bytes, slice, encoding))
        .collect()
}

fn checked_range(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    let available = bytes.len().saturating_sub(offset);
    if len > available {
        return Err(DecodeError::Truncated {
            offset,
            needed: len,
            available,
        });
    }
    Ok(&bytes[offset..offset + len])
}

fn read_float<B: Endian>(bytes: &[u8], precision: Precision) -> f64 {
    match precision {
        Precision::Float32 => f64::from(B::read_f32(bytes)),
        Precision::Float64 => B::read_f64(bytes),
    }
}

/// `peaks` must hold exactly `count * encoding.peak_size()` bytes
fn read_peaks<B: Endian>(peaks: &[u8], count: usize, encoding: &DataEncoding) -> SpectrumSlice {
    let mz_size = encoding.mz_precision.byte_size();
    let intensity_size = encoding.intensity_precision.byte_size();
    let fitted = encoding.is_fitted();

    let mut mz = Vec::with_capacity(count);
    let mut intensity = Vec::with_capacity(count);
    let mut left = Vec::with_capacity(if fitted { count } else { 0 });
    let mut right = Vec::with_capacity(if fitted { count } else { 0 });

    match encoding.peak_layout {
        PeakLayout::Interleaved => {
            for peak in peaks.chunks_exact(encoding.peak_size()) {
                let (mz_bytes, rest) = peak.split_at(mz_size);
                let (intensity_bytes, hwhm) = rest.split_at(intensity_size);
                mz.push(read_float::<B>(mz_bytes, encoding.mz_precision));
                intensity.push(read_float::<B>(intensity_bytes, encoding.intensity_precision));
                if fitted {
                    left.push(B::read_f32(&hwhm[0..4]));
                    right.push(B::read_f32(&hwhm[4..8]));
                }
            }
        }
        PeakLayout::Separate => {
            let (mz_run, rest) = peaks.split_at(count * mz_size);
            let (intensity_run, hwhm_runs) = rest.split_at(count * intensity_size);
            mz.extend(
                mz_run
                    .chunks_exact(mz_size)
                    .map(|v| read_float::<B>(v, encoding.mz_precision)),
            );
            intensity.extend(
                intensity_run
                    .chunks_exact(intensity_size)
                    .map(|v| read_float::<B>(v, encoding.intensity_precision)),
            );
            if fitted {
                let (left_run, right_run) = hwhm_runs.split_at(count * 4);
                left.extend(left_run.chunks_exact(4).map(B::read_f32));
                right.extend(right_run.chunks_exact(4).map(B::read_f32));
            }
        }
    }

    SpectrumSlice {
        spectrum_id: 0,
        mz,
        intensity,
        left_hwhm: fitted.then_some(left),
        right_hwhm: fitted.then_some(right),
    }
}
