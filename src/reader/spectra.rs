use log::trace;

use super::utils::required;
use super::{MzDbReader, ReaderError};
use crate::decode::{decode_slice, decompress, index_payload, SliceIndex, SpectrumSlice};
use crate::model::{
    BoundingBox, Compression, DataEncoding, Spectrum, SpectrumData, SpectrumHeader,
};

/// A bounding box with its payload decompressed and its slice headers indexed
///
/// Peaks are only decoded on demand, one spectrum at a time.
pub(crate) struct IndexedBoundingBox {
    bounding_box: BoundingBox,
    encoding: DataEncoding,
    bytes: Vec<u8>,
    slices: Vec<SliceIndex>,
}

impl IndexedBoundingBox {
    fn new(mut bounding_box: BoundingBox, encoding: DataEncoding) -> Result<Self, ReaderError> {
        let payload = std::mem::take(&mut bounding_box.payload);
        let bytes = if encoding.compression == Compression::None {
            payload
        } else {
            decompress(&payload, &encoding)?.into_owned()
        };
        let slices = index_payload(&bytes, &encoding)?;

        Ok(Self {
            bounding_box,
            encoding,
            bytes,
            slices,
        })
    }

    /// Decode the slice holding `spectrum_id`, if the payload has one
    fn decode_spectrum(&self, spectrum_id: i64) -> Result<Option<SpectrumSlice>, ReaderError> {
        match self.slices.iter().find(|s| s.spectrum_id == spectrum_id) {
            Some(slice) => Ok(Some(decode_slice(&self.bytes, slice, &self.encoding)?)),
            None => Ok(None),
        }
    }
}

/// Every bounding box sharing one `first_spectrum_id`, by ascending run slice m/z
pub(crate) struct BoundingBoxGroup {
    pub(crate) first_spectrum_id: i64,
    /// Highest `last_spectrum_id` over the boxes
    pub(crate) last_spectrum_id: i64,
    boxes: Vec<IndexedBoundingBox>,
}

impl BoundingBoxGroup {
    /// Concatenate the spectrum's slices across the group
    ///
    /// Peaks come out sorted by m/z and must match the header's peak count.
    pub(crate) fn assemble(&self, header: &SpectrumHeader) -> Result<SpectrumData, ReaderError> {
        let mut slices = Vec::new();
        for indexed in &self.boxes {
            if !indexed.bounding_box.covers_spectrum(header.id) {
                continue;
            }
            if let Some(slice) = indexed.decode_spectrum(header.id)? {
                slices.push(slice);
            }
        }

        // sized from the payload, never from the header count
        let decoded: usize = slices.iter().map(SpectrumSlice::peaks_count).sum();
        let mut mz = Vec::with_capacity(decoded);
        let mut intensity = Vec::with_capacity(decoded);
        let mut left_hwhm: Option<Vec<f32>> = None;
        let mut right_hwhm: Option<Vec<f32>> = None;

        for slice in slices {
            mz.extend(slice.mz);
            intensity.extend(slice.intensity);
            if let Some(left) = slice.left_hwhm {
                left_hwhm.get_or_insert_with(Vec::new).extend(left);
            }
            if let Some(right) = slice.right_hwhm {
                right_hwhm.get_or_insert_with(Vec::new).extend(right);
            }
        }

        if mz.len() as i64 != header.peaks_count {
            return Err(ReaderError::DecodingInconsistency {
                spectrum_id: header.id,
                expected: header.peaks_count,
                actual: mz.len(),
            });
        }

        if !mz.windows(2).all(|w| w[0] <= w[1]) {
            trace!("Sorting peaks of spectrum {} by m/z", header.id);
            let mut order: Vec<usize> = (0..mz.len()).collect();
            order.sort_by(|&a, &b| mz[a].total_cmp(&mz[b]));
            mz = permute(&mz, &order);
            intensity = permute(&intensity, &order);
            left_hwhm = left_hwhm.map(|values| permute(&values, &order));
            right_hwhm = right_hwhm.map(|values| permute(&values, &order));
        }

        Ok(SpectrumData::from_parts(mz, intensity, left_hwhm, right_hwhm))
    }
}

fn permute<T: Copy>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&idx| values[idx]).collect()
}

impl MzDbReader {
    /// Decode one spectrum with all its peaks
    ///
    /// Fails with [`ReaderError::NotFound`] for an unknown id and with
    /// [`ReaderError::DecodingInconsistency`] when the decoded peaks disagree
    /// with the header. Neither error affects later calls.
    pub fn get_spectrum(&self, spectrum_id: i64) -> Result<Spectrum, ReaderError> {
        let header = self.spectrum_header(spectrum_id)?;
        let group = self.load_group(header.bb_first_spectrum_id)?;
        let data = group.assemble(header)?;
        Ok(Spectrum::new(header.clone(), data))
    }

    /// All spectrum headers, ordered by id
    pub fn spectrum_headers(&self) -> Result<&[SpectrumHeader], ReaderError> {
        Ok(&self.cache()?.headers)
    }

    /// Header of one spectrum
    pub fn spectrum_header(&self, spectrum_id: i64) -> Result<&SpectrumHeader, ReaderError> {
        required(self.cache()?.header(spectrum_id), || {
            format!("spectrum {}", spectrum_id)
        })
    }

    /// Fetch, decompress and index the bounding box group starting at `first_spectrum_id`
    pub(crate) fn load_group(&self, first_spectrum_id: i64) -> Result<BoundingBoxGroup, ReaderError> {
        let cache = self.cache()?;
        let boxes = self.bounding_box_group(first_spectrum_id)?;

        let mut last_spectrum_id = first_spectrum_id;
        let mut indexed = Vec::with_capacity(boxes.len());
        for bounding_box in boxes {
            last_spectrum_id = last_spectrum_id.max(bounding_box.last_spectrum_id);
            let encoding = cache.encodings.get(bounding_box.data_encoding_id)?;
            indexed.push(IndexedBoundingBox::new(bounding_box, encoding)?);
        }

        trace!(
            "Loaded bounding box group {} ({} boxes, spectra {}..={})",
            first_spectrum_id,
            indexed.len(),
            first_spectrum_id,
            last_spectrum_id
        );

        Ok(BoundingBoxGroup {
            first_spectrum_id,
            last_spectrum_id,
            boxes: indexed,
        })
    }
}
