use std::iter::FusedIterator;
use std::ops::ControlFlow;

use super::spectra::BoundingBoxGroup;
use super::{MzDbReader, ReaderError};
use crate::model::{Spectrum, SpectrumHeader};

/// Forward-only iterator over spectra in ascending id order
///
/// Each bounding box group is fetched and indexed once, when the first of its
/// spectra is reached, and dropped once iteration moves past its last spectrum.
/// Only one group per interleaved MS level is held at a time.
///
/// After the first error the iterator is exhausted.
pub struct SpectrumIterator<'a> {
    reader: &'a MzDbReader,
    headers: std::slice::Iter<'a, SpectrumHeader>,
    ms_level: Option<i64>,
    groups: Vec<BoundingBoxGroup>,
    failed: bool,
}

impl<'a> SpectrumIterator<'a> {
    fn next_header(&mut self) -> Option<&'a SpectrumHeader> {
        let ms_level = self.ms_level;
        self.headers
            .by_ref()
            .find(|h| ms_level.map_or(true, |level| h.ms_level == level))
    }

    fn read(&mut self, header: &SpectrumHeader) -> Result<Spectrum, ReaderError> {
        self.groups.retain(|g| g.last_spectrum_id >= header.id);

        let position = self
            .groups
            .iter()
            .position(|g| g.first_spectrum_id == header.bb_first_spectrum_id);
        let group = match position {
            Some(idx) => &self.groups[idx],
            None => {
                let group = self.reader.load_group(header.bb_first_spectrum_id)?;
                self.groups.push(group);
                &self.groups[self.groups.len() - 1]
            }
        };

        let data = group.assemble(header)?;
        Ok(Spectrum::new(header.clone(), data))
    }
}

impl Iterator for SpectrumIterator<'_> {
    type Item = Result<Spectrum, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let header = self.next_header()?;
        let result = self.read(header);
        if result.is_err() {
            self.failed = true;
            self.groups.clear();
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.headers.len()))
        }
    }
}

impl FusedIterator for SpectrumIterator<'_> {}

impl MzDbReader {
    /// Iterate over spectra in ascending id order, optionally of one MS level
    pub fn iter_spectra(&self, ms_level: Option<i64>) -> Result<SpectrumIterator<'_>, ReaderError> {
        let headers = &self.cache()?.headers;
        Ok(SpectrumIterator {
            reader: self,
            headers: headers.iter(),
            ms_level,
            groups: Vec::new(),
            failed: false,
        })
    }

    /// Feed spectra to `handler` in ascending id order
    ///
    /// Returning `ControlFlow::Break` stops the walk without error and without
    /// decoding further spectra. Any error aborts the walk and is returned.
    ///
    /// ```rust,no_run
    /// use std::ops::ControlFlow;
    /// use mzdb::reader::{MzDbReader, ReaderError};
    ///
    /// let reader = MzDbReader::open("data.mzDB")?;
    /// let mut total = 0;
    /// reader.for_each_spectrum(Some(1), |spectrum| {
    ///     total += spectrum.data().peaks_count();
    ///     Ok::<_, ReaderError>(ControlFlow::Continue(()))
    /// })?;
    /// # Ok::<(), ReaderError>(())
    /// ```
    pub fn for_each_spectrum<F, E>(&self, ms_level: Option<i64>, mut handler: F) -> Result<(), E>
    where
        F: FnMut(Spectrum) -> Result<ControlFlow<()>, E>,
        E: From<ReaderError>,
    {
        for spectrum in self.iter_spectra(ms_level)? {
            if handler(spectrum?)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}
