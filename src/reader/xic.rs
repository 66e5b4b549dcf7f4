use std::collections::BTreeMap;

use log::debug;

use super::{MzDbReader, ReaderError};
use crate::decode::decode_bounding_box;
use crate::model::{XicMethod, XicPeak};

/// Pick one peak within `[target - tolerance, target + tolerance]`
///
/// Sorted slices are searched by bisection, unsorted ones by a linear scan.
/// Returns the index of the chosen peak.
pub(crate) fn pick_peak(
    mz_list: &[f64],
    intensity_list: &[f64],
    target: f64,
    tolerance: f64,
    method: XicMethod,
) -> Option<usize> {
    let (low, high) = (target - tolerance, target + tolerance);
    let candidates: Vec<usize> = if mz_list.windows(2).all(|w| w[0] <= w[1]) {
        let start = mz_list.partition_point(|&mz| mz < low);
        let end = mz_list.partition_point(|&mz| mz <= high);
        (start..end).collect()
    } else {
        (0..mz_list.len())
            .filter(|&idx| mz_list[idx] >= low && mz_list[idx] <= high)
            .collect()
    };

    let candidates = candidates.into_iter();
    match method {
        XicMethod::Max => candidates.max_by(|&a, &b| intensity_list[a].total_cmp(&intensity_list[b])),
        XicMethod::Nearest => candidates.min_by(|&a, &b| {
            (mz_list[a] - target)
                .abs()
                .total_cmp(&(mz_list[b] - target).abs())
        }),
    }
}

/// True if `candidate` should replace `current` for the same spectrum
fn is_better(candidate: &XicPeak, current: &XicPeak, target: f64, method: XicMethod) -> bool {
    match method {
        XicMethod::Max => candidate.intensity > current.intensity,
        XicMethod::Nearest => (candidate.mz - target).abs() < (current.mz - target).abs(),
    }
}

impl MzDbReader {
    /// Extracted ion chromatogram over MS1 spectra
    ///
    /// For every MS1 spectrum in the time window, keeps one peak within
    /// `mz ± tolerance_ppm`: the most intense one ([`XicMethod::Max`]) or the
    /// closest one ([`XicMethod::Nearest`]). Spectra without such a peak are
    /// left out. Points are returned in acquisition order.
    pub fn get_xic(
        &self,
        mz: f64,
        tolerance_ppm: f64,
        min_time: Option<f32>,
        max_time: Option<f32>,
        method: XicMethod,
    ) -> Result<Vec<XicPeak>, ReaderError> {
        let tolerance = mz * tolerance_ppm / 1_000_000.0;
        let min_time = min_time.unwrap_or(f32::MIN);
        let max_time = max_time.unwrap_or(f32::MAX);

        let bb_ids = self.bounding_box_ids_in_region(
            mz - tolerance,
            mz + tolerance,
            f64::from(min_time),
            f64::from(max_time),
        )?;
        debug!(
            "XIC at m/z {} ± {} ppm touches {} bounding boxes",
            mz,
            tolerance_ppm,
            bb_ids.len()
        );

        let cache = self.cache()?;
        let mut points: BTreeMap<i64, XicPeak> = BTreeMap::new();

        for bb_id in bb_ids {
            let bounding_box = self.bounding_box(bb_id)?;
            let encoding = cache.encodings.get(bounding_box.data_encoding_id)?;
            let slices = decode_bounding_box(&bounding_box.payload, &encoding)?;

            for slice in slices {
                let Some(header) = cache.header(slice.spectrum_id) else {
                    continue;
                };
                if header.ms_level != 1 || header.time < min_time || header.time > max_time {
                    continue;
                }
                let Some(idx) = pick_peak(&slice.mz, &slice.intensity, mz, tolerance, method)
                else {
                    continue;
                };

                let candidate = XicPeak {
                    spectrum_id: header.id,
                    mz: slice.mz[idx],
                    intensity: slice.intensity[idx],
                    time: header.time,
                };
                match points.get(&header.id) {
                    Some(current) if !is_better(&candidate, current, mz, method) => {}
                    _ => {
                        points.insert(header.id, candidate);
                    }
                }
            }
        }

        Ok(points.into_values().collect())
    }
}
