use std::collections::HashSet;

use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use super::cache::SchemaInfo;
use super::utils::required;
use super::{MzDbReader, ReaderError};
use crate::decode::decode_isolation_window;
use crate::model::{BoundingBox, DataEncoding, IsolationWindow, MsnRTreeEntry, RunSliceHeader};

/// R-tree coordinates are 32-bit floats rounded outwards; query bounds are
/// widened by this relative margin so stored extents still match.
const RTREE_LOWER_CORRECTION: f64 = 1.0 - 0.000_000_12;
const RTREE_UPPER_CORRECTION: f64 = 1.0 + 0.000_000_12;

/// Files with fewer MS2 spectra are never reported as DIA
const DIA_MIN_MS2_SPECTRA: usize = 100;

const MSN_RTREE_COLUMNS: &str = "id, min_ms_level, max_ms_level, min_parent_mz, max_parent_mz, \
     min_mz, max_mz, min_time, max_time";

/// Bounding box row before header-derived fields are filled in
struct BoundingBoxRow {
    id: i64,
    payload: Vec<u8>,
    run_slice_id: i64,
    first_spectrum_id: i64,
    last_spectrum_id: i64,
    ms_level: i64,
    min_mz: f64,
    max_mz: f64,
    min_time: Option<f64>,
    max_time: Option<f64>,
}

impl BoundingBoxRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            payload: row.get::<_, Option<Vec<u8>>>(1)?.unwrap_or_default(),
            run_slice_id: row.get(2)?,
            first_spectrum_id: row.get(3)?,
            last_spectrum_id: row.get(4)?,
            ms_level: row.get(5)?,
            min_mz: row.get(6)?,
            max_mz: row.get(7)?,
            min_time: row.get(8)?,
            max_time: row.get(9)?,
        })
    }
}

/// `SELECT` over `bounding_box` joined with its run slice and spatial index entries
///
/// Extents come from the MS1 R-tree, then the MSn R-tree, then the run slice
/// m/z bounds. Time bounds stay `NULL` when no R-tree indexes the box.
fn select_bounding_boxes(schema: &SchemaInfo, condition: &str) -> String {
    let mut joins = String::new();
    let mut sources = Vec::new();
    if schema.has_rtree {
        joins.push_str(" LEFT JOIN bounding_box_rtree r ON r.id = bb.id");
        sources.push("r");
    }
    if schema.has_msn_rtree {
        joins.push_str(" LEFT JOIN bounding_box_msn_rtree m ON m.id = bb.id");
        sources.push("m");
    }

    let coalesce = |column: &str, fallback: &str| {
        let mut parts: Vec<String> = sources
            .iter()
            .map(|source| format!("{}.{}", source, column))
            .collect();
        parts.push(fallback.to_string());
        if parts.len() == 1 {
            fallback.to_string()
        } else {
            format!("COALESCE({})", parts.join(", "))
        }
    };

    format!(
        "SELECT bb.id, bb.data, bb.run_slice_id, bb.first_spectrum_id, bb.last_spectrum_id, \
         rs.ms_level, {}, {}, {}, {} \
         FROM bounding_box bb JOIN run_slice rs ON rs.id = bb.run_slice_id{} \
         WHERE {} ORDER BY rs.begin_mz, bb.id",
        coalesce("min_mz", "rs.begin_mz"),
        coalesce("max_mz", "rs.end_mz"),
        coalesce("min_time", "NULL"),
        coalesce("max_time", "NULL"),
        joins,
        condition
    )
}

/// R-tree coordinates are stored as floats, MS levels included
fn msn_entry_from_row(row: &Row<'_>) -> rusqlite::Result<MsnRTreeEntry> {
    Ok(MsnRTreeEntry {
        id: row.get(0)?,
        min_ms_level: row.get::<_, f64>(1)?.round() as i64,
        max_ms_level: row.get::<_, f64>(2)?.round() as i64,
        min_parent_mz: row.get(3)?,
        max_parent_mz: row.get(4)?,
        min_mz: row.get(5)?,
        max_mz: row.get(6)?,
        min_time: row.get(7)?,
        max_time: row.get(8)?,
    })
}

fn run_slice_from_row(row: &Row<'_>) -> rusqlite::Result<RunSliceHeader> {
    Ok(RunSliceHeader {
        id: row.get(0)?,
        ms_level: row.get(1)?,
        number: row.get(2)?,
        begin_mz: row.get(3)?,
        end_mz: row.get(4)?,
        run_id: row.get(5)?,
    })
}

impl MzDbReader {
    /// Fetch one bounding box, payload included
    pub fn bounding_box(&self, bb_id: i64) -> Result<BoundingBox, ReaderError> {
        let conn = self.conn()?;
        let sql = select_bounding_boxes(&self.cache()?.schema, "bb.id = ?1");
        let row = conn
            .query_row(&sql, [bb_id], BoundingBoxRow::from_row)
            .optional()?;
        let row = required(row, || format!("bounding box {}", bb_id))?;
        self.complete_bounding_box(row)
    }

    /// All bounding boxes holding peaks of a spectrum, by ascending run slice m/z
    ///
    /// Boxes are selected through the spectrum's `bb_first_spectrum_id`.
    pub fn bounding_boxes_for_spectrum(
        &self,
        spectrum_id: i64,
    ) -> Result<Vec<BoundingBox>, ReaderError> {
        let first_spectrum_id = self.bounding_box_first_spectrum_id(spectrum_id)?;
        self.bounding_box_group(first_spectrum_id)
    }

    /// All bounding boxes whose payload starts at `first_spectrum_id`
    pub(crate) fn bounding_box_group(
        &self,
        first_spectrum_id: i64,
    ) -> Result<Vec<BoundingBox>, ReaderError> {
        let conn = self.conn()?;
        let sql = select_bounding_boxes(&self.cache()?.schema, "bb.first_spectrum_id = ?1");
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map([first_spectrum_id], BoundingBoxRow::from_row)?;

        let mut boxes = Vec::new();
        for row in rows {
            boxes.push(self.complete_bounding_box(row?)?);
        }
        Ok(boxes)
    }

    /// Data encoding used by a bounding box payload
    pub fn encoding_for_bounding_box(&self, bb_id: i64) -> Result<DataEncoding, ReaderError> {
        let encoding_id = self.data_encoding_id(bb_id)?;
        self.cache()?.encodings.get(encoding_id)
    }

    /// MS level of a run slice
    pub fn ms_level_for_run_slice(&self, run_slice_id: i64) -> Result<i64, ReaderError> {
        let level = self
            .conn()?
            .query_row(
                "SELECT ms_level FROM run_slice WHERE id = ?1",
                [run_slice_id],
                |row| row.get(0),
            )
            .optional()?;
        required(level, || format!("run slice {}", run_slice_id))
    }

    /// Run slice a bounding box belongs to
    pub fn run_slice_for_bounding_box(&self, bb_id: i64) -> Result<i64, ReaderError> {
        let run_slice_id = self
            .conn()?
            .query_row(
                "SELECT run_slice_id FROM bounding_box WHERE id = ?1",
                [bb_id],
                |row| row.get(0),
            )
            .optional()?;
        required(run_slice_id, || format!("bounding box {}", bb_id))
    }

    /// Same as [`MzDbReader::run_slice_for_bounding_box`]
    pub fn run_slice_id(&self, bb_id: i64) -> Result<i64, ReaderError> {
        self.run_slice_for_bounding_box(bb_id)
    }

    /// Same as [`MzDbReader::ms_level_for_run_slice`]
    pub fn ms_level_from_run_slice_id(&self, run_slice_id: i64) -> Result<i64, ReaderError> {
        self.ms_level_for_run_slice(run_slice_id)
    }

    /// First spectrum id of the bounding box group holding a spectrum's peaks
    pub fn bounding_box_first_spectrum_id(&self, spectrum_id: i64) -> Result<i64, ReaderError> {
        let header = required(self.cache()?.header(spectrum_id), || {
            format!("spectrum {}", spectrum_id)
        })?;
        Ok(header.bb_first_spectrum_id)
    }

    /// Lower m/z bound of an MS1 R-tree entry
    pub fn bounding_box_min_mz(&self, rtree_id: i64) -> Result<f64, ReaderError> {
        self.rtree_value("min_mz", rtree_id)
    }

    /// Lower time bound of an MS1 R-tree entry
    pub fn bounding_box_min_time(&self, rtree_id: i64) -> Result<f64, ReaderError> {
        self.rtree_value("min_time", rtree_id)
    }

    /// MS level of a bounding box, through its run slice
    pub fn bounding_box_ms_level(&self, bb_id: i64) -> Result<i64, ReaderError> {
        let level = self
            .conn()?
            .query_row(
                "SELECT rs.ms_level FROM bounding_box bb \
                 JOIN run_slice rs ON rs.id = bb.run_slice_id WHERE bb.id = ?1",
                [bb_id],
                |row| row.get(0),
            )
            .optional()?;
        required(level, || format!("bounding box {}", bb_id))
    }

    /// Data encoding id of a bounding box (that of its first spectrum)
    pub fn data_encoding_id(&self, bb_id: i64) -> Result<i64, ReaderError> {
        let encoding_id = self
            .conn()?
            .query_row(
                "SELECT s.data_encoding_id FROM bounding_box bb \
                 JOIN spectrum s ON s.id = bb.first_spectrum_id WHERE bb.id = ?1",
                [bb_id],
                |row| row.get(0),
            )
            .optional()?;
        required(encoding_id, || format!("bounding box {}", bb_id))
    }

    /// Every run slice, ordered by MS level then m/z
    pub fn run_slices(&self) -> Result<Vec<RunSliceHeader>, ReaderError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, ms_level, number, begin_mz, end_mz, run_id FROM run_slice \
             ORDER BY ms_level, begin_mz",
        )?;
        let slices = stmt.query_map([], run_slice_from_row)?;
        Ok(slices.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// One run slice
    pub fn run_slice(&self, run_slice_id: i64) -> Result<RunSliceHeader, ReaderError> {
        let slice = self
            .conn()?
            .query_row(
                "SELECT id, ms_level, number, begin_mz, end_mz, run_id FROM run_slice WHERE id = ?1",
                [run_slice_id],
                run_slice_from_row,
            )
            .optional()?;
        required(slice, || format!("run slice {}", run_slice_id))
    }

    /// Ids of the MS1 bounding boxes intersecting an m/z x time rectangle
    ///
    /// Uses the R-tree when present; otherwise run slice bounds and the times
    /// of each box's first and last spectrum.
    pub fn bounding_box_ids_in_region(
        &self,
        min_mz: f64,
        max_mz: f64,
        min_time: f64,
        max_time: f64,
    ) -> Result<Vec<i64>, ReaderError> {
        let conn = self.conn()?;
        let sql = if self.cache()?.schema.has_rtree {
            "SELECT id FROM bounding_box_rtree \
             WHERE max_mz >= ?1 AND min_mz <= ?2 AND max_time >= ?3 AND min_time <= ?4 \
             ORDER BY id"
        } else {
            "SELECT bb.id FROM bounding_box bb \
             JOIN run_slice rs ON rs.id = bb.run_slice_id \
             JOIN spectrum f ON f.id = bb.first_spectrum_id \
             JOIN spectrum l ON l.id = bb.last_spectrum_id \
             WHERE rs.ms_level = 1 AND rs.end_mz >= ?1 AND rs.begin_mz <= ?2 \
             AND l.time >= ?3 AND f.time <= ?4 ORDER BY bb.id"
        };

        let mut stmt = conn.prepare(sql)?;
        let ids = stmt.query_map([min_mz, max_mz, min_time, max_time], |row| row.get(0))?;
        Ok(ids.collect::<rusqlite::Result<Vec<i64>>>()?)
    }

    /// Ids of the spectra acquired within `[min_time, max_time]`, optionally of one MS level
    pub fn spectrum_ids_in_time_range(
        &self,
        min_time: f32,
        max_time: f32,
        ms_level: Option<i64>,
    ) -> Result<Vec<i64>, ReaderError> {
        let headers = &self.cache()?.headers;
        Ok(headers
            .iter()
            .filter(|h| h.time >= min_time && h.time <= max_time)
            .filter(|h| ms_level.map_or(true, |level| h.ms_level == level))
            .map(|h| h.id)
            .collect())
    }

    /// Run slices of one MS level, ordered by slice number
    pub fn run_slices_by_ms_level(&self, ms_level: i64) -> Result<Vec<RunSliceHeader>, ReaderError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, ms_level, number, begin_mz, end_mz, run_id FROM run_slice \
             WHERE ms_level = ?1 ORDER BY number",
        )?;
        let slices = stmt.query_map([ms_level], run_slice_from_row)?;
        Ok(slices.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Run slice of `ms_level` whose m/z window holds `mz`
    ///
    /// On a shared boundary the slice with the lower number wins.
    pub fn run_slice_containing_mz(
        &self,
        mz: f64,
        ms_level: i64,
    ) -> Result<RunSliceHeader, ReaderError> {
        let slice = self
            .conn()?
            .query_row(
                "SELECT id, ms_level, number, begin_mz, end_mz, run_id FROM run_slice \
                 WHERE ms_level = ?1 AND begin_mz <= ?2 AND end_mz >= ?2 \
                 ORDER BY number LIMIT 1",
                params![ms_level, mz],
                run_slice_from_row,
            )
            .optional()?;
        required(slice, || format!("MS{} run slice containing m/z {}", ms_level, mz))
    }

    /// Ids of the spectra whose cycle lies in `[min_cycle, max_cycle]`, optionally of one MS level
    pub fn spectrum_ids_in_cycle_range(
        &self,
        min_cycle: i64,
        max_cycle: i64,
        ms_level: Option<i64>,
    ) -> Result<Vec<i64>, ReaderError> {
        let headers = &self.cache()?.headers;
        Ok(headers
            .iter()
            .filter(|h| h.cycle >= min_cycle && h.cycle <= max_cycle)
            .filter(|h| ms_level.map_or(true, |level| h.ms_level == level))
            .map(|h| h.id)
            .collect())
    }

    /// Ids of the MS2 spectra whose main precursor m/z lies in `[min_mz, max_mz]`
    pub fn ms2_spectrum_ids_for_precursor_mz(
        &self,
        min_mz: f64,
        max_mz: f64,
    ) -> Result<Vec<i64>, ReaderError> {
        let headers = &self.cache()?.headers;
        Ok(headers
            .iter()
            .filter(|h| h.ms_level == 2)
            .filter(|h| h.precursor_mz.map_or(false, |mz| mz >= min_mz && mz <= max_mz))
            .map(|h| h.id)
            .collect())
    }

    /// MSn R-tree entries of `ms_level` whose parent window overlaps `parent_mz ± tolerance`
    ///
    /// This is how DIA (SWATH) fragment boxes are looked up by precursor window.
    /// Fails with [`ReaderError::NotFound`] when the file has no MSn R-tree.
    pub fn msn_bounding_boxes_for_parent_mz(
        &self,
        ms_level: i64,
        parent_mz: f64,
        tolerance: f64,
    ) -> Result<Vec<MsnRTreeEntry>, ReaderError> {
        let conn = self.msn_rtree_conn()?;
        let sql = format!(
            "SELECT {} FROM bounding_box_msn_rtree \
             WHERE min_ms_level <= ?1 AND max_ms_level >= ?1 \
             AND max_parent_mz >= ?2 AND min_parent_mz <= ?3 ORDER BY id",
            MSN_RTREE_COLUMNS
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let entries = stmt.query_map(
            params![
                ms_level,
                (parent_mz - tolerance) * RTREE_LOWER_CORRECTION,
                (parent_mz + tolerance) * RTREE_UPPER_CORRECTION
            ],
            msn_entry_from_row,
        )?;
        Ok(entries.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// MSn R-tree entries of `ms_level` intersecting an m/z x time rectangle
    ///
    /// Fails with [`ReaderError::NotFound`] when the file has no MSn R-tree.
    pub fn msn_bounding_boxes_in_region(
        &self,
        ms_level: i64,
        min_mz: f64,
        max_mz: f64,
        min_time: f64,
        max_time: f64,
    ) -> Result<Vec<MsnRTreeEntry>, ReaderError> {
        let conn = self.msn_rtree_conn()?;
        let sql = format!(
            "SELECT {} FROM bounding_box_msn_rtree \
             WHERE min_ms_level <= ?1 AND max_ms_level >= ?1 \
             AND max_mz >= ?2 AND min_mz <= ?3 AND max_time >= ?4 AND min_time <= ?5 \
             ORDER BY id",
            MSN_RTREE_COLUMNS
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let entries = stmt.query_map(
            params![
                ms_level,
                min_mz * RTREE_LOWER_CORRECTION,
                max_mz * RTREE_UPPER_CORRECTION,
                min_time * RTREE_LOWER_CORRECTION,
                max_time * RTREE_UPPER_CORRECTION
            ],
            msn_entry_from_row,
        )?;
        Ok(entries.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct parent m/z windows of the MSn R-tree, by ascending lower bound
    ///
    /// Fails with [`ReaderError::NotFound`] when the file has no MSn R-tree.
    pub fn parent_mz_windows(&self) -> Result<Vec<IsolationWindow>, ReaderError> {
        let conn = self.msn_rtree_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT min_parent_mz, max_parent_mz FROM bounding_box_msn_rtree \
             WHERE min_ms_level >= 2 ORDER BY min_parent_mz, max_parent_mz",
        )?;
        let windows = stmt.query_map([], |row| {
            Ok(IsolationWindow {
                min_mz: row.get(0)?,
                max_mz: row.get(1)?,
            })
        })?;
        Ok(windows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct isolation windows of the MS2 spectra, by ascending lower bound
    ///
    /// Windows are read from each precursor list and deduplicated at 0.01 m/z.
    /// Spectra without a precursor list or without a target m/z are skipped;
    /// a precursor list that is not well-formed XML is an error.
    pub fn isolation_windows(&self) -> Result<Vec<IsolationWindow>, ReaderError> {
        let headers = &self.cache()?.headers;
        let mut seen_lists: HashSet<&str> = HashSet::new();
        let mut seen_windows: HashSet<(i64, i64)> = HashSet::new();
        let mut windows = Vec::new();

        for header in headers.iter().filter(|h| h.ms_level == 2) {
            let Some(xml) = header.precursor_list.as_deref() else {
                continue;
            };
            if !seen_lists.insert(xml) {
                continue;
            }
            let Some(window) = decode_isolation_window(xml)? else {
                continue;
            };
            let key = (
                (window.min_mz * 100.0).round() as i64,
                (window.max_mz * 100.0).round() as i64,
            );
            if seen_windows.insert(key) {
                windows.push(window);
            }
        }

        windows.sort_by(|a, b| a.min_mz.total_cmp(&b.min_mz));
        debug!("Found {} distinct isolation windows", windows.len());
        Ok(windows)
    }

    /// True if the file looks like data-independent acquisition
    ///
    /// That is at least 100 MS2 spectra and an MSn R-tree.
    pub fn is_dia_data(&self) -> Result<bool, ReaderError> {
        let cache = self.cache()?;
        let ms2_count = cache.headers.iter().filter(|h| h.ms_level == 2).count();
        Ok(ms2_count >= DIA_MIN_MS2_SPECTRA && cache.schema.has_msn_rtree)
    }

    fn msn_rtree_conn(&self) -> Result<&rusqlite::Connection, ReaderError> {
        let conn = self.conn()?;
        if !self.cache()?.schema.has_msn_rtree {
            return Err(ReaderError::NotFound("bounding_box_msn_rtree table".to_string()));
        }
        Ok(conn)
    }

    fn rtree_value(&self, column: &str, rtree_id: i64) -> Result<f64, ReaderError> {
        let conn = self.conn()?;
        if !self.cache()?.schema.has_rtree {
            return Err(ReaderError::NotFound("bounding_box_rtree table".to_string()));
        }
        let sql = format!("SELECT {} FROM bounding_box_rtree WHERE id = ?1", column);
        let value = conn
            .query_row(&sql, [rtree_id], |row| row.get(0))
            .optional()?;
        required(value, || format!("R-tree entry {}", rtree_id))
    }

    /// Fill in the encoding and, without an R-tree entry, the time bounds
    fn complete_bounding_box(&self, row: BoundingBoxRow) -> Result<BoundingBox, ReaderError> {
        let cache = self.cache()?;
        let first = cache.header(row.first_spectrum_id).ok_or_else(|| {
            ReaderError::CorruptContainer(format!(
                "bounding box {} starts at unknown spectrum {}",
                row.id, row.first_spectrum_id
            ))
        })?;
        let last_time = cache
            .header(row.last_spectrum_id)
            .map_or(first.time, |last| last.time);

        Ok(BoundingBox {
            id: row.id,
            first_spectrum_id: row.first_spectrum_id,
            last_spectrum_id: row.last_spectrum_id,
            min_mz: row.min_mz,
            max_mz: row.max_mz,
            min_time: row.min_time.unwrap_or(f64::from(first.time)),
            max_time: row.max_time.unwrap_or(f64::from(last_time)),
            ms_level: row.ms_level,
            run_slice_id: row.run_slice_id,
            data_encoding_id: first.data_encoding_id,
            payload: row.payload,
        })
    }
}
