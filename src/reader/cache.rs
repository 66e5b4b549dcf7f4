use std::collections::HashMap;

use log::debug;
use rusqlite::Connection;

use super::ReaderError;
use crate::decode::{
    decode_data_encoding, decode_header, DecodeError, RawDataEncoding, SPECTRUM_HEADER_COLUMNS,
};
use crate::model::{DataEncoding, SpectrumHeader};

/// Optional parts of the schema detected at open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SchemaInfo {
    pub(crate) has_rtree: bool,
    pub(crate) has_msn_rtree: bool,
    pub(crate) has_sqlite_sequence: bool,
    pub(crate) has_software: bool,
    pub(crate) has_run: bool,
    pub(crate) has_source_file: bool,
    pub(crate) has_instrument_configuration: bool,
    pub(crate) has_chromatogram: bool,
    pub(crate) has_peak_layout: bool,
}

/// Data encodings keyed by id
///
/// Rows with values this crate cannot decode are kept with the reason, so the
/// file still opens and only decoding through them fails.
#[derive(Debug, Default)]
pub(crate) struct DataEncodingsCache {
    supported: HashMap<i64, DataEncoding>,
    unsupported: HashMap<i64, String>,
}

impl DataEncodingsCache {
    pub(crate) fn get(&self, id: i64) -> Result<DataEncoding, ReaderError> {
        if let Some(encoding) = self.supported.get(&id) {
            return Ok(*encoding);
        }
        match self.unsupported.get(&id) {
            Some(reason) => Err(ReaderError::UnsupportedEncoding(reason.clone())),
            None => Err(ReaderError::NotFound(format!("data encoding {}", id))),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.supported.len() + self.unsupported.len()
    }
}

/// Entities loaded once at open
#[derive(Debug)]
pub(crate) struct EntityCache {
    pub(crate) schema: SchemaInfo,
    /// Sorted by id
    pub(crate) headers: Vec<SpectrumHeader>,
    pub(crate) encodings: DataEncodingsCache,
}

impl EntityCache {
    pub(crate) fn load(conn: &Connection, schema: SchemaInfo) -> Result<Self, ReaderError> {
        let encodings = load_data_encodings(conn, &schema)?;
        let headers = load_headers(conn)?;
        debug!(
            "Cached {} spectrum headers and {} data encodings",
            headers.len(),
            encodings.len()
        );

        Ok(Self {
            schema,
            headers,
            encodings,
        })
    }

    pub(crate) fn header(&self, spectrum_id: i64) -> Option<&SpectrumHeader> {
        self.headers
            .binary_search_by_key(&spectrum_id, |h| h.id)
            .ok()
            .map(|idx| &self.headers[idx])
    }
}

fn load_headers(conn: &Connection) -> Result<Vec<SpectrumHeader>, ReaderError> {
    let sql = format!(
        "SELECT {} FROM spectrum ORDER BY id",
        SPECTRUM_HEADER_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let headers = stmt.query_map([], |row| decode_header(row))?;
    Ok(headers.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn load_data_encodings(
    conn: &Connection,
    schema: &SchemaInfo,
) -> Result<DataEncodingsCache, ReaderError> {
    let layout_column = if schema.has_peak_layout {
        "peak_layout"
    } else {
        "NULL"
    };
    let sql = format!(
        "SELECT id, mode, compression, byte_order, mz_precision, intensity_precision, {} \
         FROM data_encoding",
        layout_column
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(RawDataEncoding {
            id: row.get(0)?,
            mode: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            compression: row.get(2)?,
            byte_order: row.get(3)?,
            mz_precision: row.get(4)?,
            intensity_precision: row.get(5)?,
            peak_layout: row.get(6)?,
        })
    })?;

    let mut cache = DataEncodingsCache::default();
    for row in rows {
        let raw = row?;
        match decode_data_encoding(&raw) {
            Ok(encoding) => {
                cache.supported.insert(raw.id, encoding);
            }
            Err(err) => {
                debug!("Data encoding {} is unsupported: {}", raw.id, err);
                let reason = match err {
                    DecodeError::UnsupportedEncoding(reason) => reason,
                    other => other.to_string(),
                };
                cache.unsupported.insert(raw.id, reason);
            }
        }
    }

    Ok(cache)
}
