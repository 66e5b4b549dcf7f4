use rusqlite::{OptionalExtension, Row};

use super::utils::{required, sequence_value};
use super::{MzDbReader, ReaderError};
use crate::decode::decode_param_tree;
use crate::model::{InstrumentConfiguration, Run, SourceFile, Software};

const RUN_COLUMNS: &str = "id, name, start_timestamp, param_tree, shared_param_tree_id, sample_id, \
     default_instrument_config_id, default_source_file_id, default_scan_processing_id, \
     default_chrom_processing_id";
const SOFTWARE_COLUMNS: &str = "id, name, version, param_tree, shared_param_tree_id";
const SOURCE_FILE_COLUMNS: &str = "id, name, location, param_tree, shared_param_tree_id";
const INSTRUMENT_CONFIGURATION_COLUMNS: &str =
    "id, name, param_tree, component_list, shared_param_tree_id, software_id";

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<Run> {
    Ok(Run {
        id: row.get(0)?,
        name: row.get(1)?,
        start_timestamp: row.get(2)?,
        param_tree: row.get(3)?,
        shared_param_tree_id: row.get(4)?,
        sample_id: row.get(5)?,
        default_instrument_config_id: row.get(6)?,
        default_source_file_id: row.get(7)?,
        default_scan_processing_id: row.get(8)?,
        default_chrom_processing_id: row.get(9)?,
    })
}

fn software_from_row(row: &Row<'_>) -> rusqlite::Result<Software> {
    Ok(Software {
        id: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        param_tree: decode_param_tree(row.get(3)?),
        shared_param_tree_id: row.get(4)?,
    })
}

fn source_file_from_row(row: &Row<'_>) -> rusqlite::Result<SourceFile> {
    Ok(SourceFile {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        param_tree: decode_param_tree(row.get(3)?),
        shared_param_tree_id: row.get(4)?,
    })
}

fn instrument_configuration_from_row(row: &Row<'_>) -> rusqlite::Result<InstrumentConfiguration> {
    Ok(InstrumentConfiguration {
        id: row.get(0)?,
        name: row.get(1)?,
        param_tree: decode_param_tree(row.get(2)?),
        component_list: decode_param_tree(row.get(3)?),
        shared_param_tree_id: row.get(4)?,
        software_id: row.get(5)?,
    })
}

impl MzDbReader {
    /// Version of the mzDB format (`mzdb.version`)
    pub fn mzdb_version(&self) -> Result<String, ReaderError> {
        let version: Option<Option<String>> = self
            .conn()?
            .query_row("SELECT version FROM mzdb LIMIT 1", [], |row| row.get(0))
            .optional()?;
        required(version.flatten(), || "mzdb version".to_string())
    }

    /// Version of the software that wrote the file (`software` row named `*mzDB`)
    pub fn pwiz_mzdb_version(&self) -> Result<String, ReaderError> {
        let conn = self.conn()?;
        if !self.cache()?.schema.has_software {
            return Err(ReaderError::NotFound("software table".to_string()));
        }
        let version: Option<Option<String>> = conn
            .query_row(
                "SELECT version FROM software WHERE name LIKE '%mzDB' LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        required(version.flatten(), || "mzDB writer software".to_string())
    }

    /// Raw parameter tree of the `mzdb` table
    pub fn param_tree_mzdb(&self) -> Result<String, ReaderError> {
        let tree: Option<Option<String>> = self
            .conn()?
            .query_row("SELECT param_tree FROM mzdb LIMIT 1", [], |row| row.get(0))
            .optional()?;
        let tree = required(tree, || "mzdb row".to_string())?;
        Ok(decode_param_tree(tree))
    }

    /// Raw parameter tree of one spectrum
    pub fn param_tree_spectrum(&self, spectrum_id: i64) -> Result<String, ReaderError> {
        let header = required(self.cache()?.header(spectrum_id), || {
            format!("spectrum {}", spectrum_id)
        })?;
        Ok(header.param_tree.clone())
    }

    /// Raw parameter trees of every chromatogram, in id order
    ///
    /// Files without a `chromatogram` table yield an empty list.
    pub fn param_tree_chromatogram(&self) -> Result<Vec<String>, ReaderError> {
        let conn = self.conn()?;
        if !self.cache()?.schema.has_chromatogram {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare("SELECT param_tree FROM chromatogram ORDER BY id")?;
        let trees = stmt.query_map([], |row| row.get::<_, Option<String>>(0))?;
        let mut result = Vec::new();
        for tree in trees {
            result.push(decode_param_tree(tree?));
        }
        Ok(result)
    }

    /// Cycle number of the last spectrum
    pub fn last_cycle_number(&self) -> Result<i64, ReaderError> {
        let cycle = self
            .conn()?
            .query_row(
                "SELECT cycle FROM spectrum ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        required(cycle, || "last spectrum".to_string())
    }

    /// Retention time of the last spectrum (seconds)
    pub fn last_time(&self) -> Result<f32, ReaderError> {
        let time: Option<f64> = self
            .conn()?
            .query_row(
                "SELECT time FROM spectrum ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        required(time.map(|t| t as f32), || "last spectrum".to_string())
    }

    /// Highest MS level over all run slices
    pub fn max_ms_level(&self) -> Result<i64, ReaderError> {
        let level: Option<i64> =
            self.conn()?
                .query_row("SELECT MAX(ms_level) FROM run_slice", [], |row| row.get(0))?;
        required(level, || "run slices".to_string())
    }

    /// Number of bounding boxes in a run slice
    pub fn run_slice_bounding_boxes_count(&self, run_slice_id: i64) -> Result<i64, ReaderError> {
        Ok(self.conn()?.query_row(
            "SELECT COUNT(*) FROM bounding_box WHERE run_slice_id = ?1",
            [run_slice_id],
            |row| row.get(0),
        )?)
    }

    /// Number of spectra of one MS level
    pub fn spectra_count_single_ms_level(&self, ms_level: i64) -> Result<i64, ReaderError> {
        Ok(self.conn()?.query_row(
            "SELECT COUNT(id) FROM spectrum WHERE ms_level = ?1",
            [ms_level],
            |row| row.get(0),
        )?)
    }

    /// Number of spectra
    pub fn spectra_count(&self) -> Result<i64, ReaderError> {
        self.table_records_count("spectrum")
    }

    /// Number of bounding boxes
    pub fn bounding_boxes_count(&self) -> Result<i64, ReaderError> {
        self.table_records_count("bounding_box")
    }

    /// Number of data encodings, from `sqlite_sequence` when available
    pub fn data_encodings_count(&self) -> Result<i64, ReaderError> {
        self.table_records_count("data_encoding")
    }

    /// Number of data encodings, counted on the table itself
    pub fn data_encoding_count(&self) -> Result<i64, ReaderError> {
        Ok(self
            .conn()?
            .query_row("SELECT COUNT(id) FROM data_encoding", [], |row| row.get(0))?)
    }

    /// Record count of a required table
    ///
    /// The AUTOINCREMENT sequence avoids a full scan; tables without a
    /// sequence entry are counted.
    fn table_records_count(&self, table: &'static str) -> Result<i64, ReaderError> {
        let conn = self.conn()?;
        if self.cache()?.schema.has_sqlite_sequence {
            if let Some(count) = sequence_value(conn, table)? {
                return Ok(count);
            }
        }
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

// ============================================================================
// Acquisition metadata rows
// ============================================================================

impl MzDbReader {
    /// Every run, in id order
    ///
    /// Files without a `run` table yield an empty list.
    pub fn runs(&self) -> Result<Vec<Run>, ReaderError> {
        let present = self.cache()?.schema.has_run;
        self.list_rows(present, "run", RUN_COLUMNS, run_from_row)
    }

    /// One run
    pub fn run(&self, run_id: i64) -> Result<Run, ReaderError> {
        let present = self.cache()?.schema.has_run;
        self.get_row(present, "run", RUN_COLUMNS, run_id, run_from_row)
    }

    /// Every software entry, in id order
    pub fn software_list(&self) -> Result<Vec<Software>, ReaderError> {
        let present = self.cache()?.schema.has_software;
        self.list_rows(present, "software", SOFTWARE_COLUMNS, software_from_row)
    }

    /// One software entry
    pub fn software(&self, software_id: i64) -> Result<Software, ReaderError> {
        let present = self.cache()?.schema.has_software;
        self.get_row(present, "software", SOFTWARE_COLUMNS, software_id, software_from_row)
    }

    /// Every source file, in id order
    pub fn source_files(&self) -> Result<Vec<SourceFile>, ReaderError> {
        let present = self.cache()?.schema.has_source_file;
        self.list_rows(present, "source_file", SOURCE_FILE_COLUMNS, source_file_from_row)
    }

    /// One source file
    pub fn source_file(&self, source_file_id: i64) -> Result<SourceFile, ReaderError> {
        let present = self.cache()?.schema.has_source_file;
        self.get_row(
            present,
            "source_file",
            SOURCE_FILE_COLUMNS,
            source_file_id,
            source_file_from_row,
        )
    }

    /// Every instrument configuration, in id order
    pub fn instrument_configurations(&self) -> Result<Vec<InstrumentConfiguration>, ReaderError> {
        let present = self.cache()?.schema.has_instrument_configuration;
        self.list_rows(
            present,
            "instrument_configuration",
            INSTRUMENT_CONFIGURATION_COLUMNS,
            instrument_configuration_from_row,
        )
    }

    /// One instrument configuration
    pub fn instrument_configuration(
        &self,
        configuration_id: i64,
    ) -> Result<InstrumentConfiguration, ReaderError> {
        let present = self.cache()?.schema.has_instrument_configuration;
        self.get_row(
            present,
            "instrument_configuration",
            INSTRUMENT_CONFIGURATION_COLUMNS,
            configuration_id,
            instrument_configuration_from_row,
        )
    }

    /// All rows of an optional table; a missing table has none
    fn list_rows<T>(
        &self,
        present: bool,
        table: &str,
        columns: &str,
        from_row: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, ReaderError> {
        let conn = self.conn()?;
        if !present {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM {} ORDER BY id", columns, table);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// One row of an optional table by id
    fn get_row<T>(
        &self,
        present: bool,
        table: &str,
        columns: &str,
        id: i64,
        from_row: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<T, ReaderError> {
        let conn = self.conn()?;
        if !present {
            return Err(ReaderError::NotFound(format!("{} table", table)));
        }
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", columns, table);
        let row = conn.query_row(&sql, [id], from_row).optional()?;
        required(row, || format!("{} {}", table.replace('_', " "), id))
    }
}
