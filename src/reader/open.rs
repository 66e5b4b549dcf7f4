use std::path::Path;

use log::debug;
use rusqlite::{Connection, OpenFlags};

use super::cache::{EntityCache, SchemaInfo};
use super::utils::{table_columns, table_exists};
use super::{MzDbReader, ReaderConfig, ReaderError};

/// Tables every mzDB file must contain, with the columns this crate reads
const REQUIRED_TABLES: &[(&str, &[&str])] = &[
    ("mzdb", &["version", "param_tree"]),
    (
        "spectrum",
        &[
            "id",
            "initial_id",
            "title",
            "cycle",
            "time",
            "ms_level",
            "activation_type",
            "tic",
            "base_peak_mz",
            "base_peak_intensity",
            "main_precursor_mz",
            "main_precursor_charge",
            "data_points_count",
            "param_tree",
            "scan_list",
            "precursor_list",
            "product_list",
            "shared_param_tree_id",
            "instrument_configuration_id",
            "source_file_id",
            "run_id",
            "data_processing_id",
            "data_encoding_id",
            "bb_first_spectrum_id",
        ],
    ),
    (
        "bounding_box",
        &[
            "id",
            "data",
            "run_slice_id",
            "first_spectrum_id",
            "last_spectrum_id",
        ],
    ),
    (
        "run_slice",
        &["id", "ms_level", "number", "begin_mz", "end_mz", "run_id"],
    ),
    (
        "data_encoding",
        &[
            "id",
            "mode",
            "compression",
            "byte_order",
            "mz_precision",
            "intensity_precision",
        ],
    ),
];

impl MzDbReader {
    /// Open an mzDB file read-only
    ///
    /// Fails with [`ReaderError::NotFound`] if the path does not exist and with
    /// [`ReaderError::CorruptContainer`] if it is not an mzDB container.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open an mzDB file with custom configuration
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ReaderError::NotFound(format!(
                "mzDB file {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(ReaderError::CorruptContainer(format!(
                "{} is not a file",
                path.display()
            )));
        }

        debug!("Opening {}", path.display());
        let (connection, cache) = connect(path, &config).map_err(|err| match err {
            ReaderError::Sqlite(e) => {
                ReaderError::CorruptContainer(format!("{}: {}", path.display(), e))
            }
            other => other,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            config,
            connection: Some(connection),
            cache,
        })
    }
}

/// Open the connection, validate the schema and build the cache
///
/// The connection is dropped before returning on any failure.
fn connect(path: &Path, config: &ReaderConfig) -> Result<(Connection, EntityCache), ReaderError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = Connection::open_with_flags(path, flags)?;
    connection.execute_batch(&config.pragmas())?;

    let schema = validate_schema(&connection)?;
    debug!("Schema of {}: {:?}", path.display(), schema);

    let cache = EntityCache::load(&connection, schema)?;
    Ok((connection, cache))
}

fn validate_schema(conn: &Connection) -> Result<SchemaInfo, ReaderError> {
    for (table, columns) in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(ReaderError::CorruptContainer(format!(
                "missing table '{}'",
                table
            )));
        }

        let present = table_columns(conn, table)?;
        let missing = columns
            .iter()
            .find(|&&column| !present.iter().any(|p| p.as_str() == column));
        if let Some(missing) = missing {
            return Err(ReaderError::CorruptContainer(format!(
                "table '{}' has no column '{}'",
                table, missing
            )));
        }
    }

    let data_encoding_columns = table_columns(conn, "data_encoding")?;

    Ok(SchemaInfo {
        has_rtree: table_exists(conn, "bounding_box_rtree")?,
        has_msn_rtree: table_exists(conn, "bounding_box_msn_rtree")?,
        has_sqlite_sequence: table_exists(conn, "sqlite_sequence")?,
        has_software: table_exists(conn, "software")?,
        has_run: table_exists(conn, "run")?,
        has_source_file: table_exists(conn, "source_file")?,
        has_instrument_configuration: table_exists(conn, "instrument_configuration")?,
        has_chromatogram: table_exists(conn, "chromatogram")?,
        has_peak_layout: data_encoding_columns.iter().any(|c| c == "peak_layout"),
    })
}
