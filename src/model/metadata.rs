use serde::{Deserialize, Serialize};

/// One row of the `run` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Primary key
    pub id: i64,
    /// Run name
    pub name: String,
    /// Acquisition start, ISO-8601
    pub start_timestamp: Option<String>,
    /// Raw parameter tree
    pub param_tree: Option<String>,
    /// Shared parameter tree reference
    pub shared_param_tree_id: Option<i64>,
    /// Sample reference
    pub sample_id: Option<i64>,
    /// Instrument configuration used unless a spectrum says otherwise
    pub default_instrument_config_id: i64,
    /// Source file used unless a spectrum says otherwise
    pub default_source_file_id: Option<i64>,
    /// Default spectrum processing
    pub default_scan_processing_id: i64,
    /// Default chromatogram processing
    pub default_chrom_processing_id: i64,
}

/// One row of the `software` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Software {
    /// Primary key
    pub id: i64,
    /// Software name
    pub name: String,
    /// Software version
    pub version: String,
    /// Raw parameter tree, empty when `NULL`
    pub param_tree: String,
    /// Shared parameter tree reference
    pub shared_param_tree_id: Option<i64>,
}

/// One row of the `source_file` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Primary key
    pub id: i64,
    /// File name without its path
    pub name: String,
    /// URI of the directory the file was read from
    pub location: String,
    /// Raw parameter tree, empty when `NULL`
    pub param_tree: String,
    /// Shared parameter tree reference
    pub shared_param_tree_id: Option<i64>,
}

/// One row of the `instrument_configuration` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfiguration {
    /// Primary key
    pub id: i64,
    /// Configuration name
    pub name: String,
    /// Raw parameter tree, empty when `NULL`
    pub param_tree: String,
    /// Raw component list XML, empty when `NULL`
    pub component_list: String,
    /// Shared parameter tree reference
    pub shared_param_tree_id: Option<i64>,
    /// Acquisition software reference
    pub software_id: i64,
}
