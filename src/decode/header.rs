use rusqlite::Row;

use super::decode_param_tree;
use crate::model::SpectrumHeader;

/// Column list selected for every spectrum header query
pub const SPECTRUM_HEADER_COLUMNS: &str = "id, initial_id, title, cycle, time, ms_level, \
     activation_type, tic, base_peak_mz, base_peak_intensity, main_precursor_mz, \
     main_precursor_charge, data_points_count, param_tree, scan_list, precursor_list, \
     product_list, shared_param_tree_id, instrument_configuration_id, source_file_id, run_id, \
     data_processing_id, data_encoding_id, bb_first_spectrum_id";

/// Decode one `spectrum` row selected with [`SPECTRUM_HEADER_COLUMNS`]
///
/// Columns are looked up by name. Precursor fields are only kept for
/// `ms_level > 1`; MS1 rows written by some converters carry stale values.
pub fn decode_header(row: &Row<'_>) -> rusqlite::Result<SpectrumHeader> {
    let ms_level: i64 = row.get("ms_level")?;
    let (precursor_mz, precursor_charge) = if ms_level > 1 {
        (
            row.get::<_, Option<f64>>("main_precursor_mz")?,
            row.get::<_, Option<i32>>("main_precursor_charge")?,
        )
    } else {
        (None, None)
    };

    Ok(SpectrumHeader {
        id: row.get("id")?,
        initial_id: row.get("initial_id")?,
        title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
        cycle: row.get("cycle")?,
        time: row.get::<_, f64>("time")? as f32,
        ms_level,
        activation_type: row.get("activation_type")?,
        tic: row.get::<_, f64>("tic")? as f32,
        base_peak_mz: row.get("base_peak_mz")?,
        base_peak_intensity: row.get::<_, f64>("base_peak_intensity")? as f32,
        precursor_mz,
        precursor_charge,
        peaks_count: row.get("data_points_count")?,
        param_tree: decode_param_tree(row.get("param_tree")?),
        scan_list: row.get("scan_list")?,
        precursor_list: row.get("precursor_list")?,
        product_list: row.get("product_list")?,
        shared_param_tree_id: row.get("shared_param_tree_id")?,
        instrument_configuration_id: row.get("instrument_configuration_id")?,
        source_file_id: row.get("source_file_id")?,
        run_id: row.get("run_id")?,
        data_processing_id: row.get("data_processing_id")?,
        data_encoding_id: row.get("data_encoding_id")?,
        bb_first_spectrum_id: row.get("bb_first_spectrum_id")?,
    })
}
