use rusqlite::{Connection, OptionalExtension};

use super::ReaderError;

/// True if `name` is a table (plain or virtual) of the database
pub(super) fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

/// Column names of a table, empty if the table does not exist
pub(super) fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let names = stmt.query_map([table], |row| row.get(0))?;
    names.collect()
}

/// Last AUTOINCREMENT value recorded for a table, if any
pub(super) fn sequence_value(conn: &Connection, table: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT seq FROM sqlite_sequence WHERE name = ?1",
        [table],
        |row| row.get(0),
    )
    .optional()
}

/// Turn a missing row into [`ReaderError::NotFound`]
pub(super) fn required<T>(
    value: Option<T>,
    what: impl FnOnce() -> String,
) -> Result<T, ReaderError> {
    value.ok_or_else(|| ReaderError::NotFound(what()))
}
