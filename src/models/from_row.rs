use rusqlite::types::Type;
use rusqlite::Row;
use serde_json::Value;

/// Maps a `SELECT *` row onto a model. Joined columns are read by alias.
pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Reads a nullable TEXT column holding JSON.
pub(crate) fn json_column(row: &Row, column: &str) -> rusqlite::Result<Option<Value>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|text| {
        serde_json::from_str(&text).map_err(|e| {
            let index = row.as_ref().column_index(column).unwrap_or_default();
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
        })
    })
    .transpose()
}
