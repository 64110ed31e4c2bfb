//! Backend-neutral result rows and their mapping into caller types.
//!
//! Rows are decoded eagerly into JSON values (see `db::types`), so mapping a
//! row into a caller type goes through `serde`: struct fields match column
//! names (honouring `#[serde(rename)]`), a single-column row maps onto a
//! scalar, and a row maps onto a tuple positionally.

use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// One result row: ordered column names and decoded values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<JsonValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<JsonValue>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[JsonValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column. With duplicate column names the last one wins.
    pub fn get_value(&self, column: &str) -> Option<&JsonValue> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Map one column into `T`.
    pub fn get<T: DeserializeOwned>(&self, column: &str) -> DbResult<T> {
        let value = self
            .get_value(column)
            .ok_or_else(|| DbError::mapping(format!("missing column {}", column)))?;
        T::deserialize(value).map_err(|e| {
            DbError::mapping(format!("column {}: {}", column, e))
        })
    }

    /// Map the column at `index` into `T`.
    pub fn get_index<T: DeserializeOwned>(&self, index: usize) -> DbResult<T> {
        let value = self.values.get(index).ok_or_else(|| {
            DbError::mapping(format!(
                "column index {} out of bounds (len: {})",
                index,
                self.values.len()
            ))
        })?;
        Ok(T::deserialize(value)?)
    }

    pub fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }

    /// Map the whole row into `T`.
    ///
    /// The row is tried as an object keyed by column name first. If that
    /// fails, a single-column row is tried as a scalar and a wider row as a
    /// positional sequence. When nothing fits, the object error is reported.
    pub fn scan<T: DeserializeOwned>(&self) -> DbResult<T> {
        let object = JsonValue::Object(self.to_json_map());
        let err = match T::deserialize(&object) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let fallback = match self.values.as_slice() {
            [single] => T::deserialize(single),
            values => T::deserialize(&JsonValue::Array(values.to_vec())),
        };
        fallback.map_err(|_| DbError::mapping(err.to_string()))
    }
}

pub(crate) fn decode_row<R: RowToJson>(row: &R, columns: &mut Option<Arc<[String]>>) -> DbResult<Row> {
    let columns = columns
        .get_or_insert_with(|| row.column_names().into())
        .clone();
    Ok(Row::new(columns, row.to_json_values()?))
}

/// Forward-only sequence of rows returned by `query`.
///
/// The result set is fully read before the cursor is handed out, so the
/// connection is already released and iteration cannot fail.
#[derive(Debug, Clone, Default)]
pub struct RowCursor {
    columns: Arc<[String]>,
    rows: std::vec::IntoIter<Row>,
}

impl RowCursor {
    pub(crate) fn from_driver_rows<R: RowToJson>(rows: &[R]) -> DbResult<Self> {
        let mut columns = None;
        let decoded = rows
            .iter()
            .map(|row| decode_row(row, &mut columns))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Self {
            columns: columns.unwrap_or_else(|| Arc::from(Vec::new())),
            rows: decoded.into_iter(),
        })
    }

    /// Column names of the result; empty when no row was returned.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Map every remaining row into `T`.
    pub fn scan_all<T: DeserializeOwned>(self) -> DbResult<Vec<T>> {
        self.rows.map(|row| row.scan()).collect()
    }
}

impl Iterator for RowCursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for RowCursor {}

/// Deferred result of `query_row`.
///
/// Query failures and an empty result surface only when the handle is
/// scanned; an empty result scans as [`DbError::NoRows`].
#[derive(Debug)]
pub struct RowHandle {
    inner: DbResult<Option<Row>>,
}

impl RowHandle {
    pub(crate) fn new(inner: DbResult<Option<Row>>) -> Self {
        Self { inner }
    }

    pub fn scan<T: DeserializeOwned>(self) -> DbResult<T> {
        self.into_row()?.scan()
    }

    pub fn into_row(self) -> DbResult<Row> {
        self.inner?.ok_or(DbError::NoRows)
    }

    /// The query error, if the statement itself failed.
    pub fn err(&self) -> Option<&DbError> {
        self.inner.as_ref().err()
    }
}
