//! Column encodings shared by every table.
//!
//! - identifiers: canonical hyphenated UUID text (via the ID types' own
//!   `ToSql`/`FromSql`), unset optional references as `NULL`
//! - timestamps: RFC 3339 UTC with exactly six fractional digits, so text
//!   order is time order
//! - JSON: serialized text

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, Value, ValueRef};
use uuid::Uuid;

use crate::errors::Result;

/// Stored text form of a timestamp.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn parse_ts(text: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc))
}

/// Timestamp column reader.
struct StoredTs(DateTime<Utc>);

impl FromSql for StoredTs {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        parse_ts(value.as_str()?)
            .map(StoredTs)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

pub(crate) fn ts(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    row.get::<_, StoredTs>(column).map(|t| t.0)
}

pub(crate) fn opt_ts(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<StoredTs>>(column).map(|t| t.map(|t| t.0))
}

pub(crate) fn id_value(id: impl Into<Uuid>) -> Value {
    Value::Text(id.into().to_string())
}

/// Optional reference; an unset ID is written as `NULL`.
pub(crate) fn opt_id_value<I: Into<Uuid>>(id: Option<I>) -> Value {
    match id.map(Into::into) {
        Some(uuid) if !uuid.is_nil() => Value::Text(uuid.to_string()),
        _ => Value::Null,
    }
}

pub(crate) fn ts_value(ts: &DateTime<Utc>) -> Value {
    Value::Text(format_ts(ts))
}

pub(crate) fn opt_ts_value(ts: Option<&DateTime<Utc>>) -> Value {
    ts.map_or(Value::Null, ts_value)
}

pub(crate) fn text_value(text: &str) -> Value {
    Value::Text(text.to_owned())
}

pub(crate) fn json_value(json: &serde_json::Value) -> Result<Value> {
    Ok(Value::Text(serde_json::to_string(json)?))
}
