//! Decoding of driver rows into backend-neutral JSON values.
//!
//! Decoding is two-phase:
//! 1. `categorize_type` classifies a column type name into a `TypeCategory`
//! 2. a per-backend decoder extracts the value for that category
//!
//! NULL is detected from the raw value before any typed decode, so a NULL in
//! any column becomes `JsonValue::Null`. Any other decode failure is an error;
//! values are never silently dropped.

use crate::error::{DbError, DbResult};
use crate::models::DatabaseType;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Temporal,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();
    // MySQL reports modifiers after the base name ("BIGINT UNSIGNED")
    let base = lower.split_whitespace().next().unwrap_or_default();

    match base {
        "bool" | "boolean" => TypeCategory::Boolean,
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "int2" | "int4"
        | "int8" | "serial" | "smallserial" | "bigserial" => TypeCategory::Integer,
        "float" | "float4" | "float8" | "real" | "double" => TypeCategory::Float,
        // SQLite's NUMERIC affinity stores plain numbers
        "numeric" if db == DatabaseType::SQLite => TypeCategory::Float,
        "decimal" | "numeric" => TypeCategory::Decimal,
        "json" | "jsonb" => TypeCategory::Json,
        "uuid" => TypeCategory::Uuid,
        "date" | "time" | "datetime" | "timestamp" | "timestamptz" => TypeCategory::Temporal,
        "bytea" => TypeCategory::Binary,
        _ if base.contains("blob") || base.contains("binary") => TypeCategory::Binary,
        "text" | "varchar" | "char" | "bpchar" | "name" | "citext" | "tinytext"
        | "mediumtext" | "longtext" | "enum" | "set" => TypeCategory::Text,
        _ => TypeCategory::Unknown,
    }
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// DECIMAL/NUMERIC value kept as its exact decimal text.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("NUMERIC")
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        ty.name().eq_ignore_ascii_case("numeric")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        match value.format() {
            PgValueFormat::Text => Ok(RawDecimal(value.as_str()?.to_string())),
            PgValueFormat::Binary => Ok(RawDecimal(pg_numeric_to_string(value.as_bytes()?)?)),
        }
    }
}

impl sqlx::postgres::PgHasArrayType for RawDecimal {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_numeric")
    }

    fn array_compatible(ty: &PgTypeInfo) -> bool {
        ty.name().eq_ignore_ascii_case("numeric[]")
    }
}

/// Render the PostgreSQL binary NUMERIC wire format as decimal text.
///
/// Layout: `ndigits, weight, sign, dscale` as big-endian i16/u16, then
/// `ndigits` base-10000 digits. `weight` is the power of 10000 of the first
/// digit; `dscale` the number of decimal places to print.
fn pg_numeric_to_string(buf: &[u8]) -> Result<String, sqlx::error::BoxDynError> {
    use std::fmt::Write as _;

    const NEGATIVE: u16 = 0x4000;
    const NAN: u16 = 0xC000;
    const POS_INF: u16 = 0xD000;
    const NEG_INF: u16 = 0xF000;

    let read = |offset: usize| -> Result<i16, sqlx::error::BoxDynError> {
        buf.get(offset..offset + 2)
            .map(|b| i16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| "truncated NUMERIC value".into())
    };

    let ndigits = read(0)?.max(0) as usize;
    let weight = read(2)? as i32;
    let sign = read(4)? as u16;
    let dscale = read(6)? as u16 as usize;
    let digits = (0..ndigits)
        .map(|k| read(8 + 2 * k))
        .collect::<Result<Vec<_>, _>>()?;

    match sign {
        NAN => return Ok("NaN".to_string()),
        POS_INF => return Ok("Infinity".to_string()),
        NEG_INF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let digit = |i: i32| -> i16 {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NEGATIVE {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for i in 0..=weight {
            if i == 0 {
                let _ = write!(out, "{}", digit(i));
            } else {
                let _ = write!(out, "{:04}", digit(i));
            }
        }
    }
    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while fraction.len() < dscale {
            let _ = write!(fraction, "{:04}", digit(i));
            i += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

// =============================================================================
// Value helpers
// =============================================================================

/// Binary data is carried as standard base64 text.
pub fn encode_binary(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn naive_datetime_value(v: chrono::NaiveDateTime) -> JsonValue {
    JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Conversion of a driver row into column names and JSON values.
pub trait RowToJson {
    fn column_names(&self) -> Vec<String>;
    fn to_json_values(&self) -> DbResult<Vec<JsonValue>>;
}

fn column_names_of<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

impl RowToJson for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        column_names_of(self)
    }

    fn to_json_values(&self) -> DbResult<Vec<JsonValue>> {
        (0..self.len())
            .map(|idx| mysql::decode_column(self, idx).map_err(|e| DbError::query("scan", e)))
            .collect()
    }
}

impl RowToJson for PgRow {
    fn column_names(&self) -> Vec<String> {
        column_names_of(self)
    }

    fn to_json_values(&self) -> DbResult<Vec<JsonValue>> {
        (0..self.len())
            .map(|idx| postgres::decode_column(self, idx).map_err(|e| DbError::query("scan", e)))
            .collect()
    }
}

impl RowToJson for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        column_names_of(self)
    }

    fn to_json_values(&self) -> DbResult<Vec<JsonValue>> {
        (0..self.len())
            .map(|idx| sqlite::decode_column(self, idx).map_err(|e| DbError::query("scan", e)))
            .collect()
    }
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize) -> Result<JsonValue, sqlx::Error> {
        if row.try_get_raw(idx)?.is_null() {
            return Ok(JsonValue::Null);
        }
        let type_name = row.column(idx).type_info().name();

        Ok(match categorize_type(type_name, DatabaseType::MySQL) {
            TypeCategory::Decimal => JsonValue::String(row.try_get::<RawDecimal, _>(idx)?.0),
            TypeCategory::Integer => match row.try_get::<i64, _>(idx) {
                Ok(v) => v.into(),
                Err(_) => row.try_get::<u64, _>(idx)?.into(),
            },
            TypeCategory::Boolean => JsonValue::Bool(row.try_get(idx)?),
            TypeCategory::Float => match row.try_get::<f64, _>(idx) {
                Ok(v) => float_value(v),
                Err(_) => float_value(row.try_get::<f32, _>(idx)? as f64),
            },
            TypeCategory::Binary => encode_binary(&row.try_get::<Vec<u8>, _>(idx)?),
            TypeCategory::Json => row.try_get::<JsonValue, _>(idx)?,
            TypeCategory::Temporal => decode_temporal(row, idx, type_name)?,
            TypeCategory::Text | TypeCategory::Uuid | TypeCategory::Unknown => {
                JsonValue::String(row.try_get(idx)?)
            }
        })
    }

    fn decode_temporal(
        row: &MySqlRow,
        idx: usize,
        type_name: &str,
    ) -> Result<JsonValue, sqlx::Error> {
        Ok(match type_name {
            "DATE" => JsonValue::String(row.try_get::<chrono::NaiveDate, _>(idx)?.to_string()),
            "TIME" => JsonValue::String(row.try_get::<chrono::NaiveTime, _>(idx)?.to_string()),
            _ => naive_datetime_value(row.try_get(idx)?),
        })
    }
}

mod postgres {
    use super::*;
    use chrono::{FixedOffset, NaiveTime, Timelike};
    use sqlx::postgres::PgHasArrayType;
    use sqlx::postgres::types::{Oid, PgInterval, PgTimeTz};
    use std::fmt::Write as _;
    use std::net::IpAddr;

    pub fn decode_column(row: &PgRow, idx: usize) -> Result<JsonValue, sqlx::Error> {
        if row.try_get_raw(idx)?.is_null() {
            return Ok(JsonValue::Null);
        }
        let type_name = row.column(idx).type_info().name();

        Ok(match categorize_type(type_name, DatabaseType::PostgreSQL) {
            TypeCategory::Decimal => JsonValue::String(row.try_get::<RawDecimal, _>(idx)?.0),
            TypeCategory::Integer => match type_name {
                "INT2" => row.try_get::<i16, _>(idx)?.into(),
                "INT4" => row.try_get::<i32, _>(idx)?.into(),
                _ => row.try_get::<i64, _>(idx)?.into(),
            },
            TypeCategory::Boolean => JsonValue::Bool(row.try_get(idx)?),
            TypeCategory::Float => match type_name {
                "FLOAT4" => float_value(row.try_get::<f32, _>(idx)? as f64),
                _ => float_value(row.try_get::<f64, _>(idx)?),
            },
            TypeCategory::Binary => encode_binary(&row.try_get::<Vec<u8>, _>(idx)?),
            TypeCategory::Json => row.try_get::<JsonValue, _>(idx)?,
            TypeCategory::Uuid => {
                JsonValue::String(row.try_get::<sqlx::types::Uuid, _>(idx)?.to_string())
            }
            TypeCategory::Temporal => decode_temporal(row, idx, type_name)?,
            TypeCategory::Text => decode_text(row, idx)?,
            TypeCategory::Unknown => decode_other(row, idx, type_name)?,
        })
    }

    fn decode_temporal(row: &PgRow, idx: usize, type_name: &str) -> Result<JsonValue, sqlx::Error> {
        use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

        Ok(match type_name {
            "TIMESTAMPTZ" => JsonValue::String(
                row.try_get::<DateTime<Utc>, _>(idx)?
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            "DATE" => JsonValue::String(row.try_get::<NaiveDate, _>(idx)?.to_string()),
            "TIME" => JsonValue::String(row.try_get::<NaiveTime, _>(idx)?.to_string()),
            _ => naive_datetime_value(row.try_get(idx)?),
        })
    }

    /// Types outside the common categories. Statements without arguments get
    /// text results and the rest get binary ones; both render the same value.
    fn decode_other(row: &PgRow, idx: usize, type_name: &str) -> Result<JsonValue, sqlx::Error> {
        if let Some(element) = type_name.strip_suffix("[]") {
            return match decode_array(row, idx, element) {
                Some(value) => Ok(value),
                None => decode_text(row, idx),
            };
        }
        if type_name == "OID" {
            return Ok(row.try_get::<Oid, _>(idx)?.0.into());
        }

        let raw = row.try_get_raw(idx)?;
        if raw.format() == PgValueFormat::Text {
            return decode_text(row, idx);
        }
        let decode_err = |source| sqlx::Error::ColumnDecode {
            index: idx.to_string(),
            source,
        };
        let text = match type_name {
            "INTERVAL" => format_interval(&row.try_get::<PgInterval, _>(idx)?),
            "TIMETZ" => format_timetz(&row.try_get::<PgTimeTz<NaiveTime, FixedOffset>, _>(idx)?),
            "INET" | "CIDR" => format_inet(raw.as_bytes().map_err(decode_err)?).map_err(decode_err)?,
            "MACADDR" => format_macaddr(raw.as_bytes().map_err(decode_err)?).map_err(decode_err)?,
            _ => return decode_text(row, idx),
        };
        Ok(JsonValue::String(text))
    }

    /// One-dimensional arrays of the common element types. `None` when the
    /// element type is not covered or the value does not decode as a list.
    fn decode_array(row: &PgRow, idx: usize, element: &str) -> Option<JsonValue> {
        fn list<T>(row: &PgRow, idx: usize, to_json: impl Fn(T) -> JsonValue) -> Option<JsonValue>
        where
            T: for<'a> Decode<'a, sqlx::Postgres> + Type<sqlx::Postgres> + PgHasArrayType,
        {
            let values = row.try_get::<Vec<Option<T>>, _>(idx).ok()?;
            Some(JsonValue::Array(
                values
                    .into_iter()
                    .map(|v| v.map_or(JsonValue::Null, &to_json))
                    .collect(),
            ))
        }

        match categorize_type(element, DatabaseType::PostgreSQL) {
            TypeCategory::Integer => match element {
                "INT2" => list::<i16>(row, idx, JsonValue::from),
                "INT4" => list::<i32>(row, idx, JsonValue::from),
                _ => list::<i64>(row, idx, JsonValue::from),
            },
            TypeCategory::Float => match element {
                "FLOAT4" => list::<f32>(row, idx, |v| float_value(v as f64)),
                _ => list::<f64>(row, idx, float_value),
            },
            TypeCategory::Decimal => list::<RawDecimal>(row, idx, |v| JsonValue::String(v.0)),
            TypeCategory::Boolean => list::<bool>(row, idx, JsonValue::Bool),
            TypeCategory::Text => list::<String>(row, idx, JsonValue::String),
            TypeCategory::Uuid => {
                list::<sqlx::types::Uuid>(row, idx, |v| JsonValue::String(v.to_string()))
            }
            TypeCategory::Json => list::<JsonValue>(row, idx, |v| v),
            _ => None,
        }
    }

    /// `HH:MM:SS` with the fraction trimmed of trailing zeros, as the server
    /// prints it.
    fn push_clock(out: &mut String, micros: u64) {
        let secs = micros / 1_000_000;
        let fraction = micros % 1_000_000;
        let _ = write!(out, "{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            out.push('.');
            out.push_str(digits.trim_end_matches('0'));
        }
    }

    /// Render an interval in the server's default `postgres` output style,
    /// e.g. `1 year 2 mons -3 days +04:05:06.5`.
    pub fn format_interval(interval: &PgInterval) -> String {
        fn push_field(out: &mut String, is_before: &mut bool, value: i64, unit: &str) {
            if value == 0 {
                return;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            let sign = if *is_before && value > 0 { "+" } else { "" };
            let plural = if value == 1 { "" } else { "s" };
            let _ = write!(out, "{}{} {}{}", sign, value, unit, plural);
            *is_before = value < 0;
        }

        let mut out = String::new();
        let mut is_before = false;
        push_field(&mut out, &mut is_before, (interval.months / 12).into(), "year");
        push_field(&mut out, &mut is_before, (interval.months % 12).into(), "mon");
        push_field(&mut out, &mut is_before, interval.days.into(), "day");

        let micros = interval.microseconds;
        if out.is_empty() || micros != 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            if micros < 0 {
                out.push('-');
            } else if is_before {
                out.push('+');
            }
            push_clock(&mut out, micros.unsigned_abs());
        }
        out
    }

    /// `HH:MM:SS[.f]+TZ`, with minutes and seconds of the offset only when
    /// non-zero.
    pub fn format_timetz(value: &PgTimeTz<NaiveTime, FixedOffset>) -> String {
        let mut out = String::new();
        let micros = u64::from(value.time.num_seconds_from_midnight()) * 1_000_000
            + u64::from(value.time.nanosecond() / 1000);
        push_clock(&mut out, micros);

        let offset = value.offset.local_minus_utc();
        let abs = offset.unsigned_abs();
        let _ = write!(out, "{}{:02}", if offset < 0 { '-' } else { '+' }, abs / 3600);
        if abs % 3600 != 0 {
            let _ = write!(out, ":{:02}", abs / 60 % 60);
        }
        if abs % 60 != 0 {
            let _ = write!(out, ":{:02}", abs % 60);
        }
        out
    }

    /// Binary INET/CIDR: family, prefix bits, cidr flag, address length,
    /// address bytes. A full-length INET prefix is not printed.
    pub fn format_inet(bytes: &[u8]) -> Result<String, sqlx::error::BoxDynError> {
        let [family, bits, is_cidr, _, addr @ ..] = bytes else {
            return Err("truncated INET value".into());
        };
        let (ip, full) = match (family, addr.len()) {
            (2, 4) => (IpAddr::from(<[u8; 4]>::try_from(addr)?), 32),
            (3, 16) => (IpAddr::from(<[u8; 16]>::try_from(addr)?), 128),
            _ => {
                return Err(format!(
                    "invalid INET value: family {} with {} address bytes",
                    family,
                    addr.len()
                )
                .into());
            }
        };
        Ok(if *is_cidr == 0 && *bits == full {
            ip.to_string()
        } else {
            format!("{}/{}", ip, bits)
        })
    }

    pub fn format_macaddr(bytes: &[u8]) -> Result<String, sqlx::error::BoxDynError> {
        if bytes.len() != 6 {
            return Err(format!("invalid MACADDR length {}", bytes.len()).into());
        }
        Ok(bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":"))
    }

    /// Text-like columns, including user-defined types such as enums when the
    /// server sent them in text format.
    fn decode_text(row: &PgRow, idx: usize) -> Result<JsonValue, sqlx::Error> {
        match row.try_get::<String, _>(idx) {
            Ok(v) => Ok(JsonValue::String(v)),
            Err(err) => {
                let raw = row.try_get_raw(idx)?;
                if raw.format() != PgValueFormat::Text {
                    return Err(err);
                }
                raw.as_str()
                    .map(|s| JsonValue::String(s.to_string()))
                    .map_err(|source| sqlx::Error::ColumnDecode {
                        index: idx.to_string(),
                        source,
                    })
            }
        }
    }
}

mod sqlite {
    use super::*;

    /// SQLite columns are typed per value, so the category comes from the
    /// value's storage class. The declared column type only refines it:
    /// BOOLEAN integers become booleans and JSON text is parsed.
    pub fn decode_column(row: &SqliteRow, idx: usize) -> Result<JsonValue, sqlx::Error> {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(JsonValue::Null);
        }
        let storage = categorize_type(raw.type_info().name(), DatabaseType::SQLite);
        let declared = categorize_type(row.column(idx).type_info().name(), DatabaseType::SQLite);

        Ok(match (storage, declared) {
            (TypeCategory::Integer, TypeCategory::Boolean) | (TypeCategory::Boolean, _) => {
                JsonValue::Bool(row.try_get(idx)?)
            }
            (TypeCategory::Integer, _) => row.try_get::<i64, _>(idx)?.into(),
            (TypeCategory::Float | TypeCategory::Decimal, _) => {
                float_value(row.try_get::<f64, _>(idx)?)
            }
            (TypeCategory::Binary, _) => encode_binary(&row.try_get::<Vec<u8>, _>(idx)?),
            (_, TypeCategory::Json) => {
                let text: String = row.try_get(idx)?;
                serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
            }
            _ => JsonValue::String(row.try_get(idx)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(ndigits: i16, weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&ndigits.to_be_bytes());
        buf.extend_from_slice(&weight.to_be_bytes());
        buf.extend_from_slice(&sign.to_be_bytes());
        buf.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            buf.extend_from_slice(&d.to_be_bytes());
        }
        buf
    }

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT UNSIGNED", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INT8", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_does_not_match_substrings() {
        assert_eq!(
            categorize_type("POINT", DatabaseType::PostgreSQL),
            TypeCategory::Unknown
        );
        assert_eq!(
            categorize_type("INTERVAL", DatabaseType::PostgreSQL),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", DatabaseType::MySQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", DatabaseType::PostgreSQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("numeric", DatabaseType::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_other() {
        assert_eq!(
            categorize_type("jsonb", DatabaseType::PostgreSQL),
            TypeCategory::Json
        );
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DatabaseType::PostgreSQL),
            TypeCategory::Temporal
        );
        assert_eq!(
            categorize_type("VARBINARY", DatabaseType::MySQL),
            TypeCategory::Binary
        );
        assert_eq!(
            categorize_type("BOOLEAN", DatabaseType::SQLite),
            TypeCategory::Boolean
        );
    }

    #[test]
    fn test_pg_numeric_binary() {
        // 12345.678
        let buf = numeric(3, 1, 0, 3, &[1, 2345, 6780]);
        assert_eq!(pg_numeric_to_string(&buf).unwrap(), "12345.678");

        // -0.0042
        let buf = numeric(1, -1, 0x4000, 4, &[42]);
        assert_eq!(pg_numeric_to_string(&buf).unwrap(), "-0.0042");

        // 20000 with trailing zero groups omitted on the wire
        let buf = numeric(1, 1, 0, 0, &[2]);
        assert_eq!(pg_numeric_to_string(&buf).unwrap(), "20000");

        let buf = numeric(0, 0, 0xC000, 0, &[]);
        assert_eq!(pg_numeric_to_string(&buf).unwrap(), "NaN");
    }

    #[test]
    fn test_pg_numeric_truncated() {
        assert!(pg_numeric_to_string(&[0, 1]).is_err());
    }

    #[test]
    fn test_encode_binary() {
        assert_eq!(
            encode_binary(b"hello world"),
            JsonValue::String("aGVsbG8gd29ybGQ=".to_string())
        );
        assert_eq!(encode_binary(&[]), JsonValue::String(String::new()));
    }

    #[test]
    fn test_float_value_non_finite() {
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
        assert_eq!(float_value(f64::NAN), JsonValue::String("NaN".to_string()));
    }

    #[test]
    fn test_format_interval_matches_server_output() {
        use sqlx::postgres::types::PgInterval;

        let interval = |months, days, microseconds| PgInterval {
            months,
            days,
            microseconds,
        };
        assert_eq!(postgres::format_interval(&interval(0, 0, 0)), "00:00:00");
        assert_eq!(postgres::format_interval(&interval(0, 1, 0)), "1 day");
        assert_eq!(
            postgres::format_interval(&interval(0, 1, 7_384_500_000)),
            "1 day 02:03:04.5"
        );
        assert_eq!(postgres::format_interval(&interval(14, 0, 0)), "1 year 2 mons");
        assert_eq!(
            postgres::format_interval(&interval(0, -1, 7_200_000_000)),
            "-1 days +02:00:00"
        );
        assert_eq!(postgres::format_interval(&interval(0, 0, -1_000_000)), "-00:00:01");
    }

    #[test]
    fn test_format_timetz() {
        use chrono::{FixedOffset, NaiveTime};
        use sqlx::postgres::types::PgTimeTz;

        let value = PgTimeTz {
            time: NaiveTime::from_hms_micro_opt(10, 0, 0, 250_000).unwrap(),
            offset: FixedOffset::east_opt(2 * 3600).unwrap(),
        };
        assert_eq!(postgres::format_timetz(&value), "10:00:00.25+02");

        let value = PgTimeTz {
            time: NaiveTime::from_hms_opt(23, 59, 1).unwrap(),
            offset: FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap(),
        };
        assert_eq!(postgres::format_timetz(&value), "23:59:01-05:30");
    }

    #[test]
    fn test_format_inet_and_macaddr() {
        assert_eq!(
            postgres::format_inet(&[2, 24, 0, 4, 192, 168, 0, 1]).unwrap(),
            "192.168.0.1/24"
        );
        assert_eq!(
            postgres::format_inet(&[2, 32, 0, 4, 10, 0, 0, 1]).unwrap(),
            "10.0.0.1"
        );
        assert_eq!(
            postgres::format_inet(&[2, 32, 1, 4, 10, 0, 0, 1]).unwrap(),
            "10.0.0.1/32"
        );

        let mut v6 = vec![3, 128, 0, 16];
        v6.extend_from_slice(&std::net::Ipv6Addr::LOCALHOST.octets());
        assert_eq!(postgres::format_inet(&v6).unwrap(), "::1");

        assert!(postgres::format_inet(&[2, 24]).is_err());
        assert_eq!(
            postgres::format_macaddr(&[0x08, 0x00, 0x2b, 0x01, 0x02, 0x03]).unwrap(),
            "08:00:2b:01:02:03"
        );
    }
}
