//! 结果行到 JSON 的转换
//!
//! Columns are classified into a [`TypeCategory`] from the driver's type name,
//! then decoded with the matching Rust type. SQL `NULL` is always JSON `null`.
//! Types no decoder accepts (enums, domains, spatial data, ...) fall back to
//! their raw bytes: text when printable UTF-8, base64 otherwise.

use std::net::IpAddr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::response::JsonRow;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Json,
    Uuid,
    Binary,
    Bit,
    DateTime,
    DateTimeTz,
    Date,
    Time,
    Interval,
    Network,
    Array,
    Text,
}

/// Classify a driver type name (`BIGINT UNSIGNED`, `INT4`, `TIMESTAMPTZ`, `TEXT[]`, ...).
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_ascii_lowercase();
    let base = lower.split_whitespace().next().unwrap_or_default();
    if base.ends_with("[]") {
        return TypeCategory::Array;
    }

    match base {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "int2" | "int4"
        | "int8" | "year" => TypeCategory::Integer,
        "float" | "double" | "real" | "float4" | "float8" => TypeCategory::Float,
        "decimal" | "numeric" => TypeCategory::Decimal,
        "bool" | "boolean" => TypeCategory::Boolean,
        "json" | "jsonb" => TypeCategory::Json,
        "uuid" => TypeCategory::Uuid,
        "tinyblob" | "blob" | "mediumblob" | "longblob" | "binary" | "varbinary" | "bytea" => {
            TypeCategory::Binary
        }
        "bit" | "varbit" => TypeCategory::Bit,
        "datetime" | "timestamp" => TypeCategory::DateTime,
        "timestamptz" => TypeCategory::DateTimeTz,
        "date" => TypeCategory::Date,
        "time" => TypeCategory::Time,
        "interval" => TypeCategory::Interval,
        "inet" | "cidr" => TypeCategory::Network,
        _ => TypeCategory::Text,
    }
}

/// Binary data as text when it is valid UTF-8, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Undecoded column bytes as text when printable UTF-8, base64 otherwise.
///
/// Stricter than [`decode_binary_value`]: binary wire formats are often valid
/// UTF-8 full of control bytes.
pub fn decode_raw_value(bytes: &[u8]) -> JsonValue {
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            JsonValue::String(s.to_string())
        }
        _ => JsonValue::String(STANDARD.encode(bytes)),
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// Big-endian bit field as an unsigned integer (MySQL `BIT(n)`, n <= 64).
fn bits_to_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, b| (acc << 8) | u64::from(*b))
}

/// PostgreSQL binary `bit`/`varbit`: a 4-byte bit length, then the bits.
fn format_bit_string(bytes: &[u8]) -> Option<String> {
    let (len, data) = bytes.split_first_chunk::<4>()?;
    let len = u32::from_be_bytes(*len) as usize;
    if data.len() * 8 < len {
        return None;
    }
    Some(
        (0..len)
            .map(|i| if data[i / 8] & (0x80 >> (i % 8)) != 0 { '1' } else { '0' })
            .collect(),
    )
}

/// PostgreSQL binary `inet`/`cidr` in the server's text form.
fn format_inet(bytes: &[u8]) -> Option<String> {
    let [family, bits, is_cidr, len, addr @ ..] = bytes else {
        return None;
    };
    let ip = match (*family, *len) {
        (2, 4) => IpAddr::from(<[u8; 4]>::try_from(addr).ok()?),
        (3, 16) => IpAddr::from(<[u8; 16]>::try_from(addr).ok()?),
        _ => return None,
    };
    let full = if ip.is_ipv4() { 32 } else { 128 };
    if *is_cidr != 0 || *bits != full {
        Some(format!("{ip}/{bits}"))
    } else {
        Some(ip.to_string())
    }
}

/// Interval in PostgreSQL's default output style, e.g. `1 year 2 mons 3 days 04:05:06`.
fn format_interval(interval: &PgInterval) -> String {
    fn unit(n: i32, name: &str) -> String {
        if n == 1 {
            format!("{n} {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    let mut parts = Vec::new();
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if months != 0 {
        parts.push(unit(months, "mon"));
    }
    if interval.days != 0 {
        parts.push(unit(interval.days, "day"));
    }
    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        let frac = micros % 1_000_000;
        if frac != 0 {
            clock.push_str(format!(".{frac:06}").trim_end_matches('0'));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> JsonRow;
}

/// Tries each decoder in order; the first that accepts the column wins.
///
/// `Ok(None)` from any decoder means the column is SQL `NULL`. Yields `None`
/// when no decoder accepts the column type.
macro_rules! try_decode {
    ($row:expr, $idx:expr, $( $ty:ty => $map:expr ),+ $(,)?) => {{
        let mut out = None;
        $(
            if out.is_none() {
                match $row.try_get::<Option<$ty>, _>($idx) {
                    Ok(Some(v)) => out = Some(($map)(v)),
                    Ok(None) => out = Some(JsonValue::Null),
                    Err(_) => {}
                }
            }
        )+
        out
    }};
}

/// Column bytes read without a type check, mapped through `$map`.
macro_rules! decode_raw {
    ($row:expr, $idx:expr, $map:expr) => {
        match $row.try_get_unchecked::<Option<Vec<u8>>, _>($idx) {
            Ok(Some(bytes)) => Some(($map)(bytes.as_slice())),
            Ok(None) => Some(JsonValue::Null),
            Err(_) => None,
        }
    };
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), mysql::decode_column(self, idx, category))
            })
            .collect()
    }
}

impl RowToJson for PgRow {
    fn to_json_map(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), postgres::decode_column(self, idx, category))
            })
            .collect()
    }
}

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
        let decoded = match category {
            TypeCategory::Integer => try_decode!(row, idx,
                i64 => |v: i64| JsonValue::from(v),
                u64 => |v: u64| JsonValue::from(v),
            )
            // YEAR arrives as a little-endian integer the typed decoders reject.
            .or_else(|| match row.try_get_unchecked::<Option<i64>, _>(idx) {
                Ok(v) => Some(v.map_or(JsonValue::Null, JsonValue::from)),
                Err(_) => None,
            }),
            TypeCategory::Float => try_decode!(row, idx,
                f64 => float_value,
                f32 => |v: f32| float_value(f64::from(v)),
            ),
            TypeCategory::Decimal => try_decode!(row, idx,
                Decimal => |v: Decimal| JsonValue::String(v.to_string()),
                String => JsonValue::String,
            ),
            TypeCategory::Boolean => try_decode!(row, idx,
                bool => JsonValue::Bool,
                i64 => |v: i64| JsonValue::from(v),
            ),
            TypeCategory::Json => try_decode!(row, idx, JsonValue => |v| v),
            TypeCategory::Bit => decode_raw!(row, idx, |b: &[u8]| JsonValue::from(bits_to_u64(b))),
            TypeCategory::DateTime | TypeCategory::DateTimeTz => try_decode!(row, idx,
                NaiveDateTime => |v: NaiveDateTime| JsonValue::String(v.format(DATETIME_FORMAT).to_string()),
                DateTime<Utc> => |v: DateTime<Utc>| JsonValue::String(v.format(DATETIME_FORMAT).to_string()),
            ),
            TypeCategory::Date => try_decode!(row, idx,
                NaiveDate => |v: NaiveDate| JsonValue::String(v.to_string()),
            ),
            TypeCategory::Time => try_decode!(row, idx,
                NaiveTime => |v: NaiveTime| JsonValue::String(v.to_string()),
                String => JsonValue::String,
            ),
            TypeCategory::Binary | TypeCategory::Uuid | TypeCategory::Text => try_decode!(row, idx,
                String => JsonValue::String,
                Vec<u8> => |v: Vec<u8>| decode_binary_value(&v),
            ),
            TypeCategory::Interval | TypeCategory::Network | TypeCategory::Array => None,
        };
        decoded
            .or_else(|| decode_raw!(row, idx, decode_raw_value))
            .unwrap_or(JsonValue::Null)
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
        let decoded = match category {
            TypeCategory::Integer => try_decode!(row, idx,
                i16 => |v: i16| JsonValue::from(v),
                i32 => |v: i32| JsonValue::from(v),
                i64 => |v: i64| JsonValue::from(v),
            ),
            TypeCategory::Float => try_decode!(row, idx,
                f32 => |v: f32| float_value(f64::from(v)),
                f64 => float_value,
            ),
            TypeCategory::Decimal => try_decode!(row, idx,
                Decimal => |v: Decimal| JsonValue::String(v.to_string()),
            ),
            TypeCategory::Boolean => try_decode!(row, idx, bool => JsonValue::Bool),
            TypeCategory::Json => try_decode!(row, idx, JsonValue => |v| v),
            TypeCategory::Uuid => try_decode!(row, idx,
                Uuid => |v: Uuid| JsonValue::String(v.to_string()),
            ),
            TypeCategory::Binary => try_decode!(row, idx,
                Vec<u8> => |v: Vec<u8>| decode_binary_value(&v),
            ),
            TypeCategory::Bit => decode_raw!(row, idx, |b: &[u8]| {
                format_bit_string(b).map_or_else(|| decode_raw_value(b), JsonValue::String)
            }),
            TypeCategory::DateTime => try_decode!(row, idx,
                NaiveDateTime => |v: NaiveDateTime| JsonValue::String(v.format(DATETIME_FORMAT).to_string()),
            ),
            TypeCategory::DateTimeTz => try_decode!(row, idx,
                DateTime<Utc> => |v: DateTime<Utc>| JsonValue::String(v.to_rfc3339()),
            ),
            TypeCategory::Date => try_decode!(row, idx,
                NaiveDate => |v: NaiveDate| JsonValue::String(v.to_string()),
            ),
            TypeCategory::Time => try_decode!(row, idx,
                NaiveTime => |v: NaiveTime| JsonValue::String(v.to_string()),
            ),
            TypeCategory::Interval => try_decode!(row, idx,
                PgInterval => |v: PgInterval| JsonValue::String(format_interval(&v)),
            ),
            TypeCategory::Network => decode_raw!(row, idx, |b: &[u8]| {
                format_inet(b).map_or_else(|| decode_raw_value(b), JsonValue::String)
            }),
            TypeCategory::Array => try_decode!(row, idx,
                Vec<String> => |v: Vec<String>| JsonValue::from(v),
                Vec<i64> => |v: Vec<i64>| JsonValue::from(v),
                Vec<i32> => |v: Vec<i32>| JsonValue::from(v),
                Vec<i16> => |v: Vec<i16>| JsonValue::from(v),
                Vec<f64> => |v: Vec<f64>| JsonValue::Array(v.into_iter().map(float_value).collect()),
                Vec<bool> => |v: Vec<bool>| JsonValue::from(v),
            ),
            TypeCategory::Text => try_decode!(row, idx, String => JsonValue::String),
        };
        decoded
            .or_else(|| decode_raw!(row, idx, decode_raw_value))
            .unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_integer_types() {
        for name in ["INT", "BIGINT UNSIGNED", "TINYINT", "INT2", "INT4", "INT8", "MEDIUMINT"] {
            assert_eq!(categorize_type(name), TypeCategory::Integer, "{name}");
        }
    }

    #[test]
    fn test_categorize_does_not_match_substrings() {
        assert_eq!(categorize_type("INTERVAL"), TypeCategory::Interval);
        assert_eq!(categorize_type("INET"), TypeCategory::Network);
        assert_eq!(categorize_type("POINT"), TypeCategory::Text);
        assert_eq!(categorize_type("GEOMETRY"), TypeCategory::Text);
        assert_eq!(categorize_type("MOOD"), TypeCategory::Text);
        assert_eq!(categorize_type("TIMETZ"), TypeCategory::Text);
    }

    #[test]
    fn test_categorize_other_types() {
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Decimal);
        assert_eq!(categorize_type("NUMERIC"), TypeCategory::Decimal);
        assert_eq!(categorize_type("FLOAT8"), TypeCategory::Float);
        assert_eq!(categorize_type("BOOLEAN"), TypeCategory::Boolean);
        assert_eq!(categorize_type("JSONB"), TypeCategory::Json);
        assert_eq!(categorize_type("UUID"), TypeCategory::Uuid);
        assert_eq!(categorize_type("BYTEA"), TypeCategory::Binary);
        assert_eq!(categorize_type("VARBINARY"), TypeCategory::Binary);
        assert_eq!(categorize_type("DATETIME"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIMESTAMPTZ"), TypeCategory::DateTimeTz);
        assert_eq!(categorize_type("DATE"), TypeCategory::Date);
        assert_eq!(categorize_type("TIME"), TypeCategory::Time);
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("YEAR"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIT"), TypeCategory::Bit);
        assert_eq!(categorize_type("VARBIT"), TypeCategory::Bit);
        assert_eq!(categorize_type("CIDR"), TypeCategory::Network);
        assert_eq!(categorize_type("TEXT[]"), TypeCategory::Array);
        assert_eq!(categorize_type("INT4[]"), TypeCategory::Array);
    }

    #[test]
    fn test_decode_binary_value() {
        assert_eq!(decode_binary_value(b"varchar(255)"), JsonValue::from("varchar(255)"));
        assert_eq!(decode_binary_value(&[0xff, 0x00]), JsonValue::from("/wA="));
    }

    #[test]
    fn test_non_finite_float_becomes_string() {
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
        assert_eq!(float_value(f64::NAN), JsonValue::from("NaN"));
    }

    #[test]
    fn test_raw_value_keeps_enum_labels_as_text() {
        // Binary wire form of an enum value is its label.
        assert_eq!(decode_raw_value(b"happy"), JsonValue::from("happy"));
        assert_eq!(decode_raw_value(b"two\nlines"), JsonValue::from("two\nlines"));
    }

    #[test]
    fn test_raw_value_with_control_bytes_is_base64() {
        // Spatial data: SRID 0 followed by WKB.
        assert_eq!(decode_raw_value(&[0, 0, 0, 0, 1]), JsonValue::from("AAAAAAE="));
        assert_eq!(decode_raw_value(&[0xff]), JsonValue::from("/w=="));
    }

    #[test]
    fn test_bits_to_u64() {
        assert_eq!(bits_to_u64(&[0b101]), 5);
        assert_eq!(bits_to_u64(&[0x01, 0x00]), 256);
        assert_eq!(bits_to_u64(&[]), 0);
    }

    #[test]
    fn test_format_bit_string() {
        assert_eq!(format_bit_string(&[0, 0, 0, 4, 0b1010_0000]).as_deref(), Some("1010"));
        assert_eq!(format_bit_string(&[0, 0, 0, 0]).as_deref(), Some(""));
        assert_eq!(format_bit_string(&[0, 0, 0, 9, 0xff]), None);
        assert_eq!(format_bit_string(&[0, 0]), None);
    }

    #[test]
    fn test_format_inet() {
        assert_eq!(format_inet(&[2, 32, 0, 4, 10, 0, 0, 1]).as_deref(), Some("10.0.0.1"));
        assert_eq!(format_inet(&[2, 24, 1, 4, 10, 0, 0, 0]).as_deref(), Some("10.0.0.0/24"));
        let mut v6 = vec![3, 128, 0, 16];
        v6.extend_from_slice(&[0; 15]);
        v6.push(1);
        assert_eq!(format_inet(&v6).as_deref(), Some("::1"));
        assert_eq!(format_inet(&[2, 32, 0, 4, 10]), None);
    }

    #[test]
    fn test_format_interval() {
        let interval = |months, days, microseconds| PgInterval {
            months,
            days,
            microseconds,
        };
        assert_eq!(
            format_interval(&interval(14, 3, (4 * 3600 + 5 * 60 + 6) * 1_000_000)),
            "1 year 2 mons 3 days 04:05:06"
        );
        assert_eq!(format_interval(&interval(0, 1, 2 * 3600 * 1_000_000)), "1 day 02:00:00");
        assert_eq!(format_interval(&interval(0, 0, 0)), "00:00:00");
        assert_eq!(format_interval(&interval(0, 0, -90 * 60 * 1_000_000)), "-01:30:00");
        assert_eq!(format_interval(&interval(0, 0, 1_500_000)), "00:00:01.5");
    }
}
