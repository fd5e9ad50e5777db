//! Type normalization and row decoding.
//!
//! Two concerns live here:
//! 1. Mapping native column type names onto the closed [`ColumnType`] tag
//!    set via a fixed per-engine lookup. Unmapped native types fall back to
//!    `Other` - introspection never fails over a single unknown type.
//! 2. Converting driver rows into ordered JSON tuples, with
//!    category-driven decoding per engine.

use crate::models::{ColumnType, DatabaseType};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo};

// =============================================================================
// Native Type Normalization
// =============================================================================

/// Strip a parenthesized length/precision suffix: `varchar(30)` -> `varchar`.
fn base_type(native: &str) -> String {
    let trimmed = native.trim().to_lowercase();
    match trimmed.find('(') {
        Some(idx) => trimmed[..idx].trim().to_string(),
        None => trimmed,
    }
}

/// Map a native type name to the normalized tag via a fixed per-engine table.
pub fn normalize_native_type(db_type: DatabaseType, native: &str) -> ColumnType {
    let base = base_type(native);
    // MySQL reports width/signedness suffixes ("bigint unsigned")
    let base = base
        .trim_end_matches(" unsigned")
        .trim_end_matches(" signed")
        .to_string();

    match db_type {
        DatabaseType::PostgreSQL => match base.as_str() {
            "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" | "serial"
            | "smallserial" | "bigserial" | "oid" => ColumnType::Integer,
            "real" | "double precision" | "float4" | "float8" | "numeric" | "decimal"
            | "money" => ColumnType::Float,
            "character varying" | "varchar" | "character" | "char" | "bpchar" | "text"
            | "name" | "citext" | "uuid" => ColumnType::Text,
            "boolean" | "bool" => ColumnType::Boolean,
            "timestamp" | "timestamptz" | "timestamp without time zone"
            | "timestamp with time zone" | "date" | "time" | "timetz" | "interval" => {
                ColumnType::DateTime
            }
            "bytea" => ColumnType::Binary,
            _ => ColumnType::Other,
        },
        DatabaseType::MySQL => match base.as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "bit"
            | "year" => ColumnType::Integer,
            "float" | "double" | "real" | "decimal" | "numeric" => ColumnType::Float,
            "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum"
            | "set" => ColumnType::Text,
            "boolean" | "bool" => ColumnType::Boolean,
            "date" | "datetime" | "timestamp" | "time" => ColumnType::DateTime,
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
                ColumnType::Binary
            }
            _ => ColumnType::Other,
        },
        DatabaseType::MsSQL => match base.as_str() {
            "tinyint" | "smallint" | "int" | "bigint" => ColumnType::Integer,
            "real" | "float" | "decimal" | "numeric" | "money" | "smallmoney" => {
                ColumnType::Float
            }
            "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "uniqueidentifier"
            | "xml" => ColumnType::Text,
            "bit" => ColumnType::Boolean,
            "date" | "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" | "time" => {
                ColumnType::DateTime
            }
            "binary" | "varbinary" | "image" => ColumnType::Binary,
            _ => ColumnType::Other,
        },
        DatabaseType::SQLite => match base.as_str() {
            // SQLite type affinity is loose; match the common declarations
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint"
            | "unsigned big int" | "int2" | "int8" => ColumnType::Integer,
            "real" | "double" | "double precision" | "float" | "numeric" | "decimal" => {
                ColumnType::Float
            }
            "character" | "varchar" | "varying character" | "nchar" | "native character"
            | "nvarchar" | "text" | "clob" => ColumnType::Text,
            "boolean" | "bool" => ColumnType::Boolean,
            "date" | "datetime" | "timestamp" => ColumnType::DateTime,
            "blob" => ColumnType::Binary,
            _ => ColumnType::Other,
        },
    }
}

// =============================================================================
// Decoding Categories
// =============================================================================

/// Logical category for decoding a result cell. Coarser than [`ColumnType`]:
/// decimals need string-preserving treatment the normalized tag doesn't track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Binary,
    Json,
    Text,
}

fn categorize_for_decode(type_name: &str, db: DatabaseType) -> DecodeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if db == DatabaseType::SQLite && lower == "numeric" {
            return DecodeCategory::Float;
        }
        return DecodeCategory::Decimal;
    }

    if lower.contains("int") || lower.contains("serial") || lower.contains("tiny") {
        return DecodeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return DecodeCategory::Boolean;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return DecodeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return DecodeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return DecodeCategory::Binary;
    }

    DecodeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation; a plain `String`
/// decode would fail the driver's type compatibility check.
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
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Encode binary data to a base64 JSON string.
pub fn encode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

// =============================================================================
// Row to Cells Trait
// =============================================================================

/// Trait for converting database rows into ordered JSON tuples.
pub trait RowToCells {
    fn column_names(&self) -> Vec<String>;
    fn to_cells(&self) -> Vec<JsonValue>;
}

impl RowToCells for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_cells(&self) -> Vec<JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_for_decode(type_name, DatabaseType::MySQL);
                mysql::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

impl RowToCells for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_cells(&self) -> Vec<JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_for_decode(type_name, DatabaseType::PostgreSQL);
                postgres::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

impl RowToCells for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_cells(&self) -> Vec<JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_for_decode(type_name, DatabaseType::SQLite);
                sqlite::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

impl RowToCells for tiberius::Row {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_cells(&self) -> Vec<JsonValue> {
        let types: Vec<tiberius::ColumnType> =
            self.columns().iter().map(|c| c.column_type()).collect();
        types
            .iter()
            .enumerate()
            .map(|(idx, ty)| mssql::decode_column(self, idx, *ty))
            .collect()
    }
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================
//
// Each module below provides the same interface adapted to its driver's
// type system. Integer decoding tries widths in sequence because drivers
// report different concrete widths for the same logical column.

mod mysql {
    use super::*;

    pub fn decode_column(
        row: &MySqlRow,
        idx: usize,
        type_name: &str,
        category: DecodeCategory,
    ) -> JsonValue {
        match category {
            DecodeCategory::Decimal => decode_decimal(row, idx),
            DecodeCategory::Integer => decode_integer(row, idx),
            DecodeCategory::Boolean => decode_boolean(row, idx),
            DecodeCategory::Float => decode_float(row, idx),
            DecodeCategory::Binary => decode_binary_col(row, idx),
            DecodeCategory::Json => decode_json(row, idx),
            DecodeCategory::Text => decode_text(row, idx, type_name),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => JsonValue::String(v.0),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!("Failed to decode DECIMAL: {:?}", e);
                JsonValue::Null
            }
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> JsonValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return serde_json::Number::from_f64(v as f64)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        JsonValue::Null
    }

    fn decode_binary_col(row: &MySqlRow, idx: usize) -> JsonValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| encode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
        row.try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    }

    fn decode_text(row: &MySqlRow, idx: usize, type_name: &str) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
            if type_name.to_lowercase().contains("json") {
                if let Ok(json) = serde_json::from_str::<JsonValue>(&v) {
                    return json;
                }
            }
            return JsonValue::String(v);
        }
        JsonValue::Null
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(
        row: &PgRow,
        idx: usize,
        _type_name: &str,
        category: DecodeCategory,
    ) -> JsonValue {
        match category {
            DecodeCategory::Decimal => decode_decimal(row, idx),
            DecodeCategory::Integer => decode_integer(row, idx),
            DecodeCategory::Boolean => decode_boolean(row, idx),
            DecodeCategory::Float => decode_float(row, idx),
            DecodeCategory::Binary => decode_binary_col(row, idx),
            DecodeCategory::Json => decode_json(row, idx),
            DecodeCategory::Text => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> JsonValue {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => JsonValue::String(v.0),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!("Failed to decode NUMERIC: {:?}", e);
                JsonValue::Null
            }
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_boolean(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return serde_json::Number::from_f64(v as f64)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        JsonValue::Null
    }

    fn decode_binary_col(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| encode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_json(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    }

    fn decode_text(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null)
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(
        row: &SqliteRow,
        idx: usize,
        type_name: &str,
        category: DecodeCategory,
    ) -> JsonValue {
        match category {
            DecodeCategory::Integer => decode_integer(row, idx),
            DecodeCategory::Boolean => decode_boolean(row, idx),
            DecodeCategory::Float | DecodeCategory::Decimal => decode_float(row, idx),
            DecodeCategory::Binary => decode_binary_col(row, idx),
            _ => decode_text(row, idx, type_name),
        }
    }

    fn decode_integer(row: &SqliteRow, idx: usize) -> JsonValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_boolean(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &SqliteRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        JsonValue::Null
    }

    fn decode_binary_col(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| encode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_text(row: &SqliteRow, idx: usize, type_name: &str) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
            if type_name.to_lowercase().contains("json") {
                if let Ok(json) = serde_json::from_str::<JsonValue>(&v) {
                    return json;
                }
            }
            return JsonValue::String(v);
        }
        JsonValue::Null
    }
}

mod mssql {
    use super::*;
    use tiberius::ColumnType as MsType;

    pub fn decode_column(row: &tiberius::Row, idx: usize, ty: MsType) -> JsonValue {
        match ty {
            MsType::Int1 | MsType::Int2 | MsType::Int4 | MsType::Int8 | MsType::Intn => {
                decode_integer(row, idx)
            }
            MsType::Float4 | MsType::Float8 | MsType::Floatn => decode_float(row, idx),
            MsType::Decimaln | MsType::Numericn | MsType::Money | MsType::Money4 => {
                decode_decimal(row, idx)
            }
            MsType::Bit | MsType::Bitn => decode_boolean(row, idx),
            MsType::Datetime
            | MsType::Datetime2
            | MsType::Datetimen
            | MsType::Datetime4
            | MsType::DatetimeOffsetn
            | MsType::Daten
            | MsType::Timen => decode_datetime(row, idx),
            MsType::Guid => decode_guid(row, idx),
            MsType::BigBinary | MsType::BigVarBin | MsType::Image => decode_binary_col(row, idx),
            MsType::Null => JsonValue::Null,
            _ => decode_text(row, idx),
        }
    }

    fn decode_integer(row: &tiberius::Row, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<i64, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<i32, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<i16, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<u8, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_float(row: &tiberius::Row, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<f64, _>(idx) {
            return serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        if let Ok(Some(v)) = row.try_get::<f32, _>(idx) {
            return serde_json::Number::from_f64(v as f64)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        JsonValue::Null
    }

    fn decode_decimal(row: &tiberius::Row, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<tiberius::numeric::Numeric, _>(idx) {
            let scaled = v.value() as f64 / 10f64.powi(v.scale() as i32);
            return serde_json::Number::from_f64(scaled)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(scaled.to_string()));
        }
        if let Ok(Some(v)) = row.try_get::<f64, _>(idx) {
            return serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null);
        }
        JsonValue::Null
    }

    fn decode_boolean(row: &tiberius::Row, idx: usize) -> JsonValue {
        row.try_get::<bool, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_datetime(row: &tiberius::Row, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        if let Ok(Some(v)) = row.try_get::<chrono::NaiveDate, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        if let Ok(Some(v)) = row.try_get::<chrono::NaiveTime, _>(idx) {
            return JsonValue::String(v.to_string());
        }
        if let Ok(Some(v)) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx) {
            return JsonValue::String(v.to_rfc3339());
        }
        JsonValue::Null
    }

    fn decode_guid(row: &tiberius::Row, idx: usize) -> JsonValue {
        row.try_get::<uuid::Uuid, _>(idx)
            .ok()
            .flatten()
            .map(|v| JsonValue::String(v.to_string()))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_binary_col(row: &tiberius::Row, idx: usize) -> JsonValue {
        row.try_get::<&[u8], _>(idx)
            .ok()
            .flatten()
            .map(encode_binary_value)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_text(row: &tiberius::Row, idx: usize) -> JsonValue {
        row.try_get::<&str, _>(idx)
            .ok()
            .flatten()
            .map(|v| JsonValue::String(v.to_string()))
            .unwrap_or(JsonValue::Null)
    }
}
