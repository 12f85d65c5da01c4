use serde::{Deserialize, Serialize};
use std::fmt;

/// The scalar kind a column scan reports for one uploaded column.
///
/// The names mirror the dtype labels users see in the preview (`object`,
/// `int64`, ...). A kind that arrives by name and is not one of the known
/// labels is kept verbatim as `Unrecognized` so it can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScannedKind {
    Object,
    Int64,
    Float64,
    Bool,
    Datetime,
    Unrecognized(String),
}

impl ScannedKind {
    /// Parses a dtype label. Any `datetime64[...]` variant is datetime-like.
    pub fn from_dtype_name(name: &str) -> Self {
        let name = name.trim();
        match name {
            "object" | "string" | "str" => ScannedKind::Object,
            "int64" => ScannedKind::Int64,
            "float64" => ScannedKind::Float64,
            "bool" => ScannedKind::Bool,
            other if other.contains("datetime") => ScannedKind::Datetime,
            other => ScannedKind::Unrecognized(other.to_string()),
        }
    }

    pub fn dtype_name(&self) -> &str {
        match self {
            ScannedKind::Object => "object",
            ScannedKind::Int64 => "int64",
            ScannedKind::Float64 => "float64",
            ScannedKind::Bool => "bool",
            ScannedKind::Datetime => "datetime64[ns]",
            ScannedKind::Unrecognized(name) => name,
        }
    }
}

/// The closed set of SQL column types the loader ever emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    String,
    BigInt,
    Double,
    Boolean,
    Timestamp,
}

impl SqlType {
    pub const ALL: [SqlType; 5] = [
        SqlType::String,
        SqlType::BigInt,
        SqlType::Double,
        SqlType::Boolean,
        SqlType::Timestamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::String => "STRING",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the "supported data types" table shown on the configuration view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeMapping {
    pub dtype: String,
    pub sql_type: SqlType,
}

/// A column as reported by the warehouse (`DESCRIBE`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
}
