use crate::warehouse::identifier::TableName;
use chrono::NaiveDateTime;
use common::model::types::SqlType;
use std::fmt;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A bound value. Every value that reaches the warehouse travels as one of
/// these, never spliced into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    String(String),
    BigInt(i64),
    Double(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::String(value.into())
    }

    /// `None` and empty strings become NULL.
    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => SqlValue::String(v.to_string()),
            _ => SqlValue::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            SqlValue::Null => None,
            SqlValue::String(_) => Some(SqlType::String),
            SqlValue::BigInt(_) => Some(SqlType::BigInt),
            SqlValue::Double(_) => Some(SqlType::Double),
            SqlValue::Boolean(_) => Some(SqlType::Boolean),
            SqlValue::Timestamp(_) => Some(SqlType::Timestamp),
        }
    }

    /// Textual form used for display and for the REST parameter encoding.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::String(s) => Some(s.clone()),
            SqlValue::BigInt(i) => Some(i.to_string()),
            SqlValue::Double(d) => Some(d.to_string()),
            SqlValue::Boolean(b) => Some(b.to_string()),
            SqlValue::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SqlValue::Null => serde_json::Value::Null,
            SqlValue::String(s) => serde_json::Value::String(s.clone()),
            SqlValue::BigInt(i) => serde_json::Value::from(*i),
            SqlValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            SqlValue::Boolean(b) => serde_json::Value::Bool(*b),
            SqlValue::Timestamp(_) => self
                .as_text()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, SqlValue),
    IsNull(String),
}

/// Conjunction of column conditions. Values are bound like any other value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`, or `column IS NULL` when the value is NULL.
    pub fn and_eq(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        let column = column.into();
        if value.is_null() {
            self.conditions.push(Condition::IsNull(column));
        } else {
            self.conditions.push(Condition::Eq(column, value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Everything the backend ever asks a warehouse to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CurrentUser,
    Describe {
        table: TableName,
    },
    CreateTable {
        table: TableName,
        columns: Vec<ColumnDef>,
    },
    Insert {
        table: TableName,
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
        mode: WriteMode,
    },
    Select {
        table: TableName,
        filter: Predicate,
        limit: usize,
    },
    Update {
        table: TableName,
        assignments: Vec<(String, SqlValue)>,
        predicate: Predicate,
    },
    /// Removes every row, keeping the table.
    Truncate {
        table: TableName,
    },
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CurrentUser => "current_user",
            Statement::Describe { .. } => "describe",
            Statement::CreateTable { .. } => "create_table",
            Statement::Insert {
                mode: WriteMode::Append,
                ..
            } => "insert",
            Statement::Insert {
                mode: WriteMode::Overwrite,
                ..
            } => "insert_overwrite",
            Statement::Select { .. } => "select",
            Statement::Update { .. } => "update",
            Statement::Truncate { .. } => "truncate",
        }
    }

    pub fn returns_rows(&self) -> bool {
        matches!(
            self,
            Statement::CurrentUser | Statement::Describe { .. } | Statement::Select { .. }
        )
    }
}

/// Rows returned by a query, or the affected-row count of a DML statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
    pub affected_rows: Option<u64>,
}

impl StatementResult {
    pub fn affected(count: u64) -> Self {
        Self {
            affected_rows: Some(count),
            ..Self::default()
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn first_value(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.first())
    }
}
