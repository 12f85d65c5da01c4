//! Runtime configuration, read once from the environment at startup.
//!
//! Every setting has a default that runs the whole backend locally against a
//! SQLite file and a directory-backed volume. Pointing `WAREHOUSE_BACKEND` at
//! `databricks` switches the warehouse, the volume, the access probe and the
//! identity lookup to the platform's REST APIs.

use crate::error::{AppError, AppResult};
use crate::warehouse::identifier::{QualifiedName, TableName, VolumeName};
use chrono::{FixedOffset, NaiveDateTime, Utc};
use std::path::PathBuf;

pub const DEFAULT_NULL_TOKENS: [&str; 10] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "no data",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseBackend {
    Sqlite {
        path: PathBuf,
        /// Answer for `current_user()`; SQLite has no session user.
        user: Option<String>,
    },
    Databricks,
}

#[derive(Debug, Clone)]
pub struct DatabricksSettings {
    pub host: String,
    pub token: String,
    pub http_path: String,
    pub warehouse_id: String,
}

#[derive(Debug, Clone)]
pub struct ReviewTableConfig {
    pub label: String,
    pub table: TableName,
    /// Declared unique key. Empty means the table cannot be updated.
    pub key_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub warehouse: WarehouseBackend,
    pub databricks: Option<DatabricksSettings>,
    pub upload_volume: VolumeName,
    pub volume_root: PathBuf,
    pub review_tables: Vec<ReviewTableConfig>,
    pub read_limit: usize,
    pub timezone: FixedOffset,
    pub max_bind_parameters: usize,
    pub max_upload_bytes: usize,
    pub null_tokens: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = parse_number::<u16>("PORT", &get("PORT", "8080"))?;
        let read_limit = parse_number::<usize>("READ_LIMIT", &get("READ_LIMIT", "1000"))?;
        let max_bind_parameters =
            parse_number::<usize>("MAX_BIND_PARAMETERS", &get("MAX_BIND_PARAMETERS", "32766"))?;
        let max_upload_bytes = parse_number::<usize>(
            "MAX_UPLOAD_BYTES",
            &get("MAX_UPLOAD_BYTES", "104857600"),
        )?;
        let timezone = parse_offset(&get("TIMEZONE_OFFSET", "+08:00"))?;

        let backend = get("WAREHOUSE_BACKEND", "sqlite");
        let (warehouse, databricks) = match backend.trim().to_ascii_lowercase().as_str() {
            "sqlite" => (
                WarehouseBackend::Sqlite {
                    path: PathBuf::from(get("SQLITE_PATH", "warehouse.sqlite")),
                    user: lookup("LOCAL_WAREHOUSE_USER").filter(|u| !u.trim().is_empty()),
                },
                None,
            ),
            "databricks" => {
                let required = |key: &str| {
                    lookup(key)
                        .filter(|v| !v.trim().is_empty())
                        .ok_or_else(|| AppError::config(format!("{} is required", key)))
                };
                let http_path = required("DATABRICKS_HTTP_PATH")?;
                let warehouse_id = match lookup("DATABRICKS_WAREHOUSE_ID") {
                    Some(id) if !id.trim().is_empty() => id,
                    _ => warehouse_id_from_http_path(&http_path)?,
                };
                (
                    WarehouseBackend::Databricks,
                    Some(DatabricksSettings {
                        host: required("DATABRICKS_HOST")?,
                        token: required("DATABRICKS_TOKEN")?,
                        http_path,
                        warehouse_id,
                    }),
                )
            }
            other => {
                return Err(AppError::config(format!(
                    "WAREHOUSE_BACKEND must be 'sqlite' or 'databricks', got '{}'",
                    other
                )))
            }
        };

        let upload_volume = QualifiedName::parse(&get("UPLOAD_VOLUME", "dg_dev.sandbox.csv_uploads"))
            .map_err(|e| AppError::config(format!("UPLOAD_VOLUME: {}", e)))?;

        let review_tables = match lookup("REVIEW_TABLES") {
            Some(raw) => parse_review_tables(&raw)?,
            None => Vec::new(),
        };

        let null_tokens = match lookup("NULL_TOKENS") {
            Some(raw) => raw.split(',').map(|t| t.trim().to_string()).collect(),
            None => DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
        };

        Ok(Self {
            host: get("BIND_HOST", "127.0.0.1"),
            port,
            warehouse,
            databricks,
            upload_volume,
            volume_root: PathBuf::from(get("VOLUME_ROOT", "volumes")),
            review_tables,
            read_limit,
            timezone,
            max_bind_parameters,
            max_upload_bytes,
            null_tokens,
        })
    }

    pub fn review_table(&self, label: &str) -> Option<&ReviewTableConfig> {
        self.review_tables.iter().find(|t| t.label == label)
    }

    /// Wall-clock time in the configured offset; stamps audit columns and backup names.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::config(format!("{} must be a number, got '{}'", key, raw)))
}

/// Parses `+08:00`, `-05:30` or `+0800`.
pub fn parse_offset(raw: &str) -> AppResult<FixedOffset> {
    let invalid = || AppError::config(format!("TIMEZONE_OFFSET '{}' is not a UTC offset", raw));
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn warehouse_id_from_http_path(http_path: &str) -> AppResult<String> {
    http_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::config(format!(
                "cannot read a warehouse id from DATABRICKS_HTTP_PATH '{}'",
                http_path
            ))
        })
}

/// `Label=catalog.schema.table:key1,key2;Other=...`
fn parse_review_tables(raw: &str) -> AppResult<Vec<ReviewTableConfig>> {
    let mut tables = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (label, target) = entry.split_once('=').ok_or_else(|| {
            AppError::config(format!("REVIEW_TABLES entry '{}' has no '='", entry))
        })?;
        let (table, keys) = match target.split_once(':') {
            Some((table, keys)) => (table, keys),
            None => (target, ""),
        };
        let table = QualifiedName::parse(table)
            .map_err(|e| AppError::config(format!("REVIEW_TABLES '{}': {}", label.trim(), e)))?;
        let key_columns = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        tables.push(ReviewTableConfig {
            label: label.trim().to_string(),
            table,
            key_columns,
        });
    }
    Ok(tables)
}
