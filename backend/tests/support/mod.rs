//! Shared helpers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use backend::config::{AppConfig, ReviewTableConfig};
use backend::error::AppResult;
use backend::warehouse::identifier::TableName;
use backend::warehouse::sqlite::SqliteWarehouse;
use backend::warehouse::statement::{ColumnDef, Predicate, SqlValue, Statement, StatementResult, WriteMode};
use backend::warehouse::Warehouse;
use common::model::review::columns;
use common::model::types::SqlType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const MERCHANTS: &str = "dg_dev.sandbox.merchants";

/// In-memory SQLite warehouse that remembers every statement it was asked to run.
#[derive(Clone)]
pub struct RecordingWarehouse {
    inner: SqliteWarehouse,
    log: Arc<Mutex<Vec<Statement>>>,
}

impl RecordingWarehouse {
    pub fn new() -> Self {
        Self {
            inner: SqliteWarehouse::open_in_memory(None).unwrap(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap().clone()
    }

    /// Statements that change data or schema.
    pub fn writes(&self) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|s| {
                matches!(
                    s,
                    Statement::CreateTable { .. }
                        | Statement::Insert { .. }
                        | Statement::Update { .. }
                        | Statement::Truncate { .. }
                )
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// All rows of `table`, bypassing the log.
    pub async fn rows(&self, table: &str) -> StatementResult {
        self.inner
            .execute(&Statement::Select {
                table: TableName::parse(table).unwrap(),
                filter: Predicate::new(),
                limit: 10_000,
            })
            .await
            .unwrap()
    }

    /// Column name → value of the first row whose `column` equals `value`.
    pub async fn row_where(&self, table: &str, column: &str, value: SqlValue) -> HashMap<String, SqlValue> {
        let result = self
            .inner
            .execute(&Statement::Select {
                table: TableName::parse(table).unwrap(),
                filter: Predicate::new().and_eq(column, value),
                limit: 1,
            })
            .await
            .unwrap();
        result
            .columns
            .iter()
            .cloned()
            .zip(result.rows[0].iter().cloned())
            .collect()
    }
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn execute(&self, statement: &Statement) -> AppResult<StatementResult> {
        self.log.lock().unwrap().push(statement.clone());
        self.inner.execute(statement).await
    }
}

pub fn merchants_config(keys: &[&str]) -> ReviewTableConfig {
    ReviewTableConfig {
        label: "Dev - Merchants".into(),
        table: TableName::parse(MERCHANTS).unwrap(),
        key_columns: keys.iter().map(|k| k.to_string()).collect(),
    }
}

/// Creates the merchants review table and inserts `(merchant_id, review_status, size)` rows.
pub async fn seed_merchants(warehouse: &RecordingWarehouse, rows: &[(&str, Option<&str>, Option<&str>)]) {
    let mut defs = vec![
        ColumnDef {
            name: "merchant_id".into(),
            sql_type: SqlType::String,
        },
        ColumnDef {
            name: "merchant_name".into(),
            sql_type: SqlType::String,
        },
    ];
    let workflow = [
        columns::SIZE_PENDING,
        columns::GENDER_PENDING,
        columns::STATUS,
        columns::MAKER,
        columns::MAKER_DATE,
        columns::SIZE,
        columns::GENDER,
        columns::CHECKER,
        columns::CHECKER_DATE,
        columns::CHECKER_COMMENTS,
    ];
    defs.extend(workflow.iter().map(|c| ColumnDef {
        name: c.to_string(),
        sql_type: SqlType::String,
    }));
    let table = TableName::parse(MERCHANTS).unwrap();
    warehouse
        .inner
        .execute(&Statement::CreateTable {
            table: table.clone(),
            columns: defs.clone(),
        })
        .await
        .unwrap();
    if rows.is_empty() {
        return;
    }

    let data = rows
        .iter()
        .map(|(id, status, size)| {
            let mut row = vec![SqlValue::text(*id), SqlValue::text(format!("Shop {}", id))];
            for column in workflow {
                row.push(match column {
                    columns::STATUS => SqlValue::optional_text(*status),
                    columns::SIZE => SqlValue::optional_text(*size),
                    columns::SIZE_PENDING | columns::GENDER_PENDING if *status == Some("PENDING") => {
                        SqlValue::text(if column == columns::SIZE_PENDING { "SMALL" } else { "MALE" })
                    }
                    columns::MAKER if status.is_some() => SqlValue::text("maker@corp.com"),
                    _ => SqlValue::Null,
                });
            }
            row
        })
        .collect();
    warehouse
        .inner
        .execute(&Statement::Insert {
            table,
            columns: defs.into_iter().map(|d| d.name).collect(),
            rows: data,
            mode: WriteMode::Append,
        })
        .await
        .unwrap();
}

pub fn test_config(pairs: &[(&str, &str)]) -> AppConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap()
}
