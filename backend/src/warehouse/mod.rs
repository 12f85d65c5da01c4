//! The SQL warehouse seen as one narrow collaborator.
//!
//! Callers build typed [`Statement`]s; a [`Warehouse`] renders them in its own
//! [`dialect::Dialect`] and runs them. Two backends exist: the platform's SQL
//! Statement Execution API (`databricks`) and a local SQLite file (`sqlite`).

pub mod databricks;
pub mod dialect;
pub mod identifier;
pub mod sqlite;
pub mod statement;

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use common::model::types::ColumnSchema;
use identifier::TableName;
use log::debug;
use statement::{SqlValue, Statement, StatementResult};

#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn execute(&self, statement: &Statement) -> AppResult<StatementResult>;
}

/// `DESCRIBE` wrapped into a boolean: any failure reads as "does not exist".
pub async fn table_exists(warehouse: &dyn Warehouse, table: &TableName) -> bool {
    match warehouse
        .execute(&Statement::Describe {
            table: table.clone(),
        })
        .await
    {
        Ok(_) => true,
        Err(e) => {
            debug!("table {} treated as missing: {}", table, e);
            false
        }
    }
}

/// Column names and types of `table`, in declaration order.
///
/// Databricks appends partitioning sections whose rows start with `#`; those
/// and blank separator rows are skipped.
pub async fn describe_table(
    warehouse: &dyn Warehouse,
    table: &TableName,
) -> AppResult<Vec<ColumnSchema>> {
    let result = warehouse
        .execute(&Statement::Describe {
            table: table.clone(),
        })
        .await?;
    let name_idx = result.column_index("col_name").unwrap_or(0);
    let type_idx = result.column_index("data_type").unwrap_or(1);

    let mut columns = Vec::new();
    for row in &result.rows {
        let name = match row.get(name_idx).and_then(SqlValue::as_text) {
            Some(name) => name.trim().to_string(),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }
        if name.starts_with('#') {
            break;
        }
        let data_type = row
            .get(type_idx)
            .and_then(SqlValue::as_text)
            .unwrap_or_default();
        columns.push(ColumnSchema { name, data_type });
    }
    if columns.is_empty() {
        return Err(AppError::warehouse(format!(
            "DESCRIBE returned no columns for {}",
            table
        )));
    }
    Ok(columns)
}

/// Session user as reported by the warehouse itself.
pub async fn current_user(warehouse: &dyn Warehouse) -> AppResult<Option<String>> {
    let result = warehouse.execute(&Statement::CurrentUser).await?;
    Ok(result.first_value().and_then(SqlValue::as_text))
}
