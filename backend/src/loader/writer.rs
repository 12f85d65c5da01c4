use crate::error::{AppError, AppResult};
use crate::loader::dataset::UploadedDataset;
use crate::warehouse::identifier::TableName;
use crate::warehouse::statement::{Statement, WriteMode};
use crate::warehouse::Warehouse;
use log::info;

/// Refuses datasets that would need more bound values than one statement allows.
pub fn check_parameter_budget(dataset: &UploadedDataset, max_bind_parameters: usize) -> AppResult<()> {
    let needed = dataset.row_count.saturating_mul(dataset.columns.len());
    if needed > max_bind_parameters {
        return Err(AppError::validation(format!(
            "{} rows x {} columns needs {} bound values; the limit for one statement is {}",
            dataset.row_count,
            dataset.columns.len(),
            needed,
            max_bind_parameters
        )));
    }
    Ok(())
}

/// One multi-row insert covering the whole dataset, or nothing for an empty one.
pub fn insert_statement(
    table: &TableName,
    dataset: &UploadedDataset,
    mode: WriteMode,
) -> Option<Statement> {
    if dataset.is_empty() {
        return None;
    }
    Some(Statement::Insert {
        table: table.clone(),
        columns: dataset.column_names(),
        rows: dataset.rows(),
        mode,
    })
}

/// Returns the number of rows written. Overwriting with no rows empties the table.
pub async fn write_rows(
    warehouse: &dyn Warehouse,
    table: &TableName,
    dataset: &UploadedDataset,
    mode: WriteMode,
    max_bind_parameters: usize,
) -> AppResult<usize> {
    check_parameter_budget(dataset, max_bind_parameters)?;
    let statement = match (insert_statement(table, dataset, mode), mode) {
        (Some(statement), _) => statement,
        (None, WriteMode::Overwrite) => {
            warehouse
                .execute(&Statement::Truncate {
                    table: table.clone(),
                })
                .await?;
            info!("truncated {}; the overwrite had no rows", table);
            return Ok(0);
        }
        (None, WriteMode::Append) => return Ok(0),
    };
    warehouse.execute(&statement).await?;
    info!(
        "{} {} rows into {}",
        statement.kind(),
        dataset.row_count,
        table
    );
    Ok(dataset.row_count)
}
