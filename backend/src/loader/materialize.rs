use crate::error::AppResult;
use crate::warehouse::identifier::TableName;
use crate::warehouse::statement::{ColumnDef, Statement};
use crate::warehouse::Warehouse;
use log::info;

pub fn create_table_statement(table: &TableName, columns: Vec<ColumnDef>) -> Statement {
    Statement::CreateTable {
        table: table.clone(),
        columns,
    }
}

/// `CREATE TABLE IF NOT EXISTS`; running it against an existing table is a no-op.
pub async fn materialize_table(
    warehouse: &dyn Warehouse,
    table: &TableName,
    columns: Vec<ColumnDef>,
) -> AppResult<()> {
    let count = columns.len();
    warehouse
        .execute(&create_table_statement(table, columns))
        .await?;
    info!("table {} materialized with {} columns", table, count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::sqlite::SqliteWarehouse;
    use crate::warehouse::describe_table;
    use common::model::types::SqlType;

    #[tokio::test]
    async fn materializing_twice_is_not_an_error() {
        let warehouse = SqliteWarehouse::open_in_memory(None).unwrap();
        let table = TableName::parse("dg_dev.sandbox.people").unwrap();
        let columns = vec![
            ColumnDef {
                name: "name".into(),
                sql_type: SqlType::String,
            },
            ColumnDef {
                name: "order".into(),
                sql_type: SqlType::BigInt,
            },
        ];
        materialize_table(&warehouse, &table, columns.clone())
            .await
            .unwrap();
        materialize_table(&warehouse, &table, columns).await.unwrap();

        let schema = describe_table(&warehouse, &table).await.unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[1].name, "order");
    }
}
