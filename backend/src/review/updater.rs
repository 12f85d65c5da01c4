use crate::config::ReviewTableConfig;
use crate::error::{AppError, AppResult};
use crate::warehouse::statement::{Predicate, SqlValue, Statement};
use crate::warehouse::Warehouse;
use common::model::review::columns;
use common::requests::RecordKey;
use log::{error, warn};

/// Text form of a key value, used to match it against cached rows.
pub fn key_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn key_value(column: &str, value: &serde_json::Value) -> AppResult<SqlValue> {
    match value {
        serde_json::Value::String(s) => Ok(SqlValue::text(s.clone())),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::BigInt(i)),
            None => n
                .as_f64()
                .map(SqlValue::Double)
                .ok_or_else(|| AppError::validation(format!("key {} is not a number", column))),
        },
        serde_json::Value::Bool(b) => Ok(SqlValue::Boolean(*b)),
        _ => Err(AppError::validation(format!(
            "key column {} needs a scalar, non-null value",
            column
        ))),
    }
}

/// Key conditions in declared order. The request must name exactly the declared columns.
pub fn key_predicate(table: &ReviewTableConfig, key: &RecordKey) -> AppResult<Predicate> {
    if table.key_columns.is_empty() {
        return Err(AppError::validation(format!(
            "Table {} has no declared key; records cannot be updated",
            table.table
        )));
    }
    if let Some(extra) = key.keys().find(|k| !table.key_columns.contains(k)) {
        return Err(AppError::validation(format!(
            "'{}' is not part of the declared key of {}",
            extra, table.table
        )));
    }
    let mut predicate = Predicate::new();
    for column in &table.key_columns {
        let value = key.get(column).ok_or_else(|| {
            AppError::validation(format!("missing value for key column {}", column))
        })?;
        predicate = predicate.and_eq(column.clone(), key_value(column, value)?);
    }
    Ok(predicate)
}

/// `UPDATE ... SET <assignments> WHERE <key> AND review_status = <observed>`.
///
/// `observed` is the status cell exactly as it was read, so an empty or padded
/// label is matched as stored rather than as its normalized status.
pub fn guarded_update(
    table: &ReviewTableConfig,
    key: &RecordKey,
    observed: &SqlValue,
    assignments: Vec<(String, SqlValue)>,
) -> AppResult<Statement> {
    let predicate = key_predicate(table, key)?.and_eq(columns::STATUS, observed.clone());
    Ok(Statement::Update {
        table: table.table.clone(),
        assignments,
        predicate,
    })
}

/// Runs the update and insists on exactly one affected row.
pub async fn apply_update(
    warehouse: &dyn Warehouse,
    table: &ReviewTableConfig,
    statement: &Statement,
) -> AppResult<u64> {
    let result = warehouse.execute(statement).await?;
    match result.affected_rows {
        Some(1) => Ok(1),
        Some(0) => Err(AppError::Conflict {
            message: format!(
                "the record in {} is missing or its review status changed since it was read; refresh and retry",
                table.table
            ),
        }),
        Some(matched) => {
            error!(
                "declared key {:?} of {} matched {} rows",
                table.key_columns, table.table, matched
            );
            Err(AppError::AmbiguousKey {
                table: table.table.to_string(),
                matched,
            })
        }
        None => {
            warn!(
                "warehouse did not report affected rows for {}; assuming one",
                table.table
            );
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::identifier::TableName;
    use crate::warehouse::statement::Condition;

    fn merchants(keys: &[&str]) -> ReviewTableConfig {
        ReviewTableConfig {
            label: "Dev - Merchants".into(),
            table: TableName::parse("dg_dev.sandbox.merchants").unwrap(),
            key_columns: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn key(pairs: &[(&str, serde_json::Value)]) -> RecordKey {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn tables_without_a_declared_key_cannot_be_updated() {
        let err = guarded_update(
            &merchants(&[]),
            &key(&[("merchant_id", serde_json::json!("M-1"))]),
            &SqlValue::text("PENDING"),
            vec![("review_status".into(), SqlValue::text("APPROVED"))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("no declared key"));
    }

    #[test]
    fn guard_includes_every_key_column_and_the_observed_status() {
        let statement = guarded_update(
            &merchants(&["bank_id", "merchant_id"]),
            &key(&[
                ("merchant_id", serde_json::json!("M-1")),
                ("bank_id", serde_json::json!(7)),
            ]),
            &SqlValue::Null,
            vec![("review_status".into(), SqlValue::text("PENDING"))],
        )
        .unwrap();
        match statement {
            Statement::Update { predicate, .. } => assert_eq!(
                predicate.conditions,
                vec![
                    Condition::Eq("bank_id".into(), SqlValue::BigInt(7)),
                    Condition::Eq("merchant_id".into(), SqlValue::text("M-1")),
                    Condition::IsNull("review_status".into()),
                ]
            ),
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn blank_status_cells_are_guarded_as_stored() {
        let statement = guarded_update(
            &merchants(&["merchant_id"]),
            &key(&[("merchant_id", serde_json::json!("M-1"))]),
            &SqlValue::text(""),
            vec![("review_status".into(), SqlValue::text("PENDING"))],
        )
        .unwrap();
        match statement {
            Statement::Update { predicate, .. } => assert_eq!(
                predicate.conditions[1],
                Condition::Eq("review_status".into(), SqlValue::text(""))
            ),
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn key_must_match_the_declared_columns() {
        let table = merchants(&["merchant_id"]);
        assert!(key_predicate(&table, &key(&[])).is_err());
        assert!(key_predicate(
            &table,
            &key(&[
                ("merchant_id", serde_json::json!("M-1")),
                ("name", serde_json::json!("x"))
            ])
        )
        .is_err());
        assert!(key_predicate(&table, &key(&[("merchant_id", serde_json::Value::Null)])).is_err());
    }
}
