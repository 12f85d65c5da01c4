use crate::error::{AppError, AppResult};
use crate::platform::PlatformClient;
use crate::warehouse::dialect::{BoundParam, Dialect};
use crate::warehouse::statement::{SqlValue, Statement, StatementResult};
use crate::warehouse::Warehouse;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const STATEMENTS_PATH: &str = "/api/2.0/sql/statements/";

/// Remote warehouse reached through the SQL Statement Execution API.
#[derive(Clone)]
pub struct DatabricksWarehouse {
    client: PlatformClient,
    warehouse_id: String,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    parameters: Vec<StatementParameter>,
    wait_timeout: &'static str,
    on_wait_timeout: &'static str,
    format: &'static str,
    disposition: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
struct StatementParameter {
    name: String,
    /// Omitted for NULL.
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    type_name: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    statement_id: Option<String>,
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<Manifest>,
    #[serde(default)]
    result: Option<ResultData>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: String,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    schema: Option<ManifestSchema>,
}

#[derive(Debug, Deserialize)]
struct ManifestSchema {
    #[serde(default)]
    columns: Vec<ManifestColumn>,
}

#[derive(Debug, Deserialize)]
struct ManifestColumn {
    name: String,
    #[serde(default)]
    type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultData {
    #[serde(default)]
    data_array: Option<Vec<Vec<Option<String>>>>,
}

impl From<&BoundParam> for StatementParameter {
    fn from(param: &BoundParam) -> Self {
        Self {
            name: param.name.clone(),
            value: param.value.as_text(),
            type_name: param.value.sql_type().map(|t| t.as_str()),
        }
    }
}

impl DatabricksWarehouse {
    pub fn new(client: PlatformClient, warehouse_id: impl Into<String>) -> Self {
        Self {
            client,
            warehouse_id: warehouse_id.into(),
        }
    }
}

/// JSON_ARRAY results arrive as strings; the manifest type decides the value.
fn typed_cell(raw: Option<String>, type_name: Option<&str>) -> SqlValue {
    let raw = match raw {
        Some(raw) => raw,
        None => return SqlValue::Null,
    };
    match type_name.unwrap_or("STRING") {
        "LONG" | "INT" | "SHORT" | "BYTE" => raw
            .parse::<i64>()
            .map(SqlValue::BigInt)
            .unwrap_or(SqlValue::String(raw)),
        "DOUBLE" | "FLOAT" | "DECIMAL" => raw
            .parse::<f64>()
            .map(SqlValue::Double)
            .unwrap_or(SqlValue::String(raw)),
        "BOOLEAN" => match raw.as_str() {
            "true" => SqlValue::Boolean(true),
            "false" => SqlValue::Boolean(false),
            _ => SqlValue::String(raw),
        },
        _ => SqlValue::String(raw),
    }
}

fn into_result(statement: &Statement, response: ExecuteResponse) -> AppResult<StatementResult> {
    if response.status.state != "SUCCEEDED" {
        let detail = response
            .status
            .error
            .map(|e| match (e.error_code, e.message) {
                (_, Some(message)) => message,
                (Some(code), None) => code,
                (None, None) => String::new(),
            })
            .unwrap_or_default();
        return Err(AppError::warehouse(format!(
            "statement {} ended in state {}: {}",
            response.statement_id.unwrap_or_default(),
            response.status.state,
            detail
        )));
    }

    let manifest_columns = response
        .manifest
        .and_then(|m| m.schema)
        .map(|s| s.columns)
        .unwrap_or_default();
    let columns: Vec<String> = manifest_columns.iter().map(|c| c.name.clone()).collect();
    let rows: Vec<Vec<SqlValue>> = response
        .result
        .and_then(|r| r.data_array)
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let type_name = manifest_columns
                        .get(idx)
                        .and_then(|c| c.type_name.as_deref());
                    typed_cell(cell, type_name)
                })
                .collect()
        })
        .collect();

    let mut result = StatementResult {
        columns,
        rows,
        affected_rows: None,
    };
    if !statement.returns_rows() {
        result.affected_rows = match result.column_index("num_affected_rows") {
            Some(idx) => result
                .rows
                .first()
                .and_then(|row| row.get(idx))
                .and_then(SqlValue::as_text)
                .and_then(|v| v.parse::<u64>().ok()),
            None => None,
        };
    }
    Ok(result)
}

#[async_trait]
impl Warehouse for DatabricksWarehouse {
    async fn execute(&self, statement: &Statement) -> AppResult<StatementResult> {
        let rendered = Dialect::Databricks.render(statement)?;
        let mut last = StatementResult::default();
        for sql in &rendered {
            debug!(
                "databricks {}: {} ({} params)",
                statement.kind(),
                sql.sql,
                sql.params.len()
            );
            let request = ExecuteRequest {
                warehouse_id: &self.warehouse_id,
                statement: &sql.sql,
                parameters: sql.params.iter().map(StatementParameter::from).collect(),
                wait_timeout: "50s",
                on_wait_timeout: "CANCEL",
                format: "JSON_ARRAY",
                disposition: "INLINE",
            };
            let response: ExecuteResponse = self.client.post_json(STATEMENTS_PATH, &request).await?;
            last = into_result(statement, response).map_err(|e| {
                warn!("{} failed: {}", statement.kind(), e);
                e
            })?;
        }
        Ok(last)
    }
}
