use crate::error::{AppError, AppResult};
use crate::warehouse::dialect::{Dialect, RenderedSql};
use crate::warehouse::statement::{SqlValue, Statement, StatementResult, TIMESTAMP_FORMAT};
use crate::warehouse::Warehouse;
use async_trait::async_trait;
use log::debug;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Local warehouse backed by one SQLite database.
///
/// The connection is shared behind a mutex and every statement runs on the
/// blocking pool, so callers stay async like they are with the remote backend.
#[derive(Clone)]
pub struct SqliteWarehouse {
    conn: Arc<Mutex<Connection>>,
    user: Option<String>,
}

impl SqliteWarehouse {
    pub fn open(path: &Path, user: Option<String>) -> AppResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            user,
        })
    }

    pub fn open_in_memory(user: Option<String>) -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            user,
        })
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::BigInt(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::Double(d) => ToSqlOutput::Owned(Value::Real(*d)),
            SqlValue::Boolean(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Timestamp(ts) => {
                ToSqlOutput::Owned(Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()))
            }
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::BigInt(i),
        ValueRef::Real(f) => SqlValue::Double(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            SqlValue::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn query(conn: &Connection, rendered: &RenderedSql) -> AppResult<StatementResult> {
    let mut stmt = conn.prepare(&rendered.sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows = stmt.query(params_from_iter(rendered.params.iter().map(|p| &p.value)))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(from_value_ref(row.get_ref(idx)?));
        }
        out.push(values);
    }
    Ok(StatementResult {
        columns,
        rows: out,
        affected_rows: None,
    })
}

fn run(conn: &mut Connection, statement: &Statement) -> AppResult<StatementResult> {
    let rendered = Dialect::Sqlite.render(statement)?;
    for sql in &rendered {
        debug!("sqlite {}: {}", statement.kind(), sql.sql);
    }

    if statement.returns_rows() {
        let first = rendered
            .first()
            .ok_or_else(|| AppError::warehouse("nothing to run"))?;
        let result = query(conn, first)?;
        if let Statement::Describe { table } = statement {
            // pragma_table_info yields no rows for a missing table instead of failing.
            if result.rows.is_empty() {
                return Err(AppError::warehouse(format!(
                    "[TABLE_OR_VIEW_NOT_FOUND] The table or view {} cannot be found",
                    table
                )));
            }
        }
        return Ok(result);
    }

    let tx = conn.transaction()?;
    let mut affected = 0u64;
    for sql in &rendered {
        affected = tx.execute(&sql.sql, params_from_iter(sql.params.iter().map(|p| &p.value)))?
            as u64;
    }
    tx.commit()?;
    Ok(StatementResult::affected(affected))
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    async fn execute(&self, statement: &Statement) -> AppResult<StatementResult> {
        if let Statement::CurrentUser = statement {
            return match &self.user {
                Some(user) => Ok(StatementResult {
                    columns: vec!["current_user()".to_string()],
                    rows: vec![vec![SqlValue::text(user.clone())]],
                    affected_rows: None,
                }),
                None => Err(AppError::Unsupported {
                    message: "no local warehouse user configured".into(),
                }),
            };
        }

        let conn = self.conn.clone();
        let statement = statement.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| AppError::warehouse("sqlite connection lock poisoned"))?;
            run(&mut guard, &statement)
        })
        .await
        .map_err(|e| AppError::warehouse(format!("join error: {}", e)))?
    }
}
