use crate::config::ReviewTableConfig;
use crate::error::{AppError, AppResult};
use crate::review::lifecycle::{plan, ReviewAction};
use crate::review::updater::{apply_update, guarded_update, key_text};
use crate::warehouse::identifier::TableName;
use crate::warehouse::statement::{Predicate, SqlValue, Statement, TIMESTAMP_FORMAT};
use crate::warehouse::{describe_table, Warehouse};
use chrono::NaiveDateTime;
use common::model::review::{columns, RecordsView, ReviewCounts, ReviewStatus, TransitionOutcome};
use common::model::types::ColumnSchema;
use common::requests::RecordKey;
use log::info;

/// Rows of one review table as last read, plus its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub table: TableName,
    pub schema: Vec<ColumnSchema>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Which cached rows a listing returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// `None` keeps every status.
    pub statuses: Option<Vec<ReviewStatus>>,
    /// Keeps only rows whose maker is this user.
    pub maker: Option<String>,
}

/// `SELECT * ... [WHERE review_status = :status] LIMIT n` plus `DESCRIBE`.
pub async fn load_snapshot(
    warehouse: &dyn Warehouse,
    table: &TableName,
    status: Option<ReviewStatus>,
    limit: usize,
) -> AppResult<TableSnapshot> {
    let filter = match status {
        Some(status) => Predicate::new().and_eq(
            columns::STATUS,
            SqlValue::optional_text(status.stored_label()),
        ),
        None => Predicate::new(),
    };
    let result = warehouse
        .execute(&Statement::Select {
            table: table.clone(),
            filter,
            limit,
        })
        .await?;
    let schema = describe_table(warehouse, table).await?;
    info!("loaded {} rows from {}", result.rows.len(), table);
    Ok(TableSnapshot {
        table: table.clone(),
        schema,
        columns: result.columns,
        rows: result.rows,
    })
}

fn key_matches(cell: &SqlValue, wanted: &serde_json::Value) -> bool {
    if let serde_json::Value::Number(n) = wanted {
        match cell {
            SqlValue::BigInt(i) => {
                return match n.as_i64() {
                    Some(k) => *i == k,
                    None => n.as_f64() == Some(*i as f64),
                }
            }
            SqlValue::Double(d) => return n.as_f64() == Some(*d),
            _ => {}
        }
    }
    let text = cell.as_text();
    text.is_some() && text == key_text(wanted)
}

impl TableSnapshot {
    fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn text_at(&self, row: usize, column: &str) -> Option<String> {
        let idx = self.column(column)?;
        self.rows.get(row)?.get(idx)?.as_text()
    }

    /// The raw `review_status` cell, NULL when the column is absent.
    pub fn status_cell(&self, row: usize) -> SqlValue {
        self.column(columns::STATUS)
            .and_then(|idx| self.rows.get(row)?.get(idx).cloned())
            .unwrap_or(SqlValue::Null)
    }

    pub fn status_of(&self, row: usize) -> AppResult<ReviewStatus> {
        ReviewStatus::from_stored(self.text_at(row, columns::STATUS).as_deref())
            .map_err(AppError::validation)
    }

    pub fn maker_of(&self, row: usize) -> Option<String> {
        self.text_at(row, columns::MAKER)
    }

    /// Index of the row whose key columns equal `key`. Numbers compare by value,
    /// everything else as text.
    pub fn find_record(&self, key_columns: &[String], key: &RecordKey) -> AppResult<usize> {
        let mut wanted = Vec::with_capacity(key_columns.len());
        for column in key_columns {
            let idx = self.column(column).ok_or_else(|| {
                AppError::validation(format!(
                    "key column {} is not a column of {}",
                    column, self.table
                ))
            })?;
            let value = key
                .get(column)
                .filter(|v| key_text(v).is_some())
                .ok_or_else(|| AppError::validation(format!("missing value for key column {}", column)))?;
            wanted.push((idx, value));
        }
        self.rows
            .iter()
            .position(|row| {
                wanted
                    .iter()
                    .all(|(idx, value)| row.get(*idx).is_some_and(|cell| key_matches(cell, value)))
            })
            .ok_or_else(|| AppError::not_found(format!("no record in {} matches {:?}", self.table, key)))
    }

    fn matches(&self, row: usize, filter: &RecordFilter) -> bool {
        if let Some(statuses) = &filter.statuses {
            match self.status_of(row) {
                Ok(status) if statuses.contains(&status) => {}
                _ => return false,
            }
        }
        if let Some(maker) = &filter.maker {
            if self.maker_of(row).as_deref() != Some(maker.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn view(&self, filter: &RecordFilter) -> RecordsView {
        let rows = (0..self.rows.len())
            .filter(|row| self.matches(*row, filter))
            .map(|row| self.rows[row].iter().map(SqlValue::to_json).collect())
            .collect();
        RecordsView {
            table: self.table.to_string(),
            schema: self.schema.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn counts(&self, maker: Option<&str>) -> ReviewCounts {
        let mut counts = ReviewCounts::default();
        for row in 0..self.rows.len() {
            if let Some(maker) = maker {
                if self.maker_of(row).as_deref() != Some(maker) {
                    continue;
                }
            }
            counts.total += 1;
            match self.status_of(row) {
                Ok(ReviewStatus::Pending) => counts.pending += 1,
                Ok(ReviewStatus::Approved) => counts.approved += 1,
                Ok(ReviewStatus::Rejected) => counts.rejected += 1,
                _ => {}
            }
        }
        counts
    }
}

/// Plans and performs one maker or checker action against a cached record.
///
/// Input and state checks run before the warehouse is contacted; the write
/// itself is guarded on the status seen in `snapshot`.
pub async fn apply_action(
    warehouse: &dyn Warehouse,
    table: &ReviewTableConfig,
    snapshot: &TableSnapshot,
    key: &RecordKey,
    action: &ReviewAction,
    actor: &str,
    at: NaiveDateTime,
) -> AppResult<TransitionOutcome> {
    if table.key_columns.is_empty() {
        return Err(AppError::validation(format!(
            "Table {} has no declared key; records cannot be updated",
            table.table
        )));
    }
    let row = snapshot.find_record(&table.key_columns, key)?;
    let observed = snapshot.status_of(row)?;
    let transition = plan(action, observed, actor, at)?;
    let statement = guarded_update(
        table,
        key,
        &snapshot.status_cell(row),
        transition.assignments,
    )?;
    apply_update(warehouse, table, &statement).await?;

    info!(
        "{} on {} by {}: {} -> {}",
        action.name(),
        table.table,
        actor,
        transition.from,
        transition.to
    );
    Ok(TransitionOutcome {
        table: table.table.to_string(),
        from: transition.from,
        to: transition.to,
        actor: actor.to_string(),
        at: at.format(TIMESTAMP_FORMAT).to_string(),
    })
}
