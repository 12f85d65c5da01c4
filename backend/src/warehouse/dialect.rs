//! Renders [`Statement`]s into SQL text plus bound parameters.
//!
//! Identifiers are quoted and interpolated; values never are. The Databricks
//! dialect produces named `:pN` markers for the Statement Execution API. The
//! SQLite dialect produces `?N` markers and is what the local warehouse runs.

use crate::error::{AppError, AppResult};
use crate::warehouse::identifier::TableName;
use crate::warehouse::statement::{Condition, Predicate, SqlValue, Statement, WriteMode};
use common::model::types::SqlType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Databricks,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub name: String,
    pub value: SqlValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<BoundParam>,
}

struct Binder {
    dialect: Dialect,
    params: Vec<BoundParam>,
}

impl Binder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: &SqlValue) -> String {
        let index = self.params.len();
        let (name, marker) = match self.dialect {
            Dialect::Databricks => (format!("p{}", index), format!(":p{}", index)),
            Dialect::Sqlite => ((index + 1).to_string(), format!("?{}", index + 1)),
        };
        self.params.push(BoundParam {
            name,
            value: value.clone(),
        });
        marker
    }

    fn finish(self, sql: String) -> RenderedSql {
        RenderedSql {
            sql,
            params: self.params,
        }
    }
}

impl Dialect {
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::Databricks => format!("`{}`", ident.replace('`', "``")),
            Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Databricks addresses all three levels; SQLite has no catalogs, so the
    /// dotted name becomes a single identifier.
    pub fn table(&self, table: &TableName) -> String {
        match self {
            Dialect::Databricks => table
                .parts()
                .iter()
                .map(|p| self.quote_ident(p))
                .collect::<Vec<_>>()
                .join("."),
            Dialect::Sqlite => self.quote_ident(&table.to_string()),
        }
    }

    pub fn column_type(&self, sql_type: SqlType) -> &'static str {
        match self {
            Dialect::Databricks => sql_type.as_str(),
            Dialect::Sqlite => match sql_type {
                SqlType::String => "TEXT",
                SqlType::BigInt => "INTEGER",
                SqlType::Double => "REAL",
                SqlType::Boolean => "BOOLEAN",
                SqlType::Timestamp => "TIMESTAMP",
            },
        }
    }

    /// Most statements render to exactly one SQL string. SQLite's overwrite is
    /// two, meant to run in one transaction.
    pub fn render(&self, statement: &Statement) -> AppResult<Vec<RenderedSql>> {
        let mut binder = Binder::new(*self);
        match statement {
            Statement::CurrentUser => match self {
                Dialect::Databricks => Ok(vec![binder.finish("SELECT current_user()".into())]),
                Dialect::Sqlite => Err(AppError::Unsupported {
                    message: "current_user() is not available on SQLite".into(),
                }),
            },
            Statement::Describe { table } => match self {
                Dialect::Databricks => Ok(vec![
                    binder.finish(format!("DESCRIBE TABLE {}", self.table(table)))
                ]),
                Dialect::Sqlite => {
                    let marker = binder.bind(&SqlValue::text(table.to_string()));
                    Ok(vec![binder.finish(format!(
                        "SELECT name AS col_name, type AS data_type FROM pragma_table_info({})",
                        marker
                    ))])
                }
            },
            Statement::CreateTable { table, columns } => {
                if columns.is_empty() {
                    return Err(AppError::validation("cannot create a table without columns"));
                }
                let defs = columns
                    .iter()
                    .map(|c| format!("{} {}", self.quote_ident(&c.name), self.column_type(c.sql_type)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let suffix = match self {
                    Dialect::Databricks => " USING DELTA",
                    Dialect::Sqlite => "",
                };
                Ok(vec![binder.finish(format!(
                    "CREATE TABLE IF NOT EXISTS {} ({}){}",
                    self.table(table),
                    defs,
                    suffix
                ))])
            }
            Statement::Insert {
                table,
                columns,
                rows,
                mode,
            } => {
                if rows.is_empty() {
                    return Err(AppError::validation("cannot insert an empty row set"));
                }
                let column_list = columns
                    .iter()
                    .map(|c| self.quote_ident(c))
                    .collect::<Vec<_>>()
                    .join(",");
                let mut groups = Vec::with_capacity(rows.len());
                for row in rows {
                    if row.len() != columns.len() {
                        return Err(AppError::validation(format!(
                            "row has {} values for {} columns",
                            row.len(),
                            columns.len()
                        )));
                    }
                    let markers: Vec<String> = row.iter().map(|v| binder.bind(v)).collect();
                    groups.push(format!("({})", markers.join(",")));
                }
                let values = groups.join(",");
                let target = self.table(table);
                match (self, mode) {
                    (_, WriteMode::Append) => Ok(vec![binder.finish(format!(
                        "INSERT INTO {} ({}) VALUES {}",
                        target, column_list, values
                    ))]),
                    (Dialect::Databricks, WriteMode::Overwrite) => Ok(vec![binder.finish(format!(
                        "INSERT OVERWRITE {} ({}) VALUES {}",
                        target, column_list, values
                    ))]),
                    (Dialect::Sqlite, WriteMode::Overwrite) => Ok(vec![
                        RenderedSql {
                            sql: format!("DELETE FROM {}", target),
                            params: Vec::new(),
                        },
                        binder.finish(format!(
                            "INSERT INTO {} ({}) VALUES {}",
                            target, column_list, values
                        )),
                    ]),
                }
            }
            Statement::Select {
                table,
                filter,
                limit,
            } => {
                let mut sql = format!("SELECT * FROM {}", self.table(table));
                if !filter.is_empty() {
                    sql.push_str(" WHERE ");
                    sql.push_str(&self.render_predicate(filter, &mut binder));
                }
                sql.push_str(&format!(" LIMIT {}", limit));
                Ok(vec![binder.finish(sql)])
            }
            Statement::Update {
                table,
                assignments,
                predicate,
            } => {
                if assignments.is_empty() {
                    return Err(AppError::validation("update has no assignments"));
                }
                if predicate.is_empty() {
                    return Err(AppError::validation(
                        "refusing to update without a WHERE predicate",
                    ));
                }
                let set_clause = assignments
                    .iter()
                    .map(|(column, value)| {
                        format!("{} = {}", self.quote_ident(column), binder.bind(value))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let where_clause = self.render_predicate(predicate, &mut binder);
                Ok(vec![binder.finish(format!(
                    "UPDATE {} SET {} WHERE {}",
                    self.table(table),
                    set_clause,
                    where_clause
                ))])
            }
            Statement::Truncate { table } => {
                let sql = match self {
                    Dialect::Databricks => format!("TRUNCATE TABLE {}", self.table(table)),
                    Dialect::Sqlite => format!("DELETE FROM {}", self.table(table)),
                };
                Ok(vec![binder.finish(sql)])
            }
        }
    }

    fn render_predicate(&self, predicate: &Predicate, binder: &mut Binder) -> String {
        predicate
            .conditions
            .iter()
            .map(|condition| match condition {
                Condition::Eq(column, value) => {
                    format!("{} = {}", self.quote_ident(column), binder.bind(value))
                }
                Condition::IsNull(column) => format!("{} IS NULL", self.quote_ident(column)),
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::statement::ColumnDef;

    fn table() -> TableName {
        TableName::parse("dg_dev.sandbox.merchants").unwrap()
    }

    #[test]
    fn databricks_create_table_quotes_columns_and_uses_delta() {
        let statement = Statement::CreateTable {
            table: table(),
            columns: vec![
                ColumnDef {
                    name: "name".into(),
                    sql_type: SqlType::String,
                },
                ColumnDef {
                    name: "select".into(),
                    sql_type: SqlType::BigInt,
                },
            ],
        };
        let rendered = Dialect::Databricks.render(&statement).unwrap();
        assert_eq!(
            rendered[0].sql,
            "CREATE TABLE IF NOT EXISTS `dg_dev`.`sandbox`.`merchants` (`name` STRING, `select` BIGINT) USING DELTA"
        );
        assert!(rendered[0].params.is_empty());
    }

    #[test]
    fn databricks_insert_binds_every_value_positionally() {
        let statement = Statement::Insert {
            table: table(),
            columns: vec!["name".into(), "age".into()],
            rows: vec![
                vec![SqlValue::text("O'Hara"), SqlValue::BigInt(34)],
                vec![SqlValue::text("Bo"), SqlValue::Null],
            ],
            mode: WriteMode::Overwrite,
        };
        let rendered = Dialect::Databricks.render(&statement).unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(
            rendered[0].sql,
            "INSERT OVERWRITE `dg_dev`.`sandbox`.`merchants` (`name`,`age`) VALUES (:p0,:p1),(:p2,:p3)"
        );
        assert!(!rendered[0].sql.contains("O'Hara"));
        let names: Vec<&str> = rendered[0].params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p0", "p1", "p2", "p3"]);
        assert_eq!(rendered[0].params[3].value, SqlValue::Null);
    }

    #[test]
    fn sqlite_overwrite_is_delete_then_insert() {
        let statement = Statement::Insert {
            table: table(),
            columns: vec!["name".into()],
            rows: vec![vec![SqlValue::text("a")]],
            mode: WriteMode::Overwrite,
        };
        let rendered = Dialect::Sqlite.render(&statement).unwrap();
        assert_eq!(rendered[0].sql, "DELETE FROM \"dg_dev.sandbox.merchants\"");
        assert_eq!(
            rendered[1].sql,
            "INSERT INTO \"dg_dev.sandbox.merchants\" (\"name\") VALUES (?1)"
        );
    }

    #[test]
    fn update_binds_assignments_and_predicate() {
        let statement = Statement::Update {
            table: table(),
            assignments: vec![
                ("review_status".into(), SqlValue::text("APPROVED")),
                ("checker_comments".into(), SqlValue::Null),
            ],
            predicate: Predicate::new()
                .and_eq("merchant_id", SqlValue::text("M-1'; DROP TABLE x; --"))
                .and_eq("review_status", SqlValue::text("PENDING")),
        };
        let rendered = Dialect::Databricks.render(&statement).unwrap();
        assert_eq!(
            rendered[0].sql,
            "UPDATE `dg_dev`.`sandbox`.`merchants` SET `review_status` = :p0, `checker_comments` = :p1 WHERE `merchant_id` = :p2 AND `review_status` = :p3"
        );
        assert_eq!(rendered[0].params.len(), 4);
    }

    #[test]
    fn update_without_predicate_is_refused() {
        let statement = Statement::Update {
            table: table(),
            assignments: vec![("review_status".into(), SqlValue::text("PENDING"))],
            predicate: Predicate::new(),
        };
        assert!(Dialect::Sqlite.render(&statement).is_err());
    }

    #[test]
    fn select_with_status_filter_and_limit() {
        let statement = Statement::Select {
            table: table(),
            filter: Predicate::new().and_eq("review_status", SqlValue::text("PENDING")),
            limit: 1000,
        };
        let rendered = Dialect::Sqlite.render(&statement).unwrap();
        assert_eq!(
            rendered[0].sql,
            "SELECT * FROM \"dg_dev.sandbox.merchants\" WHERE \"review_status\" = ?1 LIMIT 1000"
        );
    }

    #[test]
    fn identifiers_escape_their_quote_character() {
        assert_eq!(Dialect::Databricks.quote_ident("we`ird"), "`we``ird`");
        assert_eq!(Dialect::Sqlite.quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn truncate_keeps_the_table() {
        let statement = Statement::Truncate { table: table() };
        assert_eq!(
            Dialect::Databricks.render(&statement).unwrap()[0].sql,
            "TRUNCATE TABLE `dg_dev`.`sandbox`.`merchants`"
        );
        assert_eq!(
            Dialect::Sqlite.render(&statement).unwrap()[0].sql,
            "DELETE FROM \"dg_dev.sandbox.merchants\""
        );
    }
}
