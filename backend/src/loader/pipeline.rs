use crate::error::{AppError, AppResult};
use crate::loader::dataset::UploadedDataset;
use crate::loader::materialize::materialize_table;
use crate::loader::writer::{check_parameter_budget, write_rows};
use crate::storage::{backup_path, AccessProbe, VolumeStore};
use crate::warehouse::identifier::{TableName, VolumeName};
use crate::warehouse::statement::{SqlValue, WriteMode};
use crate::warehouse::{describe_table, table_exists, Warehouse};
use bytes::Bytes;
use chrono::NaiveDateTime;
use common::model::types::SqlType;
use common::model::upload::{UploadMode, UploadSummary};
use common::requests::UploadRequest;
use log::{info, warn};
use std::collections::BTreeSet;

pub const UPLOAD_TIMESTAMP_COLUMN: &str = "upload_timestamp";
pub const UPLOADED_BY_COLUMN: &str = "uploaded_by";

/// The raw file as received, kept for the volume backup.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Bytes,
    pub md5: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Bytes) -> Self {
        let mut hasher = md5::Context::new();
        hasher.consume(&bytes);
        Self {
            name: name.into(),
            md5: format!("{:x}", hasher.finalize()),
            bytes,
        }
    }
}

/// Collaborators and request-scoped values of one upload.
pub struct UploadContext<'a> {
    pub warehouse: &'a dyn Warehouse,
    pub volume: &'a dyn VolumeStore,
    pub access: &'a dyn AccessProbe,
    pub upload_volume: &'a VolumeName,
    pub max_bind_parameters: usize,
    pub now: NaiveDateTime,
    pub user: &'a str,
}

fn normalized(names: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    names.into_iter().map(|n| n.to_ascii_lowercase()).collect()
}

/// Append and overwrite need the dataset columns to be exactly the target's.
async fn check_columns_match(
    warehouse: &dyn Warehouse,
    table: &TableName,
    dataset: &UploadedDataset,
) -> AppResult<()> {
    let target = normalized(describe_table(warehouse, table).await?.into_iter().map(|c| c.name));
    let source = normalized(dataset.column_names());
    if target == source {
        return Ok(());
    }
    let missing: Vec<&str> = target.difference(&source).map(String::as_str).collect();
    let extra: Vec<&str> = source.difference(&target).map(String::as_str).collect();
    Err(AppError::validation(format!(
        "Columns do not match {}. Missing from file: [{}]. Not in table: [{}]",
        table,
        missing.join(", "),
        extra.join(", ")
    )))
}

/// Validates, backs up the source file, then creates and/or writes the table.
///
/// Nothing is rolled back: a failure after the backup leaves the file on the
/// volume.
pub async fn run_upload(
    ctx: &UploadContext<'_>,
    dataset: &UploadedDataset,
    source: &SourceFile,
    request: &UploadRequest,
) -> AppResult<UploadSummary> {
    let table = TableName::parse(&request.target_table)?;

    let permission_check = ctx.access.check_volume(ctx.upload_volume).await;
    if !permission_check.is_valid() {
        warn!(
            "upload volume {} permission check: {} (continuing)",
            ctx.upload_volume,
            permission_check.message()
        );
    }

    let mut dataset = dataset.clone();
    if request.add_metadata {
        dataset.set_constant_column(
            UPLOAD_TIMESTAMP_COLUMN,
            SqlType::Timestamp,
            SqlValue::Timestamp(ctx.now),
        );
        dataset.set_constant_column(UPLOADED_BY_COLUMN, SqlType::String, SqlValue::text(ctx.user));
    }
    check_parameter_budget(&dataset, ctx.max_bind_parameters)?;

    let exists = table_exists(ctx.warehouse, &table).await;
    match (request.mode, exists) {
        (UploadMode::Create, true) => {
            return Err(AppError::validation(format!(
                "Table {} already exists. Choose Append or Overwrite instead.",
                table
            )))
        }
        (UploadMode::Append, false) => {
            return Err(AppError::validation(format!(
                "Table {} does not exist. Choose Create New Table instead.",
                table
            )))
        }
        (UploadMode::Append, true) | (UploadMode::Overwrite, true) => {
            check_columns_match(ctx.warehouse, &table, &dataset).await?
        }
        _ => {}
    }

    let backup = backup_path(ctx.upload_volume, &source.name, ctx.now);
    ctx.volume
        .upload(&backup, source.bytes.clone(), true)
        .await?;
    info!("backed up {} to {}", source.name, backup);

    let mut table_created = false;
    let rows_written = match request.mode {
        UploadMode::Create => {
            materialize_table(ctx.warehouse, &table, dataset.column_defs()).await?;
            table_created = true;
            write_rows(
                ctx.warehouse,
                &table,
                &dataset,
                WriteMode::Append,
                ctx.max_bind_parameters,
            )
            .await?
        }
        UploadMode::Append => {
            write_rows(
                ctx.warehouse,
                &table,
                &dataset,
                WriteMode::Append,
                ctx.max_bind_parameters,
            )
            .await?
        }
        UploadMode::Overwrite => {
            if !exists {
                materialize_table(ctx.warehouse, &table, dataset.column_defs()).await?;
                table_created = true;
            }
            write_rows(
                ctx.warehouse,
                &table,
                &dataset,
                WriteMode::Overwrite,
                ctx.max_bind_parameters,
            )
            .await?
        }
    };

    info!(
        "upload of {} into {} finished: {} rows ({})",
        source.name,
        table,
        rows_written,
        request.mode.label()
    );
    Ok(UploadSummary {
        table: table.to_string(),
        mode: request.mode,
        rows_written,
        table_created,
        backup_path: backup,
        source_md5: source.md5.clone(),
        permission_check,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_files_carry_their_md5() {
        let source = SourceFile::new("a.csv", Bytes::from_static(b"hello"));
        assert_eq!(source.md5, "5d41402abc4b2a76b9719d911017c592");
    }
}
