use serde::{Deserialize, Serialize};

/// How the uploaded rows land in the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// Creates the table; refuses when it already exists.
    Create,
    /// Appends to an existing table; refuses when it is missing.
    Append,
    /// Replaces the whole table content, creating the table first if needed.
    Overwrite,
}

impl UploadMode {
    pub fn label(&self) -> &'static str {
        match self {
            UploadMode::Create => "Create New Table",
            UploadMode::Append => "Append to Existing Table",
            UploadMode::Overwrite => "Overwrite Existing Table",
        }
    }
}

/// Outcome of the upload-volume access probe. Never blocks an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PermissionCheck {
    Valid,
    NoGrants,
    MissingPrivileges,
    Error(String),
}

impl PermissionCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, PermissionCheck::Valid)
    }

    pub fn message(&self) -> String {
        match self {
            PermissionCheck::Valid => "valid".to_string(),
            PermissionCheck::NoGrants => "No grants found".to_string(),
            PermissionCheck::MissingPrivileges => "Required privileges not found".to_string(),
            PermissionCheck::Error(detail) => format!("Error: {}", detail),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub table: String,
    pub mode: UploadMode,
    pub rows_written: usize,
    pub table_created: bool,
    /// Full volume path of the backed-up source file.
    pub backup_path: String,
    pub source_md5: String,
    pub permission_check: PermissionCheck,
}
