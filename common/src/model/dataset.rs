use crate::model::types::SqlType;
use serde::{Deserialize, Serialize};

/// Per-column summary of an uploaded CSV, generated when the file is selected.
///
/// The backend scans every cell of the column to decide its observed kind and
/// maps that kind to the SQL type the loader will declare if it has to create
/// the target table. The frontend shows these rows so the user can check the
/// detected schema before writing anything.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ColumnInfo {
    /// Header title exactly as it appears in the file.
    pub name: String,
    /// Observed kind label (`object`, `int64`, `float64`, `bool`, `datetime64[ns]`).
    pub dtype: String,
    /// SQL type inferred from `dtype`.
    pub sql_type: SqlType,
    /// Cells holding a value.
    pub non_null: usize,
    /// Cells that are empty or hold a missing-value token.
    pub nulls: usize,
}

/// What the loader page shows right after a file is chosen.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DatasetPreview {
    pub file_name: String,
    pub file_size_bytes: usize,
    pub rows: usize,
    pub columns: usize,
    pub column_info: Vec<ColumnInfo>,
    /// Up to the first ten rows, rendered as text; `None` marks a missing value.
    pub sample: Vec<Vec<Option<String>>>,
}
