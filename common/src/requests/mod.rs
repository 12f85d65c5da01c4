use crate::model::upload::UploadMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared-key values that identify one review record, column → value.
pub type RecordKey = BTreeMap<String, serde_json::Value>;

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug, Clone)]
/// Request payload for the upload submit endpoint.
/// The dataset itself comes from the file previously sent to `/preview`.
pub struct UploadRequest {
    pub target_table: String,
    pub mode: UploadMode,
    #[serde(default = "default_true")]
    pub add_metadata: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConnectRequest {
    pub table_label: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MakerSubmitRequest {
    pub key: RecordKey,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub gender: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CheckerApproveRequest {
    pub key: RecordKey,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CheckerRejectRequest {
    pub key: RecordKey,
    #[serde(default)]
    pub comments: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
/// Query string of the record listing endpoints.
/// `status` is a comma separated list (`PENDING,REJECTED`), `mine` keeps only
/// the current user's maker submissions.
pub struct RecordsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mine: bool,
}
