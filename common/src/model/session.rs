use crate::model::review::ReviewTableInfo;
use crate::model::types::TypeMapping;
use serde::{Deserialize, Serialize};

/// Answer to `POST /api/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub user: String,
}

/// Read-only view of the backend configuration for the settings page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsView {
    pub warehouse_backend: String,
    pub server_hostname: Option<String>,
    pub http_path: Option<String>,
    pub upload_volume: String,
    pub upload_volume_path: String,
    pub review_tables: Vec<ReviewTableInfo>,
    pub type_mappings: Vec<TypeMapping>,
    pub null_tokens: Vec<String>,
    pub read_limit: usize,
    pub timezone_offset: String,
    pub max_bind_parameters: usize,
}
