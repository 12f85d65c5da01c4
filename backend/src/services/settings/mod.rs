//! `GET /api/config`: connection settings, upload volume, review tables and
//! the type mapping used by the loader.

use crate::app::AppState;
use crate::config::WarehouseBackend;
use crate::loader::inference::type_mappings;
use crate::storage::volume::volume_root;
use actix_web::web::{get, scope};
use actix_web::{web, HttpResponse, Responder, Scope};
use common::model::review::ReviewTableInfo;
use common::model::session::SettingsView;

const API_PATH: &str = "/api/config";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

/// Handler for `GET /api/config`: `200 OK` with the read-only `SettingsView`.
async fn process(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(settings_view(&state))
}

fn settings_view(state: &AppState) -> SettingsView {
    let config = &state.config;
    let warehouse_backend = match &config.warehouse {
        WarehouseBackend::Sqlite { path, .. } => format!("sqlite ({})", path.display()),
        WarehouseBackend::Databricks => "databricks".to_string(),
    };
    SettingsView {
        warehouse_backend,
        server_hostname: config.databricks.as_ref().map(|d| d.host.clone()),
        http_path: config.databricks.as_ref().map(|d| d.http_path.clone()),
        upload_volume: config.upload_volume.to_string(),
        upload_volume_path: volume_root(&config.upload_volume),
        review_tables: config
            .review_tables
            .iter()
            .map(|t| ReviewTableInfo {
                label: t.label.clone(),
                table: t.table.to_string(),
                key_columns: t.key_columns.clone(),
            })
            .collect(),
        type_mappings: type_mappings(),
        null_tokens: config.null_tokens.clone(),
        read_limit: config.read_limit,
        timezone_offset: config.timezone.to_string(),
        max_bind_parameters: config.max_bind_parameters,
    }
}
