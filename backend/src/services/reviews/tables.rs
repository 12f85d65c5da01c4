use crate::app::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::review::ReviewTableInfo;

/// Handler for `GET /api/reviews/tables`: always `200 OK` with the configured tables.
pub(crate) async fn process(state: web::Data<AppState>) -> impl Responder {
    let tables: Vec<ReviewTableInfo> = state
        .config
        .review_tables
        .iter()
        .map(|t| ReviewTableInfo {
            label: t.label.clone(),
            table: t.table.to_string(),
            key_columns: t.key_columns.clone(),
        })
        .collect();
    HttpResponse::Ok().json(tables)
}
