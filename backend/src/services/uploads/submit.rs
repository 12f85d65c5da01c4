use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::loader::{run_upload, UploadContext};
use crate::services::session_id;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::model::upload::UploadSummary;
use common::requests::UploadRequest;
use log::error;

/// Handler for `POST /api/uploads/submit`.
///
/// - On success: returns `200 OK` with the `UploadSummary`.
/// - On failure: `400 Bad Request` for validation errors raised before the
///   backup, `502 Bad Gateway` when the warehouse or the volume fails.
pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<UploadRequest>,
) -> impl Responder {
    match submit_upload(&req, &state, body.into_inner()).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            error!("upload failed: {}", e);
            e.error_response()
        }
    }
}

async fn submit_upload(
    req: &HttpRequest,
    state: &AppState,
    request: UploadRequest,
) -> AppResult<UploadSummary> {
    let id = session_id(req)?;
    let session = state.sessions.get(&id).await?;
    let pending = session
        .upload
        .ok_or_else(|| AppError::validation("Please upload a CSV file first"))?;

    let ctx = UploadContext {
        warehouse: state.warehouse.as_ref(),
        volume: state.volume.as_ref(),
        access: state.access.as_ref(),
        upload_volume: &state.config.upload_volume,
        max_bind_parameters: state.config.max_bind_parameters,
        now: state.config.local_now(),
        user: &session.user,
    };
    run_upload(&ctx, &pending.dataset, &pending.source, &request).await
}
