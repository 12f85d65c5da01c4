use crate::app::AppState;
use crate::review::ReviewAction;
use crate::services::reviews::run_action;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::requests::MakerSubmitRequest;
use log::warn;

/// Handler for `POST /api/reviews/maker/submit`.
///
/// - On success: `200 OK` with the `TransitionOutcome` (now PENDING).
/// - `400 Bad Request` for a missing or unknown size or gender; nothing is written.
/// - `409 Conflict` when the record is already pending or changed since it was read.
pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<MakerSubmitRequest>,
) -> impl Responder {
    let MakerSubmitRequest { key, size, gender } = body.into_inner();
    match run_action(&req, &state, &key, ReviewAction::MakerSubmit { size, gender }).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => {
            warn!("maker submit rejected: {}", e);
            e.error_response()
        }
    }
}
