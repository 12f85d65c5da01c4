use crate::app::AppState;
use crate::review::ReviewAction;
use crate::services::reviews::run_action;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::requests::{CheckerApproveRequest, CheckerRejectRequest};
use log::warn;

/// Handler for `POST /api/reviews/checker/approve`.
///
/// - On success: `200 OK` with the `TransitionOutcome` (PENDING -> APPROVED).
/// - `400 Bad Request` for a missing size or gender.
/// - `409 Conflict` when the record is not pending or changed since it was read.
pub(crate) async fn approve(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CheckerApproveRequest>,
) -> impl Responder {
    let CheckerApproveRequest {
        key,
        size,
        gender,
        comments,
    } = body.into_inner();
    let action = ReviewAction::CheckerApprove {
        size,
        gender,
        comments,
    };
    match run_action(&req, &state, &key, action).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => {
            warn!("checker approve rejected: {}", e);
            e.error_response()
        }
    }
}

/// Handler for `POST /api/reviews/checker/reject`. Comments are mandatory.
///
/// - On success: `200 OK` with the `TransitionOutcome` (PENDING -> REJECTED).
/// - On failure: `400`, `404` or `409` with the error message, as for approve.
pub(crate) async fn reject(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CheckerRejectRequest>,
) -> impl Responder {
    let CheckerRejectRequest { key, comments } = body.into_inner();
    match run_action(&req, &state, &key, ReviewAction::CheckerReject { comments }).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => {
            warn!("checker reject rejected: {}", e);
            e.error_response()
        }
    }
}
