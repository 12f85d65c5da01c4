use crate::app::AppState;
use crate::error::AppResult;
use crate::services::reviews::connected;
use crate::services::session_id;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::model::review::ReviewSummary;

/// Handler for `GET /api/reviews/summary`.
///
/// - On success: `200 OK` with status counts, overall and for the caller's submissions.
/// - On failure: the error's status code with the error message.
pub(crate) async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match review_summary(&req, &state).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => e.error_response(),
    }
}

async fn review_summary(req: &HttpRequest, state: &AppState) -> AppResult<ReviewSummary> {
    let id = session_id(req)?;
    let connected = connected(state, &id).await?;
    Ok(ReviewSummary {
        table: connected.table.table.to_string(),
        overall: connected.snapshot.counts(None),
        mine: connected.snapshot.counts(Some(&connected.user)),
    })
}
