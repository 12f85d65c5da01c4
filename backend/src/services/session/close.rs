use crate::app::AppState;
use crate::error::AppResult;
use crate::services::session_id;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};

/// Handler for `DELETE /api/session`.
///
/// - `204 No Content` once the session is dropped.
/// - `404 Not Found` when it does not exist.
pub(crate) async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match close_session(&req, &state).await {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().body("Session not found"),
        Err(e) => e.error_response(),
    }
}

async fn close_session(req: &HttpRequest, state: &AppState) -> AppResult<bool> {
    let id = session_id(req)?;
    Ok(state.sessions.close(&id).await)
}
