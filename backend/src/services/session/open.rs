use crate::app::AppState;
use crate::services::host_claim;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::model::session::SessionInfo;
use log::info;

/// Handler for `POST /api/session`. Never fails: an unresolvable identity
/// falls back to the sentinel user.
///
/// Returns `200 OK` with the new session id and the resolved user.
pub(crate) async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let info = open_session(&req, &state).await;
    HttpResponse::Ok().json(info)
}

async fn open_session(req: &HttpRequest, state: &AppState) -> SessionInfo {
    let user = state.identity.resolve(host_claim(req).as_deref()).await;
    let session_id = state.sessions.open(user.clone()).await;
    info!("session {} opened for {}", session_id, user);
    SessionInfo { session_id, user }
}
