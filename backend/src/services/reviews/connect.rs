use crate::app::AppState;
use crate::error::AppResult;
use crate::review::{load_snapshot, RecordFilter};
use crate::services::reviews::{configured_table, connected};
use crate::services::session_id;
use crate::session::Invalidation;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::model::review::RecordsView;
use common::requests::ConnectRequest;
use log::info;

/// Handler for `POST /api/reviews/connect`.
///
/// Selects the labelled review table for the session, reads it and caches the snapshot.
///
/// - On success: `200 OK` with the `RecordsView` of every cached row.
/// - `404 Not Found` for an unknown label or session, `502 Bad Gateway` when the read fails.
pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ConnectRequest>,
) -> impl Responder {
    match connect_table(&req, &state, body.into_inner()).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => e.error_response(),
    }
}

/// Handler for `POST /api/reviews/refresh`: drops the cached snapshot and reads the table again.
///
/// - On success: `200 OK` with the fresh `RecordsView`.
/// - `400 Bad Request` when no table is connected.
pub(crate) async fn refresh(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match refresh_table(&req, &state).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => e.error_response(),
    }
}

async fn connect_table(
    req: &HttpRequest,
    state: &AppState,
    request: ConnectRequest,
) -> AppResult<RecordsView> {
    let id = session_id(req)?;
    let table = configured_table(state, &request.table_label)?;
    state.sessions.invalidate(&id, Invalidation::TableSwitch).await?;

    let snapshot = load_snapshot(
        state.warehouse.as_ref(),
        &table.table,
        None,
        state.config.read_limit,
    )
    .await?;
    let view = snapshot.view(&RecordFilter::default());
    state
        .sessions
        .update(&id, |session| {
            session.selected_table = Some(table.label.clone());
            session.snapshot = Some(snapshot);
        })
        .await?;
    info!("session {} connected to {}", id, table.table);
    Ok(view)
}

async fn refresh_table(req: &HttpRequest, state: &AppState) -> AppResult<RecordsView> {
    let id = session_id(req)?;
    state.sessions.invalidate(&id, Invalidation::Refresh).await?;
    let connected = connected(state, &id).await?;
    Ok(connected.snapshot.view(&RecordFilter::default()))
}
