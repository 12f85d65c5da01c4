//! Maker-checker review desk.
//!
//! - `GET  /api/reviews/tables`: configured review tables and their keys.
//! - `POST /api/reviews/connect`: selects a table for the session and caches a snapshot.
//! - `POST /api/reviews/refresh`: drops the cached snapshot and reads the table again.
//! - `GET  /api/reviews/records?status=PENDING,REJECTED&mine=true`: cached rows, filtered.
//! - `GET  /api/reviews/summary`: status counts, overall and for the caller.
//! - `POST /api/reviews/maker/submit`: proposes size and gender for one record.
//! - `POST /api/reviews/checker/approve` and `/checker/reject`: decide a pending record.
//!
//! Every write is a guarded UPDATE on the declared key and the status the
//! session last saw; a successful write drops the session's cached snapshot.

use crate::app::AppState;
use crate::config::ReviewTableConfig;
use crate::error::{AppError, AppResult};
use crate::review::{apply_action, load_snapshot, ReviewAction, TableSnapshot};
use crate::services::session_id;
use crate::session::Invalidation;
use actix_web::web::{get, post, scope};
use actix_web::{HttpRequest, Scope};
use common::model::review::TransitionOutcome;
use common::requests::RecordKey;

mod checker;
mod connect;
mod maker;
mod records;
mod summary;
mod tables;

const API_PATH: &str = "/api/reviews";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/tables", get().to(tables::process))
        .route("/connect", post().to(connect::process))
        .route("/refresh", post().to(connect::refresh))
        .route("/records", get().to(records::process))
        .route("/summary", get().to(summary::process))
        .route("/maker/submit", post().to(maker::process))
        .route("/checker/approve", post().to(checker::approve))
        .route("/checker/reject", post().to(checker::reject))
}

pub(crate) struct Connected {
    pub table: ReviewTableConfig,
    pub snapshot: TableSnapshot,
    pub user: String,
}

pub(crate) fn configured_table(state: &AppState, label: &str) -> AppResult<ReviewTableConfig> {
    state
        .config
        .review_table(label)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("review table '{}' is not configured", label)))
}

/// The session's selected table and its snapshot, reading the table again
/// when the cache was dropped.
pub(crate) async fn connected(state: &AppState, id: &str) -> AppResult<Connected> {
    let session = state.sessions.get(id).await?;
    let label = session
        .selected_table
        .ok_or_else(|| AppError::validation("Connect to a review table first"))?;
    let table = configured_table(state, &label)?;

    let snapshot = match session.snapshot {
        Some(snapshot) => snapshot,
        None => {
            let snapshot = load_snapshot(
                state.warehouse.as_ref(),
                &table.table,
                None,
                state.config.read_limit,
            )
            .await?;
            let cached = snapshot.clone();
            state
                .sessions
                .update(id, move |ctx| {
                    if ctx.selected_table.as_deref() == Some(label.as_str()) {
                        ctx.snapshot = Some(cached);
                    }
                })
                .await?;
            snapshot
        }
    };

    Ok(Connected {
        table,
        snapshot,
        user: session.user,
    })
}

/// Shared path of the maker and checker endpoints.
pub(crate) async fn run_action(
    req: &HttpRequest,
    state: &AppState,
    key: &RecordKey,
    action: ReviewAction,
) -> AppResult<TransitionOutcome> {
    let id = session_id(req)?;
    action.validate()?;
    let connected = connected(state, &id).await?;
    let outcome = apply_action(
        state.warehouse.as_ref(),
        &connected.table,
        &connected.snapshot,
        key,
        &action,
        &connected.user,
        state.config.local_now(),
    )
    .await?;
    state.sessions.invalidate(&id, Invalidation::AfterWrite).await?;
    Ok(outcome)
}
