//! Session lifecycle.
//!
//! - `POST /api/session`: resolves the caller's identity and opens a session.
//!   The returned id goes into the `X-Session-Id` header of later calls.
//! - `DELETE /api/session`: drops the session and everything cached in it.

use actix_web::web::{delete, post, scope};
use actix_web::Scope;

mod close;
mod open;

const API_PATH: &str = "/api/session";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(open::process))
        .route("", delete().to(close::process))
}
