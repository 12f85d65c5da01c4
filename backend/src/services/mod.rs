//! HTTP surface. Each area exposes `configure_routes()` returning its scope;
//! each endpoint lives in its own file with a `process` handler.

pub mod reviews;
pub mod session;
pub mod settings;
pub mod uploads;

use crate::error::{AppError, AppResult};
use crate::identity::FORWARDED_EMAIL_HEADER;
use actix_web::HttpRequest;

pub const SESSION_HEADER: &str = "X-Session-Id";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Session id sent by the client on every call after `POST /api/session`.
pub(crate) fn session_id(req: &HttpRequest) -> AppResult<String> {
    header(req, SESSION_HEADER)
        .map(str::to_string)
        .ok_or_else(|| AppError::validation(format!("missing {} header", SESSION_HEADER)))
}

/// User claim injected by the hosting platform's proxy, if any.
pub(crate) fn host_claim(req: &HttpRequest) -> Option<String> {
    header(req, FORWARDED_EMAIL_HEADER).map(str::to_string)
}
