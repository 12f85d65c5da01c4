//! CSV bulk loader endpoints.
//!
//! - `POST /api/uploads/preview`: multipart upload with a `file` field. The
//!   file is parsed, its columns scanned and typed, and the parsed dataset
//!   plus the raw bytes are kept in the session. Returns a `DatasetPreview`.
//! - `POST /api/uploads/submit`: JSON `UploadRequest`. Writes the dataset held
//!   in the session to the target table and returns an `UploadSummary`.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod preview;
mod submit;

const API_PATH: &str = "/api/uploads";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/preview", post().to(preview::process))
        .route("/submit", post().to(submit::process))
}
