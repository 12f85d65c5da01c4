use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::loader::{SourceFile, UploadedDataset};
use crate::services::session_id;
use crate::session::PendingUpload;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use bytes::{Bytes, BytesMut};
use common::model::dataset::DatasetPreview;
use futures_util::StreamExt;
use log::info;

/// HTTP handler wrapper that converts the preview result to an `HttpResponse`.
///
/// - On success: returns `200 OK` with the `DatasetPreview` as JSON.
/// - On failure: returns `400 Bad Request` for a missing, oversized, non-CSV or
///   malformed file, `404 Not Found` for an unknown session.
pub(crate) async fn process(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
) -> impl Responder {
    match preview_upload(&req, payload, &state).await {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => e.error_response(),
    }
}

/// Reads the `file` field into memory, refusing anything over `limit` bytes.
async fn read_file_field(mut payload: Multipart, limit: usize) -> AppResult<(String, Bytes)> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::validation(format!("multipart: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(AppError::validation("The file must end with .csv"));
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::validation(format!("multipart: {}", e)))?;
            if buf.len() + chunk.len() > limit {
                return Err(AppError::validation(format!(
                    "The file is larger than {} bytes",
                    limit
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        return Ok((filename, buf.freeze()));
    }
    Err(AppError::validation("Missing file"))
}

async fn preview_upload(
    req: &HttpRequest,
    payload: Multipart,
    state: &AppState,
) -> AppResult<DatasetPreview> {
    let id = session_id(req)?;
    state.sessions.get(&id).await?;

    let (filename, bytes) = read_file_field(payload, state.config.max_upload_bytes).await?;
    let source = SourceFile::new(filename, bytes);

    let null_tokens = state.config.null_tokens.clone();
    let parse_source = source.clone();
    let dataset = tokio::task::spawn_blocking(move || {
        UploadedDataset::parse(&parse_source.name, &parse_source.bytes, &null_tokens)
    })
    .await
    .map_err(|e| AppError::Io {
        message: format!("join error: {}", e),
    })??;

    let preview = dataset.preview(source.bytes.len());
    info!(
        "session {}: {} parsed, {} rows x {} columns (md5 {})",
        id, source.name, preview.rows, preview.columns, source.md5
    );
    state
        .sessions
        .update(&id, |session| {
            session.upload = Some(PendingUpload { dataset, source });
        })
        .await?;
    Ok(preview)
}
