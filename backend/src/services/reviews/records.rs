use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::review::RecordFilter;
use crate::services::reviews::connected;
use crate::services::session_id;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::model::review::{RecordsView, ReviewStatus};
use common::requests::RecordsQuery;

/// Handler for `GET /api/reviews/records`.
///
/// Filters the cached snapshot, reading the table first when the cache was dropped.
///
/// - On success: `200 OK` with the matching rows as a `RecordsView`.
/// - `400 Bad Request` for an unknown status or when no table is connected.
pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<RecordsQuery>,
) -> impl Responder {
    match list_records(&req, &state, query.into_inner()).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => e.error_response(),
    }
}

/// `PENDING,REJECTED` → statuses; blank means no status filter.
fn parse_statuses(raw: Option<&str>) -> AppResult<Option<Vec<ReviewStatus>>> {
    let raw = match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw,
        None => return Ok(None),
    };
    raw.split(',')
        .map(|s| s.parse::<ReviewStatus>().map_err(AppError::validation))
        .collect::<AppResult<Vec<_>>>()
        .map(Some)
}

async fn list_records(
    req: &HttpRequest,
    state: &AppState,
    query: RecordsQuery,
) -> AppResult<RecordsView> {
    let id = session_id(req)?;
    let statuses = parse_statuses(query.status.as_deref())?;
    let connected = connected(state, &id).await?;
    let filter = RecordFilter {
        statuses,
        maker: query.mine.then(|| connected.user.clone()),
    };
    Ok(connected.snapshot.view(&filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lists_parse_case_insensitively() {
        assert_eq!(parse_statuses(None).unwrap(), None);
        assert_eq!(parse_statuses(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_statuses(Some("pending, REJECTED")).unwrap(),
            Some(vec![ReviewStatus::Pending, ReviewStatus::Rejected])
        );
        assert!(parse_statuses(Some("PENDING,DONE")).is_err());
    }
}
