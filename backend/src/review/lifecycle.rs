//! The maker-checker state machine.
//!
//! ```text
//! UNSET ──┐
//! REJECTED├─ maker submit ──> PENDING ──┬─ checker approve ──> APPROVED
//! APPROVED┘                             └─ checker reject  ──> REJECTED
//! ```
//!
//! Planning a transition validates the input and the current state and yields
//! the column assignments to write. It never touches the warehouse.

use crate::error::{AppError, AppResult};
use crate::warehouse::statement::{SqlValue, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use common::model::review::{columns, BusinessSize, Gender, ReviewStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewAction {
    MakerSubmit {
        size: String,
        gender: String,
    },
    CheckerApprove {
        size: String,
        gender: String,
        comments: Option<String>,
    },
    CheckerReject {
        comments: String,
    },
}

impl ReviewAction {
    pub fn name(&self) -> &'static str {
        match self {
            ReviewAction::MakerSubmit { .. } => "maker submit",
            ReviewAction::CheckerApprove { .. } => "checker approve",
            ReviewAction::CheckerReject { .. } => "checker reject",
        }
    }

    /// Input checks only; no state is consulted.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            ReviewAction::MakerSubmit { size, gender }
            | ReviewAction::CheckerApprove { size, gender, .. } => {
                size_and_gender(size, gender).map(|_| ())
            }
            ReviewAction::CheckerReject { comments } => rejection_comments(comments).map(|_| ()),
        }
    }

    pub fn target(&self) -> ReviewStatus {
        match self {
            ReviewAction::MakerSubmit { .. } => ReviewStatus::Pending,
            ReviewAction::CheckerApprove { .. } => ReviewStatus::Approved,
            ReviewAction::CheckerReject { .. } => ReviewStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: ReviewStatus,
    pub to: ReviewStatus,
    pub assignments: Vec<(String, SqlValue)>,
}

pub fn is_allowed(from: ReviewStatus, to: ReviewStatus) -> bool {
    matches!(
        (from, to),
        (ReviewStatus::Unset, ReviewStatus::Pending)
            | (ReviewStatus::Rejected, ReviewStatus::Pending)
            | (ReviewStatus::Approved, ReviewStatus::Pending)
            | (ReviewStatus::Pending, ReviewStatus::Approved)
            | (ReviewStatus::Pending, ReviewStatus::Rejected)
    )
}

fn required<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("Please select a {}", field)));
    }
    Ok(value)
}

fn size_and_gender(size: &str, gender: &str) -> AppResult<(BusinessSize, Gender)> {
    let size = required("business size", size)?
        .parse::<BusinessSize>()
        .map_err(AppError::validation)?;
    let gender = required("gender", gender)?
        .parse::<Gender>()
        .map_err(AppError::validation)?;
    Ok((size, gender))
}

fn rejection_comments(comments: &str) -> AppResult<&str> {
    let comments = comments.trim();
    if comments.is_empty() {
        return Err(AppError::validation("Please provide comments for rejection"));
    }
    Ok(comments)
}

fn assign(column: &str, value: SqlValue) -> (String, SqlValue) {
    (column.to_string(), value)
}

/// Validates `action` against `current` and returns what to write.
pub fn plan(
    action: &ReviewAction,
    current: ReviewStatus,
    actor: &str,
    at: NaiveDateTime,
) -> AppResult<Transition> {
    let stamp = SqlValue::text(at.format(TIMESTAMP_FORMAT).to_string());
    let to = action.target();
    let status = SqlValue::optional_text(to.stored_label());

    let assignments = match action {
        ReviewAction::MakerSubmit { size, gender } => {
            let (size, gender) = size_and_gender(size, gender)?;
            vec![
                assign(columns::SIZE_PENDING, SqlValue::text(size.as_str())),
                assign(columns::GENDER_PENDING, SqlValue::text(gender.as_str())),
                assign(columns::STATUS, status),
                assign(columns::MAKER, SqlValue::text(actor)),
                assign(columns::MAKER_DATE, stamp),
            ]
        }
        ReviewAction::CheckerApprove {
            size,
            gender,
            comments,
        } => {
            let (size, gender) = size_and_gender(size, gender)?;
            vec![
                assign(columns::SIZE, SqlValue::text(size.as_str())),
                assign(columns::GENDER, SqlValue::text(gender.as_str())),
                assign(columns::STATUS, status),
                assign(columns::CHECKER, SqlValue::text(actor)),
                assign(columns::CHECKER_DATE, stamp),
                assign(
                    columns::CHECKER_COMMENTS,
                    SqlValue::optional_text(comments.as_deref().map(str::trim)),
                ),
            ]
        }
        ReviewAction::CheckerReject { comments } => {
            let comments = rejection_comments(comments)?;
            vec![
                assign(columns::STATUS, status),
                assign(columns::CHECKER, SqlValue::text(actor)),
                assign(columns::CHECKER_DATE, stamp),
                assign(columns::CHECKER_COMMENTS, SqlValue::text(comments)),
            ]
        }
    };

    if !is_allowed(current, to) {
        return Err(AppError::InvalidTransition { from: current, to });
    }

    Ok(Transition {
        from: current,
        to,
        assignments,
    })
}
