use crate::model::types::ColumnSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column names of a reviewed table that the maker-checker workflow writes.
pub mod columns {
    pub const SIZE_PENDING: &str = "business_reviewed_size_pending";
    pub const GENDER_PENDING: &str = "business_reviewed_gender_pending";
    pub const STATUS: &str = "review_status";
    pub const MAKER: &str = "reviewed_by_maker";
    pub const MAKER_DATE: &str = "reviewed_date_maker";
    pub const SIZE: &str = "business_reviewed_size";
    pub const GENDER: &str = "business_reviewed_gender";
    pub const CHECKER: &str = "reviewed_by_checker";
    pub const CHECKER_DATE: &str = "reviewed_date_checker";
    pub const CHECKER_COMMENTS: &str = "checker_comments";
}

/// Review state of one record. `Unset` is stored as NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    Unset,
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    /// The label stored in `review_status`, `None` for `Unset`.
    pub fn stored_label(&self) -> Option<&'static str> {
        match self {
            ReviewStatus::Unset => None,
            ReviewStatus::Pending => Some("PENDING"),
            ReviewStatus::Approved => Some("APPROVED"),
            ReviewStatus::Rejected => Some("REJECTED"),
        }
    }

    /// Reads a stored label. Empty and missing values are `Unset`.
    pub fn from_stored(label: Option<&str>) -> Result<Self, String> {
        match label.map(str::trim) {
            None | Some("") => Ok(ReviewStatus::Unset),
            Some("PENDING") => Ok(ReviewStatus::Pending),
            Some("APPROVED") => Ok(ReviewStatus::Approved),
            Some("REJECTED") => Ok(ReviewStatus::Rejected),
            Some(other) => Err(format!("unknown review status '{}'", other)),
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stored_label().unwrap_or("UNSET"))
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNSET" => Ok(ReviewStatus::Unset),
            other => ReviewStatus::from_stored(Some(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BusinessSize {
    Micro,
    Small,
    Medium,
    Large,
}

impl BusinessSize {
    pub const OPTIONS: [&'static str; 4] = ["MICRO", "SMALL", "MEDIUM", "LARGE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessSize::Micro => "MICRO",
            BusinessSize::Small => "SMALL",
            BusinessSize::Medium => "MEDIUM",
            BusinessSize::Large => "LARGE",
        }
    }
}

impl FromStr for BusinessSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MICRO" => Ok(BusinessSize::Micro),
            "SMALL" => Ok(BusinessSize::Small),
            "MEDIUM" => Ok(BusinessSize::Medium),
            "LARGE" => Ok(BusinessSize::Large),
            other => Err(format!(
                "business size must be one of {}, got '{}'",
                Self::OPTIONS.join(", "),
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const OPTIONS: [&'static str; 2] = ["MALE", "FEMALE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            other => Err(format!(
                "gender must be one of {}, got '{}'",
                Self::OPTIONS.join(", "),
                other
            )),
        }
    }
}

/// A review table the desk can connect to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTableInfo {
    pub label: String,
    pub table: String,
    pub key_columns: Vec<String>,
}

/// Records of the connected table as served to the review pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsView {
    pub table: String,
    pub schema: Vec<ColumnSchema>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Status counts of the connected table, overall and for the caller's submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub table: String,
    pub overall: ReviewCounts,
    pub mine: ReviewCounts,
}

/// Result of one accepted maker or checker action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub table: String,
    pub from: ReviewStatus,
    pub to: ReviewStatus,
    pub actor: String,
    pub at: String,
}
