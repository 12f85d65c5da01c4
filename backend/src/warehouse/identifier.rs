use crate::error::{AppError, AppResult};
use serde::Serialize;
use std::fmt;

/// A `catalog.schema.name` identifier, used for tables and volumes alike.
///
/// Validation is arity only: three non-empty dot separated parts. Nothing is
/// checked against the warehouse here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QualifiedName {
    pub catalog: String,
    pub schema: String,
    pub name: String,
}

pub type TableName = QualifiedName;
pub type VolumeName = QualifiedName;

impl QualifiedName {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::validation("Please specify a target table name"));
        }
        let parts: Vec<&str> = raw.split('.').map(str::trim).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(AppError::validation(format!(
                "'{}' is not a valid name, expected catalog.schema.name",
                raw
            )));
        }
        Ok(Self {
            catalog: parts[0].to_string(),
            schema: parts[1].to_string(),
            name: parts[2].to_string(),
        })
    }

    pub fn parts(&self) -> [&str; 3] {
        [&self.catalog, &self.schema, &self.name]
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_names() {
        let name = QualifiedName::parse(" dg_dev.sandbox.merchants ").unwrap();
        assert_eq!(name.parts(), ["dg_dev", "sandbox", "merchants"]);
        assert_eq!(name.to_string(), "dg_dev.sandbox.merchants");
    }

    #[test]
    fn rejects_wrong_arity_and_empty_parts() {
        for raw in ["", "merchants", "sandbox.merchants", "a.b.c.d", "a..c"] {
            assert!(
                matches!(QualifiedName::parse(raw), Err(AppError::Validation(_))),
                "{raw} should be rejected"
            );
        }
    }
}
