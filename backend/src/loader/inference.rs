use chrono::{NaiveDate, NaiveDateTime};
use common::model::types::{ScannedKind, SqlType, TypeMapping};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Maps an observed column kind to the SQL type declared for it. Total.
pub fn infer_sql_type(kind: &ScannedKind) -> SqlType {
    match kind {
        ScannedKind::Object => SqlType::String,
        ScannedKind::Int64 => SqlType::BigInt,
        ScannedKind::Float64 => SqlType::Double,
        ScannedKind::Bool => SqlType::Boolean,
        ScannedKind::Datetime => SqlType::Timestamp,
        ScannedKind::Unrecognized(_) => SqlType::String,
    }
}

/// Rows for the "supported data types" table.
pub fn type_mappings() -> Vec<TypeMapping> {
    [
        ScannedKind::Object,
        ScannedKind::Int64,
        ScannedKind::Float64,
        ScannedKind::Bool,
        ScannedKind::Datetime,
    ]
    .iter()
    .map(|kind| TypeMapping {
        dtype: kind.dtype_name().to_string(),
        sql_type: infer_sql_type(kind),
    })
    .collect()
}

pub(crate) fn parse_int(cell: &str) -> Option<i64> {
    cell.trim().parse::<i64>().ok()
}

/// Plain decimal and exponent notation, plus NaN. Infinity spellings stay text.
pub(crate) fn parse_float(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.to_ascii_lowercase().contains("inf") {
        return None;
    }
    cell.parse::<f64>().ok()
}

pub(crate) fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_datetime(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Lexical scan of one column. Empty cells are skipped; every other cell,
/// missing-value tokens included, has to agree for a non-object kind.
pub fn scan_column<'a, I>(cells: I) -> ScannedKind
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut all_datetime = true;

    for cell in cells {
        if cell.trim().is_empty() {
            continue;
        }
        seen = true;
        all_int = all_int && parse_int(cell).is_some();
        all_float = all_float && parse_float(cell).is_some();
        all_bool = all_bool && parse_bool(cell).is_some();
        all_datetime = all_datetime && parse_datetime(cell).is_some();
        if !(all_int || all_float || all_bool || all_datetime) {
            return ScannedKind::Object;
        }
    }

    match (seen, all_int, all_float, all_bool, all_datetime) {
        (false, ..) => ScannedKind::Object,
        (true, true, ..) => ScannedKind::Int64,
        (true, false, true, ..) => ScannedKind::Float64,
        (true, false, false, true, _) => ScannedKind::Bool,
        (true, false, false, false, true) => ScannedKind::Datetime,
        _ => ScannedKind::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_one_of_the_five_types() {
        let kinds = [
            ScannedKind::Object,
            ScannedKind::Int64,
            ScannedKind::Float64,
            ScannedKind::Bool,
            ScannedKind::Datetime,
            ScannedKind::from_dtype_name("datetime64[ns, UTC]"),
            ScannedKind::from_dtype_name("category"),
            ScannedKind::from_dtype_name(""),
            ScannedKind::from_dtype_name("complex128"),
        ];
        for kind in &kinds {
            assert!(SqlType::ALL.contains(&infer_sql_type(kind)));
        }
        assert_eq!(
            infer_sql_type(&ScannedKind::from_dtype_name("datetime64[ns, UTC]")),
            SqlType::Timestamp
        );
        assert_eq!(
            infer_sql_type(&ScannedKind::from_dtype_name("category")),
            SqlType::String
        );
    }

    #[test]
    fn scan_detects_numeric_columns() {
        assert_eq!(scan_column(["1", "2", "", "-3"]), ScannedKind::Int64);
        assert_eq!(scan_column(["1", "2.5", "3e2"]), ScannedKind::Float64);
        assert_eq!(scan_column(["1.5", "NaN"]), ScannedKind::Float64);
        assert_eq!(scan_column(["1", "inf"]), ScannedKind::Object);
    }

    #[test]
    fn missing_value_tokens_still_count_in_the_scan() {
        assert_eq!(scan_column(["34", "no data", "41"]), ScannedKind::Object);
    }

    #[test]
    fn scan_detects_bools_and_datetimes() {
        assert_eq!(scan_column(["true", "FALSE", "True"]), ScannedKind::Bool);
        assert_eq!(
            scan_column(["2024-01-05", "2024-01-06 10:00:00", "2024-01-07T08:30:00.250"]),
            ScannedKind::Datetime
        );
        assert_eq!(scan_column(["2024-01-05", "tomorrow"]), ScannedKind::Object);
    }

    #[test]
    fn empty_columns_are_object() {
        assert_eq!(scan_column(["", "  "]), ScannedKind::Object);
        assert_eq!(scan_column(Vec::<&str>::new()), ScannedKind::Object);
    }

    #[test]
    fn mapping_table_lists_the_known_kinds() {
        let mappings = type_mappings();
        assert_eq!(mappings.len(), 5);
        assert_eq!(mappings[1].dtype, "int64");
        assert_eq!(mappings[1].sql_type, SqlType::BigInt);
    }
}
