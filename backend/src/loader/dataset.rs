use crate::error::{AppError, AppResult};
use crate::loader::inference::{
    infer_sql_type, parse_bool, parse_datetime, parse_float, parse_int, scan_column,
};
use crate::warehouse::statement::{ColumnDef, SqlValue};
use common::model::dataset::{ColumnInfo, DatasetPreview};
use common::model::types::{ScannedKind, SqlType};
use regex::Regex;
use std::collections::HashSet;

const SAMPLE_ROWS: usize = 10;
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetColumn {
    pub name: String,
    pub kind: ScannedKind,
    pub sql_type: SqlType,
    pub values: Vec<SqlValue>,
}

/// A parsed upload, stored column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDataset {
    pub file_name: String,
    pub columns: Vec<DatasetColumn>,
    pub row_count: usize,
}

/// The most frequent candidate in the header line wins; ties and headers
/// without any candidate fall back to a comma.
pub fn detect_delimiter(header_line: &str) -> u8 {
    DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, header_line.bytes().filter(|b| *b == d).count()))
        .fold((b',', 0), |best, current| {
            if current.1 > best.1 {
                current
            } else {
                best
            }
        })
        .0
}

fn validate_header_cells(headers: &[String]) -> AppResult<()> {
    let header_re = Regex::new(r"^[^\p{Cc}]+$")
        .map_err(|e| AppError::validation(format!("Regex error: {}", e)))?;
    let mut seen = HashSet::new();
    for (idx, title) in headers.iter().enumerate() {
        if title.is_empty() {
            return Err(AppError::validation(format!(
                "CSV header cell {} must not be empty",
                idx + 1
            )));
        }
        if !header_re.is_match(title) {
            return Err(AppError::validation(format!(
                "CSV header cell '{}' contains control characters",
                title.escape_debug()
            )));
        }
        if !seen.insert(title.as_str()) {
            return Err(AppError::validation(format!(
                "CSV header '{}' appears more than once",
                title
            )));
        }
    }
    Ok(())
}

fn typed_value(cell: &str, kind: &ScannedKind, null_tokens: &[String]) -> SqlValue {
    if cell.trim().is_empty() || null_tokens.iter().any(|t| t == cell || t == cell.trim()) {
        return SqlValue::Null;
    }
    let parsed = match kind {
        ScannedKind::Int64 => parse_int(cell).map(SqlValue::BigInt),
        ScannedKind::Float64 => parse_float(cell).map(SqlValue::Double),
        ScannedKind::Bool => parse_bool(cell).map(SqlValue::Boolean),
        ScannedKind::Datetime => parse_datetime(cell).map(SqlValue::Timestamp),
        ScannedKind::Object | ScannedKind::Unrecognized(_) => None,
    };
    parsed.unwrap_or_else(|| SqlValue::text(cell))
}

impl UploadedDataset {
    /// Parses CSV bytes. `null_tokens` are the cell texts that bind as NULL.
    pub fn parse(file_name: &str, bytes: &[u8], null_tokens: &[String]) -> AppResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| AppError::validation("The uploaded file is not valid UTF-8"))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let header_line = text.lines().next().unwrap_or_default();
        if header_line.trim().is_empty() {
            return Err(AppError::validation("The uploaded file has no header row"));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(detect_delimiter(header_line))
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        validate_header_cells(&headers)?;

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut row_count = 0;
        for record in reader.records() {
            let record = record?;
            for (idx, cell) in record.iter().enumerate() {
                raw[idx].push(cell.to_string());
            }
            row_count += 1;
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| {
                let kind = scan_column(cells.iter().map(String::as_str));
                let values = cells
                    .iter()
                    .map(|cell| typed_value(cell, &kind, null_tokens))
                    .collect();
                DatasetColumn {
                    name,
                    sql_type: infer_sql_type(&kind),
                    kind,
                    values,
                }
            })
            .collect();

        Ok(Self {
            file_name: file_name.to_string(),
            columns,
            row_count,
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_defs(&self) -> Vec<ColumnDef> {
        self.columns
            .iter()
            .map(|c| ColumnDef {
                name: c.name.clone(),
                sql_type: c.sql_type,
            })
            .collect()
    }

    /// Row-major copy of the values, in column order.
    pub fn rows(&self) -> Vec<Vec<SqlValue>> {
        (0..self.row_count)
            .map(|row| self.columns.iter().map(|c| c.values[row].clone()).collect())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Sets every row of `name` to `value`, replacing a column of the same name.
    pub fn set_constant_column(&mut self, name: &str, sql_type: SqlType, value: SqlValue) {
        let kind = match sql_type {
            SqlType::Timestamp => ScannedKind::Datetime,
            SqlType::BigInt => ScannedKind::Int64,
            SqlType::Double => ScannedKind::Float64,
            SqlType::Boolean => ScannedKind::Bool,
            SqlType::String => ScannedKind::Object,
        };
        let column = DatasetColumn {
            name: name.to_string(),
            kind,
            sql_type,
            values: vec![value; self.row_count],
        };
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn preview(&self, file_size_bytes: usize) -> DatasetPreview {
        let column_info = self
            .columns
            .iter()
            .map(|c| {
                let nulls = c.values.iter().filter(|v| v.is_null()).count();
                ColumnInfo {
                    name: c.name.clone(),
                    dtype: c.kind.dtype_name().to_string(),
                    sql_type: c.sql_type,
                    non_null: self.row_count - nulls,
                    nulls,
                }
            })
            .collect();
        let sample = (0..self.row_count.min(SAMPLE_ROWS))
            .map(|row| self.columns.iter().map(|c| c.values[row].as_text()).collect())
            .collect();
        DatasetPreview {
            file_name: self.file_name.clone(),
            file_size_bytes,
            rows: self.row_count,
            columns: self.columns.len(),
            column_info,
            sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NULL_TOKENS;

    fn tokens() -> Vec<String> {
        DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn no_data_makes_age_a_string_column_with_a_null() {
        let csv = b"name,age\nAna,34\nBo,no data\nCy,41\n";
        let dataset = UploadedDataset::parse("people.csv", csv, &tokens()).unwrap();
        assert_eq!(dataset.row_count, 3);
        let age = &dataset.columns[1];
        assert_eq!(age.kind, ScannedKind::Object);
        assert_eq!(age.sql_type, SqlType::String);
        assert_eq!(
            age.values,
            vec![SqlValue::text("34"), SqlValue::Null, SqlValue::text("41")]
        );
    }

    #[test]
    fn typed_columns_bind_typed_values() {
        let csv = b"id;score;active;seen\n1;2.5;true;2024-01-02\n2;;false;2024-01-03 04:05:06\n";
        let dataset = UploadedDataset::parse("x.csv", csv, &tokens()).unwrap();
        let types: Vec<SqlType> = dataset.columns.iter().map(|c| c.sql_type).collect();
        assert_eq!(
            types,
            [SqlType::BigInt, SqlType::Double, SqlType::Boolean, SqlType::Timestamp]
        );
        assert_eq!(dataset.rows()[1][1], SqlValue::Null);
        assert_eq!(dataset.rows()[0][0], SqlValue::BigInt(1));
    }

    #[test]
    fn delimiter_is_the_most_frequent_candidate() {
        assert_eq!(detect_delimiter("a|b|c"), b'|');
        assert_eq!(detect_delimiter("a\tb\tc,d"), b'\t');
        assert_eq!(detect_delimiter("single"), b',');
    }

    #[test]
    fn header_cells_must_be_present_and_unique() {
        assert!(UploadedDataset::parse("x.csv", b"a,,c\n1,2,3\n", &tokens()).is_err());
        assert!(UploadedDataset::parse("x.csv", b"a,b,a\n1,2,3\n", &tokens()).is_err());
        assert!(UploadedDataset::parse("x.csv", b"", &tokens()).is_err());
        assert!(UploadedDataset::parse("x.csv", "\"naïve col\",select\n1,2\n".as_bytes(), &tokens()).is_ok());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = UploadedDataset::parse("x.csv", b"a,b\n1,2\n3\n", &tokens()).unwrap_err();
        assert!(matches!(err, AppError::Csv(_)));
    }

    #[test]
    fn constant_columns_fill_every_row_and_replace_by_name() {
        let mut dataset = UploadedDataset::parse("x.csv", b"a\n1\n2\n", &tokens()).unwrap();
        dataset.set_constant_column("uploaded_by", SqlType::String, SqlValue::text("ana@corp.com"));
        dataset.set_constant_column("uploaded_by", SqlType::String, SqlValue::text("bo@corp.com"));
        assert_eq!(dataset.column_names(), ["a", "uploaded_by"]);
        assert_eq!(dataset.rows()[1][1], SqlValue::text("bo@corp.com"));
    }

    #[test]
    fn preview_counts_nulls_and_samples_ten_rows() {
        let mut csv = String::from("v\n");
        for i in 0..12 {
            if i == 3 {
                csv.push_str("NA\n");
            } else {
                csv.push_str(&format!("{}\n", i));
            }
        }
        let dataset = UploadedDataset::parse("x.csv", csv.as_bytes(), &tokens()).unwrap();
        let preview = dataset.preview(csv.len());
        assert_eq!(preview.rows, 12);
        assert_eq!(preview.sample.len(), 10);
        assert_eq!(preview.column_info[0].nulls, 1);
        assert_eq!(preview.column_info[0].dtype, "object");
        assert_eq!(preview.sample[3][0], None);
    }
}
