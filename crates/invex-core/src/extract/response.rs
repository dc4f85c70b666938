//! Turning free-form model output into typed tables.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::ParseError;
use crate::models::table::{CellValue, Table};

lazy_static! {
    // Opening marker is case-sensitive; whitespace around the payload is dropped.
    static ref CSV_FENCE: Regex = Regex::new(r"(?s)```csv\s*(.*?)\s*```").unwrap();
}

/// Name of the column holding the run timestamp.
pub const TIMESTAMP_COLUMN: &str = "updated_at";

/// Spellings treated as a missing value.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// The shape of a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePayload<'a> {
    /// The response wraps its data in a csv fenced block; holds the enclosed text.
    Fenced(&'a str),
    /// No fenced block; the whole response is the candidate payload.
    Raw(&'a str),
}

impl<'a> ResponsePayload<'a> {
    /// Classify a response by looking for the first csv fenced block.
    pub fn detect(response: &'a str) -> Self {
        match CSV_FENCE.captures(response).and_then(|caps| caps.get(1)) {
            Some(m) => ResponsePayload::Fenced(m.as_str()),
            None => ResponsePayload::Raw(response),
        }
    }

    /// Text to hand to the CSV reader.
    pub fn text(&self) -> &'a str {
        match self {
            ResponsePayload::Fenced(text) | ResponsePayload::Raw(text) => text,
        }
    }

    pub fn is_fenced(&self) -> bool {
        matches!(self, ResponsePayload::Fenced(_))
    }
}

/// Return the contents of the first csv fenced block, or the whole text.
pub fn extract_csv(response: &str) -> &str {
    ResponsePayload::detect(response).text()
}

/// Parse comma-separated text with a header row into a typed table.
///
/// Lines holding only whitespace are skipped, but blank lines inside quoted
/// fields are kept. Fields are taken verbatim. A row whose field count
/// differs from the header is a [`ParseError::Malformed`].
pub fn parse_csv(payload: &str) -> Result<Table, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(payload.as_bytes());

    let mut records = reader.records().filter(|record| match record {
        Ok(record) => !is_blank_record(record),
        Err(_) => true,
    });

    let header = records.next().ok_or(ParseError::Empty)??;
    let columns = normalize_headers(header.iter());

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in records {
        let record = record?;
        if record.len() != columns.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(ParseError::Malformed {
                reason: format!(
                    "line {line} has {} fields, header has {}",
                    record.len(),
                    columns.len()
                ),
            });
        }
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|idx| infer_column(raw_rows.iter().map(|row| row[idx].as_str())))
        .collect();

    let mut table = Table::new(columns);
    for row in raw_rows {
        let cells = row
            .into_iter()
            .zip(&kinds)
            .map(|(value, kind)| kind.convert(value))
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

/// Trait for turning one raw model response into a table.
pub trait ResponseParser {
    /// Parse a raw response.
    fn parse(&self, response: &str) -> Result<Table, ParseError>;
}

/// Fenced-block CSV parser that stamps every row with the run timestamp.
#[derive(Debug, Clone)]
pub struct CsvResponseParser {
    timestamp: Option<NaiveDateTime>,
}

impl CsvResponseParser {
    /// Create a parser that appends `timestamp` to every parsed table.
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }

    /// Create a parser that leaves tables as parsed.
    pub fn without_timestamp() -> Self {
        Self { timestamp: None }
    }
}

impl ResponseParser for CsvResponseParser {
    fn parse(&self, response: &str) -> Result<Table, ParseError> {
        let payload = ResponsePayload::detect(response);
        debug!(fenced = payload.is_fenced(), len = payload.text().len(), "Parsing model response");

        let table = parse_csv(payload.text())?;
        Ok(match self.timestamp {
            Some(ts) => table.with_constant_column(TIMESTAMP_COLUMN, CellValue::DateTime(ts)),
            None => table,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    Bool,
    Text,
}

impl ColumnKind {
    fn convert(self, value: String) -> CellValue {
        if is_null_marker(&value) {
            return CellValue::Empty;
        }
        match self {
            ColumnKind::Number => parse_number(&value)
                .map(CellValue::Number)
                .unwrap_or(CellValue::Text(value)),
            ColumnKind::Bool => parse_bool(&value)
                .map(CellValue::Bool)
                .unwrap_or(CellValue::Text(value)),
            ColumnKind::Text => CellValue::Text(value),
        }
    }
}

/// A column is numeric (or boolean) only if every non-missing value is.
fn infer_column<'a>(values: impl Iterator<Item = &'a str> + Clone) -> ColumnKind {
    let mut present = values.filter(|v| !is_null_marker(v));
    let all_numbers = present.clone().all(|v| parse_number(v).is_some());
    if all_numbers {
        ColumnKind::Number
    } else if present.all(|v| parse_bool(v).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

fn is_blank_record(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn is_null_marker(value: &str) -> bool {
    NULL_MARKERS.contains(&value)
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Fill blank header names and disambiguate duplicates as `name.1`, `name.2`.
fn normalize_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .enumerate()
        .map(|(idx, raw)| {
            let base = if raw.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                raw.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn run_ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    #[test]
    fn test_extract_fenced_block() {
        let response = "Here is the data you asked for:\n\n```csv\nDate,Amount\n12/03/2024,450\n```\n\nLet me know if you need more.";
        assert_eq!(extract_csv(response), "Date,Amount\n12/03/2024,450");
        assert!(ResponsePayload::detect(response).is_fenced());
    }

    #[test]
    fn test_extract_first_block_only() {
        let response = "```csv\na,b\n1,2\n```\nand\n```csv\nc\n3\n```";
        assert_eq!(extract_csv(response), "a,b\n1,2");
    }

    #[test]
    fn test_extract_without_fence_returns_input() {
        let response = "Date,Amount\n12/03/2024,450\n";
        assert_eq!(extract_csv(response), response);
        assert_eq!(ResponsePayload::detect(response), ResponsePayload::Raw(response));
    }

    #[test]
    fn test_fence_marker_is_case_sensitive() {
        let response = "```CSV\na,b\n1,2\n```";
        assert_eq!(extract_csv(response), response);

        let response = "```json\n{}\n```";
        assert!(!ResponsePayload::detect(response).is_fenced());
    }

    #[test]
    fn test_parse_types_and_nulls() {
        let table = parse_csv(
            "Item_Service Name,Quantity/QTY,Rate,Batch\n\
             Paracetamol 500mg,10,2.5,NaN\n\
             \n\
             Cough Syrup,NaN,45,B-17\n",
        )
        .unwrap();

        assert_eq!(table.columns(), ["Item_Service Name", "Quantity/QTY", "Rate", "Batch"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.rows()[0],
            vec![
                CellValue::Text("Paracetamol 500mg".into()),
                CellValue::Number(10.0),
                CellValue::Number(2.5),
                CellValue::Empty,
            ]
        );
        assert_eq!(table.rows()[1][1], CellValue::Empty);
        assert_eq!(table.rows()[1][3], CellValue::Text("B-17".into()));
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let table = parse_csv("Seller Invoice No\n1042\nINV-77\n").unwrap();
        assert_eq!(
            table.column("Seller Invoice No").unwrap(),
            [&CellValue::Text("1042".into()), &CellValue::Text("INV-77".into())]
        );
    }

    #[test]
    fn test_quoted_fields_keep_spacing() {
        let table = parse_csv("Seller Name, Discount\n\"Acme, Pvt Ltd\", 5\n").unwrap();
        assert_eq!(table.columns(), ["Seller Name", " Discount"]);
        assert_eq!(table.rows()[0][0], CellValue::Text("Acme, Pvt Ltd".into()));
        assert_eq!(table.rows()[0][1], CellValue::Number(5.0));
    }

    #[test]
    fn test_blank_line_inside_quotes_is_kept() {
        let table = parse_csv("Description,Amount\n\"Line one\n\nLine three\",10\n  \nSecond,20\n").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.rows()[0][0],
            CellValue::Text("Line one\n\nLine three".into())
        );
        assert_eq!(table.rows()[1][1], CellValue::Number(20.0));
    }

    #[test]
    fn test_leading_blank_lines_before_header() {
        let table = parse_csv("\n   \nDate,Amount\n12/03/2024,450\n").unwrap();
        assert_eq!(table.columns(), ["Date", "Amount"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let table = parse_csv("Amount,,Amount\n1,2,3\n").unwrap();
        assert_eq!(table.columns(), ["Amount", "Unnamed: 1", "Amount.1"]);
    }

    #[test]
    fn test_header_only() {
        let table = parse_csv("Date,Amount").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_column_count_mismatch_is_malformed() {
        let err = parse_csv("Date,Amount\n12/03/2024,450,extra\n").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));

        let err = parse_csv("Date,Amount\n12/03/2024\n").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(parse_csv("  \n\n "), Err(ParseError::Empty)));
    }

    #[test]
    fn test_parser_appends_timestamp() {
        let parser = CsvResponseParser::new(run_ts());
        let table = parser
            .parse("```csv\nDate,Seller Name\n01/01/2025,Acme\n02/01/2025,Beta\n```")
            .unwrap();

        assert_eq!(table.columns(), ["Date", "Seller Name", "updated_at"]);
        assert!(table.rows().iter().all(|r| r[2] == CellValue::DateTime(run_ts())));
    }

    #[test]
    fn test_parser_rejects_prose() {
        let parser = CsvResponseParser::new(run_ts());
        let err = parser
            .parse("I could not find an invoice in this image.\nThe picture is blurry, sorry, please retry.")
            .unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn test_round_trip_keeps_header_spacing() {
        let payload = "Seller Name, Discount\nAcme,Net 30\n";
        let table = CsvResponseParser::without_timestamp().parse(payload).unwrap();

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), payload);
    }

    #[test]
    fn test_parse_then_serialize_round_trip() {
        let payload = "Date,Seller Invoice No,Amount\n05/04/2024,INV-1,1200.5\n06/04/2024,INV-2,80\n";
        let table = CsvResponseParser::without_timestamp().parse(payload).unwrap();

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), payload);
    }
}
