//! Response normalization: any upstream response shape → `Vec<Table>`.
//!
//! The excluded networking layer hands us one of four payloads, depending
//! on which backend processed the document:
//!
//! | Shape | Produced by | Modelled as |
//! |-------|-------------|-------------|
//! | markdown text | layout service, markdown endpoint | [`RawResponse::Markdown`] |
//! | `[markdown, html, source, …]` | document-parsing service tuple | [`RawResponse::MarkdownTuple`] |
//! | `{result: [ {type, res: {html\|cells}} ]}` | structure-recognition regions | [`RawResponse::Regions`] |
//! | `{tables: [ {columnNames, rows} ]}` | prompt-based AI extractor | [`RawResponse::AiTables`] |
//!
//! Every shape goes through [`RawResponse::extract`], which never fails:
//! a response with no recognisable table yields an empty [`Extraction`], and
//! regions that could not be parsed are listed in [`Extraction::skipped`].

use crate::error::{DocQuoteError, RegionError};
use crate::parse::{
    cells::{grid_fits, MAX_GRID_CELLS},
    lines::collect_text_lines,
    CellRecord, TableSource,
};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Tables recovered from one response, plus the regions that yielded none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub tables: Vec<Table>,
    pub skipped: Vec<RegionError>,
}

impl Extraction {
    fn from_tables(tables: Vec<Table>) -> Self {
        Self {
            tables,
            skipped: Vec::new(),
        }
    }

    /// True when no table was found. Not an error.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// How to interpret a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseFormat {
    /// Sniff the shape with [`RawResponse::detect`]. (default)
    #[default]
    Auto,
    /// Treat the body as markdown text even if it happens to be valid JSON.
    Markdown,
    /// JSON array whose first element is markdown.
    Tuple,
    /// Structure-recognition region JSON.
    Regions,
    /// Prompt-extractor `{tables: […]}` JSON.
    Ai,
}

/// A decoded upstream response, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Markdown(String),
    MarkdownTuple(Value),
    Regions(Value),
    AiTables(Value),
}

impl RawResponse {
    /// Classify a response body.
    ///
    /// Non-JSON text is markdown. JSON is classified by [`RawResponse::from_json`].
    pub fn detect(body: &str) -> Self {
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => Self::from_json(value),
            Err(_) => RawResponse::Markdown(body.to_string()),
        }
    }

    /// Classify an already-parsed JSON response.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => RawResponse::Markdown(s),
            Value::Array(ref items) if items.first().is_some_and(Value::is_string) => {
                RawResponse::MarkdownTuple(value)
            }
            Value::Object(ref obj) if obj.get("tables").is_some_and(Value::is_array) => {
                RawResponse::AiTables(value)
            }
            other => RawResponse::Regions(other),
        }
    }

    /// Interpret `body` as the given format.
    ///
    /// # Errors
    /// [`DocQuoteError::InvalidJson`] when a JSON format is forced and the
    /// body does not parse.
    pub fn parse_as(body: &str, format: ResponseFormat) -> Result<Self, DocQuoteError> {
        let json = || {
            serde_json::from_str::<Value>(body.trim())
                .map_err(|source| DocQuoteError::InvalidJson { source })
        };
        Ok(match format {
            ResponseFormat::Auto => Self::detect(body),
            ResponseFormat::Markdown => RawResponse::Markdown(body.to_string()),
            ResponseFormat::Tuple => RawResponse::MarkdownTuple(json()?),
            ResponseFormat::Regions => RawResponse::Regions(json()?),
            ResponseFormat::Ai => RawResponse::AiTables(json()?),
        })
    }

    /// Short name of the shape, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RawResponse::Markdown(_) => "markdown",
            RawResponse::MarkdownTuple(_) => "tuple",
            RawResponse::Regions(_) => "regions",
            RawResponse::AiTables(_) => "ai",
        }
    }

    /// Extract every table the response carries.
    pub fn extract(&self) -> Extraction {
        let extraction = match self {
            RawResponse::Markdown(md) => {
                Extraction::from_tables(TableSource::Markdown(md.clone()).parse())
            }
            RawResponse::MarkdownTuple(value) => extract_tuple(value),
            RawResponse::Regions(value) => normalize_regions(value),
            RawResponse::AiTables(value) => extract_ai_tables(value),
        };
        info!(
            "Extracted {} table(s) from {} response ({} region(s) skipped)",
            extraction.tables.len(),
            self.kind(),
            extraction.skipped.len()
        );
        extraction
    }
}

/// Detect the shape of `body` and extract its tables.
pub fn extract_tables(body: &str) -> Extraction {
    RawResponse::detect(body).extract()
}

// ── Region payloads ──────────────────────────────────────────────────────

/// The region list inside a structure-recognition response.
///
/// Checks `result`, then `data`, then falls back to the value itself. Null,
/// `false`, `0` and `""` count as absent.
pub fn locate_payload(response: &Value) -> &Value {
    ["result", "data"]
        .iter()
        .filter_map(|key| response.get(*key))
        .find(|v| is_truthy(v))
        .unwrap_or(response)
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Turn a structure-recognition response into tables.
///
/// Regions typed `table` that carry a `res` payload are parsed as HTML
/// first, then as a cell grid. When no region yields a table, the text of
/// all items is fed once to the line parser as a last resort.
pub fn normalize_regions(response: &Value) -> Extraction {
    let payload = locate_payload(response);
    let Some(items) = payload.as_array() else {
        warn!("Unrecognised structure response: payload is not an array");
        return Extraction::default();
    };

    let mut extraction = Extraction::default();
    for (i, item) in items.iter().enumerate() {
        if item.get("type").and_then(Value::as_str) != Some("table") {
            continue;
        }
        let Some(res) = item.get("res").filter(|r| is_truthy(r)) else {
            continue;
        };
        match table_from_region(i, res) {
            Ok(table) => {
                debug!(
                    "Region {}: {} columns, {} rows",
                    i,
                    table.column_count(),
                    table.rows.len()
                );
                extraction.tables.push(table);
            }
            Err(e) => {
                debug!("{}", e);
                extraction.skipped.push(e);
            }
        }
    }

    if extraction.tables.is_empty() && !items.is_empty() {
        let lines = collect_text_lines(items);
        if let Some(table) = TableSource::Lines(lines).parse().into_iter().next() {
            debug!("Fallback line parser recovered {} rows", table.rows.len());
            extraction.tables.push(table);
        }
    }

    extraction
}

fn table_from_region(region: usize, res: &Value) -> Result<Table, RegionError> {
    let mut malformed = None;

    if let Some(html) = res.get("html").filter(|v| !v.is_null()) {
        match html.as_str() {
            Some(s) => {
                if let Some(t) = first_table(TableSource::Html(s.to_string())) {
                    return Ok(t);
                }
            }
            None => {
                malformed = Some(RegionError::Malformed {
                    region,
                    field: "html".to_string(),
                })
            }
        }
    }

    if let Some(cells) = res.get("cells").filter(|v| !v.is_null()) {
        match cells.as_array() {
            Some(arr) => {
                let records: Vec<CellRecord> =
                    arr.iter().filter_map(CellRecord::from_json).collect();
                if !grid_fits(&records) {
                    warn!(
                        "Region {}: cell grid exceeds {} cells, skipped",
                        region, MAX_GRID_CELLS
                    );
                    return Err(RegionError::Malformed {
                        region,
                        field: "cells".to_string(),
                    });
                }
                if let Some(t) = first_table(TableSource::Cells(records)) {
                    return Ok(t);
                }
            }
            None => {
                malformed.get_or_insert(RegionError::Malformed {
                    region,
                    field: "cells".to_string(),
                });
            }
        }
    }

    Err(malformed.unwrap_or(RegionError::NoTable { region }))
}

/// First table with at least one column.
fn first_table(source: TableSource) -> Option<Table> {
    source.parse().into_iter().find(|t| t.column_count() > 0)
}

// ── Other shapes ─────────────────────────────────────────────────────────

fn extract_tuple(value: &Value) -> Extraction {
    match value.get(0).and_then(Value::as_str) {
        Some(md) => Extraction::from_tables(TableSource::Markdown(md.to_string()).parse()),
        None => {
            warn!("Unrecognised tuple response: first element is not markdown");
            Extraction {
                tables: Vec::new(),
                skipped: vec![RegionError::Malformed {
                    region: 0,
                    field: "markdown".to_string(),
                }],
            }
        }
    }
}

fn extract_ai_tables(value: &Value) -> Extraction {
    let Some(entries) = value.get("tables").and_then(Value::as_array) else {
        warn!("Unrecognised extractor response: no 'tables' array");
        return Extraction::default();
    };

    let mut extraction = Extraction::default();
    for (i, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<Table>(entry.clone()) {
            Ok(table) => extraction.tables.push(table),
            Err(e) => extraction.skipped.push(RegionError::BadTableEntry {
                region: i,
                detail: e.to_string(),
            }),
        }
    }
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_lookup_order() {
        let v = json!({"result": [1], "data": [2]});
        assert_eq!(locate_payload(&v), &json!([1]));

        let v = json!({"result": null, "data": [2]});
        assert_eq!(locate_payload(&v), &json!([2]));

        let v = json!([3]);
        assert_eq!(locate_payload(&v), &json!([3]));
    }

    #[test]
    fn non_array_payload_is_empty_not_error() {
        let e = normalize_regions(&json!({"result": {"oops": true}}));
        assert!(e.is_empty());
        assert!(e.skipped.is_empty());
    }

    #[test]
    fn html_region_is_parsed() {
        let v = json!({"result": [
            {"type": "text", "res": {"text": "Invoice 42"}},
            {"type": "table", "res": {"html": "<table><tr><th>Item</th><th>Amount</th></tr><tr><td>Pen</td><td>10</td></tr></table>"}}
        ]});
        let e = normalize_regions(&v);
        assert_eq!(e.tables.len(), 1);
        assert_eq!(e.tables[0].column_names, vec!["Item", "Amount"]);
    }

    #[test]
    fn falls_back_from_html_to_cells() {
        let v = json!([{"type": "table", "res": {
            "html": "<p>no rows</p>",
            "cells": [
                {"row": 0, "col": 0, "text": "Item"},
                {"row_start": 1, "col_start": 0, "content": "Pen"}
            ]
        }}]);
        let e = normalize_regions(&v);
        assert_eq!(e.tables.len(), 1);
        assert_eq!(e.tables[0].rows, vec![vec!["Pen".to_string()]]);
    }

    #[test]
    fn failed_region_is_recorded_and_others_survive() {
        let v = json!({"data": [
            {"type": "table", "res": {"cells": "not a list"}},
            {"type": "table", "res": {"html": "<tr><td>A</td></tr><tr><td>1</td></tr>"}}
        ]});
        let e = normalize_regions(&v);
        assert_eq!(e.tables.len(), 1);
        assert_eq!(
            e.skipped,
            vec![RegionError::Malformed {
                region: 0,
                field: "cells".into()
            }]
        );
    }

    #[test]
    fn fallback_lines_when_no_table_region() {
        let v = json!({"result": [
            {"type": "text", "text": "Item  Qty  Amount"},
            {"type": "text", "res": {"text": "Pen  2  10.00"}}
        ]});
        let e = normalize_regions(&v);
        assert_eq!(e.tables.len(), 1);
        assert_eq!(e.tables[0].column_names, vec!["Item", "Qty", "Amount"]);
    }

    #[test]
    fn table_region_without_res_is_ignored() {
        let v = json!([{"type": "table"}, {"type": "table", "res": null}]);
        let e = normalize_regions(&v);
        assert!(e.is_empty());
        assert!(e.skipped.is_empty());
    }

    #[test]
    fn oversized_cell_grid_is_malformed_not_allocated() {
        let v = json!([{"type": "table", "res": {"cells": [
            {"row": 0, "col": 0, "text": "A"},
            {"row": 1_000_000_000u64, "col": 1_000_000_000u64, "text": "x"}
        ]}}]);
        let e = normalize_regions(&v);
        assert!(e.is_empty());
        assert_eq!(
            e.skipped,
            vec![RegionError::Malformed {
                region: 0,
                field: "cells".into()
            }]
        );
    }

    #[test]
    fn detect_classifies_shapes() {
        assert_eq!(RawResponse::detect("| A |\n| - |\n| 1 |").kind(), "markdown");
        assert_eq!(RawResponse::detect("\"| A |\"").kind(), "markdown");
        assert_eq!(RawResponse::detect(r##"["# doc", "<html>", "src"]"##).kind(), "tuple");
        assert_eq!(RawResponse::detect(r#"{"tables": []}"#).kind(), "ai");
        assert_eq!(RawResponse::detect(r#"{"result": []}"#).kind(), "regions");
        assert_eq!(RawResponse::detect("[]").kind(), "regions");
    }

    #[test]
    fn tuple_response_parses_first_element() {
        let body = json!(["| A | B |\n| --- | --- |\n| 1 | 2 |", "<div/>", "code"]).to_string();
        let e = extract_tables(&body);
        assert_eq!(e.tables.len(), 1);
        assert_eq!(e.tables[0].rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn ai_tables_skip_bad_entries() {
        let body = json!({"tables": [
            {"columnNames": ["Item", "Amount"], "rows": [["Pen", "10"]]},
            {"columns": ["wrong"]}
        ]})
        .to_string();
        let e = extract_tables(&body);
        assert_eq!(e.tables.len(), 1);
        assert_eq!(e.skipped.len(), 1);
        assert!(matches!(e.skipped[0], RegionError::BadTableEntry { region: 1, .. }));
    }

    #[test]
    fn forced_json_format_rejects_text() {
        let err = RawResponse::parse_as("| A |", ResponseFormat::Regions).unwrap_err();
        assert!(matches!(err, DocQuoteError::InvalidJson { .. }));

        let raw = RawResponse::parse_as(r#"{"tables": []}"#, ResponseFormat::Markdown).unwrap();
        assert_eq!(raw.kind(), "markdown");
    }
}
