use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{ExtractedRecord, ExtractionStats};
use crate::pipeline::processing::transform::normalize_amount;
use crate::pipeline::processing::transform::rate::normalize_rate;
use crate::spreadsheet::{MergedCellIndex, RawSheet};

// Fixed row geometry of the participation matrix layout (1-based).
const PROJECT_NAME_ROW: u32 = 4;
const CLIENT_ORG_ROW: u32 = 5;
const DEPARTMENT_ROW: u32 = 6;
const NOTE_ROW: u32 = 7;
const STAGE_ROW: u32 = 8;
const HEADER_ROW: u32 = 9;
const DATA_START_ROW: u32 = 10;

// The per-person summary side-table occupies the first four columns;
// repeating (name, rate, period) groups start after it.
const SUMMARY_NAME_COL: u32 = 1;
const SUMMARY_NICKNAME_COL: u32 = 2;
const SUMMARY_RATE_COL: u32 = 3;
const SUMMARY_COUNT_COL: u32 = 4;
const GROUP_SCAN_START_COL: u32 = 5;
const GROUP_WIDTH: u32 = 3;

/// Consecutive fully-empty data rows after which the scan stops. Bounds the
/// scan against trailing allocated-but-empty sheet rows.
const MAX_EMPTY_ROW_RUN: u32 = 30;

/// Member-name cells starting with this marker are footnote annotations,
/// never data.
const FOOTNOTE_MARKER: &str = "※";

/// Label pattern for participation/input-rate columns and for the matrix
/// sheet name itself.
static RATE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(투입|참여)\s*[율률]").unwrap()
});

const NAME_LABEL: &str = "이름";

/// Whether a sheet follows the participation-matrix layout, judged by name.
pub fn is_matrix_sheet(sheet_name: &str) -> bool {
    RATE_LABEL_RE.is_match(sheet_name)
}

/// Per-member totals from the summary side-table. A later row with the same
/// member name overwrites an earlier one.
#[derive(Debug, Clone, Default)]
struct MemberSummary {
    nickname: Option<String>,
    total_rate: Option<f64>,
    total_project_count: Option<f64>,
}

/// Extracts person-per-project participation records from a matrix sheet.
///
/// The layout repeats a 3-column (name, rate, period) group horizontally,
/// one group per project, with the project descriptors stacked in fixed
/// header rows above. Header cells are heavily merged, so all header and
/// label reads go through the merged-cell index.
pub struct MatrixExtractor<'a> {
    sheet: &'a dyn RawSheet,
    sheet_name: &'a str,
    merged: MergedCellIndex,
}

impl<'a> MatrixExtractor<'a> {
    pub fn new(sheet: &'a dyn RawSheet, sheet_name: &'a str) -> Self {
        Self {
            sheet,
            sheet_name,
            merged: MergedCellIndex::build(sheet),
        }
    }

    pub fn extract(&self) -> (Vec<ExtractedRecord>, ExtractionStats) {
        let groups = self.discover_groups();
        let summaries = self.build_summary_table();
        debug!(
            "Matrix sheet '{}': {} groups, {} summarized members",
            self.sheet_name,
            groups.len(),
            summaries.len()
        );

        let mut records = Vec::new();
        let mut empty_run = 0u32;
        for row in DATA_START_ROW..=self.sheet.row_count() {
            let mut row_has_entry = false;
            for &group_col in &groups {
                let name = self.text_at(row, group_col);
                let rate = self.value_at(row, group_col + 1);
                let period = self.text_at(row, group_col + 2);

                let has_payload =
                    name.is_some() || !rate.is_null() || period.is_some();
                if !has_payload {
                    continue;
                }
                row_has_entry = true;

                // A blank name with a stray rate or period is noise; a name
                // starting with the footnote marker is an annotation.
                let Some(member_name) = name else { continue };
                if member_name.starts_with(FOOTNOTE_MARKER) {
                    continue;
                }

                records.push(self.emit(row, group_col, &member_name, &rate, period, &summaries));
            }

            if row_has_entry {
                empty_run = 0;
            } else {
                empty_run += 1;
                if empty_run >= MAX_EMPTY_ROW_RUN {
                    debug!(
                        "Matrix sheet '{}': stopping at row {} after {} empty rows",
                        self.sheet_name, row, empty_run
                    );
                    break;
                }
            }
        }

        let stats = ExtractionStats {
            total: self.sheet.row_count().saturating_sub(DATA_START_ROW - 1),
            extracted: records.len() as u32,
            errored: 0,
        };
        (records, stats)
    }

    /// Finds the starting column of each repeating group by scanning the
    /// header row for a name label immediately followed by a rate label.
    /// A match advances the scan past the whole group so its remaining
    /// columns are not re-detected.
    fn discover_groups(&self) -> Vec<u32> {
        let mut groups = Vec::new();
        let last_start = self.sheet.column_count().saturating_sub(GROUP_WIDTH - 1);
        let mut col = GROUP_SCAN_START_COL;
        while col <= last_start {
            let header = self.text_at(HEADER_ROW, col).unwrap_or_default();
            let next_header = self.text_at(HEADER_ROW, col + 1).unwrap_or_default();
            if header.contains(NAME_LABEL) && RATE_LABEL_RE.is_match(&next_header) {
                groups.push(col);
                col += GROUP_WIDTH;
            } else {
                col += 1;
            }
        }
        groups
    }

    /// Reads the narrow per-member summary table in the leading columns.
    fn build_summary_table(&self) -> HashMap<String, MemberSummary> {
        let mut summaries = HashMap::new();
        for row in DATA_START_ROW..=self.sheet.row_count() {
            let Some(name) = self.text_at(row, SUMMARY_NAME_COL) else {
                continue;
            };
            let summary = MemberSummary {
                nickname: self.text_at(row, SUMMARY_NICKNAME_COL),
                total_rate: normalize_rate(&self.value_at(row, SUMMARY_RATE_COL)),
                total_project_count: amount_of(&self.value_at(row, SUMMARY_COUNT_COL)),
            };
            // Last row wins on duplicate names.
            summaries.insert(name, summary);
        }
        summaries
    }

    fn emit(
        &self,
        row: u32,
        group_col: u32,
        member_name: &str,
        rate: &Value,
        period: Option<String>,
        summaries: &HashMap<String, MemberSummary>,
    ) -> ExtractedRecord {
        let summary = summaries.get(member_name).cloned().unwrap_or_default();

        let mut fields = Map::new();
        fields.insert("memberName".to_string(), Value::String(member_name.to_string()));
        fields.insert("nickname".to_string(), option_text(summary.nickname));
        fields.insert("totalRate".to_string(), option_number(summary.total_rate));
        fields.insert(
            "totalProjectCount".to_string(),
            summary
                .total_project_count
                .map(|count| Value::Number((count.trunc() as i64).into()))
                .unwrap_or(Value::Null),
        );
        fields.insert("projectName".to_string(), self.header_text(PROJECT_NAME_ROW, group_col));
        fields.insert("clientOrg".to_string(), self.header_text(CLIENT_ORG_ROW, group_col));
        fields.insert("department".to_string(), self.header_text(DEPARTMENT_ROW, group_col));
        fields.insert("note".to_string(), self.header_text(NOTE_ROW, group_col));
        fields.insert("stage".to_string(), self.header_text(STAGE_ROW, group_col));
        fields.insert("rate".to_string(), option_number(normalize_rate(rate)));
        fields.insert("period".to_string(), option_text(period));

        ExtractedRecord::new(fields, self.sheet_name, row)
    }

    fn value_at(&self, row: u32, col: u32) -> Value {
        self.merged.value_at(self.sheet, row, col)
    }

    /// Whitespace-normalized cell text; None when blank.
    fn text_at(&self, row: u32, col: u32) -> Option<String> {
        clean_text(&self.value_at(row, col))
    }

    fn header_text(&self, row: u32, col: u32) -> Value {
        self.text_at(row, col).map(Value::String).unwrap_or(Value::Null)
    }
}

/// Collapses a scalar cell value to trimmed, whitespace-normalized text.
fn clean_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn amount_of(value: &Value) -> Option<f64> {
    normalize_amount(value).ok().and_then(|v| v.as_f64())
}

fn option_text(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn option_number(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
