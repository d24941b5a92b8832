use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field sentinel used by the upstream schema discovery for columns it could
/// not map to any record field.
pub const UNMAPPED_FIELD: &str = "unmapped";

/// Minimum mapping confidence required for a column mapping to be applied.
pub const MIN_CONFIDENCE: f64 = 0.3;

/// A single column-to-field mapping produced by the upstream schema
/// discovery stage. Immutable within this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    /// Header string as discovered at design time. Hierarchical headers use
    /// segments joined by " > ".
    pub excel_column: String,
    /// Dot-path of the target record field, or the "unmapped" sentinel.
    pub firestore_field: String,
    /// Discovery confidence in [0, 1].
    pub confidence: f64,
    /// Name of a registered normalizer to apply to the raw cell value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

/// Per-sheet extraction instructions: which sheet, which target collection,
/// and the column mappings discovered for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMapping {
    pub sheet_name: String,
    pub target_collection: String,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub column_mappings: Vec<ColumnMapping>,
}

/// Provenance pointing back at the cell grid a record came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Sheet name in the source workbook.
    pub sheet: String,
    /// 1-based row number.
    pub row: u32,
}

/// One extracted record: an open-ended nested object plus mandatory
/// provenance. The provenance field is structural, so a record without it
/// cannot be constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "_source")]
    pub source: SourceRef,
}

impl ExtractedRecord {
    pub fn new(fields: Map<String, Value>, sheet: &str, row: u32) -> Self {
        Self {
            fields,
            source: SourceRef {
                sheet: sheet.to_string(),
                row,
            },
        }
    }
}

/// Row accounting for one sheet's extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Rows the sheet offered for extraction.
    pub total: u32,
    /// Records actually emitted; always equals `records.len()`.
    pub extracted: u32,
    /// Rows that failed during assembly. Rows dropped by null-filtering or
    /// admission rules do not count here.
    pub errored: u32,
}

/// The outcome of extracting one sheet mapping, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub sheet_name: String,
    pub target_collection: String,
    pub records: Vec<ExtractedRecord>,
    pub errors: Vec<String>,
    pub stats: ExtractionStats,
}

impl ExtractionResult {
    /// An empty result shell for a sheet about to be processed.
    pub fn new(mapping: &SheetMapping) -> Self {
        Self {
            sheet_name: mapping.sheet_name.clone(),
            target_collection: mapping.target_collection.clone(),
            records: Vec::new(),
            errors: Vec::new(),
            stats: ExtractionStats::default(),
        }
    }

    /// A result for a sheet whose setup or processing failed entirely.
    pub fn failed(mapping: &SheetMapping, message: String) -> Self {
        Self {
            sheet_name: mapping.sheet_name.clone(),
            target_collection: mapping.target_collection.clone(),
            records: Vec::new(),
            errors: vec![message],
            stats: ExtractionStats {
                total: 0,
                extracted: 0,
                errored: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracted_record_serializes_source_inline() {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("정산팀"));
        let record = ExtractedRecord::new(fields, "거래내역", 7);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], json!("정산팀"));
        assert_eq!(value["_source"]["sheet"], json!("거래내역"));
        assert_eq!(value["_source"]["row"], json!(7));
    }

    #[test]
    fn column_mapping_uses_camel_case_wire_names() {
        let mapping: ColumnMapping = serde_json::from_value(json!({
            "excelColumn": "금액 > 입금액",
            "firestoreField": "amounts.depositAmount",
            "confidence": 0.8,
            "transform": "normalizeAmount"
        }))
        .unwrap();
        assert_eq!(mapping.excel_column, "금액 > 입금액");
        assert_eq!(mapping.firestore_field, "amounts.depositAmount");
    }
}
