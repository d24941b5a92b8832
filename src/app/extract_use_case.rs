use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::ports::{ParseOptions, SheetParserPort, WorkbookPort};
use crate::config::LayoutConfig;
use crate::domain::{ExtractedRecord, ExtractionResult, SheetMapping};
use crate::error::Result;
use crate::pipeline::processing::assemble::{assemble_record, is_null_record};
use crate::pipeline::processing::columns::resolve_headers;
use crate::pipeline::processing::guard::admit_record;
use crate::pipeline::processing::matrix::{is_matrix_sheet, MatrixExtractor};

/// Orchestrates extraction across a workbook's sheet mappings.
///
/// Sheets are processed strictly in input order, one result per non-skipped
/// mapping with columns, regardless of per-sheet success or failure. A
/// failed sheet never aborts the run: its failure is captured in its own
/// result and the next mapping proceeds.
pub struct ExtractionUseCase {
    parser: Arc<dyn SheetParserPort>,
    workbook: Arc<dyn WorkbookPort>,
    layouts: LayoutConfig,
}

impl ExtractionUseCase {
    pub fn new(
        parser: Arc<dyn SheetParserPort>,
        workbook: Arc<dyn WorkbookPort>,
        layouts: LayoutConfig,
    ) -> Self {
        Self {
            parser,
            workbook,
            layouts,
        }
    }

    /// Extract records for every sheet mapping, in input order. Mappings
    /// flagged skipped or carrying no column mappings produce no result
    /// entry at all.
    pub async fn extract_workbook(
        &self,
        path: &Path,
        mappings: &[SheetMapping],
    ) -> Vec<ExtractionResult> {
        let mut results = Vec::new();
        for mapping in mappings {
            if mapping.skipped || mapping.column_mappings.is_empty() {
                debug!("Skipping sheet '{}' (no extractable mappings)", mapping.sheet_name);
                continue;
            }
            let result = match self.extract_sheet(path, mapping).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Sheet '{}' failed: {}", mapping.sheet_name, e);
                    ExtractionResult::failed(mapping, e.to_string())
                }
            };
            info!(
                "Sheet '{}': {} records, {} errors",
                result.sheet_name,
                result.stats.extracted,
                result.errors.len()
            );
            results.push(result);
        }
        results
    }

    async fn extract_sheet(&self, path: &Path, mapping: &SheetMapping) -> Result<ExtractionResult> {
        if is_matrix_sheet(&mapping.sheet_name) {
            self.extract_matrix_sheet(path, mapping).await
        } else {
            self.extract_generic_sheet(path, mapping).await
        }
    }

    /// Generic per-row path: parse, resolve headers once, then assemble,
    /// null-filter, guard, and stamp provenance row by row. A row that
    /// fails assembly is recorded and the remaining rows still run.
    async fn extract_generic_sheet(
        &self,
        path: &Path,
        mapping: &SheetMapping,
    ) -> Result<ExtractionResult> {
        let options = self.parse_options(&mapping.sheet_name);
        let parsed = self.parser.parse(path, &mapping.sheet_name, &options).await?;

        let expected: Vec<String> = mapping
            .column_mappings
            .iter()
            .map(|m| m.excel_column.clone())
            .collect();
        let resolved = resolve_headers(&parsed.headers, &expected);
        for column in &expected {
            if !resolved.contains_key(column) {
                debug!(
                    "Sheet '{}': header '{}' unresolved, using it verbatim",
                    mapping.sheet_name, column
                );
            }
        }

        let mut result = ExtractionResult::new(mapping);
        result.stats.total = parsed.rows.len() as u32;
        for (i, row) in parsed.rows.iter().enumerate() {
            let row_number = (i + 1) as u32;
            match assemble_record(row, &mapping.column_mappings, &resolved) {
                Ok(fields) => {
                    if is_null_record(&fields) {
                        continue;
                    }
                    if !admit_record(&fields, &mapping.target_collection) {
                        continue;
                    }
                    result.records.push(ExtractedRecord::new(
                        fields,
                        &mapping.sheet_name,
                        row_number,
                    ));
                }
                Err(e) => {
                    result.errors.push(format!("Row {}: {:#}", row_number, e));
                    result.stats.errored += 1;
                }
            }
        }
        result.stats.extracted = result.records.len() as u32;
        Ok(result)
    }

    /// Matrix path: re-open the workbook for raw cell and merge access and
    /// run the specialized extractor. Errors here surface at the sheet
    /// level; the matrix scan has no per-row error capture.
    async fn extract_matrix_sheet(
        &self,
        path: &Path,
        mapping: &SheetMapping,
    ) -> Result<ExtractionResult> {
        let sheet = self.workbook.open_sheet(path, &mapping.sheet_name).await?;
        let extractor = MatrixExtractor::new(sheet.as_ref(), &mapping.sheet_name);
        let (records, stats) = extractor.extract();

        let mut result = ExtractionResult::new(mapping);
        result.records = records;
        result.stats = stats;
        Ok(result)
    }

    fn parse_options(&self, sheet_name: &str) -> ParseOptions {
        match self.layouts.lookup(sheet_name) {
            Some(layout) => ParseOptions {
                header_row_count: layout.header_row_count,
                header_start_row: layout.header_start_row,
                data_start_row: layout.data_start_row,
            },
            None => ParseOptions::default(),
        }
    }
}
