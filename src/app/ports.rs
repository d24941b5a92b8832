use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::spreadsheet::RawSheet;

/// A sheet parsed into headers and keyed rows by the generic reader, with
/// the header/data boundary already resolved.
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Layout overrides forwarded to the generic parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub header_row_count: Option<u32>,
    pub header_start_row: Option<u32>,
    pub data_start_row: Option<u32>,
}

/// Generic spreadsheet parser collaborator: turns one sheet into
/// header-keyed rows.
#[async_trait]
pub trait SheetParserPort: Send + Sync {
    async fn parse(&self, path: &Path, sheet_name: &str, options: &ParseOptions)
        -> Result<ParsedSheet>;
}

/// Raw workbook accessor collaborator, used only by the matrix path, which
/// needs cell-by-coordinate and merge-range access the generic parser does
/// not expose.
#[async_trait]
pub trait WorkbookPort: Send + Sync {
    async fn open_sheet(&self, path: &Path, sheet_name: &str) -> Result<Box<dyn RawSheet>>;
}
