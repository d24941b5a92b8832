use std::collections::HashMap;

use serde_json::Value;

use super::cell::resolve_cell;
use super::RawSheet;

/// A parsed "A1:C3"-style merge range, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

/// Converts a column letter run to its 1-based index ('A' = 1, 'AA' = 27).
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for ch in letters.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        index = index.checked_mul(26)?.checked_add(upper as u32 - 'A' as u32 + 1)?;
    }
    Some(index)
}

/// Parses a single "C7"-style cell reference into (row, col).
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim();
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let col = column_index(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row, col))
}

/// Parses an "A1:C3"-style range reference.
pub fn parse_range_ref(reference: &str) -> Option<CellRange> {
    let (start, end) = reference.split_once(':')?;
    let (start_row, start_col) = parse_cell_ref(start)?;
    let (end_row, end_col) = parse_cell_ref(end)?;
    if end_row < start_row || end_col < start_col {
        return None;
    }
    Some(CellRange {
        start_row,
        start_col,
        end_row,
        end_col,
    })
}

/// Precomputed merged-cell values for one sheet.
///
/// Workbook readers report every cell of a merge region except the top-left
/// one as blank, so header rows and multi-row label blocks would otherwise
/// read as empty. The index maps each covered non-top-left coordinate to the
/// resolved top-left value. Built once per sheet, discarded with it.
#[derive(Debug, Default)]
pub struct MergedCellIndex {
    values: HashMap<(u32, u32), Value>,
}

impl MergedCellIndex {
    /// Build the index from a sheet's merge ranges. Malformed range
    /// references are skipped.
    pub fn build(sheet: &dyn RawSheet) -> Self {
        let mut values = HashMap::new();
        for reference in sheet.merged_ranges() {
            let Some(range) = parse_range_ref(reference) else {
                tracing::debug!("Skipping malformed merge range reference '{}'", reference);
                continue;
            };
            let top_left = resolve_cell(&sheet.cell(range.start_row, range.start_col));
            for row in range.start_row..=range.end_row {
                for col in range.start_col..=range.end_col {
                    if (row, col) == (range.start_row, range.start_col) {
                        continue;
                    }
                    values.insert((row, col), top_left.clone());
                }
            }
        }
        Self { values }
    }

    /// Resolve the value at a coordinate: merged-range hit first, direct
    /// cell resolution otherwise.
    pub fn value_at(&self, sheet: &dyn RawSheet, row: u32, col: u32) -> Value {
        match self.values.get(&(row, col)) {
            Some(value) => value.clone(),
            None => resolve_cell(&sheet.cell(row, col)),
        }
    }
}
