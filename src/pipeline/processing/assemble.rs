use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::domain::{ColumnMapping, MIN_CONFIDENCE, UNMAPPED_FIELD};
use crate::pipeline::processing::transform;

/// Builds one nested record from a parsed row by applying the sheet's
/// column mappings and their transforms.
///
/// Mappings below the confidence threshold or pointing at the "unmapped"
/// sentinel are skipped. The row key comes from the header resolver output,
/// falling back to the mapping's own header string when unresolved; a key
/// absent from the row reads as null rather than failing. A transform error
/// aborts the whole row and propagates to the caller.
pub fn assemble_record(
    row: &Map<String, Value>,
    mappings: &[ColumnMapping],
    resolved_headers: &HashMap<String, String>,
) -> Result<Map<String, Value>> {
    let mut record = Map::new();
    for mapping in mappings {
        if mapping.firestore_field == UNMAPPED_FIELD || mapping.confidence < MIN_CONFIDENCE {
            continue;
        }
        let key = resolved_headers
            .get(&mapping.excel_column)
            .unwrap_or(&mapping.excel_column);
        let raw = row.get(key).cloned().unwrap_or(Value::Null);
        let value = match &mapping.transform {
            Some(name) => transform::apply(name, &raw)
                .with_context(|| format!("column '{}'", mapping.excel_column))?,
            None => raw,
        };
        set_path(&mut record, &mapping.firestore_field, value);
    }
    Ok(record)
}

/// Assigns a value at a dot-path, creating intermediate objects for every
/// segment except the last. An intermediate that already holds a non-object
/// is replaced by an object.
pub fn set_path(record: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = record;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => current = map,
            _ => return,
        }
    }
}

/// True when the record carries no actual data: every leaf value is null,
/// or there are no fields at all. Used to silently drop rows that mapped
/// only blank cells.
pub fn is_null_record(record: &Map<String, Value>) -> bool {
    record.values().all(value_is_all_null)
}

fn value_is_all_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.values().all(value_is_all_null),
        _ => false,
    }
}
