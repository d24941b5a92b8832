use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Per-sheet layout overrides for workbooks whose header geometry deviates
/// from the single-header-row default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutOverride {
    pub header_row_count: Option<u32>,
    pub header_start_row: Option<u32>,
    pub data_start_row: Option<u32>,
}

/// Sheet-layout profile registry, keyed by sheet name.
#[derive(Debug, Default, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub sheets: HashMap<String, LayoutOverride>,
}

impl LayoutConfig {
    /// Load layout overrides from a TOML file. A missing file yields an
    /// empty config, since most workbooks need no overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: LayoutConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Look up overrides for one sheet.
    pub fn lookup(&self, sheet_name: &str) -> Option<&LayoutOverride> {
        self.sheets.get(sheet_name)
    }
}
