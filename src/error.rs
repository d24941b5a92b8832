use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Workbook I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("Sheet parse failed: {0}")]
    Parse(String),

    #[error("Layout configuration error: {0}")]
    Layout(String),
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
