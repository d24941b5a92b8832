pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod spreadsheet;

// Layered application boundary: ports for the external collaborators and
// the orchestrating use case.
pub mod app;

pub use app::ExtractionUseCase;
pub use domain::{
    ColumnMapping, ExtractedRecord, ExtractionResult, ExtractionStats, SheetMapping, SourceRef,
};
