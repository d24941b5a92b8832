// Application layer: collaborator ports and the extraction use case.

pub mod extract_use_case;
pub mod ports;

pub use extract_use_case::ExtractionUseCase;
