use spendlens_ingest::IngestError;
use thiserror::Error;

use crate::remote::LlmError;

/// Failures that abort processing of a statement.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] LlmError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] IngestError),

    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
