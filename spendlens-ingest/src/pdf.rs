//! Page-text extraction from statement PDFs.
//!
//! The pipeline only needs plain text; the container format is someone else's problem.
//! A scanned statement may legitimately come back with no text at all.

use std::path::Path;

use tracing::{debug, info};

use crate::error::IngestError;

/// Anything that can turn a statement file into its concatenated page text.
pub trait TextSource: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;

    /// Human-readable backend name for capability reporting.
    fn name(&self) -> &'static str;
}

/// `pdf-extract` backed implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        if !path.exists() {
            return Err(IngestError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        info!("Extracting text from {}", path.display());
        // pdf-extract panics on some malformed documents instead of returning an error
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text(path))
            .map_err(|_| IngestError::Pdf {
                path: path.to_path_buf(),
                message: "PDF parser aborted on malformed input".to_string(),
            })?
            .map_err(|e| IngestError::Pdf {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        // pdf-extract separates pages with form feeds
        let text = text.replace('\u{c}', "\n");
        debug!("Extracted {} characters", text.len());
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "pdf-extract"
    }
}

/// Reads the file as UTF-8 text. Used for pre-extracted statements and fixtures.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn name(&self) -> &'static str {
        "plain-text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_text_source_reads_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "09-Oct-24 CARREFOUR 45.50").unwrap();
        let text = PlainTextSource.extract_text(f.path()).unwrap();
        assert!(text.contains("CARREFOUR"));
    }

    #[test]
    fn test_missing_pdf_is_io_error() {
        let err = PdfTextSource
            .extract_text(Path::new("/definitely/not/here.pdf"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[test]
    fn test_corrupt_pdf_is_pdf_error() {
        let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        f.write_all(b"this is not a pdf").unwrap();
        let err = PdfTextSource.extract_text(f.path()).unwrap_err();
        assert!(matches!(err, IngestError::Pdf { .. }), "got {err:?}");
    }
}
