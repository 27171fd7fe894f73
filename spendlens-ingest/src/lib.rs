//! spendlens-ingest: statement text extraction, description cleanup and statement parsers.

pub mod error;
pub mod normalize;
pub mod parsers;
pub mod pdf;

pub use error::IngestError;
pub use normalize::normalize_description;
pub use parsers::parse_statement_text;
pub use pdf::{PdfTextSource, PlainTextSource, TextSource};
