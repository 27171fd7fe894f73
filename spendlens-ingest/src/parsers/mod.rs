//! Statement dialect parsers. Each takes extracted plain text and yields transactions.

pub mod dmy_statement;

pub use dmy_statement::parse_statement_text;
