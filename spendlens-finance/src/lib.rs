//! spendlens-finance: keyword and remote classification, aggregation, pipeline and export

pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod export;
pub mod keyword;
pub mod pipeline;
pub mod remote;

pub use aggregate::aggregate;
pub use classifier::{Classifier, ClassifierChain};
pub use error::{ExportError, PipelineError};
pub use export::{ReportWriter, XlsxReportWriter, report_filename};
pub use keyword::KeywordClassifier;
pub use pipeline::{PipelineSettings, StatementPipeline, DEFAULT_MAX_TRANSACTIONS};
pub use remote::{
    AnthropicClient, CompletionClient, CompletionParams, LlmConfig, LlmError, RemoteClassifier,
    RemoteSettings,
};
