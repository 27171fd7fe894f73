//! Statement pipeline: text → transactions → labels → summary.

use std::path::Path;
use std::sync::Arc;

use spendlens_core::{CategorizedSummary, Transaction};
use spendlens_ingest::{parse_statement_text, TextSource};
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::classifier::ClassifierChain;
use crate::error::PipelineError;
use crate::keyword::KeywordClassifier;
use crate::remote::{AnthropicClient, CompletionClient, LlmConfig, RemoteClassifier, RemoteSettings};

/// Transactions classified per request; the rest of a longer statement is dropped.
pub const DEFAULT_MAX_TRANSACTIONS: usize = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub max_transactions: usize,
    pub remote: RemoteSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_transactions: DEFAULT_MAX_TRANSACTIONS,
            remote: RemoteSettings::default(),
        }
    }
}

/// Keep the first `max` transactions; returns how many were dropped.
fn cap_transactions(txns: &mut Vec<Transaction>, max: usize) -> usize {
    let dropped = txns.len().saturating_sub(max);
    txns.truncate(max);
    dropped
}

pub struct StatementPipeline {
    source: Arc<dyn TextSource>,
    chain: ClassifierChain,
    max_transactions: usize,
}

impl StatementPipeline {
    pub fn new(source: Arc<dyn TextSource>, chain: ClassifierChain, max_transactions: usize) -> Self {
        Self {
            source,
            chain,
            max_transactions: max_transactions.max(1),
        }
    }

    /// Keyword rules first, remote model for the remainder.
    pub fn standard(
        source: Arc<dyn TextSource>,
        client: Arc<dyn CompletionClient>,
        settings: &PipelineSettings,
    ) -> Self {
        let chain = ClassifierChain::new()
            .with_stage(KeywordClassifier)
            .with_stage(RemoteClassifier::new(client, settings.remote.clone()));
        Self::new(source, chain, settings.max_transactions)
    }

    /// Standard pipeline against the Anthropic API. Fails before any work is done
    /// when the credential is missing.
    pub fn from_env(
        source: Arc<dyn TextSource>,
        llm: &LlmConfig,
        settings: &PipelineSettings,
    ) -> Result<Self, PipelineError> {
        let client = AnthropicClient::from_env(llm)?;
        info!("Remote classification via {}", client.model());
        Ok(Self::standard(source, Arc::new(client), settings))
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Extract, classify and aggregate one statement file.
    pub async fn process_file(&self, path: &Path) -> Result<CategorizedSummary, PipelineError> {
        info!("Processing statement {}", path.display());
        let source = Arc::clone(&self.source);
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || source.extract_text(&owned)).await??;
        Ok(self.process_text(&text).await)
    }

    /// Classify and aggregate already-extracted statement text.
    pub async fn process_text(&self, text: &str) -> CategorizedSummary {
        let mut txns = parse_statement_text(text);
        if txns.is_empty() {
            info!("No transactions found");
            return CategorizedSummary::empty();
        }

        let dropped = cap_transactions(&mut txns, self.max_transactions);
        if dropped > 0 {
            warn!(
                "Large statement; processing first {} transactions, dropped {}",
                self.max_transactions, dropped
            );
        }

        let labels = self.chain.classify(&txns).await;
        let summary = aggregate(txns.into_iter().zip(labels));
        info!(
            "Categorized {} transactions into {} categories, total {:.2}",
            summary.total_transactions,
            summary.categories.len(),
            summary.total_expenses
        );
        summary
    }
}
