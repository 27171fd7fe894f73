//! Classifier capability and the ordered chain that combines classifiers.

use async_trait::async_trait;
use spendlens_core::{Category, Transaction};
use tracing::info;

/// Something that can label transactions.
///
/// Returns exactly one slot per input transaction, in input order. `None` leaves
/// the transaction for the next classifier in a chain. Implementations never fail;
/// a classifier that cannot reach its backend answers `None` or `Other`.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(&self, txns: &[Transaction]) -> Vec<Option<Category>>;
}

/// Runs classifiers in order; each sees only what earlier stages left unresolved.
#[derive(Default)]
pub struct ClassifierChain {
    stages: Vec<Box<dyn Classifier>>,
}

impl ClassifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl Classifier + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Label every transaction. Anything no stage resolves becomes `Other`.
    pub async fn classify(&self, txns: &[Transaction]) -> Vec<Category> {
        let mut labels: Vec<Option<Category>> = vec![None; txns.len()];

        for stage in &self.stages {
            let pending: Vec<usize> = (0..txns.len()).filter(|&i| labels[i].is_none()).collect();
            if pending.is_empty() {
                break;
            }

            let batch: Vec<Transaction> = pending.iter().map(|&i| txns[i].clone()).collect();
            let answers = stage.classify(&batch).await;

            let mut resolved = 0;
            for (&i, answer) in pending.iter().zip(answers) {
                if answer.is_some() {
                    resolved += 1;
                }
                labels[i] = answer;
            }
            info!(
                "{} classifier: {} of {} resolved",
                stage.name(),
                resolved,
                pending.len()
            );
        }

        labels
            .into_iter()
            .map(|l| l.unwrap_or(Category::Other))
            .collect()
    }
}
