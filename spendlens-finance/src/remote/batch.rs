//! Remote batch classifier: bounded batches, tolerant reply parsing, per-item fallback.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use spendlens_core::{Category, Transaction};
use spendlens_ingest::normalize_description;
use tracing::{debug, info, warn};

use super::client::{CompletionClient, CompletionParams};
use super::json_recovery::parse_json_object;
use super::prompt::{batch_prompt, single_prompt};
use crate::classifier::Classifier;

pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSettings {
    /// Transactions per batch request
    pub batch_size: usize,
    /// Batches in flight at once; 1 keeps them strictly sequential
    pub concurrency: usize,
    pub batch: CompletionParams,
    pub single: CompletionParams,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
            batch: CompletionParams::batch(),
            single: CompletionParams::single(),
        }
    }
}

/// Classifies through a hosted model. Never fails: anything it cannot label is `Other`.
pub struct RemoteClassifier {
    client: Arc<dyn CompletionClient>,
    settings: RemoteSettings,
}

/// Labels for indexes `1..=len` of a parsed reply. Missing or non-string entries are `Other`.
fn labels_from_reply(map: &Map<String, Value>, len: usize) -> Vec<Category> {
    (1..=len)
        .map(|n| {
            map.get(&n.to_string())
                .and_then(Value::as_str)
                .map(Category::resolve)
                .unwrap_or(Category::Other)
        })
        .collect()
}

impl RemoteClassifier {
    pub fn new(client: Arc<dyn CompletionClient>, settings: RemoteSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    /// Classify one description on its own. Any remote failure yields `Other`.
    pub async fn classify_one(&self, description: &str) -> Category {
        let cleaned = normalize_description(description);
        match self
            .client
            .complete(&single_prompt(&cleaned), &self.settings.single)
            .await
        {
            Ok(reply) => {
                let category = Category::resolve(&reply);
                debug!("'{}' -> {} (reply: {:?})", cleaned, category, reply);
                category
            }
            Err(e) => {
                warn!("Single classification failed for '{}': {}", cleaned, e);
                Category::Other
            }
        }
    }

    /// Classify one batch with a single request, falling back to one request per
    /// transaction if the call fails or the reply cannot be parsed.
    pub async fn classify_batch(&self, batch: &[Transaction]) -> Vec<Category> {
        if batch.is_empty() {
            return Vec::new();
        }

        let descriptions: Vec<String> = batch
            .iter()
            .map(|t| normalize_description(&t.description))
            .collect();

        let parsed = match self
            .client
            .complete(&batch_prompt(&descriptions), &self.settings.batch)
            .await
        {
            Ok(reply) => {
                debug!("Batch reply: {}", reply);
                parse_json_object(&reply).map_err(|e| format!("unparsable reply: {e}"))
            }
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(map) => labels_from_reply(&map, batch.len()),
            Err(reason) => {
                warn!(
                    "Batch of {} failed ({}); classifying individually",
                    batch.len(),
                    reason
                );
                let mut out = Vec::with_capacity(batch.len());
                for txn in batch {
                    out.push(self.classify_one(&txn.description).await);
                }
                out
            }
        }
    }

    /// Classify every transaction in fixed-size batches, preserving input order.
    pub async fn classify_all(&self, txns: &[Transaction]) -> Vec<Category> {
        let size = self.settings.batch_size.max(1);
        let total = txns.len().div_ceil(size);

        let jobs: Vec<_> = txns
            .chunks(size)
            .enumerate()
            .map(|(n, chunk)| self.numbered_batch(n, total, chunk))
            .collect();
        let per_batch: Vec<Vec<Category>> = stream::iter(jobs)
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        per_batch.into_iter().flatten().collect()
    }

    async fn numbered_batch(&self, n: usize, total: usize, chunk: &[Transaction]) -> Vec<Category> {
        info!("Processing batch {}/{} ({} transactions)", n + 1, total, chunk.len());
        self.classify_batch(chunk).await
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn classify(&self, txns: &[Transaction]) -> Vec<Option<Category>> {
        self.classify_all(txns).await.into_iter().map(Some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::client::LlmError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every prompt.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: Mutex<Vec<(String, CompletionParams)>>,
    }

    impl ScriptedClient {
        fn with(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, CompletionParams)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push((prompt.to_string(), *params));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("connection refused".to_string())))
        }
    }

    /// Answers batch prompts by reading the label off each listed description,
    /// e.g. "3. Healthcare 7" -> {"3": "Healthcare"}.
    struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn complete(&self, prompt: &str, _params: &CompletionParams) -> Result<String, LlmError> {
            let mut map = Map::new();
            for line in prompt.lines() {
                let Some((idx, rest)) = line.split_once(". ") else { continue };
                if idx.parse::<usize>().is_err() {
                    continue;
                }
                let label = rest.rsplit_once(' ').map(|(l, _)| l).unwrap_or(rest);
                map.insert(idx.to_string(), Value::String(label.to_string()));
            }
            Ok(Value::Object(map).to_string())
        }
    }

    fn txn(desc: &str) -> Transaction {
        Transaction::new("08-Oct-24", desc, 10.0)
    }

    fn classifier(client: Arc<dyn CompletionClient>, batch_size: usize) -> RemoteClassifier {
        RemoteClassifier::new(
            client,
            RemoteSettings {
                batch_size,
                ..RemoteSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_fenced_batch_reply() {
        let client = ScriptedClient::with(vec![Ok(
            "```json\n{\"1\":\"Shopping\",\"2\":\"Food & Dining\"}\n```".to_string(),
        )]);
        let rc = classifier(client.clone(), 50);
        let labels = rc
            .classify_batch(&[txn("NFC - (AP-PAY)-NOON.COM"), txn("TALABAT")])
            .await;
        assert_eq!(labels, vec![Category::Shopping, Category::FoodAndDining]);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        // normalized descriptions go out, not raw ones
        assert!(calls[0].0.contains("1. NOON.COM"));
        assert_eq!(calls[0].1, CompletionParams::batch());
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back_to_singles_then_other() {
        let client = ScriptedClient::with(vec![Ok("Sure! Here are your categories.".to_string())]);
        let rc = classifier(client.clone(), 50);
        let labels = rc.classify_batch(&[txn("A SHOP"), txn("B SHOP"), txn("C SHOP")]).await;
        assert_eq!(labels, vec![Category::Other; 3]);

        let calls = client.calls();
        assert_eq!(calls.len(), 4, "one batch call plus one per item");
        assert!(calls[1..].iter().all(|(_, p)| *p == CompletionParams::single()));
        assert!(calls[2].0.contains("Transaction: \"B SHOP\""));
    }

    #[tokio::test]
    async fn test_failed_batch_call_uses_single_replies() {
        let client = ScriptedClient::with(vec![
            Err(LlmError::Timeout(std::time::Duration::from_secs(60))),
            Ok("Healthcare".to_string()),
            Ok("  education\n".to_string()),
        ]);
        let rc = classifier(client, 50);
        let labels = rc.classify_batch(&[txn("ASTER CLINIC"), txn("GEMS SCHOOL")]).await;
        assert_eq!(labels, vec![Category::Healthcare, Category::Education]);
    }

    #[tokio::test]
    async fn test_missing_and_fuzzy_labels() {
        let client = ScriptedClient::with(vec![Ok(
            r#"{"1": "entertainment", "3": "Groceries", "4": 7}"#.to_string(),
        )]);
        let rc = classifier(client.clone(), 50);
        let labels = rc
            .classify_batch(&[txn("VOX CINEMAS"), txn("X"), txn("Y"), txn("Z")])
            .await;
        assert_eq!(
            labels,
            vec![Category::Entertainment, Category::Other, Category::Other, Category::Other]
        );
        // a parsed reply never triggers the single-item path
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_one_bad_batch_does_not_affect_the_next() {
        let client = ScriptedClient::with(vec![
            Ok("not json".to_string()),
            Err(LlmError::Transport("reset".to_string())),
            Err(LlmError::Transport("reset".to_string())),
            Ok(r#"{"1": "Transportation", "2": "Shopping"}"#.to_string()),
        ]);
        let rc = classifier(client, 2);
        let labels = rc
            .classify_all(&[txn("A"), txn("B"), txn("RTA"), txn("ACE")])
            .await;
        assert_eq!(
            labels,
            vec![Category::Other, Category::Other, Category::Transportation, Category::Shopping]
        );
    }

    #[tokio::test]
    async fn test_concurrent_batches_keep_attribution() {
        let txns: Vec<Transaction> = (0..23)
            .map(|i| {
                let label = Category::ALL[i % Category::ALL.len()];
                txn(&format!("{} {}", label, i))
            })
            .collect();
        let rc = RemoteClassifier::new(
            Arc::new(EchoClient),
            RemoteSettings {
                batch_size: 4,
                concurrency: 3,
                ..RemoteSettings::default()
            },
        );
        let labels = rc.classify_all(&txns).await;
        let expected: Vec<Category> = (0..23).map(|i| Category::ALL[i % Category::ALL.len()]).collect();
        assert_eq!(labels, expected);
    }

    #[tokio::test]
    async fn test_batches_through_classifier_trait_object() {
        let stage: Box<dyn Classifier> = Box::new(RemoteClassifier::new(
            Arc::new(EchoClient),
            RemoteSettings {
                batch_size: 2,
                concurrency: 2,
                ..RemoteSettings::default()
            },
        ));
        // the boxed future must be Send to run on a spawned task
        let handle = tokio::spawn(async move {
            stage
                .classify(&[txn("Shopping 1"), txn("Healthcare 2"), txn("Education 3")])
                .await
        });
        assert_eq!(
            handle.await.unwrap(),
            vec![Some(Category::Shopping), Some(Category::Healthcare), Some(Category::Education)]
        );
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let client = ScriptedClient::with(vec![]);
        let rc = classifier(client.clone(), 50);
        assert!(rc.classify_all(&[]).await.is_empty());
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_labels_from_reply_bounds() {
        let map: Map<String, Value> =
            serde_json::from_str(r#"{"0": "Shopping", "1": "Healthcare", "9": "Education"}"#).unwrap();
        assert_eq!(labels_from_reply(&map, 2), vec![Category::Healthcare, Category::Other]);
    }
}
