// src/batch/mod.rs
//! Sequential re-analysis over stored feedback.
//!
//! One record at a time with a fixed inter-call delay, so a backfill over a
//! large backlog never hammers the Gemini API. Each record gets a bounded
//! number of attempts before degrading to the heuristic classifier.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::analysis::provider::AnalysisProvider;
use crate::analysis::{heuristic, FeedbackAnalysis};
use crate::config::CONFIG;
use crate::feedback::store::FeedbackStore;
use crate::feedback::FeedbackRecord;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub total: usize,
    /// Classified by the AI provider.
    pub ai_analyzed: usize,
    /// Classified by the heuristic after retries were exhausted.
    pub fell_back: usize,
    /// Rows whose analysis could not be persisted.
    pub failed: usize,
}

pub struct BatchReanalyzer {
    provider: Arc<dyn AnalysisProvider>,
    delay: Duration,
    max_retries: u32,
}

impl BatchReanalyzer {
    pub fn new(provider: Arc<dyn AnalysisProvider>, delay: Duration, max_retries: u32) -> Self {
        Self {
            provider,
            delay,
            max_retries,
        }
    }

    pub fn from_config(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self::new(
            provider,
            Duration::from_millis(CONFIG.reanalyze_delay_ms),
            CONFIG.reanalyze_max_retries,
        )
    }

    /// Analyze every commented-but-unanalyzed record, oldest first.
    pub async fn run(&self, store: &FeedbackStore, limit: Option<usize>) -> Result<BatchOutcome> {
        let mut records = store.list_unanalyzed().await?;
        if let Some(limit) = limit {
            records.truncate(limit);
        }

        let mut outcome = BatchOutcome {
            total: records.len(),
            ..Default::default()
        };
        info!("Batch re-analysis starting over {} records", records.len());

        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                sleep(self.delay).await;
            }

            let (analysis, from_ai) = self.classify_with_retry(record).await;
            match store
                .attach_analysis(record.id, &analysis, Utc::now())
                .await
            {
                Ok(()) => {
                    if from_ai {
                        outcome.ai_analyzed += 1;
                    } else {
                        outcome.fell_back += 1;
                    }
                }
                Err(e) => {
                    warn!(feedback_id = record.id, "Failed to persist batch analysis: {e}");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            "Batch re-analysis done: {} via AI, {} heuristic, {} failed",
            outcome.ai_analyzed, outcome.fell_back, outcome.failed
        );
        Ok(outcome)
    }

    async fn classify_with_retry(&self, record: &FeedbackRecord) -> (FeedbackAnalysis, bool) {
        let comment = record.comment.as_deref().unwrap_or("");
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self
                .provider
                .analyze_feedback(comment, record.rating, record.meal_type)
                .await
            {
                Ok(analysis) => return (analysis, true),
                Err(e) if attempt <= self.max_retries => {
                    let jitter =
                        Duration::from_millis(100 * attempt as u64 + rand::random::<u64>() % 100);
                    warn!(
                        feedback_id = record.id,
                        "Batch attempt {attempt} failed ({e}), retrying after {jitter:?}"
                    );
                    sleep(jitter).await;
                }
                Err(e) => {
                    warn!(
                        feedback_id = record.id,
                        "Batch attempts exhausted ({e}), using heuristic fallback"
                    );
                    return (
                        heuristic::classify(comment, record.rating, record.meal_type),
                        false,
                    );
                }
            }
        }
    }
}
