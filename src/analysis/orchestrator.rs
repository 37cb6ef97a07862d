// src/analysis/orchestrator.rs
//! Fail-open selection between the AI classifier and the heuristic fallback.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use super::provider::AnalysisProvider;
use super::{heuristic, FeedbackAnalysis};
use crate::feedback::store::FeedbackStore;
use crate::feedback::{FeedbackRecord, NewFeedback};

pub struct FeedbackAnalyzer {
    provider: Arc<dyn AnalysisProvider>,
}

impl FeedbackAnalyzer {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self { provider }
    }

    /// Classify one record. Never fails: any provider error degrades to the
    /// heuristic classifier, which always produces a complete analysis.
    ///
    /// Callers must not pass records without a usable comment; the store-level
    /// entry points below enforce that.
    pub async fn analyze(&self, record: &FeedbackRecord) -> FeedbackAnalysis {
        let comment = record.comment.as_deref().unwrap_or("");
        match self
            .provider
            .analyze_feedback(comment, record.rating, record.meal_type)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(
                    feedback_id = record.id,
                    provider = self.provider.name(),
                    "Classification failed ({e}), using heuristic fallback"
                );
                heuristic::classify(comment, record.rating, record.meal_type)
            }
        }
    }

    /// Accept a submission and classify it inline when a comment is present.
    ///
    /// Acceptance never depends on classification: a failed analysis write is
    /// logged and the stored record is returned without one.
    pub async fn submit(&self, store: &FeedbackStore, new: &NewFeedback) -> Result<FeedbackRecord> {
        let mut record = store.save(new).await.context("Failed to save feedback")?;

        if record.has_comment() {
            let analysis = self.analyze(&record).await;
            let analyzed_at = Utc::now();
            match store.attach_analysis(record.id, &analysis, analyzed_at).await {
                Ok(()) => {
                    record.analysis = Some(analysis);
                    record.analyzed_at = Some(analyzed_at);
                }
                Err(e) => {
                    warn!(feedback_id = record.id, "Failed to persist analysis: {e}");
                }
            }
        }

        Ok(record)
    }

    /// Admin re-analysis: fully overwrites any prior analysis on the row.
    pub async fn reanalyze(&self, store: &FeedbackStore, id: i64) -> Result<FeedbackRecord> {
        let record = store
            .get(id)
            .await?
            .with_context(|| format!("feedback {id} not found"))?;

        if !record.has_comment() {
            bail!("feedback {id} has no comment to analyze");
        }

        let analysis = self.analyze(&record).await;
        let analyzed_at = Utc::now();
        store.attach_analysis(id, &analysis, analyzed_at).await?;
        info!(
            feedback_id = id,
            priority = analysis.priority_level.as_str(),
            "Feedback re-analyzed"
        );

        store
            .get(id)
            .await?
            .with_context(|| format!("feedback {id} disappeared during re-analysis"))
    }
}
