// src/analysis/provider.rs

use async_trait::async_trait;

use super::{AnalysisError, FeedbackAnalysis};
use crate::feedback::{FeedbackRecord, MealType};

/// Seam between the pipeline and the external text-generation service.
/// The orchestrator and aggregator only ever see this trait, which keeps
/// their failure behavior testable without the network.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Classify one piece of feedback. A single attempt, no retries; the
    /// caller decides whether to fall back.
    async fn analyze_feedback(
        &self,
        comment: &str,
        rating: i64,
        meal_type: MealType,
    ) -> Result<FeedbackAnalysis, AnalysisError>;

    /// Produce a free-prose management summary over analyzed feedback.
    /// No schema contract on the response.
    async fn generate_insights(
        &self,
        feedback: &[FeedbackRecord],
    ) -> Result<String, AnalysisError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
