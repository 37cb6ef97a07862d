// tests/test_helpers.rs
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;

use messboard::analysis::provider::AnalysisProvider;
use messboard::analysis::{AnalysisError, FeedbackAnalysis, PriorityLevel, Sentiment};
use messboard::feedback::migration;
use messboard::feedback::store::FeedbackStore;
use messboard::feedback::{FeedbackRecord, MealType, NewFeedback};

/// Fresh store over an isolated in-memory database.
pub async fn setup_store() -> FeedbackStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    migration::run_migrations(&pool).await.unwrap();
    FeedbackStore::new(pool)
}

pub fn new_feedback(rating: i64, comment: Option<&str>, meal_type: MealType) -> NewFeedback {
    NewFeedback {
        rating,
        comment: comment.map(str::to_string),
        meal_type,
    }
}

pub fn canned_analysis(priority_score: i64) -> FeedbackAnalysis {
    FeedbackAnalysis {
        priority_score,
        priority_level: PriorityLevel::from_score(priority_score),
        sentiment: Sentiment::Negative,
        category: "Hygiene".to_string(),
        keywords: vec!["dirty".to_string()],
        summary: "Canned analysis for tests".to_string(),
        recommended_action: "Clean the serving area".to_string(),
        escalation_needed: priority_score >= 8,
        health_safety_concern: false,
    }
}

/// Provider that fails every call and counts how often it was asked.
#[derive(Default)]
pub struct FailingProvider {
    pub analyze_calls: AtomicUsize,
    pub insight_calls: AtomicUsize,
}

#[async_trait]
impl AnalysisProvider for FailingProvider {
    async fn analyze_feedback(
        &self,
        _comment: &str,
        _rating: i64,
        _meal_type: MealType,
    ) -> Result<FeedbackAnalysis, AnalysisError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        Err(AnalysisError::Service("simulated outage".into()))
    }

    async fn generate_insights(
        &self,
        _feedback: &[FeedbackRecord],
    ) -> Result<String, AnalysisError> {
        self.insight_calls.fetch_add(1, Ordering::SeqCst);
        Err(AnalysisError::Timeout)
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Provider that always answers with a fixed analysis and narrative.
pub struct CannedProvider {
    pub analysis: FeedbackAnalysis,
    pub narrative: String,
    pub insight_calls: AtomicUsize,
}

impl CannedProvider {
    pub fn new(analysis: FeedbackAnalysis, narrative: &str) -> Self {
        Self {
            analysis,
            narrative: narrative.to_string(),
            insight_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AnalysisProvider for CannedProvider {
    async fn analyze_feedback(
        &self,
        _comment: &str,
        _rating: i64,
        _meal_type: MealType,
    ) -> Result<FeedbackAnalysis, AnalysisError> {
        Ok(self.analysis.clone())
    }

    async fn generate_insights(
        &self,
        _feedback: &[FeedbackRecord],
    ) -> Result<String, AnalysisError> {
        self.insight_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.narrative.clone())
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}
