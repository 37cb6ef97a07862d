// src/insights/mod.rs
//! Dashboard aggregation: numeric statistics plus an AI narrative.
//!
//! The statistics are pure in-memory reduction and never depend on the
//! external service; only the narrative does, and it degrades to a fixed
//! placeholder when the call fails.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::provider::AnalysisProvider;
use crate::analysis::{PriorityLevel, Sentiment};
use crate::config::CONFIG;
use crate::feedback::FeedbackRecord;

pub const NARRATIVE_FALLBACK: &str =
    "Unable to generate insights at this time. Please review individual feedback items.";

/// Dashboard window, applied by the caller before records reach the
/// aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Today,
    Week,
    Month,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            // Calendar day, not a rolling 24-hour window.
            Self::Today => Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN)),
            Self::Week => now - Duration::days(7),
            Self::Month => now - Duration::days(30),
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown timeframe: {other} (expected today|week|month)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub urgent: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsStats {
    pub total_feedback: usize,
    pub priority_breakdown: PriorityBreakdown,
    pub sentiment_breakdown: SentimentBreakdown,
    pub category_breakdown: BTreeMap<String, usize>,
    pub health_safety_concerns: usize,
    /// Mean rating rounded to one decimal; 0 when there is no feedback.
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightsReport {
    pub timeframe: &'static str,
    pub stats: InsightsStats,
    pub ai_insights: String,
    pub recent_urgent_feedback: Vec<FeedbackRecord>,
}

pub struct InsightsAggregator;

impl InsightsAggregator {
    pub fn compute_stats(records: &[FeedbackRecord]) -> InsightsStats {
        let mut stats = InsightsStats {
            total_feedback: records.len(),
            ..Default::default()
        };

        let mut rating_sum = 0i64;
        for record in records {
            rating_sum += record.rating;
            let Some(analysis) = &record.analysis else {
                continue;
            };

            match analysis.priority_level {
                PriorityLevel::Urgent => stats.priority_breakdown.urgent += 1,
                PriorityLevel::High => stats.priority_breakdown.high += 1,
                PriorityLevel::Medium => stats.priority_breakdown.medium += 1,
                PriorityLevel::Low => stats.priority_breakdown.low += 1,
            }
            match analysis.sentiment {
                Sentiment::Positive => stats.sentiment_breakdown.positive += 1,
                Sentiment::Neutral => stats.sentiment_breakdown.neutral += 1,
                Sentiment::Negative => stats.sentiment_breakdown.negative += 1,
            }
            if !analysis.category.is_empty() {
                *stats
                    .category_breakdown
                    .entry(analysis.category.clone())
                    .or_insert(0) += 1;
            }
            if analysis.health_safety_concern {
                stats.health_safety_concerns += 1;
            }
        }

        if !records.is_empty() {
            let mean = rating_sum as f64 / records.len() as f64;
            stats.average_rating = (mean * 10.0).round() / 10.0;
        }
        stats
    }

    /// Records scored 8+, highest score first, ties broken by recency.
    pub fn select_urgent(records: &[FeedbackRecord], limit: usize) -> Vec<FeedbackRecord> {
        let mut urgent: Vec<FeedbackRecord> = records
            .iter()
            .filter(|r| {
                r.analysis
                    .as_ref()
                    .map(|a| a.priority_score >= 8)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        urgent.sort_by(|a, b| {
            let score = |r: &FeedbackRecord| r.analysis.as_ref().map(|x| x.priority_score).unwrap_or(0);
            score(b)
                .cmp(&score(a))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        urgent.truncate(limit);
        urgent
    }

    /// Full dashboard report. The narrative call is only made when there is
    /// feedback to talk about, and its failure never blocks the statistics.
    pub async fn summarize(
        provider: &dyn AnalysisProvider,
        timeframe: Timeframe,
        records: &[FeedbackRecord],
    ) -> InsightsReport {
        let stats = Self::compute_stats(records);
        let recent_urgent_feedback = Self::select_urgent(records, CONFIG.urgent_feedback_limit);

        let ai_insights = if records.is_empty() {
            String::new()
        } else {
            match provider.generate_insights(records).await {
                Ok(narrative) => narrative,
                Err(e) => {
                    warn!(provider = provider.name(), "Failed to generate insights narrative: {e}");
                    NARRATIVE_FALLBACK.to_string()
                }
            }
        };

        InsightsReport {
            timeframe: timeframe.as_str(),
            stats,
            ai_insights,
            recent_urgent_feedback,
        }
    }
}
