// src/analysis/mod.rs
//! The strict internal schema for feedback classification.
//!
//! Everything coming back from the model is untrusted text; this module is
//! the single place where the extracted JSON is coerced into a valid
//! `FeedbackAnalysis`. Downstream code never sees an unclamped score or an
//! unknown sentiment.

pub mod heuristic;
pub mod orchestrator;
pub mod provider;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Priority bucket, always derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLevel {
    #[serde(rename = "URGENT")]
    Urgent,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW")]
    Low,
}

impl PriorityLevel {
    /// Fixed score-to-bucket thresholds. The level the model claims is
    /// ignored; only the clamped score decides the bucket.
    pub fn from_score(score: i64) -> Self {
        if score >= 9 {
            Self::Urgent
        } else if score >= 7 {
            Self::High
        } else if score >= 4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "URGENT",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::str::FromStr for PriorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "URGENT" => Ok(Self::Urgent),
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(format!("unknown priority level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// Unrecognized values collapse to neutral rather than failing the
    /// whole analysis.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

/// Structured classification attached to a feedback record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    pub priority_score: i64,
    pub priority_level: PriorityLevel,
    pub sentiment: Sentiment,
    pub category: String,
    pub keywords: Vec<String>,
    pub summary: String,
    pub recommended_action: String,
    pub escalation_needed: bool,
    pub health_safety_concern: bool,
}

impl FeedbackAnalysis {
    /// Builds a valid analysis from whatever JSON object the model produced.
    ///
    /// Coercion rules:
    /// - `priority_score` clamped into [1, 10] (non-numeric becomes 5)
    /// - `priority_level` recomputed from the clamped score
    /// - `sentiment` coerced to neutral when unrecognized
    /// - `keywords` coerced to empty when not an array of strings
    /// - missing text fields become empty strings, missing flags false
    pub fn from_model_json(value: &Value) -> Result<Self, AnalysisError> {
        let obj = value.as_object().ok_or_else(|| {
            AnalysisError::MalformedResponse("model output is not a JSON object".into())
        })?;

        let priority_score = obj
            .get("priority_score")
            .and_then(Value::as_i64)
            .unwrap_or(5)
            .clamp(1, 10);

        let sentiment = obj
            .get("sentiment")
            .and_then(Value::as_str)
            .map(Sentiment::parse_lenient)
            .unwrap_or(Sentiment::Neutral);

        let keywords = obj
            .get("keywords")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let text_field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let flag = |key: &str| obj.get(key).and_then(Value::as_bool).unwrap_or(false);

        Ok(Self {
            priority_score,
            priority_level: PriorityLevel::from_score(priority_score),
            sentiment,
            category: {
                let category = text_field("category");
                if category.is_empty() { "Other".to_string() } else { category }
            },
            keywords,
            summary: text_field("summary"),
            recommended_action: text_field("recommended_action"),
            escalation_needed: flag("escalation_needed"),
            health_safety_concern: flag("health_safety_concern"),
        })
    }
}

/// Failures of the AI classification path. The orchestrator recovers from
/// all of these via the heuristic fallback; only `Configuration` aborts.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Gemini API key not configured: {0}")]
    Configuration(String),

    #[error("Gemini request timed out")]
    Timeout,

    #[error("Gemini API error: {0}")]
    Service(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}
