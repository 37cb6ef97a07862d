// src/feedback/mod.rs
//! Feedback domain types shared by the store, the orchestrator and the CLI.

pub mod migration;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::FeedbackAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }
}

impl std::str::FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            other => Err(format!("unknown meal type: {other}")),
        }
    }
}

/// Mutated only through admin status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Processing,
    Resolved,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Resolved => "resolved",
        }
    }
}

impl std::str::FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown feedback status: {other}")),
        }
    }
}

/// A single user-submitted rating + comment for one meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub meal_type: MealType,
    pub status: FeedbackStatus,
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Present iff `analyzed_at` is set; overwritten in full on re-analysis.
    pub analysis: Option<FeedbackAnalysis>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl FeedbackRecord {
    /// Blank comments are never eligible for analysis.
    pub fn has_comment(&self) -> bool {
        self.comment
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Submission payload from the (out-of-scope) HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    pub rating: i64,
    pub comment: Option<String>,
    pub meal_type: MealType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertUrgency {
    Critical,
    High,
}

/// Unresolved high-priority feedback, as surfaced on the admin alerts view.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub feedback: FeedbackRecord,
    pub urgency_level: AlertUrgency,
    pub minutes_since_created: i64,
}

impl Alert {
    pub fn new(feedback: FeedbackRecord, now: DateTime<Utc>) -> Self {
        let urgency_level = match feedback.analysis.as_ref().map(|a| a.priority_score) {
            Some(score) if score >= 9 => AlertUrgency::Critical,
            _ => AlertUrgency::High,
        };
        let minutes_since_created = (now - feedback.created_at).num_minutes().max(0);
        Self {
            feedback,
            urgency_level,
            minutes_since_created,
        }
    }
}
