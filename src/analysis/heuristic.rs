// src/analysis/heuristic.rs
//! Rule-based fallback classifier. Pure and deterministic: used whenever the
//! Gemini path is unavailable, so it must always produce a complete analysis.

use super::{FeedbackAnalysis, PriorityLevel, Sentiment};
use crate::feedback::MealType;

const HEALTH_KEYWORDS: &[&str] = &[
    "poison", "sick", "stomach", "vomit", "spoiled", "rotten", "insects", "hair", "dirty",
    "contaminated",
];

const SERVICE_KEYWORDS: &[&str] = &["staff", "rude", "slow", "queue", "wait", "service"];

const QUALITY_KEYWORDS: &[&str] = &[
    "taste", "cold", "hot", "salty", "sweet", "bland", "overcooked", "undercooked",
];

fn matches_any(comment: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| comment.contains(k))
}

/// Derives an analysis from keyword matches and the numeric rating alone.
pub fn classify(comment: &str, rating: i64, meal_type: MealType) -> FeedbackAnalysis {
    let lower = comment.to_lowercase();

    let has_health_concern = matches_any(&lower, HEALTH_KEYWORDS);
    let has_service_issue = matches_any(&lower, SERVICE_KEYWORDS);
    let has_quality_issue = matches_any(&lower, QUALITY_KEYWORDS);

    let mut priority_score: i64 = 5;
    let category;

    if has_health_concern {
        priority_score = 10;
        category = "Health Safety";
    } else if rating <= 2 {
        priority_score = priority_score.max(7);
        category = if has_service_issue { "Service" } else { "Food Quality" };
    } else if rating == 3 {
        priority_score = priority_score.max(5);
        category = if has_quality_issue { "Food Quality" } else { "Service" };
    } else {
        priority_score = priority_score.min(4);
        category = "Food Quality";
    }

    let sentiment = if rating >= 4 {
        Sentiment::Positive
    } else if rating == 3 {
        Sentiment::Neutral
    } else {
        Sentiment::Negative
    };

    FeedbackAnalysis {
        priority_score,
        priority_level: PriorityLevel::from_score(priority_score),
        sentiment,
        category: category.to_string(),
        keywords: vec![meal_type.as_str().to_string(), category.to_lowercase()],
        summary: format!(
            "{rating}/5 rating for {} with {} feedback",
            meal_type.as_str(),
            category.to_lowercase()
        ),
        recommended_action: if has_health_concern {
            "Immediate investigation required".to_string()
        } else {
            "Review and address concerns".to_string()
        },
        escalation_needed: priority_score >= 8,
        health_safety_concern: has_health_concern,
    }
}
