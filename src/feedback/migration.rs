// src/feedback/migration.rs
//! Schema setup for the feedback table. Run at startup; every statement is
//! idempotent so repeated runs are safe.

use anyhow::Result;
use sqlx::{Executor, SqlitePool};
use tracing::info;

/// Feedback rows carry both the submission and its `ai_*` analysis columns;
/// `ai_analyzed_at IS NOT NULL` is the sole signal a row has been analyzed.
const CREATE_FEEDBACK: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
    comment TEXT,
    meal_type TEXT NOT NULL CHECK (meal_type IN ('breakfast', 'lunch', 'dinner')),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'processing', 'resolved')),
    admin_response TEXT,
    created_at DATETIME NOT NULL,
    updated_at DATETIME,
    ai_priority_score INTEGER,
    ai_priority_level TEXT,
    ai_sentiment TEXT,
    ai_category TEXT,
    ai_keywords TEXT,
    ai_summary TEXT,
    ai_recommended_action TEXT,
    ai_escalation_needed BOOLEAN,
    ai_health_safety_concern BOOLEAN,
    ai_analyzed_at DATETIME
);
"#;

const CREATE_FEEDBACK_INDICES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_feedback_created_at ON feedback(created_at);
CREATE INDEX IF NOT EXISTS idx_feedback_status ON feedback(status);
CREATE INDEX IF NOT EXISTS idx_feedback_priority ON feedback(ai_priority_score);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    pool.execute(CREATE_FEEDBACK).await?;
    pool.execute(CREATE_FEEDBACK_INDICES).await?;
    info!("Feedback schema ready");
    Ok(())
}
