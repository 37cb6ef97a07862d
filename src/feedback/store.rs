// src/feedback/store.rs
//! SQLite persistence for feedback records and their attached analyses.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{Alert, FeedbackRecord, FeedbackStatus, NewFeedback};
use crate::analysis::{FeedbackAnalysis, PriorityLevel, Sentiment};

const RECORD_COLUMNS: &str = r#"
    id, rating, comment, meal_type, status, admin_response, created_at,
    ai_priority_score, ai_priority_level, ai_sentiment, ai_category,
    ai_keywords, ai_summary, ai_recommended_action,
    ai_escalation_needed, ai_health_safety_concern, ai_analyzed_at
"#;

pub struct FeedbackStore {
    pool: SqlitePool,
}

impl FeedbackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a new submission. Classification happens separately; a row
    /// is accepted as long as basic validation passes.
    pub async fn save(&self, new: &NewFeedback) -> Result<FeedbackRecord> {
        if !(1..=5).contains(&new.rating) {
            bail!("rating must be between 1 and 5, got {}", new.rating);
        }

        let created_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO feedback (rating, comment, meal_type, status, created_at)
            VALUES (?, ?, ?, 'pending', ?)
            RETURNING id
            "#,
        )
        .bind(new.rating)
        .bind(&new.comment)
        .bind(new.meal_type.as_str())
        .bind(created_at.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.get("id");
        Ok(FeedbackRecord {
            id,
            rating: new.rating,
            comment: new.comment.clone(),
            meal_type: new.meal_type,
            status: FeedbackStatus::Pending,
            admin_response: None,
            created_at,
            analysis: None,
            analyzed_at: None,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<FeedbackRecord>> {
        let row = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM feedback WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| record_from_row(&r)).transpose()
    }

    /// Writes the full analysis onto its row. Always a complete overwrite,
    /// never a partial merge.
    pub async fn attach_analysis(
        &self,
        id: i64,
        analysis: &FeedbackAnalysis,
        analyzed_at: DateTime<Utc>,
    ) -> Result<()> {
        let keywords_json = serde_json::to_string(&analysis.keywords)?;

        let result = sqlx::query(
            r#"
            UPDATE feedback SET
                ai_priority_score = ?,
                ai_priority_level = ?,
                ai_sentiment = ?,
                ai_category = ?,
                ai_keywords = ?,
                ai_summary = ?,
                ai_recommended_action = ?,
                ai_escalation_needed = ?,
                ai_health_safety_concern = ?,
                ai_analyzed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(analysis.priority_score)
        .bind(analysis.priority_level.as_str())
        .bind(analysis.sentiment.as_str())
        .bind(&analysis.category)
        .bind(keywords_json)
        .bind(&analysis.summary)
        .bind(&analysis.recommended_action)
        .bind(analysis.escalation_needed)
        .bind(analysis.health_safety_concern)
        .bind(analyzed_at.naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("feedback {id} not found");
        }
        Ok(())
    }

    /// Dashboard read: analyzed, commented rows within the timeframe,
    /// highest priority first.
    pub async fn list_analyzed_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<FeedbackRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM feedback
            WHERE comment IS NOT NULL
              AND TRIM(comment) <> ''
              AND ai_analyzed_at IS NOT NULL
              AND created_at >= ?
            ORDER BY ai_priority_score DESC, created_at DESC
            "#
        ))
        .bind(cutoff.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Commented rows that never received an analysis, oldest first.
    pub async fn list_unanalyzed(&self) -> Result<Vec<FeedbackRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM feedback
            WHERE comment IS NOT NULL
              AND TRIM(comment) <> ''
              AND ai_analyzed_at IS NULL
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: FeedbackStatus,
        admin_response: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE feedback
            SET status = ?, admin_response = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(admin_response)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("feedback {id} not found");
        }
        Ok(())
    }

    /// Unresolved feedback scored HIGH or above within the window.
    pub async fn open_alerts(&self, cutoff: DateTime<Utc>) -> Result<Vec<Alert>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM feedback
            WHERE ai_priority_score >= 7
              AND status IN ('pending', 'processing')
              AND created_at >= ?
            ORDER BY ai_priority_score DESC, created_at DESC
            "#
        ))
        .bind(cutoff.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        rows.iter()
            .map(|r| record_from_row(r).map(|fb| Alert::new(fb, now)))
            .collect()
    }
}

fn record_from_row(row: &SqliteRow) -> Result<FeedbackRecord> {
    let meal_type: String = row.get("meal_type");
    let status: String = row.get("status");
    let created_at: NaiveDateTime = row.get("created_at");
    let analyzed_at: Option<NaiveDateTime> = row.get("ai_analyzed_at");

    let analysis = if analyzed_at.is_some() {
        let priority_score: i64 = row.get("ai_priority_score");
        let level: String = row.get("ai_priority_level");
        let sentiment: String = row.get("ai_sentiment");
        let keywords: Option<String> = row.get("ai_keywords");

        Some(FeedbackAnalysis {
            priority_score,
            priority_level: level
                .parse::<PriorityLevel>()
                .unwrap_or(PriorityLevel::from_score(priority_score)),
            sentiment: Sentiment::parse_lenient(&sentiment),
            category: row.get::<Option<String>, _>("ai_category").unwrap_or_default(),
            keywords: keywords
                .as_deref()
                .and_then(|k| serde_json::from_str(k).ok())
                .unwrap_or_default(),
            summary: row.get::<Option<String>, _>("ai_summary").unwrap_or_default(),
            recommended_action: row
                .get::<Option<String>, _>("ai_recommended_action")
                .unwrap_or_default(),
            escalation_needed: row
                .get::<Option<bool>, _>("ai_escalation_needed")
                .unwrap_or(false),
            health_safety_concern: row
                .get::<Option<bool>, _>("ai_health_safety_concern")
                .unwrap_or(false),
        })
    } else {
        None
    };

    Ok(FeedbackRecord {
        id: row.get("id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        meal_type: meal_type.parse().map_err(|e: String| anyhow!(e))?,
        status: status.parse().map_err(|e: String| anyhow!(e))?,
        admin_response: row.get("admin_response"),
        created_at: Utc.from_utc_datetime(&created_at),
        analysis,
        analyzed_at: analyzed_at.map(|t| Utc.from_utc_datetime(&t)),
    })
}
