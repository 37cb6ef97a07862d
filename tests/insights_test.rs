// tests/insights_test.rs

mod test_helpers;

use std::sync::atomic::Ordering;

use test_helpers::{canned_analysis, new_feedback, setup_store, CannedProvider, FailingProvider};

use chrono::{Duration, Utc};
use messboard::feedback::MealType;
use messboard::insights::{InsightsAggregator, Timeframe, NARRATIVE_FALLBACK};

#[tokio::test]
async fn empty_input_makes_no_narrative_call() {
    let provider = FailingProvider::default();

    let report = InsightsAggregator::summarize(&provider, Timeframe::Week, &[]).await;

    assert_eq!(report.timeframe, "week");
    assert_eq!(report.stats.total_feedback, 0);
    assert_eq!(report.stats.average_rating, 0.0);
    assert!(report.ai_insights.is_empty());
    assert!(report.recent_urgent_feedback.is_empty());
    assert_eq!(provider.insight_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn narrative_failure_degrades_to_placeholder_with_stats_intact() {
    let store = setup_store().await;
    let saved = store
        .save(&new_feedback(1, Some("dirty serving counter"), MealType::Lunch))
        .await
        .unwrap();
    store
        .attach_analysis(saved.id, &canned_analysis(9), Utc::now())
        .await
        .unwrap();

    let records = store
        .list_analyzed_since(Utc::now() - Duration::days(7))
        .await
        .unwrap();

    let provider = FailingProvider::default();
    let report = InsightsAggregator::summarize(&provider, Timeframe::Week, &records).await;

    assert_eq!(report.ai_insights, NARRATIVE_FALLBACK);
    assert_eq!(provider.insight_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.stats.total_feedback, 1);
    assert_eq!(report.stats.priority_breakdown.urgent, 1);
    assert_eq!(report.stats.average_rating, 1.0);
    assert_eq!(report.recent_urgent_feedback.len(), 1);
}

#[tokio::test]
async fn narrative_success_is_passed_through_verbatim() {
    let store = setup_store().await;
    for (rating, comment) in [(5, "loved the paneer"), (2, "slow queue again")] {
        let saved = store
            .save(&new_feedback(rating, Some(comment), MealType::Dinner))
            .await
            .unwrap();
        store
            .attach_analysis(saved.id, &canned_analysis(4), Utc::now())
            .await
            .unwrap();
    }

    let records = store
        .list_analyzed_since(Utc::now() - Duration::days(7))
        .await
        .unwrap();

    let provider = CannedProvider::new(canned_analysis(4), "Ratings are trending upward.");
    let report = InsightsAggregator::summarize(&provider, Timeframe::Month, &records).await;

    assert_eq!(report.timeframe, "month");
    assert_eq!(report.ai_insights, "Ratings are trending upward.");
    assert_eq!(report.stats.total_feedback, 2);
    assert_eq!(report.stats.average_rating, 3.5);
    assert_eq!(report.stats.category_breakdown.get("Hygiene"), Some(&2));
}
