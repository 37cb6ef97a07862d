// tests/orchestrator_test.rs

mod test_helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use test_helpers::{canned_analysis, new_feedback, setup_store, CannedProvider, FailingProvider};

use messboard::analysis::orchestrator::FeedbackAnalyzer;
use messboard::analysis::PriorityLevel;
use messboard::feedback::MealType;

#[tokio::test]
async fn submission_without_comment_is_never_analyzed() {
    let store = setup_store().await;
    let provider = Arc::new(FailingProvider::default());
    let analyzer = FeedbackAnalyzer::new(provider.clone());

    let record = analyzer
        .submit(&store, &new_feedback(5, Some(""), MealType::Lunch))
        .await
        .unwrap();

    assert!(record.analysis.is_none());
    assert!(record.analyzed_at.is_none());
    assert_eq!(provider.analyze_calls.load(Ordering::SeqCst), 0);

    let stored = store.get(record.id).await.unwrap().unwrap();
    assert!(stored.analyzed_at.is_none());
}

#[tokio::test]
async fn submission_survives_total_provider_outage() {
    let store = setup_store().await;
    let analyzer = FeedbackAnalyzer::new(Arc::new(FailingProvider::default()));

    let record = analyzer
        .submit(
            &store,
            &new_feedback(1, Some("Found insects in the food, got sick"), MealType::Breakfast),
        )
        .await
        .unwrap();

    // Fail-open: acceptance plus a complete heuristic analysis.
    let analysis = record.analysis.expect("fallback analysis attached");
    assert_eq!(analysis.priority_score, 10);
    assert_eq!(analysis.priority_level, PriorityLevel::Urgent);
    assert_eq!(analysis.category, "Health Safety");
    assert!(analysis.health_safety_concern);
    assert!(record.analyzed_at.is_some());

    let stored = store.get(record.id).await.unwrap().unwrap();
    assert_eq!(stored.analysis.unwrap().priority_score, 10);
}

#[tokio::test]
async fn ai_result_is_used_when_the_provider_answers() {
    let store = setup_store().await;
    let analyzer = FeedbackAnalyzer::new(Arc::new(CannedProvider::new(
        canned_analysis(6),
        "narrative",
    )));

    let record = analyzer
        .submit(&store, &new_feedback(3, Some("too oily lately"), MealType::Dinner))
        .await
        .unwrap();

    let analysis = record.analysis.unwrap();
    assert_eq!(analysis.priority_score, 6);
    assert_eq!(analysis.category, "Hygiene");
}

#[tokio::test]
async fn reanalyze_requires_a_comment() {
    let store = setup_store().await;
    let analyzer = FeedbackAnalyzer::new(Arc::new(FailingProvider::default()));

    let silent = store.save(&new_feedback(4, None, MealType::Lunch)).await.unwrap();
    let err = analyzer.reanalyze(&store, silent.id).await.unwrap_err();
    assert!(err.to_string().contains("no comment"));

    let missing = analyzer.reanalyze(&store, 12345).await.unwrap_err();
    assert!(missing.to_string().contains("not found"));
}

#[tokio::test]
async fn reanalyze_overwrites_the_previous_analysis() {
    let store = setup_store().await;

    let record = store
        .save(&new_feedback(2, Some("the wait was endless"), MealType::Lunch))
        .await
        .unwrap();
    store
        .attach_analysis(record.id, &canned_analysis(9), chrono::Utc::now())
        .await
        .unwrap();

    // Provider is down, so re-analysis lands on the heuristic result.
    let analyzer = FeedbackAnalyzer::new(Arc::new(FailingProvider::default()));
    let updated = analyzer.reanalyze(&store, record.id).await.unwrap();

    let analysis = updated.analysis.unwrap();
    assert_eq!(analysis.priority_score, 7);
    assert_eq!(analysis.category, "Service");
    assert_ne!(analysis.summary, "Canned analysis for tests");
}
