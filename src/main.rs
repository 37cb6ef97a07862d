// src/main.rs

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use messboard::analysis::orchestrator::FeedbackAnalyzer;
use messboard::analysis::provider::AnalysisProvider;
use messboard::batch::BatchReanalyzer;
use messboard::config::CONFIG;
use messboard::feedback::migration;
use messboard::feedback::store::FeedbackStore;
use messboard::feedback::{MealType, NewFeedback};
use messboard::gemini::GeminiClient;
use messboard::insights::{InsightsAggregator, Timeframe};

#[derive(Parser)]
#[command(name = "messboard", about = "Mess feedback classification and insights")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update the database schema
    Migrate,
    /// Submit one feedback entry and classify it inline
    Submit {
        #[arg(long)]
        rating: i64,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long, default_value = "lunch")]
        meal_type: String,
    },
    /// Re-analyze one record by id, or the whole unanalyzed backlog
    Reanalyze {
        #[arg(long)]
        id: Option<i64>,
        /// Cap the number of backlog records processed
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the dashboard insights report
    Insights {
        #[arg(long, default_value = "week")]
        timeframe: String,
    },
    /// List unresolved high-priority feedback from the last week
    Alerts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from_str(&CONFIG.log_level).unwrap_or(Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let pool = SqlitePoolOptions::new()
        .max_connections(CONFIG.sqlite_max_connections)
        .connect(&CONFIG.database_url)
        .await?;
    migration::run_migrations(&pool).await?;
    let store = FeedbackStore::new(pool);

    match cli.command {
        Command::Migrate => {
            info!("Migrations applied to {}", CONFIG.database_url);
        }
        Command::Submit {
            rating,
            comment,
            meal_type,
        } => {
            let meal_type: MealType = meal_type.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let analyzer = FeedbackAnalyzer::new(gemini_provider()?);
            let record = analyzer
                .submit(
                    &store,
                    &NewFeedback {
                        rating,
                        comment,
                        meal_type,
                    },
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Reanalyze { id: Some(id), .. } => {
            let analyzer = FeedbackAnalyzer::new(gemini_provider()?);
            let record = analyzer.reanalyze(&store, id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Reanalyze { id: None, limit } => {
            let runner = BatchReanalyzer::from_config(gemini_provider()?);
            let outcome = runner.run(&store, limit).await?;
            info!(
                "Re-analyzed {} records ({} via AI, {} heuristic, {} failed)",
                outcome.total, outcome.ai_analyzed, outcome.fell_back, outcome.failed
            );
        }
        Command::Insights { timeframe } => {
            let timeframe: Timeframe =
                timeframe.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let provider = gemini_provider()?;
            let records = store
                .list_analyzed_since(timeframe.cutoff(chrono::Utc::now()))
                .await?;
            let report = InsightsAggregator::summarize(provider.as_ref(), timeframe, &records).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Alerts => {
            let cutoff = Timeframe::Week.cutoff(chrono::Utc::now());
            let alerts = store.open_alerts(cutoff).await?;
            let critical = alerts
                .iter()
                .filter(|a| a.urgency_level == messboard::feedback::AlertUrgency::Critical)
                .count();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "total_alerts": alerts.len(),
                    "critical_alerts": critical,
                    "alerts": alerts,
                }))?
            );
        }
    }

    Ok(())
}

fn gemini_provider() -> Result<Arc<dyn AnalysisProvider>> {
    let client = GeminiClient::from_env()?;
    Ok(Arc::new(client))
}
