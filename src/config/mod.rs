// src/config/mod.rs
// All tunables come from the environment (.env supported); defaults are safe for local use.

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct MessboardConfig {
    // ── Gemini Configuration
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// Per-request timeout for generateContent calls, in seconds.
    pub gemini_timeout_secs: u64,

    // ── Database Configuration
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Batch Re-analysis Configuration
    pub reanalyze_delay_ms: u64,
    pub reanalyze_max_retries: u32,

    // ── Insights Configuration
    pub urgent_feedback_limit: usize,

    // ── Logging
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            // Tolerate inline comments and stray whitespace in .env values
            let clean_val = val.split('#').next().unwrap_or("").trim();
            clean_val.parse::<T>().unwrap_or(default)
        }
        Err(_) => default,
    }
}

impl MessboardConfig {
    pub fn from_env() -> Self {
        // Best effort; missing .env just means plain environment variables.
        let _ = dotenvy::dotenv();

        Self {
            gemini_base_url: env_var_or(
                "MESSBOARD_GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ),
            gemini_model: env_var_or("MESSBOARD_GEMINI_MODEL", "gemini-1.5-flash".to_string()),
            gemini_timeout_secs: env_var_or("MESSBOARD_GEMINI_TIMEOUT_SECS", 30),
            database_url: env_var_or("DATABASE_URL", "sqlite:./messboard.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 5),
            reanalyze_delay_ms: env_var_or("MESSBOARD_REANALYZE_DELAY_MS", 1000),
            reanalyze_max_retries: env_var_or("MESSBOARD_REANALYZE_MAX_RETRIES", 2),
            urgent_feedback_limit: env_var_or("MESSBOARD_URGENT_FEEDBACK_LIMIT", 10),
            log_level: env_var_or("MESSBOARD_LOG_LEVEL", "info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<MessboardConfig> = Lazy::new(MessboardConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        // No other test in this binary touches these vars.
        unsafe {
            std::env::remove_var("MESSBOARD_GEMINI_BASE_URL");
            std::env::remove_var("MESSBOARD_GEMINI_MODEL");
            std::env::remove_var("MESSBOARD_GEMINI_TIMEOUT_SECS");
            std::env::remove_var("MESSBOARD_REANALYZE_DELAY_MS");
            std::env::remove_var("MESSBOARD_REANALYZE_MAX_RETRIES");
            std::env::remove_var("MESSBOARD_URGENT_FEEDBACK_LIMIT");
            std::env::remove_var("MESSBOARD_LOG_LEVEL");
        }

        let cfg = MessboardConfig::from_env();
        assert_eq!(
            cfg.gemini_base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(cfg.gemini_model, "gemini-1.5-flash");
        assert_eq!(cfg.gemini_timeout_secs, 30);
        assert_eq!(cfg.reanalyze_delay_ms, 1000);
        assert_eq!(cfg.reanalyze_max_retries, 2);
        assert_eq!(cfg.urgent_feedback_limit, 10);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn env_var_or_strips_inline_comments() {
        unsafe {
            std::env::set_var("MESSBOARD_TEST_TIMEOUT", "45 # seconds");
        }
        assert_eq!(env_var_or("MESSBOARD_TEST_TIMEOUT", 30u64), 45);
        unsafe {
            std::env::remove_var("MESSBOARD_TEST_TIMEOUT");
        }
    }
}
