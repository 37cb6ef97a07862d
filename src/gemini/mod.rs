// src/gemini/mod.rs
//! Gemini client for feedback classification and insights narratives.
//!
//! Uses the plain generateContent API: one prompt in, free text out. There is
//! no structured-output guarantee, so the JSON payload is dug out of whatever
//! prose and code fencing the model wraps around it.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::analysis::provider::AnalysisProvider;
use crate::analysis::{AnalysisError, FeedbackAnalysis};
use crate::config::CONFIG;
use crate::feedback::{FeedbackRecord, MealType};

pub struct GeminiClient {
    client: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            base_url: CONFIG.gemini_base_url.clone(),
            model: CONFIG.gemini_model.clone(),
            timeout: Duration::from_secs(CONFIG.gemini_timeout_secs),
        }
    }

    /// Construction is the only place a missing credential is fatal; every
    /// later failure is recoverable by the heuristic fallback.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AnalysisError::Configuration("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Single prompt-to-text round trip against generateContent.
    async fn generate(&self, prompt: String) -> Result<String, AnalysisError> {
        let api_request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiTextPart { text: prompt }],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&api_request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout
                } else {
                    AnalysisError::Service(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Service(format!("{status} - {body}")));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        if let Some(error) = &api_response.error {
            return Err(AnalysisError::Service(error.message.clone()));
        }

        let mut text = String::new();
        if let Some(candidates) = api_response.candidates {
            if let Some(candidate) = candidates.into_iter().next() {
                for part in candidate.content.parts {
                    if let Some(t) = part.text {
                        text.push_str(&t);
                    }
                }
            }
        }

        if text.is_empty() {
            return Err(AnalysisError::MalformedResponse(
                "response contained no text".into(),
            ));
        }
        Ok(text)
    }

    fn classification_prompt(comment: &str, rating: i64, meal_type: MealType) -> String {
        format!(
            r#"Analyze this mess/cafeteria feedback and provide a JSON response.

Feedback Details:
- Comment: "{comment}"
- Rating: {rating}/5
- Meal Type: {meal_type}

Return ONLY a valid JSON object with these fields:
{{
  "priority_score": <number 1-10>,
  "priority_level": "<LOW|MEDIUM|HIGH|URGENT>",
  "sentiment": "<positive|neutral|negative>",
  "category": "<string: Food Quality|Service|Hygiene|Health Safety|Infrastructure|Staff|Other>",
  "keywords": ["<array of key terms>"],
  "summary": "<brief 1-2 sentence summary>",
  "recommended_action": "<suggested action for management>",
  "escalation_needed": <boolean>,
  "health_safety_concern": <boolean>
}}

Priority Scoring Guidelines:
- 9-10 (URGENT): Health/safety issues, food poisoning, contamination, serious hygiene problems
- 7-8 (HIGH): Service disruptions, equipment failures, staff issues, major quality problems
- 4-6 (MEDIUM): Taste issues, minor quality problems, suggestions for improvement
- 1-3 (LOW): Minor complaints, general suggestions, positive feedback

Consider the rating when determining priority - very low ratings (1-2) should increase priority."#,
            meal_type = meal_type.as_str(),
        )
    }

    fn insights_prompt(feedback: &[FeedbackRecord]) -> String {
        let entries = feedback
            .iter()
            .enumerate()
            .map(|(i, fb)| {
                let (category, level) = fb
                    .analysis
                    .as_ref()
                    .map(|a| (a.category.as_str(), a.priority_level.as_str()))
                    .unwrap_or(("N/A", "N/A"));
                format!(
                    "{}. Rating: {}/5, Meal: {}\n   Comment: \"{}\"\n   Category: {}\n   Priority: {}",
                    i + 1,
                    fb.rating,
                    fb.meal_type.as_str(),
                    fb.comment.as_deref().unwrap_or(""),
                    category,
                    level,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Analyze these mess feedback entries and provide actionable insights for management:

{entries}

Provide a concise summary with:
1. Key trends and patterns
2. Most urgent issues to address
3. Specific actionable recommendations
4. Overall satisfaction trends

Keep the response under 300 words and focus on actionable insights."#
        )
    }
}

#[async_trait]
impl AnalysisProvider for GeminiClient {
    async fn analyze_feedback(
        &self,
        comment: &str,
        rating: i64,
        meal_type: MealType,
    ) -> Result<FeedbackAnalysis, AnalysisError> {
        let prompt = Self::classification_prompt(comment, rating, meal_type);
        let text = self.generate(prompt).await?;
        let value = extract_json(&text)?;
        FeedbackAnalysis::from_model_json(&value)
    }

    async fn generate_insights(
        &self,
        feedback: &[FeedbackRecord],
    ) -> Result<String, AnalysisError> {
        let prompt = Self::insights_prompt(feedback);
        let text = self.generate(prompt).await?;
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiTextPart>,
}

#[derive(Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContentResponse,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

/// Pulls the first balanced `{...}` object out of free text and parses it.
///
/// Brace counting is string-aware so quoted braces inside the payload do not
/// unbalance the scan; code fences fall out naturally because the scan starts
/// at the first `{`.
pub fn extract_json(text: &str) -> Result<Value, AnalysisError> {
    let bytes = text.as_bytes();
    let start = text
        .find('{')
        .ok_or_else(|| AnalysisError::MalformedResponse("no JSON object in response".into()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..=i];
                    return serde_json::from_str(candidate)
                        .map_err(|e| AnalysisError::MalformedResponse(e.to_string()));
                }
            }
            _ => {}
        }
    }

    Err(AnalysisError::MalformedResponse(
        "unbalanced JSON object in response".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PriorityLevel;

    #[test]
    fn extracts_json_from_code_fence() {
        let text = "Here is the result: ```json\n{\"priority_score\": 15, \"sentiment\": \"negative\"}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value["priority_score"], 15);

        let analysis = FeedbackAnalysis::from_model_json(&value).unwrap();
        assert_eq!(analysis.priority_score, 10);
        assert_eq!(analysis.priority_level, PriorityLevel::Urgent);
    }

    #[test]
    fn extracts_nested_objects_and_braces_in_strings() {
        let text = r#"note {"summary": "use {braces} carefully", "extra": {"a": 1}} trailing"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["summary"], "use {braces} carefully");
        assert_eq!(value["extra"]["a"], 1);
    }

    #[test]
    fn rejects_text_without_json() {
        assert!(matches!(
            extract_json("the model refused to answer"),
            Err(AnalysisError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_json("{\"unterminated\": true"),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn classification_prompt_carries_schema_and_bands() {
        let prompt = GeminiClient::classification_prompt("cold rice", 2, MealType::Dinner);
        assert!(prompt.contains("\"priority_score\""));
        assert!(prompt.contains("\"health_safety_concern\""));
        assert!(prompt.contains("9-10 (URGENT)"));
        assert!(prompt.contains("Rating: 2/5"));
        assert!(prompt.contains("Meal Type: dinner"));
    }
}
