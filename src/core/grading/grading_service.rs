use super::grading_models::{AiConfig, AiMessage, AiProviderResponse, GradingRequest};
use async_trait::async_trait;
use std::error::Error;
use thiserror::Error;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    ///
    /// Returns the model's answer text.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

// Blanket implementation for Box<dyn AiProvider> so the web state can hold
// whichever provider main wired up.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        (**self).chat_complete(messages, config).await
    }
}

#[derive(Debug, Error)]
pub enum GradingError {
    #[error("{0}")]
    Provider(String),

    #[error("Model response was not valid JSON: {0}")]
    MalformedResponse(String),
}

pub struct GradingService<P: AiProvider> {
    provider: P,
    config: AiConfig,
}

impl<P: AiProvider> GradingService<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self { provider, config }
    }

    /// Grades one submission and returns the model's JSON verbatim.
    ///
    /// The result is expected to look like
    /// `{"grade": n, "feedback": "..", "strengths": [..], "improvements": [..]}`
    /// but only JSON well-formedness is checked.
    pub async fn grade(
        &self,
        request: &GradingRequest,
    ) -> Result<serde_json::Value, GradingError> {
        let prompt = build_prompt(request);
        let messages = [AiMessage::user(prompt)];

        let response = self
            .provider
            .chat_complete(&messages, &self.config)
            .await
            .map_err(|e| GradingError::Provider(e.to_string()))?;

        tracing::debug!("Grading response: {} chars", response.content.len());

        parse_grading_response(&response.content)
    }
}

/// Builds the grading instruction for the model.
pub fn build_prompt(request: &GradingRequest) -> String {
    let rubric = serde_json::to_string_pretty(&request.rubric)
        .unwrap_or_else(|_| request.rubric.to_string());

    format!(
        r#"You are an expert teacher grading student work.

Grade Level: {grade_level}
Rubric: {rubric}

Student Submission:
{submission}

Please provide:
1. A numerical grade (0-100)
2. Constructive, grade-appropriate feedback
3. Specific strengths
4. Areas for improvement

Format your response as JSON:
{{
  "grade": <number>,
  "feedback": "<feedback text>",
  "strengths": ["<strength 1>", "<strength 2>"],
  "improvements": ["<improvement 1>", "<improvement 2>"]
}}"#,
        grade_level = request.grade_level,
        rubric = rubric,
        submission = request.submission,
    )
}

/// Parses the model's text as JSON.
///
/// Models regularly wrap JSON in a markdown code fence even when told not to,
/// so a single surrounding fence is removed first. Anything else is parsed as-is.
pub fn parse_grading_response(text: &str) -> Result<serde_json::Value, GradingError> {
    let payload = strip_code_fence(text);
    serde_json::from_str(payload).map_err(|e| GradingError::MalformedResponse(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}
