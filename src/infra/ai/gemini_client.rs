// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implementation of the `AiProvider` trait that talks to Google's Gemini API
// (https://ai.google.dev/gemini-api/docs).
//
// - Authentication: API key is passed as a query parameter (`?key=API_KEY`).
// - Request format: `contents[]` with nested `parts`.
// - Response format: text lives at `candidates[0].content.parts[*].text`.
// - Thinking: only Flash-class 2.5 models accept a zero `thinkingBudget`; Pro and
//   Gemini 3 models reject it with 400, so they get no `thinkingConfig` at all.
//
// **Environment Variables:**
// - `GEMINI_API_KEY` - Your API key from https://aistudio.google.com/apikey

use crate::core::grading::{AiConfig, AiMessage, AiProvider, AiProviderResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================
//
// See: https://ai.google.dev/api/generate-content

/// A single part of content. Gemini uses a "parts" array to support
/// multimodal content; we only ever send and read text.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

/// See: https://ai.google.dev/api/generate-content#generationconfig
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    /// `application/json` makes the model return a bare JSON document.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,

    /// Nested inside generationConfig per the API spec.
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

/// Thinking/reasoning settings (Gemini 2.5+).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    /// 0 disables thinking, -1 lets the model decide.
    thinking_budget: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,

    /// Why the model stopped generating (e.g., "STOP", "SAFETY").
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

/// Client for Google's Gemini API.
///
/// The API key is optional at construction so the service can start without
/// one; every call then fails with a configuration error instead.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, api_key })
    }

    /// Picks the `thinkingConfig` the model will accept, if any.
    ///
    /// Older models reject the field outright. A budget of 0 only works on
    /// Flash-class 2.5 models; everything else keeps its default thinking.
    fn thinking_config(model: &str, budget: Option<i32>) -> Option<ThinkingConfig> {
        let budget = budget?;
        let is_2_5 = model.contains("2.5");
        let supports_thinking = is_2_5 || model.contains("gemini-3");
        let can_disable = is_2_5 && model.contains("flash");

        let accepted = if budget == 0 {
            can_disable
        } else {
            supports_thinking
        };
        accepted.then_some(ThinkingConfig {
            thinking_budget: budget,
        })
    }

    fn build_request(messages: &[AiMessage], config: &AiConfig) -> GenerateContentRequest {
        let contents = messages
            .iter()
            .map(|msg| Content {
                role: msg.role.clone(),
                parts: vec![Part {
                    text: Some(msg.content.clone()),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            generation_config: Some(GenerationConfig {
                temperature: Some(config.temperature),
                max_output_tokens: config.max_tokens,
                response_mime_type: config
                    .json_output
                    .then(|| "application/json".to_string()),
                thinking_config: Self::thinking_config(&config.model, config.thinking_budget),
            }),
        }
    }

    /// Formats a non-success response, unwrapping Gemini's error envelope when present.
    fn api_error(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<GeminiErrorResponse>(body) {
            Ok(error_response) => format!(
                "Gemini API error ({}): {}",
                status.as_u16(),
                error_response.error.message
            ),
            Err(_) => format!("Gemini API error ({}): {}", status.as_u16(), body),
        }
    }

    /// Concatenates the text parts of the first candidate.
    fn extract_response(
        response: GenerateContentResponse,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let candidate = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or(
                "No content in Gemini response - the model may have been blocked by safety filters",
            )?;

        let parts = match candidate.content {
            Some(content) if !content.parts.is_empty() => content.parts,
            _ => {
                return Err(format!(
                    "Gemini returned an empty candidate (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                )
                .into())
            }
        };

        let content = parts.into_iter().filter_map(|p| p.text).collect::<String>();

        Ok(AiProviderResponse { content })
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or("GEMINI_API_KEY is not configured")?;

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, config.model);
        let request = Self::build_request(messages, config);

        // Never log the URL with the key attached
        tracing::debug!(
            "Gemini request to model {}: {} messages",
            config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(Self::api_error(status, &error_text).into());
        }

        let response_json: GenerateContentResponse = response.json().await?;
        let result = Self::extract_response(response_json)?;

        tracing::debug!("Gemini response received: {} chars", result.content.len());

        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
