use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the provider for a bare JSON document instead of free text.
    pub json_output: bool,
    /// Thinking token budget. `Some(0)` asks for thinking to be disabled where
    /// the model allows it; models that can't turn it off keep their default.
    pub thinking_budget: Option<i32>,
}

impl AiConfig {
    /// Generation settings used for grading.
    ///
    /// Low temperature keeps grades stable between runs of the same submission.
    pub fn for_grading(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens: Some(2048),
            json_output: true,
            thinking_budget: Some(0),
        }
    }
}

/// Response from an AI provider.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    /// The model's answer text.
    pub content: String,
}

fn default_rubric() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_grade_level() -> String {
    "high school".to_string()
}

/// Body of `POST /api/grade`. Every field is optional; nothing is validated.
#[derive(Debug, Clone, Deserialize)]
pub struct GradingRequest {
    #[serde(default)]
    pub submission: String,
    /// Free-form criteria mapping, embedded in the prompt as pretty-printed JSON.
    #[serde(default = "default_rubric")]
    pub rubric: serde_json::Value,
    #[serde(default = "default_grade_level")]
    pub grade_level: String,
}

impl Default for GradingRequest {
    fn default() -> Self {
        Self {
            submission: String::new(),
            rubric: default_rubric(),
            grade_level: default_grade_level(),
        }
    }
}
