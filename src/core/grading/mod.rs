pub mod grading_models;
pub mod grading_service;

pub use grading_models::{AiConfig, AiMessage, AiProviderResponse, GradingRequest};
pub use grading_service::{AiProvider, GradingError, GradingService};
