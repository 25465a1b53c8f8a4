// HTTP error responses.
//
// JSON routes answer with `{"error": <message>}`; browser-facing routes render
// the error page instead.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::config::ADDON_TITLE;
use crate::core::auth::AuthError;
use crate::core::classroom::ClassroomError;
use crate::core::grading::GradingError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Content-Type must be application/json")]
    UnsupportedMediaType,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<GradingError> for ApiError {
    fn from(err: GradingError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ClassroomError> for ApiError {
    fn from(err: ClassroomError) -> Self {
        match err {
            ClassroomError::NotAuthenticated => ApiError::Unauthorized,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    title: &'a str,
    error_message: &'a str,
}

/// Error rendered as an HTML page.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: String,
}

impl PageError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<AuthError> for PageError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::ProviderDenied(_)
            | AuthError::MissingState
            | AuthError::StateMismatch
            | AuthError::MissingCode => StatusCode::BAD_REQUEST,
            AuthError::TokenExchangeFailed(_) => StatusCode::BAD_GATEWAY,
            AuthError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<askama::Error> for PageError {
    fn from(err: askama::Error) -> Self {
        tracing::error!(error = %err, "Template rendering failed");
        PageError::internal("Failed to render page")
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let page = ErrorTemplate {
            title: ADDON_TITLE,
            error_message: &self.message,
        };
        match page.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::StoreError;

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UnsupportedMediaType.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::from(GradingError::MalformedResponse("eof".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ClassroomError::NotAuthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_callback_errors_map_to_page_statuses() {
        assert_eq!(
            PageError::from(AuthError::StateMismatch).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PageError::from(AuthError::TokenExchangeFailed("boom".into())).status,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PageError::from(AuthError::Session(StoreError::Backend("down".into()))).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
