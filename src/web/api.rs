// JSON API used by the add-on views.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use axum_extra::extract::SignedCookieJar;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::error::ApiError;
use super::session_cookie;
use super::AppState;
use crate::core::grading::GradingRequest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttachmentRequest {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
}

/// Only `application/json` bodies are accepted (parameters such as `charset`
/// are allowed). Form and `text/plain` posts can be sent cross-site without a
/// preflight, and the session cookie rides along on them.
fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if mime.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType)
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {}", field)))
}

/// POST /api/grade
pub async fn grade(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    require_json(&headers)?;
    let request: GradingRequest = parse_body(&body)?;

    let result = state.grader.grade(&request).await.map_err(|e| {
        tracing::error!(error = %e, grade_level = %request.grade_level, "Grading failed");
        ApiError::from(e)
    })?;

    Ok(Json(result))
}

/// POST /api/create-attachment
///
/// The session is checked before the body is looked at, so an unauthenticated
/// caller gets 401 whatever it sends.
pub async fn create_attachment(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let session_id = session_cookie::session_id(&jar);
    let credentials = state
        .sessions
        .credentials(session_id.as_deref())
        .await?
        .filter(|c| c.has_access_token())
        .ok_or(ApiError::Unauthorized)?;

    require_json(&headers)?;
    let request: CreateAttachmentRequest = parse_body(&body)?;
    let course_id = required(request.course_id, "courseId")?;
    let item_id = required(request.item_id, "itemId")?;

    let created = state
        .attachments
        .create_attachment(Some(&credentials), &course_id, &item_id)
        .await?;

    Ok(Json(created))
}
