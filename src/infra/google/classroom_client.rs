use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use url::Url;

use crate::core::auth::Credentials;
use crate::core::classroom::{AddOnAttachment, ClassroomApi};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

/// Google APIs wrap failures as `{"error": {"code": .., "message": .., "status": ..}}`.
#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

/// Minimal Classroom REST client. Only the add-on attachment call is needed.
pub struct ClassroomClient {
    client: Client,
    base_url: Url,
}

impl ClassroomClient {
    pub fn new(base_url: Url) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url })
    }

    /// `{base}/courses/{courseId}/courseWork/{itemId}/addOnAttachments`, ids percent-encoded.
    fn attachments_url(&self, course_id: &str, item_id: &str) -> Result<Url, String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("Classroom base URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["courses", course_id, "courseWork", item_id, "addOnAttachments"]);
        Ok(url)
    }

    fn api_error(status: reqwest::StatusCode, body: &str) -> String {
        let message = serde_json::from_str::<GoogleErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        format!("Classroom API error ({}): {}", status.as_u16(), message)
    }
}

#[async_trait]
impl ClassroomApi for ClassroomClient {
    async fn create_addon_attachment(
        &self,
        credentials: &Credentials,
        course_id: &str,
        item_id: &str,
        attachment: &AddOnAttachment,
    ) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>> {
        let url = self.attachments_url(course_id, item_id)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&credentials.token)
            .json(attachment)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::api_error(status, &body).into());
        }

        let created: serde_json::Value = response.json().await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ClassroomClient {
        ClassroomClient::new("https://classroom.googleapis.com/v1/".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_attachments_url() {
        let url = client().attachments_url("123", "456").unwrap();
        assert_eq!(
            url.as_str(),
            "https://classroom.googleapis.com/v1/courses/123/courseWork/456/addOnAttachments"
        );
    }

    #[test]
    fn test_attachments_url_encodes_ids() {
        let url = client().attachments_url("a/b", "c?d").unwrap();
        assert_eq!(
            url.as_str(),
            "https://classroom.googleapis.com/v1/courses/a%2Fb/courseWork/c%3Fd/addOnAttachments"
        );
    }

    #[test]
    fn test_api_error_unwraps_google_envelope() {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(
            ClassroomClient::api_error(reqwest::StatusCode::FORBIDDEN, body),
            "Classroom API error (403): The caller does not have permission"
        );
        assert_eq!(
            ClassroomClient::api_error(reqwest::StatusCode::NOT_FOUND, "Not Found"),
            "Classroom API error (404): Not Found"
        );
    }
}
