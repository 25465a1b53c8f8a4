// Classroom add-on attachments.
//
// When a teacher picks the add-on on a piece of course work, Classroom needs an
// attachment resource that tells it where our teacher and student views live.
// This module builds that resource and hands it to the Classroom API port.

use crate::core::auth::Credentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClassroomError {
    #[error("Not authorized")]
    NotAuthenticated,

    #[error("Invalid attachment link: {0}")]
    InvalidLink(String),

    #[error("{0}")]
    Api(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedUri {
    pub uri: String,
}

/// Request body for `courses.courseWork.addOnAttachments.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOnAttachment {
    pub teacher_view_uri: EmbedUri,
    pub student_view_uri: EmbedUri,
    pub title: String,
}

/// Port for the Classroom REST API.
#[async_trait]
pub trait ClassroomApi: Send + Sync {
    /// Creates the attachment and returns the created resource as Classroom sent it.
    async fn create_addon_attachment(
        &self,
        credentials: &Credentials,
        course_id: &str,
        item_id: &str,
        attachment: &AddOnAttachment,
    ) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl ClassroomApi for Box<dyn ClassroomApi> {
    async fn create_addon_attachment(
        &self,
        credentials: &Credentials,
        course_id: &str,
        item_id: &str,
        attachment: &AddOnAttachment,
    ) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>> {
        (**self)
            .create_addon_attachment(credentials, course_id, item_id, attachment)
            .await
    }
}

pub struct AttachmentService<C: ClassroomApi> {
    api: C,
    /// Base URL of our own views. Must end with `/`.
    public_base_url: Url,
    title: String,
}

impl<C: ClassroomApi> AttachmentService<C> {
    pub fn new(api: C, public_base_url: Url, title: impl Into<String>) -> Self {
        Self {
            api,
            public_base_url,
            title: title.into(),
        }
    }

    /// Builds the attachment resource pointing at our views for `item_id`.
    pub fn build_attachment(&self, item_id: &str) -> Result<AddOnAttachment, ClassroomError> {
        Ok(AddOnAttachment {
            teacher_view_uri: EmbedUri {
                uri: self.view_uri("teacher-view", item_id)?,
            },
            student_view_uri: EmbedUri {
                uri: self.view_uri("student-view", item_id)?,
            },
            title: self.title.clone(),
        })
    }

    fn view_uri(&self, view: &str, item_id: &str) -> Result<String, ClassroomError> {
        let mut url = self
            .public_base_url
            .join(view)
            .map_err(|e| ClassroomError::InvalidLink(e.to_string()))?;
        url.query_pairs_mut().append_pair("itemId", item_id);
        Ok(url.into())
    }

    /// One best-effort create call; no retry and no token refresh.
    pub async fn create_attachment(
        &self,
        credentials: Option<&Credentials>,
        course_id: &str,
        item_id: &str,
    ) -> Result<serde_json::Value, ClassroomError> {
        let credentials = credentials
            .filter(|c| c.has_access_token())
            .ok_or(ClassroomError::NotAuthenticated)?;

        let attachment = self.build_attachment(item_id)?;

        let created = self
            .api
            .create_addon_attachment(credentials, course_id, item_id, &attachment)
            .await
            .map_err(|e| {
                tracing::error!(course_id, item_id, error = %e, "Attachment creation failed");
                ClassroomError::Api(e.to_string())
            })?;

        tracing::info!(course_id, item_id, "Add-on attachment created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<(String, String, AddOnAttachment)>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl ClassroomApi for RecordingApi {
        async fn create_addon_attachment(
            &self,
            _credentials: &Credentials,
            course_id: &str,
            item_id: &str,
            attachment: &AddOnAttachment,
        ) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>> {
            self.calls.lock().unwrap().push((
                course_id.to_string(),
                item_id.to_string(),
                attachment.clone(),
            ));
            if let Some(message) = &self.fail_with {
                return Err(message.clone().into());
            }
            let mut created = serde_json::to_value(attachment)?;
            created["id"] = serde_json::json!("attachment-1");
            Ok(created)
        }
    }

    fn credentials(token: &str) -> Credentials {
        Credentials {
            token: token.to_string(),
            refresh_token: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![],
        }
    }

    fn service(api: RecordingApi) -> AttachmentService<RecordingApi> {
        AttachmentService::new(
            api,
            "https://localhost:5000/".parse().unwrap(),
            "AI Auto-Grading",
        )
    }

    #[test]
    fn test_view_uris_embed_item_id() {
        let service = service(RecordingApi::default());
        let attachment = service.build_attachment("item-42").unwrap();

        assert_eq!(
            attachment.teacher_view_uri.uri,
            "https://localhost:5000/teacher-view?itemId=item-42"
        );
        assert_eq!(
            attachment.student_view_uri.uri,
            "https://localhost:5000/student-view?itemId=item-42"
        );
        assert_eq!(attachment.title, "AI Auto-Grading");
    }

    #[test]
    fn test_item_id_is_percent_encoded() {
        let service = service(RecordingApi::default());
        let attachment = service.build_attachment("a&b=c").unwrap();
        assert!(attachment.teacher_view_uri.uri.ends_with("itemId=a%26b%3Dc"));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let service = service(RecordingApi::default());
        let value = serde_json::to_value(service.build_attachment("1").unwrap()).unwrap();

        assert!(value["teacherViewUri"]["uri"].is_string());
        assert!(value["studentViewUri"]["uri"].is_string());
        assert_eq!(value["title"], "AI Auto-Grading");
    }

    #[tokio::test]
    async fn test_missing_or_blank_credentials_are_rejected() {
        let service = service(RecordingApi::default());

        let none = service.create_attachment(None, "c1", "i1").await;
        assert!(matches!(none, Err(ClassroomError::NotAuthenticated)));

        let blank = credentials("  ");
        let blank = service.create_attachment(Some(&blank), "c1", "i1").await;
        assert!(matches!(blank, Err(ClassroomError::NotAuthenticated)));

        assert!(service.api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_passes_ids_and_returns_raw_response() {
        let service = service(RecordingApi::default());
        let creds = credentials("ya29.token");

        let created = service
            .create_attachment(Some(&creds), "course-1", "item-9")
            .await
            .unwrap();

        assert_eq!(created["id"], "attachment-1");
        assert!(created["teacherViewUri"]["uri"]
            .as_str()
            .unwrap()
            .contains("itemId=item-9"));

        let calls = service.api.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "course-1");
        assert_eq!(calls[0].1, "item-9");
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let service = service(RecordingApi {
            fail_with: Some("Classroom API error (403): The caller does not have permission".into()),
            ..Default::default()
        });
        let creds = credentials("ya29.token");

        let err = service
            .create_attachment(Some(&creds), "c", "i")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Classroom API error (403): The caller does not have permission"
        );
    }
}
