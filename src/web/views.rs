// Add-on views.
//
// Classroom opens these in an iframe and passes its context as query
// parameters. Every parameter is optional and defaults to an empty string;
// the handlers never fail on missing context. A repeated parameter keeps its
// first value.

use askama::Template;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;

use super::error::PageError;
use super::first_value_query::FirstValueQuery;
use super::session_cookie;
use super::AppState;
use crate::config::ADDON_TITLE;
use crate::core::auth::AuthStatus;

const ADDON_UTILS_JS: &str = include_str!("../../static/scripts/addon-utils.js");

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "addon-discovery.html")]
struct AddonDiscoveryTemplate<'a> {
    title: &'a str,
    message: &'a str,
    login_hint: &'a str,
    connected: bool,
}

#[derive(Template)]
#[template(path = "teacher-view.html")]
struct TeacherViewTemplate<'a> {
    title: &'a str,
    item_id: &'a str,
    item_type: &'a str,
    course_id: &'a str,
}

#[derive(Template)]
#[template(path = "student-view.html")]
struct StudentViewTemplate<'a> {
    title: &'a str,
    item_id: &'a str,
    attachment_id: &'a str,
    submission_id: &'a str,
}

#[derive(Template)]
#[template(path = "grader-view.html")]
struct GraderViewTemplate<'a> {
    title: &'a str,
    item_id: &'a str,
    attachment_id: &'a str,
    submission_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiscoveryParams {
    pub login_hint: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeacherViewParams {
    pub item_id: String,
    pub item_type: String,
    pub course_id: String,
}

/// Context for the student and grader views.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionParams {
    pub item_id: String,
    pub attachment_id: String,
    pub submission_id: String,
}

fn render(template: &impl Template) -> Result<Html<String>, PageError> {
    Ok(Html(template.render()?))
}

pub async fn index() -> Result<Html<String>, PageError> {
    render(&IndexTemplate {
        title: ADDON_TITLE,
        message: "Welcome to AI Auto-Grader for Google Classroom",
    })
}

/// First screen Classroom shows when a teacher opens the add-on.
pub async fn addon_discovery(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    FirstValueQuery(params): FirstValueQuery<DiscoveryParams>,
) -> Result<Html<String>, PageError> {
    let session_id = session_cookie::session_id(&jar);
    let connected = match state.sessions.session(session_id.as_deref()).await {
        Ok(session) => session.status() == AuthStatus::Authenticated,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read session for discovery view");
            false
        }
    };

    render(&AddonDiscoveryTemplate {
        title: "AI Auto-Grader Setup",
        message: "Welcome! Let's set up AI-powered grading for your assignments.",
        login_hint: &params.login_hint,
        connected,
    })
}

pub async fn teacher_view(
    FirstValueQuery(params): FirstValueQuery<TeacherViewParams>,
) -> Result<Html<String>, PageError> {
    render(&TeacherViewTemplate {
        title: "Create Auto-Grading Assignment",
        item_id: &params.item_id,
        item_type: &params.item_type,
        course_id: &params.course_id,
    })
}

pub async fn student_view(
    FirstValueQuery(params): FirstValueQuery<SubmissionParams>,
) -> Result<Html<String>, PageError> {
    render(&StudentViewTemplate {
        title: "Submit Your Work",
        item_id: &params.item_id,
        attachment_id: &params.attachment_id,
        submission_id: &params.submission_id,
    })
}

pub async fn grader_view(
    FirstValueQuery(params): FirstValueQuery<SubmissionParams>,
) -> Result<Html<String>, PageError> {
    render(&GraderViewTemplate {
        title: "Review Student Work",
        item_id: &params.item_id,
        attachment_id: &params.attachment_id,
        submission_id: &params.submission_id,
    })
}

/// Helpers the views use to talk to the Classroom host page.
pub async fn addon_utils_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        ADDON_UTILS_JS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query<T: serde::de::DeserializeOwned>(uri: &str) -> T {
        let uri: axum::http::Uri = uri.parse().unwrap();
        FirstValueQuery::<T>::from_query(uri.query()).unwrap().0
    }

    #[test]
    fn test_missing_query_params_default_to_empty() {
        let params: TeacherViewParams = query("/teacher-view");
        assert_eq!(params.item_id, "");
        assert_eq!(params.item_type, "");
        assert_eq!(params.course_id, "");

        let params: SubmissionParams = query("/student-view?itemId=7");
        assert_eq!(params.item_id, "7");
        assert_eq!(params.attachment_id, "");
        assert_eq!(params.submission_id, "");
    }

    #[test]
    fn test_repeated_view_params_keep_first_value() {
        let params: SubmissionParams =
            query("/grader-view?itemId=a&submissionId=s1&itemId=b&submissionId=s2");
        assert_eq!(params.item_id, "a");
        assert_eq!(params.submission_id, "s1");
    }

    #[test]
    fn test_discovery_template_escapes_login_hint() {
        let html = AddonDiscoveryTemplate {
            title: "Setup",
            message: "Hello",
            login_hint: "<script>alert(1)</script>",
            connected: false,
        }
        .render()
        .unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_discovery_template_reflects_connection() {
        let connected = AddonDiscoveryTemplate {
            title: "Setup",
            message: "Hello",
            login_hint: "",
            connected: true,
        }
        .render()
        .unwrap();
        assert!(connected.contains("Connected to Google Classroom"));

        let disconnected = AddonDiscoveryTemplate {
            title: "Setup",
            message: "Hello",
            login_hint: "",
            connected: false,
        }
        .render()
        .unwrap();
        assert!(disconnected.contains("href=\"/authorize"));
    }
}
