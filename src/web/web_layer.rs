// Web layer - axum routes, templates and cookies.
// Handlers only translate HTTP to core calls; the flows live in core.

#[path = "api.rs"]
pub mod api;

#[path = "error.rs"]
pub mod error;

#[path = "first_value_query.rs"]
pub mod first_value_query;

#[path = "health.rs"]
pub mod health;

#[path = "oauth_routes.rs"]
pub mod oauth_routes;

#[path = "session_cookie.rs"]
pub mod session_cookie;

#[path = "views.rs"]
pub mod views;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use tower_http::trace::TraceLayer;

use crate::core::auth::{SessionManager, SessionStore, TokenExchanger};
use crate::core::classroom::{AttachmentService, ClassroomApi};
use crate::core::grading::{AiProvider, GradingService};

pub type Sessions = SessionManager<Box<dyn TokenExchanger>, Box<dyn SessionStore>>;
pub type Grader = GradingService<Box<dyn AiProvider>>;
pub type Attachments = AttachmentService<Box<dyn ClassroomApi>>;

/// Shared by every handler. Cloned per request, so everything heavy is behind an Arc.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Sessions>,
    pub grader: Arc<Grader>,
    pub attachments: Arc<Attachments>,
    pub cookie_key: Key,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        sessions: Sessions,
        grader: Grader,
        attachments: Attachments,
        secret_key: &str,
        cookie_secure: bool,
    ) -> Self {
        Self {
            sessions: Arc::new(sessions),
            grader: Arc::new(grader),
            attachments: Arc::new(attachments),
            cookie_key: cookie_key(secret_key),
            cookie_secure,
        }
    }
}

/// Signing keys must be 64 bytes; SHA-512 stretches any secret to that length.
fn cookie_key(secret_key: &str) -> Key {
    Key::from(Sha512::digest(secret_key.as_bytes()).as_slice())
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(views::index))
        .route("/addon-discovery", get(views::addon_discovery))
        .route("/teacher-view", get(views::teacher_view))
        .route("/student-view", get(views::student_view))
        .route("/grader-view", get(views::grader_view))
        .route(
            "/static/scripts/addon-utils.js",
            get(views::addon_utils_script),
        )
        .route("/authorize", get(oauth_routes::authorize))
        .route("/callback", get(oauth_routes::callback))
        .route("/api/grade", post(api::grade))
        .route("/api/create-attachment", post(api::create_attachment))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
