// OAuth routes: thin HTTP wrappers around `SessionManager`.

use axum::extract::State;
use axum::response::Redirect;
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;

use super::error::PageError;
use super::first_value_query::FirstValueQuery;
use super::session_cookie;
use super::AppState;
use crate::core::auth::CallbackParams;

/// Where the browser lands once the OAuth round trip completes.
pub const POST_LOGIN_REDIRECT: &str = "/addon-discovery";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizeParams {
    pub login_hint: String,
}

/// Starts the authorization code flow and redirects to Google.
pub async fn authorize(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    FirstValueQuery(params): FirstValueQuery<AuthorizeParams>,
) -> Result<(SignedCookieJar, Redirect), PageError> {
    let (jar, session_id) = session_cookie::ensure_session(jar, state.cookie_secure);
    let request = state
        .sessions
        .authorize(&session_id, &params.login_hint)
        .await?;

    Ok((jar, Redirect::to(&request.url)))
}

/// Completes the flow. Failures render the error page with a status per kind.
pub async fn callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    FirstValueQuery(params): FirstValueQuery<CallbackParams>,
) -> Result<Redirect, PageError> {
    let session_id = session_cookie::session_id(&jar);
    state.sessions.callback(session_id.as_deref(), params).await?;

    Ok(Redirect::to(POST_LOGIN_REDIRECT))
}
