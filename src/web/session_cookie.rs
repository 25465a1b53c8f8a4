// Session cookie helpers.
//
// The cookie only carries an opaque session id, signed with the server secret.
// Everything else lives server-side in the `SessionStore`.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::SignedCookieJar;

use crate::core::auth::nonce;

pub const SESSION_COOKIE: &str = "grader_session";

/// Session id from a correctly signed cookie, if there is one.
pub fn session_id(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| !id.is_empty())
}

/// Reuses the current session or starts a new one.
///
/// Returns the jar to send back (carrying the new cookie if one was minted).
pub fn ensure_session(jar: SignedCookieJar, secure: bool) -> (SignedCookieJar, String) {
    if let Some(id) = session_id(&jar) {
        return (jar, id);
    }

    let id = nonce::generate_session_id();
    let jar = jar.add(session_cookie(&id, secure));
    (jar, id)
}

/// Classroom embeds the add-on views in an iframe on classroom.google.com, so
/// the cookie must be `SameSite=None` to reach us from there. Browsers only
/// accept that on secure cookies; plain-http development falls back to `Lax`.
fn session_cookie(session_id: &str, secure: bool) -> Cookie<'static> {
    let same_site = if secure { SameSite::None } else { SameSite::Lax };

    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_cookie_is_cross_site() {
        let cookie = session_cookie("abc", true);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_insecure_cookie_falls_back_to_lax() {
        let cookie = session_cookie("abc", false);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(false));
    }
}
