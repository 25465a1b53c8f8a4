// Domain models for the OAuth session lifecycle.
//
// A browser session moves through three states:
//   unauthenticated -> pending (state issued) -> authenticated (credentials stored)
// Everything here is plain data so it can be stored by any `SessionStore`.

use serde::{Deserialize, Serialize};
use url::Url;

/// Fixed OAuth provider settings. Built once from `AppConfig`.
#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: Url,
    pub token_uri: Url,
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
}

/// Serialized OAuth token set kept in the session.
///
/// Field names match the dict the add-on has always stored, so an existing
/// session payload deserializes unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credentials {
    /// Builds credentials from a token response.
    ///
    /// Granted scopes come from the response when the provider reports them,
    /// otherwise we assume the requested scopes were granted.
    pub fn from_token_set(tokens: TokenSet, provider: &OAuthProviderConfig) -> Self {
        let scopes = match tokens.scope.as_deref() {
            Some(scope) if !scope.trim().is_empty() => {
                scope.split_whitespace().map(str::to_string).collect()
            }
            _ => provider.scopes.clone(),
        };

        Self {
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_uri: provider.token_uri.to_string(),
            client_id: provider.client_id.clone(),
            client_secret: provider.client_secret.clone(),
            scopes,
        }
    }

    /// Credentials are only worth sending upstream with a non-empty access token.
    /// Freshness is NOT checked; an expired token surfaces as an upstream error.
    pub fn has_access_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Raw token endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Space-separated scopes actually granted.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Everything we keep per browser session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// CSRF token for the OAuth round trip in flight, if any.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Pending,
    Authenticated,
}

impl SessionData {
    pub fn status(&self) -> AuthStatus {
        if self.credentials.is_some() {
            AuthStatus::Authenticated
        } else if self.state.is_some() {
            AuthStatus::Pending
        } else {
            AuthStatus::Unauthenticated
        }
    }
}

/// Where to send the browser. The `state` it carries is already stored in the
/// session and is checked on the callback.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
}

/// Query parameters the provider sends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OAuthProviderConfig {
        OAuthProviderConfig {
            client_id: "client-1".to_string(),
            client_secret: "secret-1".to_string(),
            auth_uri: "https://accounts.example.com/auth".parse().unwrap(),
            token_uri: "https://oauth2.example.com/token".parse().unwrap(),
            redirect_uri: "https://localhost:5000/callback".parse().unwrap(),
            scopes: vec!["openid".to_string(), "email".to_string()],
        }
    }

    #[test]
    fn test_credentials_round_trip_through_value() {
        let tokens = TokenSet {
            access_token: "ya29.token".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            ..Default::default()
        };
        let credentials = Credentials::from_token_set(tokens, &provider());

        let value = serde_json::to_value(&credentials).unwrap();
        let restored: Credentials = serde_json::from_value(value).unwrap();

        assert_eq!(restored.token_uri, credentials.token_uri);
        assert_eq!(restored.client_id, credentials.client_id);
        assert_eq!(restored.scopes, credentials.scopes);
        assert_eq!(restored, credentials);
    }

    #[test]
    fn test_serialized_field_names() {
        let credentials = Credentials::from_token_set(
            TokenSet {
                access_token: "abc".to_string(),
                ..Default::default()
            },
            &provider(),
        );
        let value = serde_json::to_value(&credentials).unwrap();

        for key in [
            "token",
            "refresh_token",
            "token_uri",
            "client_id",
            "client_secret",
            "scopes",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_granted_scopes_override_requested() {
        let tokens = TokenSet {
            access_token: "abc".to_string(),
            scope: Some("openid https://www.googleapis.com/auth/classroom.addons.teacher".into()),
            ..Default::default()
        };
        let credentials = Credentials::from_token_set(tokens, &provider());

        assert_eq!(
            credentials.scopes,
            vec![
                "openid".to_string(),
                "https://www.googleapis.com/auth/classroom.addons.teacher".to_string()
            ]
        );
    }

    #[test]
    fn test_session_status_transitions() {
        let mut session = SessionData::default();
        assert_eq!(session.status(), AuthStatus::Unauthenticated);

        session.state = Some("abc".to_string());
        assert_eq!(session.status(), AuthStatus::Pending);

        session.state = None;
        session.credentials = Some(Credentials::from_token_set(
            TokenSet {
                access_token: "tok".to_string(),
                ..Default::default()
            },
            &provider(),
        ));
        assert_eq!(session.status(), AuthStatus::Authenticated);
    }

    #[test]
    fn test_blank_token_is_not_usable() {
        let mut credentials = Credentials::from_token_set(TokenSet::default(), &provider());
        assert!(!credentials.has_access_token());

        credentials.token = "ya29".to_string();
        assert!(credentials.has_access_token());
    }
}
