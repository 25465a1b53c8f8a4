// Application configuration.
//
// Everything the service needs from the environment is read ONCE at startup into
// an immutable `AppConfig`. Components receive the parts they need at
// construction time; nothing reads `std::env` after `main` has built this struct.
//
// **Environment Variables:**
// - `HOST` / `PORT` - Listen address (defaults: 127.0.0.1:5000)
// - `SECRET_KEY` - Signs the session cookie
// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - OAuth client (required)
// - `REDIRECT_URI` - OAuth callback registered with Google
// - `PUBLIC_BASE_URL` - Where the add-on views are reachable (used in attachments)
// - `GEMINI_API_KEY` - API key from https://aistudio.google.com/apikey
// - `GEMINI_MODEL` / `GEMINI_TEMPERATURE` - Grading model settings
// - `COOKIE_SECURE` - Set to false only for plain-http local development

use crate::core::auth::OAuthProviderConfig;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key-change-in-production";
pub const ADDON_TITLE: &str = "AI Auto-Grader";
pub const ATTACHMENT_TITLE: &str = "AI Auto-Grading";
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const CLASSROOM_API_BASE: &str = "https://classroom.googleapis.com/v1/";

/// Scopes requested on every authorization. Classroom add-ons need both the
/// teacher and student add-on scopes so a single login works for either role.
pub const OAUTH_SCOPES: &[&str] = &[
    "openid",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/classroom.addons.teacher",
    "https://www.googleapis.com/auth/classroom.addons.student",
    "https://www.googleapis.com/auth/classroom.courses.readonly",
    "https://www.googleapis.com/auth/classroom.coursework.me",
    "https://www.googleapis.com/auth/classroom.coursework.students",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub secret_key: String,
    pub cookie_secure: bool,
    pub oauth: OAuthProviderConfig,
    /// Base URL of this add-on as Classroom sees it. Always ends with `/`.
    pub public_base_url: Url,
    pub classroom_api_base: Url,
    pub gemini: GeminiSettings,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests don't have to
    /// mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => 5000,
        };
        let listen_addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "HOST",
                reason: e.to_string(),
            })?;

        let secret_key = lookup("SECRET_KEY")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => raw.parse::<bool>().map_err(|e| ConfigError::Invalid {
                var: "COOKIE_SECURE",
                reason: e.to_string(),
            })?,
            None => true,
        };

        let client_id = required(&lookup, "GOOGLE_CLIENT_ID")?;
        let client_secret = required(&lookup, "GOOGLE_CLIENT_SECRET")?;
        let redirect_uri = parse_url(
            "REDIRECT_URI",
            lookup("REDIRECT_URI").unwrap_or_else(|| "https://localhost:5000/callback".into()),
        )?;

        let mut public_base_url = parse_url(
            "PUBLIC_BASE_URL",
            lookup("PUBLIC_BASE_URL").unwrap_or_else(|| "https://localhost:5000/".into()),
        )?;
        // `Url::join` replaces the last path segment unless the base ends in '/'
        if !public_base_url.path().ends_with('/') {
            let path = format!("{}/", public_base_url.path());
            public_base_url.set_path(&path);
        }

        let temperature = match lookup("GEMINI_TEMPERATURE") {
            Some(raw) => raw.parse::<f32>().map_err(|e| ConfigError::Invalid {
                var: "GEMINI_TEMPERATURE",
                reason: e.to_string(),
            })?,
            None => 0.4,
        };

        Ok(Self {
            listen_addr,
            secret_key,
            cookie_secure,
            oauth: OAuthProviderConfig {
                client_id,
                client_secret,
                auth_uri: parse_url("GOOGLE_AUTH_URI", GOOGLE_AUTH_URI.to_string())?,
                token_uri: parse_url("GOOGLE_TOKEN_URI", GOOGLE_TOKEN_URI.to_string())?,
                redirect_uri,
                scopes: OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            },
            public_base_url,
            classroom_api_base: parse_url("CLASSROOM_API_BASE", CLASSROOM_API_BASE.to_string())?,
            gemini: GeminiSettings {
                api_key: lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()),
                model: lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
                temperature,
            },
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parse_url(var: &'static str, raw: String) -> Result<Url, ConfigError> {
    Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
