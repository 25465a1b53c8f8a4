use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;

use crate::core::auth::{OAuthProviderConfig, TokenExchanger, TokenSet};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google's token endpoint reports failures as `{"error": .., "error_description": ..}`.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Authorization-code exchange against Google's OAuth 2.0 token endpoint.
pub struct GoogleTokenClient {
    client: Client,
}

impl GoogleTokenClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }

    fn form<'a>(provider: &'a OAuthProviderConfig, code: &'a str) -> [(&'static str, &'a str); 5] {
        [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("redirect_uri", provider.redirect_uri.as_str()),
        ]
    }

    fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<TokenErrorBody>(body) {
            Ok(err) => match err.error_description {
                Some(description) => format!(
                    "token endpoint returned {} ({}): {}",
                    status.as_u16(),
                    err.error,
                    description
                ),
                None => format!("token endpoint returned {} ({})", status.as_u16(), err.error),
            },
            Err(_) => format!("token endpoint returned {}: {}", status.as_u16(), body),
        }
    }
}

#[async_trait]
impl TokenExchanger for GoogleTokenClient {
    async fn exchange_code(
        &self,
        provider: &OAuthProviderConfig,
        code: &str,
    ) -> Result<TokenSet, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .post(provider.token_uri.clone())
            .form(&Self::form(provider, code))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::describe_failure(status, &body).into());
        }

        let tokens: TokenSet = response.json().await?;
        Ok(tokens)
    }
}
