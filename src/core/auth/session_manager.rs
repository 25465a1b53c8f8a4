// OAuth session manager - the authorization code flow, without any web framework.
//
// The web layer maps cookies to session ids and HTTP responses to/from these
// calls; the flow itself (issue state, verify state, exchange code, persist
// credentials) lives here so it can be tested with in-memory fakes.

use super::auth_models::{
    AuthorizationRequest, CallbackParams, Credentials, OAuthProviderConfig, SessionData, TokenSet,
};
use super::nonce;
use super::session_store::{SessionStore, StoreError};
use async_trait::async_trait;
use std::error::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization was declined by the provider: {0}")]
    ProviderDenied(String),

    #[error("No pending authorization for this session")]
    MissingState,

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Authorization code missing from callback")]
    MissingCode,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Session store error: {0}")]
    Session(#[from] StoreError),
}

/// Port for the provider's token endpoint.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchanges an authorization code for a token set.
    async fn exchange_code(
        &self,
        provider: &OAuthProviderConfig,
        code: &str,
    ) -> Result<TokenSet, Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl TokenExchanger for Box<dyn TokenExchanger> {
    async fn exchange_code(
        &self,
        provider: &OAuthProviderConfig,
        code: &str,
    ) -> Result<TokenSet, Box<dyn Error + Send + Sync>> {
        (**self).exchange_code(provider, code).await
    }
}

pub struct SessionManager<E: TokenExchanger, S: SessionStore> {
    provider: OAuthProviderConfig,
    exchanger: E,
    store: S,
}

impl<E: TokenExchanger, S: SessionStore> SessionManager<E, S> {
    pub fn new(provider: OAuthProviderConfig, exchanger: E, store: S) -> Self {
        Self {
            provider,
            exchanger,
            store,
        }
    }

    /// Builds the provider URL for a given `state`.
    ///
    /// Always requests offline access (so we get a refresh token) and
    /// incremental authorization. `login_hint` is only sent when non-empty.
    pub fn authorization_url(&self, state: &str, login_hint: &str) -> String {
        let scope = self.provider.scopes.join(" ");

        let mut url = self.provider.auth_uri.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.provider.client_id)
                .append_pair("redirect_uri", self.provider.redirect_uri.as_str())
                .append_pair("scope", &scope)
                .append_pair("state", state)
                .append_pair("access_type", "offline")
                .append_pair("include_granted_scopes", "true");
            if !login_hint.is_empty() {
                query.append_pair("login_hint", login_hint);
            }
        }

        url.into()
    }

    /// unauthenticated/authenticated -> pending.
    ///
    /// Issues a fresh `state` and stores it in the session. Existing credentials
    /// are kept: re-authorizing is how additional scopes get granted.
    pub async fn authorize(
        &self,
        session_id: &str,
        login_hint: &str,
    ) -> Result<AuthorizationRequest, AuthError> {
        let state = nonce::generate_state();
        let url = self.authorization_url(&state, login_hint);

        let mut session = self.store.get(session_id).await?.unwrap_or_default();
        session.state = Some(state);
        self.store.put(session_id, session).await?;

        tracing::info!(has_login_hint = !login_hint.is_empty(), "OAuth authorization started");

        Ok(AuthorizationRequest { url })
    }

    /// pending -> authenticated.
    ///
    /// The presented `state` must equal the one issued for this session; the
    /// stored state is consumed on success so it can't be replayed.
    pub async fn callback(
        &self,
        session_id: Option<&str>,
        params: CallbackParams,
    ) -> Result<Credentials, AuthError> {
        if let Some(error) = params.error {
            let detail = params.error_description.unwrap_or(error);
            tracing::warn!(error = %detail, "OAuth error returned by provider");
            return Err(AuthError::ProviderDenied(detail));
        }

        let session_id = session_id.ok_or(AuthError::MissingState)?;
        let mut session = self
            .store
            .get(session_id)
            .await?
            .ok_or(AuthError::MissingState)?;
        let expected = session.state.as_deref().ok_or(AuthError::MissingState)?;

        match params.state.as_deref() {
            Some(received) if received == expected => {}
            _ => {
                tracing::warn!("OAuth state mismatch");
                return Err(AuthError::StateMismatch);
            }
        }

        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCode)?;

        let tokens = self
            .exchanger
            .exchange_code(&self.provider, &code)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Token exchange failed");
                AuthError::TokenExchangeFailed(e.to_string())
            })?;

        let expires_in = tokens.expires_in;
        let credentials = Credentials::from_token_set(tokens, &self.provider);

        session.state = None;
        session.credentials = Some(credentials.clone());
        self.store.put(session_id, session).await?;

        tracing::info!(
            scopes = credentials.scopes.len(),
            has_refresh_token = credentials.refresh_token.is_some(),
            expires_in,
            "OAuth login completed"
        );

        Ok(credentials)
    }

    /// Current session contents; unknown or absent ids read as an empty session.
    pub async fn session(&self, session_id: Option<&str>) -> Result<SessionData, AuthError> {
        match session_id {
            Some(id) => Ok(self.store.get(id).await?.unwrap_or_default()),
            None => Ok(SessionData::default()),
        }
    }

    pub async fn credentials(
        &self,
        session_id: Option<&str>,
    ) -> Result<Option<Credentials>, AuthError> {
        Ok(self.session(session_id).await?.credentials)
    }
}
