// Core auth module - the OAuth session lifecycle.
// No axum or reqwest types in here; cookies live in the web layer and HTTP
// calls to Google live in infra.

pub mod auth_models;
pub mod nonce;
pub mod session_manager;
pub mod session_store;

pub use auth_models::{
    AuthStatus, AuthorizationRequest, CallbackParams, Credentials, OAuthProviderConfig,
    SessionData, TokenSet,
};
pub use session_manager::{AuthError, SessionManager, TokenExchanger};
pub use session_store::{SessionStore, StoreError};
