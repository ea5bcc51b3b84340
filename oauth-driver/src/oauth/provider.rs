//! OAuth provider strategy and types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::user::UserProfile;
use crate::error::Error;

/// Known OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Yandex,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Yandex => "yandex",
        }
    }
}

/// Maps a provider's raw user-info payload to the canonical profile.
///
/// Implementations are pure: no I/O, no access to the token.
pub trait Normalize: Send + Sync {
    fn normalize(&self, raw: serde_json::Value) -> Result<UserProfile, Error>;
}

/// Everything the generic authorization code flow needs to know about one provider.
///
/// A provider is a value of this type plus a [`Normalize`] implementation, see
/// [`crate::oauth::providers::yandex::provider`].
#[derive(Clone)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub authorize_url: String,
    pub access_token_url: String,
    pub user_info_url: String,
    /// Scheme prefixed to the access token in the `Authorization` header.
    pub auth_scheme: String,
    pub scope_separator: String,
    /// Scopes requested when the caller configures none.
    pub default_scopes: Vec<String>,
    /// Query params always sent to the user-info endpoint.
    pub user_info_params: Vec<(String, String)>,
    /// Values of the callback `error` param meaning the user declined consent.
    pub denial_codes: Vec<String>,
    /// Key under which the state is kept in the caller's [`StateStore`](super::StateStore).
    pub state_key: String,
    pub normalizer: Arc<dyn Normalize>,
}

impl ProviderProfile {
    /// Whether `error` is one of the provider's "user declined" codes.
    pub fn is_denial(&self, error: &str) -> bool {
        self.denial_codes.iter().any(|code| code == error)
    }
}

impl fmt::Debug for ProviderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderProfile")
            .field("kind", &self.kind)
            .field("authorize_url", &self.authorize_url)
            .field("access_token_url", &self.access_token_url)
            .field("user_info_url", &self.user_info_url)
            .field("auth_scheme", &self.auth_scheme)
            .field("scope_separator", &self.scope_separator)
            .field("default_scopes", &self.default_scopes)
            .field("user_info_params", &self.user_info_params)
            .field("denial_codes", &self.denial_codes)
            .field("state_key", &self.state_key)
            .finish_non_exhaustive()
    }
}
