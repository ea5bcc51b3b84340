//! OAuth token types.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// Token type every access token issued by the flow carries.
pub const BEARER: &str = "bearer";

/// Access token obtained from the provider, immutable once constructed.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Access token for API requests.
    pub token: SecretString,
    /// Token type, lowercased (usually "bearer").
    pub token_type: String,
    /// Lifetime in seconds as reported by the provider.
    pub expires_in: Option<u64>,
    /// When the access token expires, computed at exchange time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token, if the provider issued one.
    pub refresh_token: Option<SecretString>,
}

impl AccessToken {
    /// Wrap a token the caller already holds. Nothing is known about its expiry.
    pub fn bearer(token: SecretString) -> Self {
        Self {
            token,
            token_type: BEARER.to_string(),
            expires_in: None,
            expires_at: None,
            refresh_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_bearer_token() {
        let token = AccessToken::bearer(SecretString::from("abc".to_string()));
        assert_eq!(token.token.expose_secret(), "abc");
        assert_eq!(token.token_type, "bearer");
        assert!(token.refresh_token.is_none());
        assert!(token.expires_in.is_none());
        assert!(token.expires_at.is_none());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = AccessToken::bearer(SecretString::from("super-secret".to_string()));
        assert!(!format!("{:?}", token).contains("super-secret"));
    }
}
