//! Driver configuration supplied once at construction.

use std::time::Duration;

use secrecy::SecretString;

use crate::oauth::providers::yandex::AvatarSize;

/// Client credentials, callback URL and optional endpoint overrides.
///
/// Every `None` falls back to the provider default.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub callback_url: String,
    /// Requested scopes; empty means the provider's default set.
    pub scopes: Vec<String>,
    pub authorize_url: Option<String>,
    pub access_token_url: Option<String>,
    pub user_info_url: Option<String>,
    pub avatar_base_url: Option<String>,
    pub avatar_size: Option<AvatarSize>,
    /// Timeout applied to every provider request.
    pub request_timeout: Option<Duration>,
}

impl DriverConfig {
    /// Create a configuration with provider defaults for everything optional.
    ///
    /// # Arguments
    ///
    /// * `client_id` - OAuth application client ID
    /// * `client_secret` - OAuth application client secret
    /// * `callback_url` - Redirect URI registered with the provider
    pub fn new(client_id: String, client_secret: SecretString, callback_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            callback_url,
            scopes: Vec::new(),
            authorize_url: None,
            access_token_url: None,
            user_info_url: None,
            avatar_base_url: None,
            avatar_size: None,
            request_timeout: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authorize_url(mut self, url: String) -> Self {
        self.authorize_url = Some(url);
        self
    }

    pub fn with_access_token_url(mut self, url: String) -> Self {
        self.access_token_url = Some(url);
        self
    }

    pub fn with_user_info_url(mut self, url: String) -> Self {
        self.user_info_url = Some(url);
        self
    }

    pub fn with_avatar_base_url(mut self, url: String) -> Self {
        self.avatar_base_url = Some(url);
        self
    }

    pub fn with_avatar_size(mut self, size: AvatarSize) -> Self {
        self.avatar_size = Some(size);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_new_config_has_no_overrides() {
        let config = DriverConfig::new(
            "id".to_string(),
            SecretString::from("secret".to_string()),
            "https://app.example/cb".to_string(),
        );

        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret.expose_secret(), "secret");
        assert!(config.scopes.is_empty());
        assert!(config.authorize_url.is_none());
        assert!(config.avatar_size.is_none());
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = DriverConfig::new(
            "id".to_string(),
            SecretString::from("secret".to_string()),
            "https://app.example/cb".to_string(),
        )
        .with_scopes(["login:info"])
        .with_user_info_url("http://localhost/info".to_string())
        .with_avatar_size(AvatarSize::Islands50)
        .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.scopes, vec!["login:info".to_string()]);
        assert_eq!(config.user_info_url.as_deref(), Some("http://localhost/info"));
        assert_eq!(config.avatar_size, Some(AvatarSize::Islands50));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let config = DriverConfig::new(
            "id".to_string(),
            SecretString::from("hunter2".to_string()),
            "https://app.example/cb".to_string(),
        );
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
