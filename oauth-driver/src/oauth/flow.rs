//! Provider-agnostic authorization code flow.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::authorization::RedirectRequest;
use super::provider::ProviderProfile;
use super::state::StateToken;
use super::token::{self, AccessToken};
use super::user::UserProfile;
use super::profile;
use crate::error::Error;
use crate::http::{ApiRequest, HttpClient};
use crate::providers::DriverConfig;

/// Caller hook applied to a request after the flow has set its own values.
pub type RequestHook<'a> = &'a (dyn Fn(&mut ApiRequest) + Sync);

/// Runs the four steps of the authorization code grant for one provider:
/// redirect URL, code exchange, profile fetch and normalization.
///
/// Holds no per-login state, so one instance can serve concurrent logins.
pub struct AuthorizationCodeFlow<C: HttpClient> {
    client: Arc<C>,
    provider: ProviderProfile,
    client_id: String,
    client_secret: SecretString,
    callback_url: String,
    scopes: Vec<String>,
}

impl<C: HttpClient> AuthorizationCodeFlow<C> {
    /// Create a flow, validating every endpoint URL up front.
    ///
    /// # Arguments
    ///
    /// * `client` - Transport used for token and profile requests
    /// * `provider` - Provider endpoints and normalizer
    /// * `config` - Client credentials, callback URL and scopes
    pub fn new(client: Arc<C>, provider: ProviderProfile, config: &DriverConfig) -> Result<Self, Error> {
        for url in [
            provider.authorize_url.as_str(),
            provider.access_token_url.as_str(),
            provider.user_info_url.as_str(),
            config.callback_url.as_str(),
        ] {
            Url::parse(url)?;
        }

        Ok(Self {
            client,
            provider,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
            scopes: config.scopes.clone(),
        })
    }

    pub fn provider(&self) -> &ProviderProfile {
        &self.provider
    }

    /// Scopes sent on the redirect: the configured ones, or the provider defaults.
    pub fn scopes(&self) -> &[String] {
        if self.scopes.is_empty() {
            &self.provider.default_scopes
        } else {
            &self.scopes
        }
    }

    /// Build the authorization redirect URL for `state`.
    pub fn authorization_url(
        &self,
        state: &StateToken,
        hook: &dyn Fn(&mut RedirectRequest),
    ) -> Result<String, Error> {
        let mut request = RedirectRequest::new(&self.provider.scope_separator);
        request.scopes(self.scopes()).param("response_type", "code");

        hook(&mut request);

        request.build_url(
            &self.provider.authorize_url,
            &self.client_id,
            &self.callback_url,
            state,
        )
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str, hook: RequestHook<'_>) -> Result<AccessToken, Error> {
        let mut request = token::exchange_request(
            &self.provider.access_token_url,
            &self.client_id,
            &self.client_secret,
            &self.callback_url,
            code,
        );

        hook(&mut request);

        token::exchange(self.client.as_ref(), request).await
    }

    /// Fetch the raw user-info payload with an access token.
    pub async fn fetch_profile(
        &self,
        access_token: &SecretString,
        hook: RequestHook<'_>,
    ) -> Result<serde_json::Value, Error> {
        let mut request = profile::authenticated_request(
            &self.provider.user_info_url,
            &self.provider.auth_scheme,
            access_token.expose_secret(),
            &self.provider.user_info_params,
        );

        hook(&mut request);

        profile::fetch(self.client.as_ref(), request).await
    }

    /// Map a raw payload with the provider's normalizer.
    pub fn normalize(&self, raw: serde_json::Value) -> Result<UserProfile, Error> {
        self.provider.normalizer.normalize(raw)
    }
}

impl<C: HttpClient> Clone for AuthorizationCodeFlow<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            provider: self.provider.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            callback_url: self.callback_url.clone(),
            scopes: self.scopes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClientBuilder;
    use crate::oauth::providers::yandex;
    use crate::ErrorKind;

    fn config() -> DriverConfig {
        DriverConfig::new(
            "client".to_string(),
            SecretString::from("secret".to_string()),
            "https://app.example/cb".to_string(),
        )
    }

    fn flow(config: &DriverConfig) -> AuthorizationCodeFlow<crate::http::ReqwestClient> {
        let client = Arc::new(HttpClientBuilder::new().build().unwrap());
        AuthorizationCodeFlow::new(client, yandex::provider(config), config).unwrap()
    }

    #[test]
    fn test_default_scopes_used_when_none_configured() {
        let flow = flow(&config());
        assert_eq!(flow.scopes(), ["login:email", "login:info", "login:avatar"]);

        let state = StateToken::issue();
        let url = flow.authorization_url(&state, &|_| {}).unwrap();
        assert!(url.contains("scope=login%3Aemail+login%3Ainfo+login%3Aavatar"));
    }

    #[test]
    fn test_configured_scopes_replace_defaults() {
        let flow = flow(&config().with_scopes([yandex::YandexScope::Info]));
        assert_eq!(flow.scopes(), ["login:info"]);
    }

    #[test]
    fn test_authorization_url_is_deterministic() {
        let flow = flow(&config());
        let state = StateToken::issue();

        let first = flow.authorization_url(&state, &|_| {}).unwrap();
        let second = flow.authorization_url(&state, &|_| {}).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with(
            "https://oauth.yandex.ru/authorize?response_type=code&client_id=client\
             &redirect_uri=https%3A%2F%2Fapp.example%2Fcb&scope="
        ));
    }

    #[test]
    fn test_invalid_endpoint_rejected_at_construction() {
        let config = config().with_user_info_url("::not-a-url::".to_string());
        let client = Arc::new(HttpClientBuilder::new().build().unwrap());
        let result = AuthorizationCodeFlow::new(client, yandex::provider(&config), &config);

        assert_eq!(
            result.err().map(|e| e.error_kind),
            Some(ErrorKind::Config(crate::error::ConfigErrorKind::InvalidUrl))
        );
    }
}
