//! Login driver: the redirect and callback halves of one authorization attempt.

use std::fmt;
use std::sync::Arc;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::authorization::RedirectRequest;
use super::flow::{AuthorizationCodeFlow, RequestHook};
use super::providers::yandex;
use super::state::{self, StateStore, StateToken};
use super::token::AccessToken;
use super::user::NormalizedUser;
use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::http::{ApiRequest, HttpClient, HttpClientBuilder, ReqwestClient};
use crate::providers::DriverConfig;

/// Query params the provider appends to the callback URL.
#[derive(Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse the raw query string of the callback request.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (name, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = Some(value.into_owned());
            match name.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        params
    }
}

impl fmt::Debug for CallbackParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackParams")
            .field("code", &self.code.as_ref().map(|_| "[REDACTED]"))
            .field("state", &self.state.as_ref().map(|_| "[REDACTED]"))
            .field("error", &self.error)
            .field("error_description", &self.error_description)
            .finish()
    }
}

/// Result of the redirect phase.
#[derive(Debug, Clone)]
pub struct Redirect {
    /// URL to send the browser to.
    pub url: String,
    /// State issued for this attempt, already written to the state store.
    pub state: StateToken,
}

/// Terminal state of one authorization attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    Success(NormalizedUser),
    /// The user declined consent on the provider's page.
    Denied,
    Failed(Error),
}

/// Driver facade over [`AuthorizationCodeFlow`].
///
/// The driver keeps nothing between calls: the state for an attempt lives in
/// the caller's [`StateStore`], so a driver can be shared or rebuilt per
/// request.
pub struct Driver<C: HttpClient = ReqwestClient> {
    flow: AuthorizationCodeFlow<C>,
}

impl Driver<ReqwestClient> {
    /// Create a Yandex driver with the default `reqwest` transport.
    pub fn yandex(config: DriverConfig) -> Result<Self, Error> {
        let mut builder = HttpClientBuilder::new();
        if let Some(timeout) = config.request_timeout {
            builder = builder.with_timeout(timeout);
        }
        let client = Arc::new(builder.build()?);
        Self::yandex_with_client(config, client)
    }
}

impl<C: HttpClient> Driver<C> {
    pub fn new(flow: AuthorizationCodeFlow<C>) -> Self {
        Self { flow }
    }

    /// Create a Yandex driver on top of a custom transport.
    pub fn yandex_with_client(config: DriverConfig, client: Arc<C>) -> Result<Self, Error> {
        let provider = yandex::provider(&config);
        Ok(Self::new(AuthorizationCodeFlow::new(client, provider, &config)?))
    }

    pub fn flow(&self) -> &AuthorizationCodeFlow<C> {
        &self.flow
    }

    /// Key the state is stored under in the caller's [`StateStore`].
    pub fn state_key(&self) -> &str {
        &self.flow.provider().state_key
    }

    /// Start a login: issue a state, store it and build the redirect URL.
    pub fn begin_login(&self, store: &dyn StateStore) -> Result<Redirect, Error> {
        self.begin_login_with(store, |_| {})
    }

    /// Start a login, letting `hook` add or override redirect params.
    ///
    /// `client_id`, `redirect_uri` and `state` cannot be overridden.
    pub fn begin_login_with<F>(&self, store: &dyn StateStore, hook: F) -> Result<Redirect, Error>
    where
        F: Fn(&mut RedirectRequest),
    {
        let state = StateToken::issue();
        let url = self.flow.authorization_url(&state, &hook)?;
        store.store(self.state_key(), state.as_str());

        debug!(
            provider = self.flow.provider().kind.as_str(),
            "Issued authorization redirect"
        );
        Ok(Redirect { url, state })
    }

    /// The provider's `error` param, if present.
    pub fn error<'a>(&self, callback: &'a CallbackParams) -> Option<&'a str> {
        callback.error.as_deref().filter(|error| !error.is_empty())
    }

    pub fn has_error(&self, callback: &CallbackParams) -> bool {
        self.error(callback).is_some()
    }

    pub fn has_code(&self, callback: &CallbackParams) -> bool {
        callback.code.as_deref().is_some_and(|code| !code.is_empty())
    }

    /// True only when the callback error is one of the provider's denial codes.
    pub fn access_denied(&self, callback: &CallbackParams) -> bool {
        self.error(callback)
            .is_some_and(|error| self.flow.provider().is_denial(error))
    }

    /// Check the callback state against the stored one, consuming it.
    ///
    /// Returns true when the states do NOT match. The stored state is cleared
    /// either way.
    pub fn state_mismatch(&self, callback: &CallbackParams, store: &dyn StateStore) -> bool {
        !state::consume(store, self.state_key(), callback.state.as_deref())
    }

    /// Validate the callback and exchange its code for an access token.
    pub async fn access_token(
        &self,
        callback: &CallbackParams,
        store: &dyn StateStore,
    ) -> Result<AccessToken, Error> {
        self.access_token_with(callback, store, |_| {}).await
    }

    /// Same as [`Driver::access_token`], with a hook on the token request.
    pub async fn access_token_with<F>(
        &self,
        callback: &CallbackParams,
        store: &dyn StateStore,
        hook: F,
    ) -> Result<AccessToken, Error>
    where
        F: Fn(&mut ApiRequest) + Sync,
    {
        let code = self.verify_callback(callback, store)?;
        self.flow.exchange_code(code, &hook).await
    }

    /// Complete a login from the callback: validate, exchange, fetch, normalize.
    pub async fn user(
        &self,
        callback: &CallbackParams,
        store: &dyn StateStore,
    ) -> Result<NormalizedUser, Error> {
        self.user_with(callback, store, |_| {}).await
    }

    /// Same as [`Driver::user`], with a hook applied to the token and profile requests.
    pub async fn user_with<F>(
        &self,
        callback: &CallbackParams,
        store: &dyn StateStore,
        hook: F,
    ) -> Result<NormalizedUser, Error>
    where
        F: Fn(&mut ApiRequest) + Sync,
    {
        let code = self.verify_callback(callback, store)?;
        let token = self.flow.exchange_code(code, &hook).await?;
        let user = self.user_for_token(token, &hook).await?;

        info!(
            provider = self.flow.provider().kind.as_str(),
            user_id = %user.id,
            "Completed login"
        );
        Ok(user)
    }

    /// Load the user for an access token obtained elsewhere.
    ///
    /// No redirect took place, so there is no state to check.
    pub async fn user_from_token(&self, token: &str) -> Result<NormalizedUser, Error> {
        self.user_from_token_with(token, |_| {}).await
    }

    /// Same as [`Driver::user_from_token`], with a hook on the profile request.
    pub async fn user_from_token_with<F>(
        &self,
        token: &str,
        hook: F,
    ) -> Result<NormalizedUser, Error>
    where
        F: Fn(&mut ApiRequest) + Sync,
    {
        let token = AccessToken::bearer(SecretString::new(token.to_string()));
        self.user_for_token(token, &hook).await
    }

    /// Drive the callback to a terminal [`LoginOutcome`].
    pub async fn complete(&self, callback: &CallbackParams, store: &dyn StateStore) -> LoginOutcome {
        if self.access_denied(callback) {
            // The state is single use even when the user declined.
            store.clear(self.state_key());
            info!(
                provider = self.flow.provider().kind.as_str(),
                "User declined authorization"
            );
            return LoginOutcome::Denied;
        }

        match self.user(callback, store).await {
            Ok(user) => LoginOutcome::Success(user),
            Err(e) => LoginOutcome::Failed(e),
        }
    }

    /// Consume the state, then return the authorization code.
    ///
    /// Runs before any network I/O.
    fn verify_callback<'a>(
        &self,
        callback: &'a CallbackParams,
        store: &dyn StateStore,
    ) -> Result<&'a str, Error> {
        if self.state_mismatch(callback, store) {
            warn!("OAuth callback state is missing, expired or does not match");
            return Err(oauth_error(
                OAuthErrorKind::StateMismatch,
                "Unable to verify re-redirect state",
            ));
        }

        if let Some(error) = self.error(callback) {
            let kind = if self.flow.provider().is_denial(error) {
                OAuthErrorKind::AccessDenied
            } else {
                OAuthErrorKind::AuthorizationFailed
            };
            warn!(error, "Provider returned an error on callback");
            return Err(oauth_error(kind, error));
        }

        callback
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| oauth_error(OAuthErrorKind::MissingCode, "Missing code on callback"))
    }

    async fn user_for_token(
        &self,
        token: AccessToken,
        hook: RequestHook<'_>,
    ) -> Result<NormalizedUser, Error> {
        let raw = self.flow.fetch_profile(&token.token, hook).await?;
        let profile = self.flow.normalize(raw)?;
        Ok(profile.with_token(token))
    }
}

impl<C: HttpClient> Clone for Driver<C> {
    fn clone(&self) -> Self {
        Self {
            flow: self.flow.clone(),
        }
    }
}
