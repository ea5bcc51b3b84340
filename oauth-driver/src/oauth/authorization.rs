//! Authorization redirect URL construction.

use tracing::warn;
use url::Url;

use super::state::StateToken;
use crate::error::Error;

const RESPONSE_TYPE: &str = "response_type";
const SCOPE: &str = "scope";

/// Params the caller can never set; the flow always writes its own values.
const PROTECTED_PARAMS: [&str; 3] = ["client_id", "redirect_uri", "state"];

/// Query params of the authorization redirect, open to caller customization.
///
/// The flow sets `response_type` and `scope` first and then hands the value to
/// the caller's hook. Anything the hook sets overrides those defaults, except
/// `client_id`, `redirect_uri` and `state`, which are ignored here and filled
/// in when the URL is built.
#[derive(Debug, Clone)]
pub struct RedirectRequest {
    scope_separator: String,
    params: Vec<(String, String)>,
}

impl RedirectRequest {
    pub(crate) fn new(scope_separator: &str) -> Self {
        Self {
            scope_separator: scope_separator.to_string(),
            params: Vec::new(),
        }
    }

    /// Set a query param. Setting an existing name replaces its value.
    pub fn param(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        if PROTECTED_PARAMS.contains(&name) {
            warn!(param = name, "Ignoring attempt to override protected redirect param");
            return self;
        }

        let value = value.into();
        match self.params.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name.to_string(), value)),
        }
        self
    }

    /// Remove a query param if present.
    pub fn clear_param(&mut self, name: &str) -> &mut Self {
        self.params.retain(|(existing, _)| existing != name);
        self
    }

    /// Replace the requested scopes, joined by the provider's separator.
    pub fn scopes<I, S>(&mut self, scopes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = scopes
            .into_iter()
            .map(|scope| scope.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(self.scope_separator.as_str());
        self.param(SCOPE, joined)
    }

    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Compose the final URL.
    ///
    /// Param order is fixed: `response_type`, `client_id`, `redirect_uri`,
    /// `scope`, `state`, then any other params in the order they were set.
    pub(crate) fn build_url(
        &self,
        authorize_url: &str,
        client_id: &str,
        redirect_uri: &str,
        state: &StateToken,
    ) -> Result<String, Error> {
        let mut url = Url::parse(authorize_url)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(response_type) = self.param_value(RESPONSE_TYPE) {
                query.append_pair(RESPONSE_TYPE, response_type);
            }
            query.append_pair("client_id", client_id);
            query.append_pair("redirect_uri", redirect_uri);
            if let Some(scope) = self.param_value(SCOPE) {
                query.append_pair(SCOPE, scope);
            }
            query.append_pair("state", state.as_str());
            for (name, value) in &self.params {
                if name != RESPONSE_TYPE && name != SCOPE {
                    query.append_pair(name, value);
                }
            }
        }
        Ok(url.into())
    }
}
