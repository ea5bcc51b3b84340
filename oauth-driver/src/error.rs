//! Error types for the `oauth-driver` crate.
//!
//! A root Error struct holds an error kind and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for oauth-driver crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in oauth-driver.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    OAuth(OAuthErrorKind),
    Http(HttpErrorKind),
    Config(ConfigErrorKind),
}

/// Errors from the authorization code flow.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// Callback state is absent, expired or does not match the stored one.
    StateMismatch,
    /// User declined consent on the provider's page.
    AccessDenied,
    /// Callback carries any other provider `error` parameter.
    AuthorizationFailed,
    /// Callback carries neither an error nor an authorization code.
    MissingCode,
    TokenExchangeFailed,
    ProfileFetchFailed,
    /// Profile lacks a field the requested scopes should have granted.
    MissingScope,
}

/// Errors from HTTP transport operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Timeout,
    Network,
}

/// Errors from driver configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigErrorKind {
    InvalidUrl,
}

/// Non-success response returned by the provider.
///
/// Attached as the source of token exchange and profile fetch errors so callers
/// can log the status and body.
#[derive(Debug)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for ProviderResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "provider responded with HTTP {}: {}", self.status, self.body)
    }
}

impl StdError for ProviderResponse {}

impl Error {
    /// Provider response attached to this error, if any.
    pub fn provider_response(&self) -> Option<&ProviderResponse> {
        self.source
            .as_ref()
            .and_then(|source| source.downcast_ref::<ProviderResponse>())
    }

    /// HTTP status returned by the provider, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.provider_response().map(|response| response.status)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind)?,
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
            ErrorKind::Config(kind) => write!(f, "Config error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_timeout() {
            ErrorKind::Http(HttpErrorKind::Timeout)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            // Strip the URL so query strings never end up in error output.
            source: Some(Box::new(err.without_url())),
            error_kind,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Config(ConfigErrorKind::InvalidUrl),
        }
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create OAuth errors from a provider response.
pub fn provider_error(kind: OAuthErrorKind, status: u16, body: String) -> Error {
    Error {
        source: Some(Box::new(ProviderResponse { status, body })),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create HTTP errors.
pub fn http_error(kind: HttpErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Http(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_exposes_status() {
        let err = provider_error(
            OAuthErrorKind::TokenExchangeFailed,
            400,
            r#"{"error":"invalid_grant"}"#.to_string(),
        );

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed)
        );
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[test]
    fn test_message_error_has_no_status() {
        let err = oauth_error(OAuthErrorKind::MissingScope, "no email");
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("MissingScope"));
    }

    #[test]
    fn test_url_parse_error_is_config_error() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert_eq!(err.error_kind, ErrorKind::Config(ConfigErrorKind::InvalidUrl));
    }
}
