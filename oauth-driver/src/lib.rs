//! # oauth-driver
//!
//! Server side of the OAuth 2.0 authorization code grant, with a Yandex ID provider:
//! - CSRF state issue and single-use validation
//! - Authorization redirect URL construction
//! - Authorization code exchange
//! - Authenticated profile fetch and normalization into a provider-agnostic user
//!
//! ## Architecture
//!
//! `oauth::AuthorizationCodeFlow` is provider-agnostic; a provider is a
//! `oauth::ProviderProfile` value (endpoints, auth scheme, scopes, normalizer).
//! `oauth::Driver` wraps the flow into "begin login" and "complete login".
//! The HTTP transport (`http::HttpClient`) and the state storage
//! (`oauth::StateStore`) are traits so the web framework can supply its own.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oauth_driver::{
//!     oauth::{CallbackParams, Driver, MemoryStateStore},
//!     providers::DriverConfig,
//! };
//!
//! let driver = Driver::yandex(config)?;
//! let redirect = driver.begin_login(&store)?;
//! // ... browser comes back to the callback URL ...
//! let user = driver.user(&CallbackParams::from_query(query), &store).await?;
//! ```

pub mod error;
pub mod http;
pub mod oauth;
pub mod providers;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
