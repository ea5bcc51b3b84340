//! Access tokens and the authorization code exchange.

mod exchange;
mod tokens;

pub(crate) use exchange::{exchange, exchange_request};
pub use tokens::{AccessToken, BEARER};
