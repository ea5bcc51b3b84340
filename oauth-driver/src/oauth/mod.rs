//! OAuth 2.0 authorization code flow.
//!
//! A generic flow engine parameterized by a provider profile, and a driver
//! facade exposing the redirect and callback halves of a login.

mod authorization;
mod driver;
mod flow;
mod profile;
mod provider;
mod user;

pub mod providers;
pub mod state;
pub mod token;

pub use authorization::RedirectRequest;
pub use driver::{CallbackParams, Driver, LoginOutcome, Redirect};
pub use flow::{AuthorizationCodeFlow, RequestHook};
pub use provider::{Normalize, ProviderKind, ProviderProfile};
pub use state::{MemoryStateStore, StateStore, StateToken};
pub use token::AccessToken;
pub use user::{EmailVerificationState, NormalizedUser, UserId, UserProfile};
