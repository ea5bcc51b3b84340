//! Provider profiles for the authorization code flow.

pub mod yandex;
