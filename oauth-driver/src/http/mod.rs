//! HTTP transport abstraction and the default `reqwest` client.

mod client;
mod request;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig, ReqwestClient};
pub use request::{ApiRequest, HttpResponse, Method};
