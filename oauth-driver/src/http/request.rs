//! Transport-agnostic request and response values.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;

/// HTTP method used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Header and form field names whose values are never printed.
const REDACTED: &[&str] = &["authorization", "client_secret", "code"];

/// A request the driver is about to dispatch.
///
/// The driver fills in its own headers, query params and form fields first and
/// then hands the value to the caller's hook, so anything the hook sets wins.
/// Setting an existing name replaces its value in place.
#[derive(Clone)]
pub struct ApiRequest {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    params: Vec<(String, String)>,
    fields: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            fields: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Set a header. Header names compare case-insensitively.
    pub fn header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
        self
    }

    /// Remove a header if present.
    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self
    }

    /// Set a query string parameter.
    pub fn param(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        upsert(&mut self.params, name, value.into());
        self
    }

    /// Set a form-encoded body field.
    pub fn field(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        upsert(&mut self.fields, name, value.into());
        self
    }

    /// Set a timeout for this request only.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn param_value(&self, name: &str) -> Option<&str> {
        lookup(&self.params, name)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        lookup(&self.fields, name)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &redact(&self.headers))
            .field("params", &self.params)
            .field("fields", &redact(&self.fields))
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn upsert(pairs: &mut Vec<(String, String)>, name: &str, value: String) {
    match pairs.iter_mut().find(|(existing, _)| existing == name) {
        Some(entry) => entry.1 = value,
        None => pairs.push((name.to_string(), value)),
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(existing, _)| existing == name)
        .map(|(_, value)| value.as_str())
}

fn redact(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
    pairs
        .iter()
        .map(|(name, value)| {
            let hidden = REDACTED
                .iter()
                .any(|redacted| name.eq_ignore_ascii_case(redacted));
            (name.as_str(), if hidden { "[REDACTED]" } else { value.as_str() })
        })
        .collect()
}

/// Raw response returned by an [`HttpClient`](super::HttpClient).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
