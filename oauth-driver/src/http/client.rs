//! HTTP transport used by the driver, with a `reqwest` implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::debug;

use super::{ApiRequest, HttpResponse, Method};
use crate::error::{http_error, Error, HttpErrorKind};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("oauth-driver/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Transport the driver sends its token and profile requests through.
///
/// Implementations only need GET/POST with custom headers, query params and a
/// form body. Requests are sent exactly once; there is no retry.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<HttpResponse, Error>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Wrap an already configured `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: ApiRequest) -> Result<HttpResponse, Error> {
        debug!(method = ?request.method(), url = request.url(), "Sending provider request");

        let mut builder = match request.method() {
            Method::Get => self.client.get(request.url()),
            Method::Post => self.client.post(request.url()),
        };

        if !request.params().is_empty() {
            builder = builder.query(request.params());
        }

        for (name, value) in request.headers() {
            let mut header_value = HeaderValue::from_str(value).map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: crate::ErrorKind::Http(HttpErrorKind::BuilderFailed),
            })?;
            if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                header_value.set_sensitive(true);
            }
            builder = builder.header(name.as_str(), header_value);
        }

        if !request.fields().is_empty() {
            builder = builder.form(request.fields());
        }

        if let Some(timeout) = request.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, "Provider responded");

        Ok(HttpResponse { status, body })
    }
}

/// Builder for the default `reqwest` transport.
///
/// Every request carries an `oauth-driver/<version>` user agent.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<ReqwestClient, Error> {
        if self.config.timeout.is_zero() {
            return Err(http_error(
                HttpErrorKind::BuilderFailed,
                "Request timeout must be greater than zero",
            ));
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .build()?;

        Ok(ReqwestClient::from_client(client))
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_builder_default() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.config.timeout, Duration::from_secs(30));
        assert!(builder.config.user_agent.starts_with("oauth-driver/"));
    }

    #[test]
    fn test_builder_with_timeout() {
        let builder = HttpClientBuilder::new().with_timeout(Duration::from_secs(5));
        assert_eq!(builder.config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = HttpClientBuilder::new()
            .with_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_execute_sends_headers_params_and_form() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/echo")
            .match_query(Matcher::UrlEncoded("format".into(), "json".into()))
            .match_header("authorization", "OAuth abc")
            .match_body(Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()))
            .with_status(201)
            .with_body("created")
            .create_async()
            .await;

        let client = HttpClientBuilder::new().build().unwrap();
        let mut request = ApiRequest::post(format!("{}/echo", server.url()));
        request
            .header("Authorization", "OAuth abc")
            .param("format", "json")
            .field("grant_type", "authorization_code");

        let response = client.execute(request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
        assert_eq!(response.body, "created");
    }

    #[tokio::test]
    async fn test_execute_connection_refused_is_http_error() {
        let client = HttpClientBuilder::new()
            .with_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let request = ApiRequest::get("http://127.0.0.1:1/unreachable");

        let err = client.execute(request).await.unwrap_err();
        assert!(matches!(err.error_kind, crate::ErrorKind::Http(_)));
    }
}
