//! Authenticated requests against the provider's user-info endpoint.

use tracing::{debug, warn};

use crate::error::{provider_error, Error, ErrorKind, OAuthErrorKind};
use crate::http::{ApiRequest, HttpClient};

/// Build a GET request carrying the access token.
///
/// The token goes in `Authorization: <scheme> <token>`; Yandex expects the
/// `OAuth` scheme rather than `Bearer`.
pub(crate) fn authenticated_request(
    url: &str,
    auth_scheme: &str,
    token: &str,
    params: &[(String, String)],
) -> ApiRequest {
    let mut request = ApiRequest::get(url);
    request
        .header("Authorization", format!("{} {}", auth_scheme, token))
        .header("Accept", "application/json");
    for (name, value) in params {
        request.param(name, value.as_str());
    }
    request
}

/// Send the profile request and parse the JSON payload.
pub(crate) async fn fetch<C: HttpClient + ?Sized>(
    client: &C,
    request: ApiRequest,
) -> Result<serde_json::Value, Error> {
    debug!("Fetching user profile");

    let response = client.execute(request).await?;
    if !response.is_success() {
        warn!(status = response.status, "User info endpoint rejected request");
        return Err(provider_error(
            OAuthErrorKind::ProfileFetchFailed,
            response.status,
            response.body,
        ));
    }

    let raw: serde_json::Value = response.json().map_err(|e| {
        warn!("Failed to parse user info response: {}", e);
        Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed),
        }
    })?;

    if !raw.is_object() {
        warn!("User info response is not a JSON object");
        return Err(provider_error(
            OAuthErrorKind::ProfileFetchFailed,
            response.status,
            response.body,
        ));
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClientBuilder;
    use mockito::{Matcher, Server};

    #[test]
    fn test_authenticated_request_headers() {
        let params = vec![("format".to_string(), "json".to_string())];
        let request = authenticated_request("https://login.example/info", "OAuth", "tok", &params);

        assert_eq!(request.header_value("Authorization"), Some("OAuth tok"));
        assert_eq!(request.header_value("Accept"), Some("application/json"));
        assert_eq!(request.param_value("format"), Some("json"));
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/info")
            .match_query(Matcher::UrlEncoded("format".into(), "json".into()))
            .match_header("authorization", "OAuth tok")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"1","login":"bob"}"#)
            .create_async()
            .await;

        let client = HttpClientBuilder::new().build().unwrap();
        let params = vec![("format".to_string(), "json".to_string())];
        let request =
            authenticated_request(&format!("{}/info", server.url()), "OAuth", "tok", &params);

        let raw = fetch(&client, request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(raw["login"], "bob");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_profile_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/info")
            .with_status(401)
            .with_body("invalid token")
            .create_async()
            .await;

        let client = HttpClientBuilder::new().build().unwrap();
        let request = authenticated_request(&format!("{}/info", server.url()), "OAuth", "bad", &[]);

        let err = fetch(&client, request).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed)
        );
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_fetch_unparseable_body_is_profile_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/info")
            .with_status(200)
            .with_body("login=bob")
            .create_async()
            .await;

        let client = HttpClientBuilder::new().build().unwrap();
        let request = authenticated_request(&format!("{}/info", server.url()), "OAuth", "tok", &[]);

        let err = fetch(&client, request).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed)
        );
    }
}
