//! Authorization code to access token exchange.

use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::tokens::{AccessToken, BEARER};
use crate::error::{oauth_error, provider_error, Error, OAuthErrorKind};
use crate::http::{ApiRequest, HttpClient, HttpResponse};

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
}

/// Build the token endpoint request for an authorization code.
pub(crate) fn exchange_request(
    access_token_url: &str,
    client_id: &str,
    client_secret: &SecretString,
    redirect_uri: &str,
    code: &str,
) -> ApiRequest {
    let mut request = ApiRequest::post(access_token_url);
    request
        .header("Accept", "application/json")
        .field("grant_type", "authorization_code")
        .field("code", code)
        .field("client_id", client_id)
        .field("client_secret", client_secret.expose_secret().as_str())
        .field("redirect_uri", redirect_uri);
    request
}

/// Send the exchange request once and parse the token.
///
/// Authorization codes are single use, so a failed exchange is never retried.
pub(crate) async fn exchange<C: HttpClient + ?Sized>(
    client: &C,
    request: ApiRequest,
) -> Result<AccessToken, Error> {
    debug!("Exchanging OAuth code for access token");

    let response = client.execute(request).await?;
    let token = parse_token_response(response)?;

    debug!("Successfully exchanged OAuth code for access token");
    Ok(token)
}

/// Turn a token endpoint response into an [`AccessToken`].
pub(crate) fn parse_token_response(response: HttpResponse) -> Result<AccessToken, Error> {
    if !response.is_success() {
        warn!(status = response.status, "Token endpoint rejected code exchange");
        return Err(provider_error(
            OAuthErrorKind::TokenExchangeFailed,
            response.status,
            response.body,
        ));
    }

    let body: TokenResponse = response.json().map_err(|e| {
        warn!("Failed to parse token response: {}", e);
        Error {
            source: Some(Box::new(e)),
            error_kind: crate::ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed),
        }
    })?;

    let access_token = body
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("Token response has no access_token");
            oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                "Token response has no access_token",
            )
        })?;

    let expires_at = body
        .expires_in
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));

    Ok(AccessToken {
        token: SecretString::new(access_token),
        token_type: body
            .token_type
            .map(|kind| kind.to_ascii_lowercase())
            .unwrap_or_else(|| BEARER.to_string()),
        expires_in: body.expires_in,
        expires_at,
        refresh_token: body
            .refresh_token
            .filter(|token| !token.is_empty())
            .map(SecretString::new),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_exchange_request_fields() {
        let secret = SecretString::new("secret".to_string());
        let request = exchange_request(
            "https://oauth.example/token",
            "client",
            &secret,
            "https://app.example/callback",
            "the-code",
        );

        assert_eq!(request.url(), "https://oauth.example/token");
        assert_eq!(request.field_value("grant_type"), Some("authorization_code"));
        assert_eq!(request.field_value("code"), Some("the-code"));
        assert_eq!(request.field_value("client_id"), Some("client"));
        assert_eq!(request.field_value("client_secret"), Some("secret"));
        assert_eq!(
            request.field_value("redirect_uri"),
            Some("https://app.example/callback")
        );
    }

    #[test]
    fn test_parse_full_response() {
        let token = parse_token_response(response(
            200,
            r#"{"access_token":"at","token_type":"bearer","expires_in":3600,"refresh_token":"rt"}"#,
        ))
        .unwrap();

        assert_eq!(token.token.expose_secret(), "at");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, Some(3600));
        assert!(token.expires_at.is_some());
        assert_eq!(token.refresh_token.unwrap().expose_secret(), "rt");
    }

    #[test]
    fn test_parse_out_of_range_lifetime() {
        let token = parse_token_response(response(
            200,
            r#"{"access_token":"at","token_type":"bearer","expires_in":9000000000000000}"#,
        ))
        .unwrap();

        assert_eq!(token.token.expose_secret(), "at");
        assert_eq!(token.expires_in, Some(9_000_000_000_000_000));
        assert!(token.expires_at.is_none());
    }

    #[test]
    fn test_parse_minimal_response_defaults_to_bearer() {
        let token = parse_token_response(response(200, r#"{"access_token":"at"}"#)).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert!(token.expires_at.is_none());
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_parse_http_400_is_exchange_error() {
        let err = parse_token_response(response(
            400,
            r#"{"error":"bad_verification_code","error_description":"Invalid code"}"#,
        ))
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed)
        );
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_parse_invalid_json_is_exchange_error() {
        let err = parse_token_response(response(200, "<html>oops</html>")).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed)
        );
    }

    #[test]
    fn test_parse_missing_access_token_is_exchange_error() {
        let err = parse_token_response(response(200, r#"{"token_type":"bearer"}"#)).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed)
        );
    }
}
