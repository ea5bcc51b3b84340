//! Provider-independent user model returned by a completed login.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::AccessToken;

/// Provider user identifier, kept as the provider sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Text(id) => f.write_str(id),
            UserId::Number(id) => write!(f, "{}", id),
        }
    }
}

/// What the provider reports about the user's email ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailVerificationState {
    Verified,
    Unverified,
    /// The provider does not report verification status.
    Unsupported,
}

impl EmailVerificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailVerificationState::Verified => "verified",
            EmailVerificationState::Unverified => "unverified",
            EmailVerificationState::Unsupported => "unsupported",
        }
    }
}

/// Normalized profile, before the access token is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub nick_name: Option<String>,
    pub name: Option<String>,
    pub email: String,
    /// `None` when the user has no avatar.
    pub avatar_url: Option<String>,
    pub email_verification_state: EmailVerificationState,
    /// Untouched provider payload.
    pub original: serde_json::Value,
}

impl UserProfile {
    pub fn with_token(self, token: AccessToken) -> NormalizedUser {
        NormalizedUser {
            id: self.id,
            nick_name: self.nick_name,
            name: self.name,
            email: self.email,
            avatar_url: self.avatar_url,
            email_verification_state: self.email_verification_state,
            token,
            original: self.original,
        }
    }
}

/// The authenticated user, owned by the caller once returned.
#[derive(Debug, Clone)]
pub struct NormalizedUser {
    pub id: UserId,
    pub nick_name: Option<String>,
    pub name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
    pub email_verification_state: EmailVerificationState,
    pub token: AccessToken,
    pub original: serde_json::Value,
}

impl NormalizedUser {
    /// The profile part of this user, without the token.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            nick_name: self.nick_name.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
            email_verification_state: self.email_verification_state,
            original: self.original.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_id_preserves_string_and_number() {
        let text: UserId = serde_json::from_value(json!("1")).unwrap();
        let number: UserId = serde_json::from_value(json!(42)).unwrap();

        assert_eq!(text, UserId::Text("1".to_string()));
        assert!(matches!(number, UserId::Number(_)));
        assert_eq!(number.to_string(), "42");
        assert_eq!(serde_json::to_value(&number).unwrap(), json!(42));
    }

    #[test]
    fn test_email_verification_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(EmailVerificationState::Unsupported).unwrap(),
            json!("unsupported")
        );
        assert_eq!(EmailVerificationState::Unsupported.as_str(), "unsupported");
    }
}
