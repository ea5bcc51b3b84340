//! Yandex OAuth provider.
//!
//! Yandex ID authenticates API calls with `Authorization: OAuth <token>` and
//! returns the profile and the default email from the same endpoint.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::error::{oauth_error, Error, ErrorKind, OAuthErrorKind};
use crate::oauth::user::{EmailVerificationState, UserId, UserProfile};
use crate::oauth::{Normalize, ProviderKind, ProviderProfile};
use crate::providers::DriverConfig;

pub const AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";
pub const ACCESS_TOKEN_URL: &str = "https://oauth.yandex.ru/token";
pub const USER_INFO_URL: &str = "https://login.yandex.ru/info";
pub const AVATAR_BASE_URL: &str = "https://avatars.yandex.net/get-yapic";

/// Key the state is stored under between redirect and callback.
pub const STATE_KEY: &str = "yandex_oauth_state";

/// Callback `error` values meaning the user declined consent.
///
/// Yandex documents `access_denied`; `user_denied` shows up from older
/// integrations, so both are accepted.
pub const DENIAL_CODES: [&str; 2] = ["access_denied", "user_denied"];

/// Yandex ID permission scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YandexScope {
    Avatar,
    Birthday,
    Email,
    Info,
    DefaultPhone,
}

impl YandexScope {
    /// Scopes requested when none are configured.
    pub const DEFAULT: [YandexScope; 3] =
        [YandexScope::Email, YandexScope::Info, YandexScope::Avatar];

    pub fn as_str(&self) -> &'static str {
        match self {
            YandexScope::Avatar => "login:avatar",
            YandexScope::Birthday => "login:birthday",
            YandexScope::Email => "login:email",
            YandexScope::Info => "login:info",
            YandexScope::DefaultPhone => "login:default_phone",
        }
    }
}

impl fmt::Display for YandexScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<YandexScope> for String {
    fn from(scope: YandexScope) -> Self {
        scope.as_str().to_string()
    }
}

/// Returned when parsing an unknown scope or avatar size.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

impl FromStr for YandexScope {
    type Err = ParseError;

    fn from_str(scope: &str) -> Result<Self, Self::Err> {
        match scope {
            "login:avatar" => Ok(YandexScope::Avatar),
            "login:birthday" => Ok(YandexScope::Birthday),
            "login:email" => Ok(YandexScope::Email),
            "login:info" => Ok(YandexScope::Info),
            "login:default_phone" => Ok(YandexScope::DefaultPhone),
            _ => Err(ParseError(scope.to_string())),
        }
    }
}

/// Avatar renditions served by the Yandex avatar CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvatarSize {
    IslandsSmall,
    Islands34,
    IslandsMiddle,
    Islands50,
    IslandsRetinaSmall,
    Islands68,
    Islands75,
    IslandsRetinaMiddle,
    IslandsRetina50,
    #[default]
    Islands200,
}

impl AvatarSize {
    pub const ALL: [AvatarSize; 10] = [
        AvatarSize::IslandsSmall,
        AvatarSize::Islands34,
        AvatarSize::IslandsMiddle,
        AvatarSize::Islands50,
        AvatarSize::IslandsRetinaSmall,
        AvatarSize::Islands68,
        AvatarSize::Islands75,
        AvatarSize::IslandsRetinaMiddle,
        AvatarSize::IslandsRetina50,
        AvatarSize::Islands200,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarSize::IslandsSmall => "islands-small",
            AvatarSize::Islands34 => "islands-34",
            AvatarSize::IslandsMiddle => "islands-middle",
            AvatarSize::Islands50 => "islands-50",
            AvatarSize::IslandsRetinaSmall => "islands-retina-small",
            AvatarSize::Islands68 => "islands-68",
            AvatarSize::Islands75 => "islands-75",
            AvatarSize::IslandsRetinaMiddle => "islands-retina-middle",
            AvatarSize::IslandsRetina50 => "islands-retina-50",
            AvatarSize::Islands200 => "islands-200",
        }
    }
}

impl fmt::Display for AvatarSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvatarSize {
    type Err = ParseError;

    fn from_str(size: &str) -> Result<Self, Self::Err> {
        AvatarSize::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == size)
            .ok_or_else(|| ParseError(size.to_string()))
    }
}

/// Fields of `https://login.yandex.ru/info?format=json` the driver promotes.
#[derive(Debug, Deserialize)]
struct YandexProfile {
    id: UserId,
    login: Option<String>,
    real_name: Option<String>,
    display_name: Option<String>,
    default_email: Option<String>,
    default_avatar_id: Option<String>,
    is_avatar_empty: Option<bool>,
}

/// Maps the Yandex user-info payload to [`UserProfile`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    avatar_base_url: String,
    avatar_size: AvatarSize,
}

impl Normalizer {
    pub fn new(avatar_base_url: String, avatar_size: AvatarSize) -> Self {
        Self {
            avatar_base_url: avatar_base_url.trim_end_matches('/').to_string(),
            avatar_size,
        }
    }

    fn avatar_url(&self, profile: &YandexProfile) -> Option<String> {
        if profile.is_avatar_empty.unwrap_or(false) {
            return None;
        }
        profile
            .default_avatar_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| format!("{}/{}/{}", self.avatar_base_url, id, self.avatar_size))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(AVATAR_BASE_URL.to_string(), AvatarSize::default())
    }
}

impl Normalize for Normalizer {
    fn normalize(&self, raw: serde_json::Value) -> Result<UserProfile, Error> {
        let profile = YandexProfile::deserialize(&raw).map_err(|e| {
            warn!("Yandex profile does not match the expected shape: {}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed),
            }
        })?;

        let email = profile
            .default_email
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                warn!("Yandex profile has no default_email");
                oauth_error(
                    OAuthErrorKind::MissingScope,
                    "Cannot request user email. Make sure you are using the \"login:email\" scope",
                )
            })?;

        let avatar_url = self.avatar_url(&profile);

        Ok(UserProfile {
            id: profile.id,
            nick_name: profile.login,
            name: profile.real_name.or(profile.display_name),
            email,
            avatar_url,
            email_verification_state: EmailVerificationState::Unsupported,
            original: raw,
        })
    }
}

/// Build the Yandex provider profile, applying the overrides from `config`.
pub fn provider(config: &DriverConfig) -> ProviderProfile {
    let normalizer = Normalizer::new(
        config
            .avatar_base_url
            .clone()
            .unwrap_or_else(|| AVATAR_BASE_URL.to_string()),
        config.avatar_size.unwrap_or_default(),
    );

    ProviderProfile {
        kind: ProviderKind::Yandex,
        authorize_url: config
            .authorize_url
            .clone()
            .unwrap_or_else(|| AUTHORIZE_URL.to_string()),
        access_token_url: config
            .access_token_url
            .clone()
            .unwrap_or_else(|| ACCESS_TOKEN_URL.to_string()),
        user_info_url: config
            .user_info_url
            .clone()
            .unwrap_or_else(|| USER_INFO_URL.to_string()),
        auth_scheme: "OAuth".to_string(),
        scope_separator: " ".to_string(),
        default_scopes: YandexScope::DEFAULT.into_iter().map(String::from).collect(),
        user_info_params: vec![("format".to_string(), "json".to_string())],
        denial_codes: DENIAL_CODES.iter().map(|code| code.to_string()).collect(),
        state_key: STATE_KEY.to_string(),
        normalizer: Arc::new(normalizer),
    }
}
