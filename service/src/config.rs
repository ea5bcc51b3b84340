use clap::builder::TypedValueParser as _;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::LevelFilter;
use oauth_driver::oauth::providers::yandex::{AvatarSize, YandexScope};
use oauth_driver::providers::DriverConfig;
use secrecy::SecretString;
use std::convert::Infallible;
use std::time::Duration;

/// Default callback URL, matching a local development server.
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:3333/yandex/callback";

/// Longest accepted state lifetime: one day.
pub const MAX_STATE_TTL_SECS: u64 = 86_400;

fn parse_secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::new(value.to_string()))
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The client ID of the Yandex OAuth application.
    #[arg(long, env = "YANDEX_CLIENT_ID")]
    yandex_client_id: Option<String>,

    /// The client secret of the Yandex OAuth application.
    #[arg(long, env = "YANDEX_CLIENT_SECRET", hide_env_values = true, value_parser = parse_secret)]
    yandex_client_secret: Option<SecretString>,

    /// The redirect URI registered for the Yandex OAuth application.
    #[arg(long, env = "YANDEX_CALLBACK_URL", default_value = DEFAULT_CALLBACK_URL)]
    yandex_callback_url: String,

    /// A comma separated list of scopes to request. Leave empty to request the
    /// default set (login:email, login:info, login:avatar).
    #[arg(
        long,
        env = "YANDEX_SCOPES",
        value_delimiter = ',',
        use_value_delimiter = true,
        value_parser = clap::builder::PossibleValuesParser::new([
            "login:avatar", "login:birthday", "login:email", "login:info", "login:default_phone"
        ])
            .map(|s| s.parse::<YandexScope>().unwrap()),
    )]
    pub yandex_scopes: Vec<YandexScope>,

    /// Override the authorization endpoint.
    #[arg(long, env = "YANDEX_AUTHORIZE_URL")]
    yandex_authorize_url: Option<String>,

    /// Override the token endpoint.
    /// Override in tests to point at a mock server.
    #[arg(long, env = "YANDEX_ACCESS_TOKEN_URL")]
    yandex_access_token_url: Option<String>,

    /// Override the user info endpoint.
    /// Override in tests to point at a mock server.
    #[arg(long, env = "YANDEX_USER_INFO_URL")]
    yandex_user_info_url: Option<String>,

    /// Override the avatar CDN base URL.
    #[arg(long, env = "YANDEX_AVATAR_URL")]
    yandex_avatar_url: Option<String>,

    /// The avatar rendition used to build avatar URLs.
    #[arg(
        long,
        env = "YANDEX_AVATAR_SIZE",
        default_value_t = AvatarSize::Islands200,
        value_parser = clap::builder::PossibleValuesParser::new(AvatarSize::ALL.map(|size| size.as_str()))
            .map(|s| s.parse::<AvatarSize>().unwrap()),
    )]
    pub yandex_avatar_size: AvatarSize,

    /// Timeout in seconds for each request to Yandex
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Seconds an issued OAuth state stays valid, at most one day
    #[arg(
        long,
        env,
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..=MAX_STATE_TTL_SECS),
    )]
    pub state_ttl_secs: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Issue a state and print the Yandex authorization URL
    Authorize,
    /// Complete a login from the parameters Yandex sent to the callback URL
    Callback {
        /// The `code` query parameter
        #[arg(long)]
        code: Option<String>,
        /// The `state` query parameter
        #[arg(long)]
        state: Option<String>,
        /// The state printed by `authorize`
        #[arg(long)]
        stored_state: String,
        /// The `error` query parameter, when consent was not given
        #[arg(long)]
        error: Option<String>,
        /// Include the access token in the printed user
        #[arg(long)]
        show_token: bool,
    },
    /// Fetch the user behind an existing access token
    Token {
        #[arg(long, env = "YANDEX_ACCESS_TOKEN", hide_env_values = true, value_parser = parse_secret)]
        access_token: SecretString,
        /// Include the access token in the printed user
        #[arg(long)]
        show_token: bool,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn yandex_client_id(&self) -> Option<String> {
        self.yandex_client_id.clone()
    }

    pub fn yandex_client_secret(&self) -> Option<SecretString> {
        self.yandex_client_secret.clone()
    }

    pub fn yandex_callback_url(&self) -> &str {
        &self.yandex_callback_url
    }

    pub fn set_yandex_user_info_url(mut self, url: String) -> Self {
        self.yandex_user_info_url = Some(url);
        self
    }

    pub fn set_yandex_access_token_url(mut self, url: String) -> Self {
        self.yandex_access_token_url = Some(url);
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn state_ttl(&self) -> chrono::Duration {
        let secs = self.state_ttl_secs.min(MAX_STATE_TTL_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }

    /// Builds the driver configuration, or `None` when the client credentials
    /// are not set.
    pub fn driver_config(&self) -> Option<DriverConfig> {
        let mut config = DriverConfig::new(
            self.yandex_client_id()?,
            self.yandex_client_secret()?,
            self.yandex_callback_url.clone(),
        )
        .with_scopes(self.yandex_scopes.iter().copied())
        .with_avatar_size(self.yandex_avatar_size)
        .with_request_timeout(self.http_timeout());

        config.authorize_url = self.yandex_authorize_url.clone();
        config.access_token_url = self.yandex_access_token_url.clone();
        config.user_info_url = self.yandex_user_info_url.clone();
        config.avatar_base_url = self.yandex_avatar_url.clone();

        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["yandex_login"];
        argv.extend_from_slice(args);
        Config::parse_from(argv)
    }

    #[test]
    fn test_driver_config_from_flags() {
        let config = parse(&[
            "--yandex-client-id",
            "client",
            "--yandex-client-secret",
            "secret",
            "--yandex-callback-url",
            "https://app.example/cb",
            "--yandex-scopes",
            "login:info,login:email",
            "--yandex-avatar-size",
            "islands-50",
            "--http-timeout-secs",
            "5",
        ]);

        let driver_config = config.driver_config().unwrap();
        assert_eq!(driver_config.client_id, "client");
        assert_eq!(driver_config.client_secret.expose_secret(), "secret");
        assert_eq!(driver_config.callback_url, "https://app.example/cb");
        assert_eq!(driver_config.scopes, vec!["login:info", "login:email"]);
        assert_eq!(driver_config.avatar_size, Some(AvatarSize::Islands50));
        assert_eq!(driver_config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_endpoint_overrides() {
        let config = parse(&[
            "--yandex-client-id",
            "client",
            "--yandex-client-secret",
            "secret",
        ])
        .set_yandex_access_token_url("http://localhost:1234/token".to_string())
        .set_yandex_user_info_url("http://localhost:1234/info".to_string());

        let driver_config = config.driver_config().unwrap();
        assert_eq!(
            driver_config.access_token_url.as_deref(),
            Some("http://localhost:1234/token")
        );
        assert_eq!(
            driver_config.user_info_url.as_deref(),
            Some("http://localhost:1234/info")
        );
    }

    #[test]
    fn test_rejects_unknown_scope() {
        let result = Config::try_parse_from([
            "yandex_login",
            "--yandex-scopes",
            "login:everything",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_callback_subcommand() {
        let config = parse(&[
            "callback",
            "--code",
            "auth-code",
            "--state",
            "abc",
            "--stored-state",
            "abc",
        ]);

        match config.command {
            Some(Command::Callback {
                code,
                state,
                stored_state,
                error,
                show_token,
            }) => {
                assert_eq!(code.as_deref(), Some("auth-code"));
                assert_eq!(state.as_deref(), Some("abc"));
                assert_eq!(stored_state, "abc");
                assert!(error.is_none());
                assert!(!show_token);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_state_ttl_beyond_one_day() {
        let result = Config::try_parse_from([
            "yandex_login",
            "--state-ttl-secs",
            "9000000000000000",
        ]);
        assert!(result.is_err());

        let result = Config::try_parse_from(["yandex_login", "--state-ttl-secs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = parse(&[
            "--yandex-client-id",
            "client",
            "--yandex-client-secret",
            "client-secret-value",
            "token",
            "--access-token",
            "access-token-value",
        ]);

        let debug = format!("{config:?}");
        assert!(!debug.contains("client-secret-value"));
        assert!(!debug.contains("access-token-value"));

        match config.command {
            Some(Command::Token { access_token, .. }) => {
                assert_eq!(access_token.expose_secret(), "access-token-value");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_state_ttl() {
        let config = parse(&["--state-ttl-secs", "120"]);
        assert_eq!(config.state_ttl(), chrono::Duration::seconds(120));
    }
}
