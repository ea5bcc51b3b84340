use log::{error, info, warn};
use oauth_driver::oauth::{
    CallbackParams, Driver, LoginOutcome, MemoryStateStore, NormalizedUser, StateStore,
};
use secrecy::ExposeSecret;
use service::{
    config::{Command, Config},
    logging::Logger,
};

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start the logger: {e}");
        std::process::exit(1);
    }

    let Some(driver_config) = config.driver_config() else {
        error!("YANDEX_CLIENT_ID and YANDEX_CLIENT_SECRET must both be set");
        std::process::exit(1);
    };

    let driver = match Driver::yandex(driver_config) {
        Ok(driver) => driver,
        Err(e) => {
            error!("Failed to configure the Yandex driver: {e}");
            std::process::exit(1);
        }
    };

    let store = MemoryStateStore::with_ttl(config.state_ttl());

    match config.command.clone().unwrap_or(Command::Authorize) {
        Command::Authorize => match driver.begin_login(&store) {
            Ok(redirect) => {
                info!("Open the URL below, then pass the returned query to `callback`");
                println!("{}", redirect.url);
                println!("state: {}", redirect.state.as_str());
            }
            Err(e) => {
                error!("Failed to build the authorization URL: {e}");
                std::process::exit(1);
            }
        },
        Command::Callback {
            code,
            state,
            stored_state,
            error,
            show_token,
        } => {
            store.store(driver.state_key(), &stored_state);
            let callback = CallbackParams {
                code,
                state,
                error,
                ..CallbackParams::default()
            };

            match driver.complete(&callback, &store).await {
                LoginOutcome::Success(user) => print_user(&user, show_token),
                LoginOutcome::Denied => {
                    warn!("The user declined access on the Yandex consent page");
                    std::process::exit(2);
                }
                LoginOutcome::Failed(e) => {
                    error!("Login failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Token {
            access_token,
            show_token,
        } => match driver.user_from_token(access_token.expose_secret()).await {
            Ok(user) => print_user(&user, show_token),
            Err(e) => {
                error!("Failed to fetch the Yandex profile: {e}");
                std::process::exit(1);
            }
        },
    }
}

fn print_user(user: &NormalizedUser, show_token: bool) {
    let mut json = match serde_json::to_value(user.profile()) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize the user: {e}");
            std::process::exit(1);
        }
    };

    if show_token {
        json["token"] = serde_json::json!({
            "token": user.token.token.expose_secret(),
            "token_type": user.token.token_type,
            "expires_in": user.token.expires_in,
            "expires_at": user.token.expires_at,
            "refresh_token": user.token.refresh_token.as_ref().map(|t| t.expose_secret()),
        });
    }

    match serde_json::to_string_pretty(&json) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!("Failed to serialize the user: {e}");
            std::process::exit(1);
        }
    }
}
