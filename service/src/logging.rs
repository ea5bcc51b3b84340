use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Target under which the driver's `tracing` events arrive as `log` records.
pub const DRIVER_TARGET: &str = "oauth_driver";

/// HTTP stack modules hidden from console output unless running at Trace.
const FILTERED_MODULES: &[&str] = &["reqwest", "hyper", "hyper_util", "h2", "rustls", "mio"];

pub struct Logger {}

impl Logger {
    /// Installs a terminal logger at `config.log_level_filter`.
    ///
    /// `oauth-driver` logs through `tracing` with its `log` feature on, so with no
    /// tracing subscriber installed its events land here next to the binary's own.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        TermLogger::init(
            config.log_level_filter,
            Self::build_log_config(config.log_level_filter),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )
    }

    /// Whether records from `target` are dropped at `level`.
    ///
    /// The driver target always passes; transport crates only show at Trace.
    fn hides_target(level: LevelFilter, target: &str) -> bool {
        level != LevelFilter::Trace
            && !target.starts_with(DRIVER_TARGET)
            && FILTERED_MODULES
                .iter()
                .any(|module| target.starts_with(module))
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        for module in FILTERED_MODULES
            .iter()
            .filter(|module| Self::hides_target(level, module))
        {
            builder.add_filter_ignore_str(*module);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_targets_hidden_below_trace() {
        for target in ["reqwest::connect", "hyper_util::client", "rustls::client", "h2::codec"] {
            assert!(Logger::hides_target(LevelFilter::Debug, target), "{target}");
            assert!(!Logger::hides_target(LevelFilter::Trace, target), "{target}");
        }
    }

    #[test]
    fn test_driver_target_always_shown() {
        for level in [
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
            LevelFilter::Trace,
        ] {
            assert!(!Logger::hides_target(level, "oauth_driver::oauth::driver"));
            assert!(!Logger::hides_target(level, "oauth_driver::http::client"));
        }
    }

    #[test]
    fn test_binary_target_shown() {
        assert!(!Logger::hides_target(LevelFilter::Info, "yandex_login"));
    }

    #[test]
    fn test_build_log_config_does_not_panic() {
        let _filtered = Logger::build_log_config(LevelFilter::Info);
        let _unfiltered = Logger::build_log_config(LevelFilter::Trace);
    }
}
