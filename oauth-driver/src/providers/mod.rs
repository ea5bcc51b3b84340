//! Driver configuration.

mod config;

pub use config::DriverConfig;
