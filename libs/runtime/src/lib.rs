//! Runtime support for the storefront server: layered configuration and
//! logging initialization. Kept free of any domain knowledge so that it can
//! be reused by tooling binaries.

pub mod config;
pub mod logging;

pub use config::{
    default_logging_config, AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section,
    ServerConfig,
};
