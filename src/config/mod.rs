//! Configuration module for simplereports.
//!
//! Handles connection configuration, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{expand_connect_env, ConnectionConfig, DatabaseKind, ResolveOptions};
pub use settings::{
    expand_env_vars, ConnectionSettings, LoggingSettings, OutputSettings, Settings, SettingsError,
};
