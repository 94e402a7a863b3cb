//! Configuration management
//!
//! Handles connection parameters, saved profiles, passwords and settings.

pub mod connections;
pub mod secrets;
pub mod settings;

pub use connections::{ConnectionParams, ConnectionProfile, ProfileStore, SslMode};
pub use secrets::{EnvSecretStore, MemorySecretStore, SecretStore};
pub use settings::Settings;
