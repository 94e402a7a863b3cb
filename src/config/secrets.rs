//! Password storage
//!
//! Passwords are kept out of the profile file and looked up by profile
//! name. A missing entry is not an error: it reads as an empty password.

use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Backend for storing connection passwords by profile name.
pub trait SecretStore: Send + Sync {
    /// `None` when nothing is stored for `key`
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, secret: &str) -> ConfigResult<()>;

    /// Removing a key that is not stored is not an error.
    fn delete(&self, key: &str) -> ConfigResult<()>;

    /// Password for a profile, empty when none is stored.
    fn password_for(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }
}

/// Process-local store, also handy in tests.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Option<String> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, secret: &str) -> ConfigResult<()> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> ConfigResult<()> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Reads passwords from `PGBROWSE_PASSWORD_<PROFILE>` environment
/// variables (profile upper-cased, non-alphanumerics as `_`), falling back
/// to `PGPASSWORD`. Storing a password is refused with a pointer to the
/// variable to export instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn var_name(key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("PGBROWSE_PASSWORD_{}", suffix)
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(Self::var_name(key))
            .or_else(|_| std::env::var("PGPASSWORD"))
            .ok()
    }

    fn set(&self, key: &str, _secret: &str) -> ConfigResult<()> {
        tracing::debug!(profile = %key, "environment secret store is read-only");
        Err(ConfigError::Invalid(format!(
            "passwords are read from the environment; export {} instead",
            Self::var_name(key)
        )))
    }

    fn delete(&self, _key: &str) -> ConfigResult<()> {
        Ok(())
    }
}
