//! Credential lookup.

use std::collections::HashMap;
use std::fmt;

/// Where providers read their API keys from.
pub trait CredentialSource: Send + Sync + fmt::Debug {
    /// Value of `name`, or `None` when unset.
    fn get(&self, name: &str) -> Option<String>;

    /// Value of `name` when set and not blank.
    fn non_blank(&self, name: &str) -> Option<String> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }
}

/// Reads credentials from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed credentials, mostly for tests.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    /// Create an empty credential set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // values are secrets
        f.debug_struct("StaticCredentials")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}
