//! Provider tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic name of a (backend, prompt variant) pair.
///
/// Used only for artifact naming. Both components are restricted to
/// lowercase ASCII alphanumerics, so the `-` separator keeps distinct
/// pairs from ever producing the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderTag(String);

impl ProviderTag {
    /// Compose a tag from a service name and a prompt variant name.
    ///
    /// Returns `None` when either component is not a valid tag component.
    pub fn new(service: &str, prompt: &str) -> Option<Self> {
        if !is_valid_component(service) || !is_valid_component(prompt) {
            return None;
        }
        Some(Self(format!("{service}-{prompt}")))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Service half of the tag.
    pub fn service(&self) -> &str {
        self.0.split_once('-').map(|(s, _)| s).unwrap_or(&self.0)
    }

    /// Prompt variant half of the tag.
    pub fn prompt(&self) -> &str {
        self.0.split_once('-').map(|(_, p)| p).unwrap_or_default()
    }
}

/// Check whether a string may be used as one half of a tag.
pub fn is_valid_component(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
