//! Video identity models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reference::{resolve_video_id, ReferenceResult};

/// Canonical video identifier, used as cache key and filename stem.
///
/// Only produced by resolution, so it is always non-empty and URL-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Resolve a URL or bare ID into a video ID.
    pub fn resolve(input: &str) -> ReferenceResult<Self> {
        resolve_video_id(input).map(Self)
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// User input paired with the ID it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    /// Input as given (untrimmed)
    pub input: String,
    /// Resolved canonical ID
    pub id: VideoId,
}

impl VideoReference {
    /// Parse user input into a reference.
    pub fn parse(input: impl Into<String>) -> ReferenceResult<Self> {
        let input = input.into();
        let id = VideoId::resolve(&input)?;
        Ok(Self { input, id })
    }

    /// Canonical watch URL handed to the acquisition tool.
    ///
    /// Bare IDs and every accepted URL shape map to the same URL.
    pub fn source_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.input.trim(), self.id)
    }
}
