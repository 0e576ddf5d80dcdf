//! On-disk artifact layout.
//!
//! Every artifact of a run lives in one flat output directory:
//!
//! | Artifact | Path | Lifetime |
//! |----------|------|----------|
//! | audio | `{id}.{ext}` | removed after transcription |
//! | transcript | `{id}.txt` | durable cache |
//! | summary | `{id}-{tag}.txt` | durable, one per provider tag |
//! | stdout capture | `{audio file}.txt` | removed after transcription |

use std::path::{Path, PathBuf};

use crate::provider_tag::{is_valid_component, ProviderTag};
use crate::video::VideoId;

/// Path scheme for the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    /// Create a new layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output template in the acquisition tool's substitution syntax.
    pub fn audio_template(&self) -> PathBuf {
        self.root.join("%(id)s.%(ext)s")
    }

    /// Downloaded audio for `id`.
    pub fn audio_path(&self, id: &VideoId, extension: &str) -> PathBuf {
        self.root.join(format!("{id}.{extension}"))
    }

    /// Transcript cache for `id`.
    pub fn transcript_path(&self, id: &VideoId) -> PathBuf {
        self.root.join(format!("{id}.txt"))
    }

    /// Summary written by the provider named `tag`.
    pub fn summary_path(&self, id: &VideoId, tag: &ProviderTag) -> PathBuf {
        self.root.join(format!("{id}-{tag}.txt"))
    }

    /// Whether `id` has the shape `{video}-{service}-{prompt}` for one of
    /// `prompts`. Such an ID's transcript path is another video's summary.
    pub fn is_summary_stem(id: &VideoId, prompts: &[&str]) -> bool {
        let mut parts = id.as_str().rsplitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prompt), Some(service), Some(video)) => {
                !video.is_empty() && is_valid_component(service) && prompts.contains(&prompt)
            }
            _ => false,
        }
    }

    /// File that receives the transcription tool's stdout for `audio`.
    pub fn stdout_capture_path(audio: &Path) -> PathBuf {
        let mut name = audio.as_os_str().to_os_string();
        name.push(".txt");
        PathBuf::from(name)
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new("downloads")
    }
}
