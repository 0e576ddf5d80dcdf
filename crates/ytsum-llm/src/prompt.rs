//! Prompt variants.

use std::fmt;
use std::str::FromStr;

use crate::error::LlmError;

const TRANSCRIPT_SLOT: &str = "{transcript}";

const DEFAULT_SYSTEM: &str = "You are an assistant that summarizes video transcripts. \
Write a clear, faithful summary in plain prose. Do not invent details that are not in the transcript.";

const DEFAULT_USER: &str = "Summarize the following video transcript:\n\n{transcript}";

const KEYPOINTS_SYSTEM: &str = "You are an assistant that extracts the key points of video transcripts. \
Answer with a short bulleted list, one point per line, most important first.";

const KEYPOINTS_USER: &str = "List the key points of the following video transcript:\n\n{transcript}";

const DETAILED_SYSTEM: &str = "You are an assistant that writes detailed summaries of video transcripts. \
Organize the summary into sections that follow the structure of the video, and keep names, numbers and conclusions.";

const DETAILED_USER: &str = "Write a detailed, sectioned summary of the following video transcript:\n\n{transcript}";

/// Prompt shape sent to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PromptVariant {
    #[default]
    Default,
    KeyPoints,
    Detailed,
}

impl PromptVariant {
    /// Every variant, in display order.
    pub const ALL: [PromptVariant; 3] = [Self::Default, Self::KeyPoints, Self::Detailed];

    /// Name used in provider tags.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::KeyPoints => "keypoints",
            Self::Detailed => "detailed",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Default => DEFAULT_SYSTEM,
            Self::KeyPoints => KEYPOINTS_SYSTEM,
            Self::Detailed => DETAILED_SYSTEM,
        }
    }

    /// User template with a single `{transcript}` slot.
    pub fn user_template(&self) -> &'static str {
        match self {
            Self::Default => DEFAULT_USER,
            Self::KeyPoints => KEYPOINTS_USER,
            Self::Detailed => DETAILED_USER,
        }
    }

    /// User prompt with the transcript substituted in.
    pub fn user_prompt(&self, transcript: &str) -> String {
        self.user_template().replacen(TRANSCRIPT_SLOT, transcript, 1)
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PromptVariant {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|variant| variant.name() == wanted)
            .ok_or_else(|| LlmError::UnknownPromptVariant(s.to_string()))
    }
}
