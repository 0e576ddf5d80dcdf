//! Pipeline error types.

use std::fmt;

use thiserror::Error;
use ytsum_llm::LlmError;
use ytsum_media::MediaError;
use ytsum_models::ReferenceError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline stage, used to report where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ResolveReference,
    Prepare,
    CheckCache,
    Acquire,
    Transcribe,
    Summarize,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveReference => "resolve_reference",
            Self::Prepare => "prepare",
            Self::CheckCache => "check_cache",
            Self::Acquire => "acquire",
            Self::Transcribe => "transcribe",
            Self::Summarize => "summarize",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid video reference: {0}")]
    InvalidReference(#[from] ReferenceError),

    #[error("{0}")]
    Preparation(#[source] LlmError),

    #[error("{0}")]
    Download(#[source] MediaError),

    #[error("{0}")]
    Transcription(#[source] MediaError),

    #[error("Summarization failed: {0}")]
    Summarization(#[source] LlmError),

    #[error("IO error during {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(stage: Stage, source: std::io::Error) -> Self {
        Self::Io { stage, source }
    }

    /// Stage the run failed in.
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidReference(_) => Stage::ResolveReference,
            Self::Preparation(_) => Stage::Prepare,
            Self::Download(_) => Stage::Acquire,
            Self::Transcription(_) => Stage::Transcribe,
            Self::Summarization(_) => Stage::Summarize,
            Self::Io { stage, .. } => *stage,
        }
    }

    /// Diagnostic lines from a failed external tool, if any.
    pub fn process_context(&self) -> &[String] {
        match self {
            Self::Download(e) | Self::Transcription(e) => e.process_context(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        let err = PipelineError::from(ReferenceError::Empty);
        assert_eq!(err.stage(), Stage::ResolveReference);

        let err = PipelineError::Summarization(LlmError::EmptyInput);
        assert_eq!(err.stage(), Stage::Summarize);
        assert_eq!(err.to_string(), "Summarization failed: Empty input provided");

        let err = PipelineError::io(
            Stage::Persist,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.stage(), Stage::Persist);
        assert_eq!(err.to_string(), "IO error during persist: denied");
    }

    #[test]
    fn test_download_keeps_tool_context() {
        let inner = MediaError::process_failed("yt-dlp", Some(1), vec!["ERROR: private".into()]);
        let err = PipelineError::Download(MediaError::download_caused_by("failed", inner));
        assert_eq!(err.stage(), Stage::Acquire);
        assert_eq!(err.process_context(), ["ERROR: private".to_string()]);
    }
}
