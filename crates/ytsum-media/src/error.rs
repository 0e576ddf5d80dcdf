//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while driving external tools.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}{}", exit_label(.exit_code), context_suffix(.context))]
    ProcessFailed {
        program: String,
        exit_code: Option<i32>,
        /// Last lines of the diagnostic stream
        context: Vec<String>,
    },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Download failed: {message}")]
    Download {
        message: String,
        #[source]
        source: Option<Box<MediaError>>,
    },

    #[error("Transcription failed: {message}")]
    Transcription {
        message: String,
        #[source]
        source: Option<Box<MediaError>>,
    },

    #[error("Segmenting failed: {message}")]
    Segment {
        message: String,
        #[source]
        source: Option<Box<MediaError>>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn context_suffix(context: &[String]) -> String {
    match context.last() {
        Some(line) => format!(": {line}"),
        None => String::new(),
    }
}

impl MediaError {
    /// Create a process failure error.
    pub fn process_failed(
        program: impl Into<String>,
        exit_code: Option<i32>,
        context: Vec<String>,
    ) -> Self {
        Self::ProcessFailed {
            program: program.into(),
            exit_code,
            context,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a lower-level failure as a download error.
    pub fn download_caused_by(message: impl Into<String>, source: MediaError) -> Self {
        Self::Download {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a transcription failure error.
    pub fn transcription_failed(message: impl Into<String>) -> Self {
        Self::Transcription {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a lower-level failure as a transcription error.
    pub fn transcription_caused_by(message: impl Into<String>, source: MediaError) -> Self {
        Self::Transcription {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a segmenting failure error.
    pub fn segment_failed(message: impl Into<String>) -> Self {
        Self::Segment {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a lower-level failure as a segmenting error.
    pub fn segment_caused_by(message: impl Into<String>, source: MediaError) -> Self {
        Self::Segment {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Diagnostic lines captured from the failing process, if any.
    pub fn process_context(&self) -> &[String] {
        match self {
            Self::ProcessFailed { context, .. } => context,
            Self::Download { source: Some(inner), .. }
            | Self::Transcription { source: Some(inner), .. }
            | Self::Segment { source: Some(inner), .. } => inner.process_context(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_display() {
        let err = MediaError::process_failed(
            "yt-dlp",
            Some(1),
            vec!["[download] 10%".into(), "ERROR: Video unavailable".into()],
        );
        assert_eq!(err.to_string(), "yt-dlp exited with status 1: ERROR: Video unavailable");

        let err = MediaError::process_failed("ffmpeg", None, vec![]);
        assert_eq!(err.to_string(), "ffmpeg exited with no status (terminated by signal)");
    }

    #[test]
    fn test_context_through_wrapper() {
        let inner = MediaError::process_failed("yt-dlp", Some(1), vec!["ERROR: nope".into()]);
        let err = MediaError::download_caused_by("yt-dlp failed", inner);
        assert_eq!(err.process_context(), ["ERROR: nope".to_string()]);
        assert_eq!(err.to_string(), "Download failed: yt-dlp failed");
    }
}
