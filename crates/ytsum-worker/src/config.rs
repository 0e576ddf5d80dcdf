//! Pipeline configuration.

use std::path::PathBuf;

use ytsum_media::{DownloadOptions, TranscribeOptions};
use ytsum_models::ArtifactLayout;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding audio, transcripts and summaries
    pub output_dir: PathBuf,
    /// yt-dlp settings
    pub download: DownloadOptions,
    /// whisper settings
    pub transcribe: TranscribeOptions,
    /// ffmpeg executable, used only when segmenting
    pub ffmpeg_program: String,
    /// Split audio larger than this before transcribing; `None` disables
    pub max_audio_bytes: Option<u64>,
    /// Kill external tools after this many seconds; `None` waits forever
    pub process_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            download: DownloadOptions::default(),
            transcribe: TranscribeOptions::default(),
            ffmpeg_program: "ffmpeg".to_string(),
            max_audio_bytes: None,
            process_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("YTSUM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            download: DownloadOptions {
                program: std::env::var("YTSUM_YTDLP_BIN").unwrap_or(defaults.download.program),
                concurrent_fragments: std::env::var("YTSUM_DOWNLOAD_FRAGMENTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.download.concurrent_fragments),
                audio_format: std::env::var("YTSUM_AUDIO_FORMAT")
                    .unwrap_or(defaults.download.audio_format),
                audio_quality: std::env::var("YTSUM_AUDIO_QUALITY")
                    .unwrap_or(defaults.download.audio_quality),
            },
            transcribe: TranscribeOptions {
                python: std::env::var("YTSUM_PYTHON_BIN").unwrap_or(defaults.transcribe.python),
                model: std::env::var("YTSUM_WHISPER_MODEL").unwrap_or(defaults.transcribe.model),
            },
            ffmpeg_program: std::env::var("YTSUM_FFMPEG_BIN").unwrap_or(defaults.ffmpeg_program),
            max_audio_bytes: std::env::var("YTSUM_MAX_AUDIO_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&bytes: &u64| bytes > 0),
            process_timeout_secs: std::env::var("YTSUM_PROCESS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&secs: &u64| secs > 0),
        }
    }

    /// Artifact layout rooted at the output directory.
    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.download.audio_format, "mp3");
        assert_eq!(config.transcribe.model, "base");
        assert!(config.max_audio_bytes.is_none());
        assert_eq!(config.layout().root(), std::path::Path::new("downloads"));
    }
}
