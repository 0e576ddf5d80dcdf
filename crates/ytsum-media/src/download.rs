//! Audio acquisition using yt-dlp.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use ytsum_models::{ArtifactLayout, VideoReference};

use crate::command::{CommandSpec, ProcessExecutor};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::file_size;
use crate::progress::ProgressSink;

/// Fixed yt-dlp settings for audio extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// yt-dlp executable
    pub program: String,
    /// Concurrent fragment downloads (`-N`)
    pub concurrent_fragments: u32,
    /// Extracted audio codec, also the artifact extension
    pub audio_format: String,
    /// Audio bitrate
    pub audio_quality: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            concurrent_fragments: 5,
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
        }
    }
}

/// Extracts the audio track of a video into the output directory.
#[derive(Debug, Clone, Default)]
pub struct AudioDownloader {
    options: DownloadOptions,
}

impl AudioDownloader {
    /// Create a new downloader.
    pub fn new(options: DownloadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Build the yt-dlp invocation for `reference`.
    ///
    /// `--newline` makes yt-dlp emit one progress line per update instead of
    /// redrawing a single line.
    pub fn build_spec(&self, reference: &VideoReference, layout: &ArtifactLayout) -> CommandSpec {
        CommandSpec::new(&self.options.program)
            .arg("-N")
            .arg(self.options.concurrent_fragments.to_string())
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(&self.options.audio_format)
            .arg("--audio-quality")
            .arg(&self.options.audio_quality)
            .arg("-o")
            .path_arg(layout.audio_template())
            .arg("--newline")
            .arg(reference.source_url())
    }

    /// Download audio for `reference`, returning the path of the audio file.
    pub async fn download(
        &self,
        executor: &dyn ProcessExecutor,
        reference: &VideoReference,
        layout: &ArtifactLayout,
        progress: Arc<dyn ProgressSink>,
    ) -> MediaResult<PathBuf> {
        progress.update("Creating download directory...");
        tokio::fs::create_dir_all(layout.root()).await.map_err(|e| {
            MediaError::download_caused_by("failed to create output directory", e.into())
        })?;

        let spec = self.build_spec(reference, layout);

        info!(
            video_id = %reference.id,
            url = %reference.source_url(),
            "Downloading audio"
        );
        progress.update("Starting download with yt-dlp...");

        executor
            .run(&spec, Arc::clone(&progress))
            .await
            .map_err(|e| MediaError::download_caused_by("failed to download audio", e))?;

        let audio_path = layout.audio_path(&reference.id, &self.options.audio_format);
        if !audio_path.exists() {
            return Err(MediaError::download_failed(format!(
                "no output file found at {}",
                audio_path.display()
            )));
        }

        let size = file_size(&audio_path).await?;
        info!(
            output = %audio_path.display(),
            size_mb = size as f64 / (1024.0 * 1024.0),
            "Downloaded audio successfully"
        );

        Ok(audio_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CapturedOutput, CompletedProcess};
    use crate::progress::NullProgress;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Pretends to be yt-dlp: writes the audio file named by the template.
    struct FakeYtDlp {
        write_output: bool,
        fail: bool,
    }

    #[async_trait]
    impl ProcessExecutor for FakeYtDlp {
        async fn run(
            &self,
            spec: &CommandSpec,
            progress: Arc<dyn ProgressSink>,
        ) -> MediaResult<CompletedProcess> {
            if self.fail {
                return Err(MediaError::process_failed(
                    spec.program(),
                    Some(1),
                    vec!["ERROR: Video unavailable".to_string()],
                ));
            }
            progress.update("[download] 100% of 1.00MiB");
            if self.write_output {
                let args = spec.arguments();
                let template = &args[args.iter().position(|a| a == "-o").unwrap() + 1];
                let path = template.replace("%(id)s", "ABC123").replace("%(ext)s", "mp3");
                tokio::fs::write(path, b"audio").await?;
            }
            Ok(CompletedProcess {
                program: spec.program().to_string(),
                exit_code: Some(0),
                ..Default::default()
            })
        }

        async fn capture(&self, _spec: &CommandSpec) -> MediaResult<CapturedOutput> {
            unreachable!("yt-dlp is never captured")
        }
    }

    fn reference() -> VideoReference {
        VideoReference::parse("https://youtu.be/ABC123").unwrap()
    }

    #[test]
    fn test_build_spec() {
        let layout = ArtifactLayout::new("downloads");
        let spec = AudioDownloader::default().build_spec(&reference(), &layout);

        assert_eq!(spec.program(), "yt-dlp");
        assert_eq!(
            spec.arguments(),
            [
                "-N",
                "5",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
                "-o",
                "downloads/%(id)s.%(ext)s",
                "--newline",
                "https://www.youtube.com/watch?v=ABC123",
            ]
        );
    }

    #[tokio::test]
    async fn test_download_returns_audio_path() {
        let dir = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(dir.path().join("downloads"));
        let executor = FakeYtDlp {
            write_output: true,
            fail: false,
        };

        let path = AudioDownloader::default()
            .download(&executor, &reference(), &layout, Arc::new(NullProgress))
            .await
            .unwrap();

        assert_eq!(path, layout.root().join("ABC123.mp3"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_download_missing_output() {
        let dir = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        let executor = FakeYtDlp {
            write_output: false,
            fail: false,
        };

        let err = AudioDownloader::default()
            .download(&executor, &reference(), &layout, Arc::new(NullProgress))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Download { .. }));
    }

    #[tokio::test]
    async fn test_download_tool_failure_keeps_context() {
        let dir = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        let executor = FakeYtDlp {
            write_output: false,
            fail: true,
        };

        let err = AudioDownloader::default()
            .download(&executor, &reference(), &layout, Arc::new(NullProgress))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Download { .. }));
        assert_eq!(err.process_context(), ["ERROR: Video unavailable".to_string()]);
    }
}
