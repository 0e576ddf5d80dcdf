//! Speech-to-text using the whisper CLI.
//!
//! whisper writes a plain-text sibling `{output_dir}/{audio stem}.txt` and
//! echoes the timestamped transcript on stdout, which is captured into
//! `{audio}.txt`. The sibling is preferred; the capture is the fallback.
//! Both are transient: callers persist the returned text themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use ytsum_models::ArtifactLayout;

use crate::command::{CommandSpec, ProcessExecutor};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_quietly;
use crate::progress::ProgressSink;

/// whisper invocation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscribeOptions {
    /// Python interpreter with the `whisper` module installed
    pub python: String,
    /// Model size selector
    pub model: String,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            model: "base".to_string(),
        }
    }
}

/// Turns audio files into transcript text.
#[derive(Debug, Clone, Default)]
pub struct Transcriber {
    options: TranscribeOptions,
}

impl Transcriber {
    /// Create a new transcriber.
    pub fn new(options: TranscribeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranscribeOptions {
        &self.options
    }

    /// Build the whisper invocation for one audio file.
    pub fn build_spec(&self, audio: &Path, output_dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.options.python)
            .args(["-m", "whisper", "--model"])
            .arg(&self.options.model)
            .arg("--output_dir")
            .path_arg(output_dir)
            .args(["--output_format", "txt"])
            .path_arg(audio)
            .stdout_to(ArtifactLayout::stdout_capture_path(audio))
    }

    /// Plain-text file whisper writes for `audio`.
    pub fn sibling_path(audio: &Path, output_dir: &Path) -> PathBuf {
        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        output_dir.join(format!("{stem}.txt"))
    }

    /// Transcribe one audio file.
    ///
    /// The stdout capture and whisper's sibling file are removed before
    /// returning, on success and on failure.
    pub async fn transcribe_file(
        &self,
        executor: &dyn ProcessExecutor,
        audio: &Path,
        output_dir: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> MediaResult<String> {
        let capture = ArtifactLayout::stdout_capture_path(audio);
        let sibling = Self::sibling_path(audio, output_dir);

        tokio::fs::File::create(&capture).await.map_err(|e| {
            MediaError::transcription_caused_by("failed to create output file", e.into())
        })?;

        let spec = self.build_spec(audio, output_dir);
        progress.update("Transcribing audio...");
        info!(audio = %audio.display(), model = %self.options.model, "Transcribing audio");

        let result = self.run_and_read(executor, &spec, &capture, &sibling, progress).await;

        remove_quietly(&[&capture, &sibling]).await;

        let transcript = result?;
        if transcript.trim().is_empty() {
            return Err(MediaError::transcription_failed(format!(
                "empty transcript for {}",
                audio.display()
            )));
        }

        Ok(transcript)
    }

    async fn run_and_read(
        &self,
        executor: &dyn ProcessExecutor,
        spec: &CommandSpec,
        capture: &Path,
        sibling: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> MediaResult<String> {
        executor
            .run(spec, progress)
            .await
            .map_err(|e| MediaError::transcription_caused_by("failed to transcribe", e))?;

        let source = if sibling.exists() { sibling } else { capture };
        debug!(source = %source.display(), "Reading transcription");

        tokio::fs::read_to_string(source).await.map_err(|e| {
            MediaError::transcription_caused_by("failed to read transcription file", e.into())
        })
    }

    /// Transcribe audio parts in order and join their text.
    pub async fn transcribe_all(
        &self,
        executor: &dyn ProcessExecutor,
        parts: &[PathBuf],
        output_dir: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> MediaResult<String> {
        let mut texts = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            if parts.len() > 1 {
                progress.update(&format!("Transcribing part {}/{}...", index + 1, parts.len()));
            }
            let text = self
                .transcribe_file(executor, part, output_dir, Arc::clone(&progress))
                .await?;
            texts.push(text.trim_end().to_string());
        }
        Ok(texts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CapturedOutput, CompletedProcess};
    use crate::progress::NullProgress;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Pretends to be whisper.
    #[derive(Default)]
    struct FakeWhisper {
        write_sibling: bool,
        fail: bool,
        calls: Mutex<Vec<CommandSpec>>,
    }

    #[async_trait]
    impl ProcessExecutor for FakeWhisper {
        async fn run(
            &self,
            spec: &CommandSpec,
            _progress: Arc<dyn ProgressSink>,
        ) -> MediaResult<CompletedProcess> {
            self.calls.lock().unwrap().push(spec.clone());
            let audio = PathBuf::from(spec.arguments().last().unwrap());
            let stem = audio.file_stem().unwrap().to_string_lossy().to_string();
            tokio::fs::write(
                spec.stdout_file().unwrap(),
                format!("[00:00.000 --> 00:02.000] stdout {stem}\n"),
            )
            .await?;
            if self.fail {
                return Err(MediaError::process_failed(spec.program(), Some(2), vec![]));
            }
            if self.write_sibling {
                let dir = audio.parent().unwrap();
                tokio::fs::write(dir.join(format!("{stem}.txt")), format!("plain {stem}\n"))
                    .await?;
            }
            Ok(CompletedProcess::default())
        }

        async fn capture(&self, _spec: &CommandSpec) -> MediaResult<CapturedOutput> {
            unreachable!()
        }
    }

    async fn audio_in(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, b"audio").await.unwrap();
        path
    }

    #[test]
    fn test_build_spec() {
        let spec = Transcriber::default()
            .build_spec(Path::new("downloads/ABC123.mp3"), Path::new("downloads"));

        assert_eq!(spec.program(), "python3");
        assert_eq!(
            spec.arguments(),
            [
                "-m",
                "whisper",
                "--model",
                "base",
                "--output_dir",
                "downloads",
                "--output_format",
                "txt",
                "downloads/ABC123.mp3",
            ]
        );
        assert_eq!(
            spec.stdout_file(),
            Some(Path::new("downloads/ABC123.mp3.txt"))
        );
    }

    #[tokio::test]
    async fn test_prefers_plain_text_sibling_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(&dir, "ABC123.mp3").await;
        let executor = FakeWhisper {
            write_sibling: true,
            ..Default::default()
        };

        let text = Transcriber::default()
            .transcribe_file(&executor, &audio, dir.path(), Arc::new(NullProgress))
            .await
            .unwrap();

        assert_eq!(text, "plain ABC123\n");
        assert!(!dir.path().join("ABC123.mp3.txt").exists());
        assert!(!dir.path().join("ABC123.txt").exists());
        assert!(audio.exists(), "audio lifetime belongs to the caller");
    }

    #[tokio::test]
    async fn test_falls_back_to_stdout_capture() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(&dir, "ABC123.mp3").await;
        let executor = FakeWhisper::default();

        let text = Transcriber::default()
            .transcribe_file(&executor, &audio, dir.path(), Arc::new(NullProgress))
            .await
            .unwrap();

        assert_eq!(text, "[00:00.000 --> 00:02.000] stdout ABC123\n");
    }

    #[tokio::test]
    async fn test_failure_removes_intermediate_text() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(&dir, "ABC123.mp3").await;
        let executor = FakeWhisper {
            fail: true,
            ..Default::default()
        };

        let err = Transcriber::default()
            .transcribe_file(&executor, &audio, dir.path(), Arc::new(NullProgress))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Transcription { .. }));
        assert!(!dir.path().join("ABC123.mp3.txt").exists());
    }

    #[tokio::test]
    async fn test_transcribe_all_joins_parts_in_order() {
        let dir = TempDir::new().unwrap();
        let parts = vec![
            audio_in(&dir, "ABC123_part1.mp3").await,
            audio_in(&dir, "ABC123_part2.mp3").await,
        ];
        let executor = FakeWhisper {
            write_sibling: true,
            ..Default::default()
        };

        let text = Transcriber::default()
            .transcribe_all(&executor, &parts, dir.path(), Arc::new(NullProgress))
            .await
            .unwrap();

        assert_eq!(text, "plain ABC123_part1\nplain ABC123_part2");
        assert_eq!(executor.calls.lock().unwrap().len(), 2);
    }
}
