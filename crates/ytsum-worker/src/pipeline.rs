//! The summarization pipeline.
//!
//! A run moves through
//! `ResolveReference -> CheckCache -> (Acquire -> Transcribe | cache hit)
//! -> Summarize -> Persist`, stopping at the first failing stage.
//! The transcript cache `{output}/{id}.txt` survives every later failure,
//! so a re-run only repeats summarization.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::Instrument;
use ytsum_llm::{PromptVariant, SummarizationProvider};
use ytsum_media::fs_utils::remove_quietly;
use ytsum_media::{
    segment_if_needed, AudioDownloader, CommandRunner, ProcessExecutor, ProgressSink, Transcriber,
};
use ytsum_models::{ArtifactLayout, ProviderTag, ReferenceError, VideoId, VideoReference};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::logging::RunLogger;

/// Result of one successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub video_id: VideoId,
    pub provider: ProviderTag,
    pub summary: String,
    pub summary_path: PathBuf,
    pub transcript_path: PathBuf,
    /// Whether the transcript came from the cache
    pub cache_hit: bool,
    /// Stages the run went through, in order
    pub stages: Vec<Stage>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

struct Completed {
    summary: String,
    summary_path: PathBuf,
    cache_hit: bool,
    stages: Vec<Stage>,
}

/// Download, transcribe and summarize videos into an output directory.
pub struct Pipeline {
    layout: ArtifactLayout,
    downloader: AudioDownloader,
    transcriber: Transcriber,
    ffmpeg_program: String,
    max_audio_bytes: Option<u64>,
    executor: Arc<dyn ProcessExecutor>,
}

impl Pipeline {
    /// Pipeline running tools through `executor`.
    pub fn new(config: &PipelineConfig, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            layout: config.layout(),
            downloader: AudioDownloader::new(config.download.clone()),
            transcriber: Transcriber::new(config.transcribe.clone()),
            ffmpeg_program: config.ffmpeg_program.clone(),
            max_audio_bytes: config.max_audio_bytes,
            executor,
        }
    }

    /// Pipeline spawning the real tools.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut runner = CommandRunner::new();
        if let Some(secs) = config.process_timeout_secs {
            runner = runner.with_timeout(secs);
        }
        Self::new(config, Arc::new(runner))
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Summarize the video named by `reference` with `provider`.
    pub async fn process(
        &self,
        reference: &str,
        provider: &dyn SummarizationProvider,
        progress: Arc<dyn ProgressSink>,
    ) -> PipelineResult<RunReport> {
        let result = self.run(reference, provider, Arc::clone(&progress)).await;
        progress.clear();
        result
    }

    async fn run(
        &self,
        reference: &str,
        provider: &dyn SummarizationProvider,
        progress: Arc<dyn ProgressSink>,
    ) -> PipelineResult<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        progress.update("Starting video processing...");

        let reference = VideoReference::parse(reference)
            .and_then(|parsed| {
                let prompts = PromptVariant::ALL.map(|variant| variant.name());
                if ArtifactLayout::is_summary_stem(&parsed.id, &prompts) {
                    return Err(ReferenceError::ClashesWithSummary(parsed.id.to_string()));
                }
                Ok(parsed)
            })
            .map_err(|e| {
                tracing::error!(input = %reference, stage = %Stage::ResolveReference, "{}", e);
                PipelineError::from(e)
            })?;
        let tag = provider.identify();
        let logger = RunLogger::new(&reference.id, &tag);
        let span = logger.create_span();

        async {
            logger.log_start(&reference.input);

            let result = self
                .run_resolved(&reference, provider, &tag, &logger, progress)
                .await;

            match result {
                Ok(completed) => {
                    let elapsed = start.elapsed();
                    logger.log_completion(elapsed);
                    Ok(RunReport {
                        transcript_path: self.layout.transcript_path(&reference.id),
                        video_id: reference.id.clone(),
                        provider: tag.clone(),
                        summary: completed.summary,
                        summary_path: completed.summary_path,
                        cache_hit: completed.cache_hit,
                        stages: completed.stages,
                        started_at,
                        elapsed,
                    })
                }
                Err(e) => {
                    logger.log_error(&e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_resolved(
        &self,
        reference: &VideoReference,
        provider: &dyn SummarizationProvider,
        tag: &ProviderTag,
        logger: &RunLogger,
        progress: Arc<dyn ProgressSink>,
    ) -> PipelineResult<Completed> {
        let mut stages = vec![Stage::ResolveReference, Stage::CheckCache];

        logger.log_stage(Stage::CheckCache, "Checking transcript cache");
        let (transcript, cache_hit) = match self.cached_transcript(&reference.id).await? {
            Some(transcript) => {
                logger.log_stage(Stage::CheckCache, "Using cached transcript");
                progress.update("Using cached transcript...");
                (transcript, true)
            }
            None => {
                stages.extend([Stage::Acquire, Stage::Transcribe]);
                let transcript = self
                    .acquire_and_transcribe(reference, logger, Arc::clone(&progress))
                    .await?;
                (transcript, false)
            }
        };

        stages.push(Stage::Summarize);
        logger.log_stage(Stage::Summarize, "Generating summary");
        progress.update("Preparing summary request...");
        let summary = provider
            .generate_from_input(&transcript)
            .await
            .map_err(PipelineError::Summarization)?;

        stages.push(Stage::Persist);
        let summary_path = self.layout.summary_path(&reference.id, tag);
        logger.log_stage(Stage::Persist, "Writing summary");
        tokio::fs::write(&summary_path, &summary)
            .await
            .map_err(|e| PipelineError::io(Stage::Persist, e))?;

        Ok(Completed {
            summary,
            summary_path,
            cache_hit,
            stages,
        })
    }

    /// Read `{id}.txt` when a previous run left one.
    async fn cached_transcript(&self, id: &VideoId) -> PipelineResult<Option<String>> {
        let path = self.layout.transcript_path(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::io(Stage::CheckCache, e)),
        }
    }

    async fn acquire_and_transcribe(
        &self,
        reference: &VideoReference,
        logger: &RunLogger,
        progress: Arc<dyn ProgressSink>,
    ) -> PipelineResult<String> {
        let executor = self.executor.as_ref();
        let audio = self
            .layout
            .audio_path(&reference.id, &self.downloader.options().audio_format);

        logger.log_stage(Stage::Acquire, "Downloading audio");
        if let Err(e) = self
            .downloader
            .download(executor, reference, &self.layout, Arc::clone(&progress))
            .await
        {
            remove_quietly(&[&audio]).await;
            return Err(PipelineError::Download(e));
        }

        logger.log_stage(Stage::Transcribe, "Transcribing audio");
        let result = self.transcribe(&audio, progress).await;
        remove_quietly(&[&audio]).await;
        let transcript = result?;

        tokio::fs::write(self.layout.transcript_path(&reference.id), &transcript)
            .await
            .map_err(|e| PipelineError::io(Stage::Transcribe, e))?;

        Ok(transcript)
    }

    /// Transcribe `audio`, splitting it first when it exceeds the size limit.
    async fn transcribe(
        &self,
        audio: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> PipelineResult<String> {
        let executor = self.executor.as_ref();

        let parts = match self.max_audio_bytes {
            Some(max_bytes) => segment_if_needed(
                executor,
                audio,
                max_bytes,
                &self.ffmpeg_program,
                Some(Arc::clone(&progress)),
            )
            .await
            .map_err(PipelineError::Transcription)?,
            None => vec![audio.to_path_buf()],
        };

        let result = self
            .transcriber
            .transcribe_all(executor, &parts, self.layout.root(), progress)
            .await;

        let segments: Vec<&PathBuf> = parts.iter().filter(|part| *part != audio).collect();
        remove_quietly(&segments).await;

        result.map_err(PipelineError::Transcription)
    }
}
