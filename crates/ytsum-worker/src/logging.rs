//! Structured run logging.

use std::time::Duration;

use tracing::{error, info, Span};
use ytsum_models::{ProviderTag, VideoId};

use crate::error::{PipelineError, Stage};

/// Logs the lifecycle of one (video, provider) run with consistent fields.
#[derive(Debug, Clone)]
pub struct RunLogger {
    video_id: String,
    provider: String,
}

impl RunLogger {
    pub fn new(video_id: &VideoId, provider: &ProviderTag) -> Self {
        Self {
            video_id: video_id.to_string(),
            provider: provider.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            provider = %self.provider,
            "Run started: {}", message
        );
    }

    pub fn log_stage(&self, stage: Stage, message: &str) {
        info!(
            video_id = %self.video_id,
            provider = %self.provider,
            stage = %stage,
            "{}", message
        );
    }

    /// Log a failure with its stage and any captured tool output.
    pub fn log_error(&self, err: &PipelineError) {
        let context = err.process_context();
        error!(
            video_id = %self.video_id,
            provider = %self.provider,
            stage = %err.stage(),
            tool_output = %context.join("\n"),
            "Run failed: {}", err
        );
    }

    pub fn log_completion(&self, elapsed: Duration) {
        info!(
            video_id = %self.video_id,
            provider = %self.provider,
            elapsed_secs = elapsed.as_secs_f64(),
            "Run completed"
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Span carrying the run fields.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            video_id = %self.video_id,
            provider = %self.provider
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_fields() {
        let id = VideoId::resolve("https://youtu.be/ABC123").unwrap();
        let tag = ProviderTag::new("openai", "default").unwrap();
        let logger = RunLogger::new(&id, &tag);

        assert_eq!(logger.video_id(), "ABC123");
        assert_eq!(logger.provider(), "openai-default");
        logger.log_stage(Stage::CheckCache, "Checking cache");
    }
}
