//! YouTube video summarizer.
//!
//! This crate provides:
//! - The download, transcribe and summarize pipeline with a transcript cache
//! - Batch runs over several provider combinations
//! - Environment-based configuration
//! - Structured run logging

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use batch::BatchOutcome;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, Stage};
pub use logging::RunLogger;
pub use pipeline::{Pipeline, RunReport};
