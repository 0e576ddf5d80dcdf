//! External tool wrappers for the ytsum pipeline.
//!
//! This crate provides:
//! - A process executor that streams a tool's diagnostic output line by line
//! - A narrow progress sink, independent of any rendering
//! - Audio acquisition with yt-dlp
//! - Transcription with whisper
//! - Optional size-bounded audio segmenting with ffmpeg

pub mod command;
pub mod download;
pub mod error;
pub mod fs_utils;
pub mod progress;
pub mod segment;
pub mod transcribe;

pub use command::{
    CapturedOutput, CommandRunner, CommandSpec, CompletedProcess, DiagnosticStream,
    FfmpegCommand, ProcessExecutor,
};
pub use download::{AudioDownloader, DownloadOptions};
pub use error::{MediaError, MediaResult};
pub use progress::{FnProgress, NullProgress, ProgressSink, TracingProgress};
pub use segment::{parse_duration, plan_segments, segment_if_needed, SegmentSpan};
pub use transcribe::{Transcriber, TranscribeOptions};
