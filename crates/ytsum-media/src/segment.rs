//! Size-bounded audio segmenting.
//!
//! Files over the byte budget are cut into equal-duration stream-copy parts
//! `{stem}_part{n}{ext}` next to the source. The part count comes from the
//! byte size, the part length from the probed duration.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, ProcessExecutor};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{file_size, remove_quietly};
use crate::progress::{NullProgress, ProgressSink};

/// One planned part of a split audio file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpan {
    /// Zero-based part index
    pub index: usize,
    /// Start offset in seconds
    pub start: f64,
    /// Part length in seconds
    pub duration: f64,
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})").expect("duration pattern is valid")
    })
}

/// Extract the whole-second duration from FFmpeg's stream banner.
pub fn parse_duration(text: &str) -> Option<f64> {
    let caps = duration_regex().captures(text)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    let total = field(1)? * 3600 + field(2)? * 60 + field(3)?;
    Some(total as f64)
}

/// Split `total_secs` into `size / max_bytes + 1` equal spans.
///
/// Returns a single span covering everything when the file fits.
pub fn plan_segments(size: u64, max_bytes: u64, total_secs: f64) -> Vec<SegmentSpan> {
    if max_bytes == 0 || size <= max_bytes {
        return vec![SegmentSpan {
            index: 0,
            start: 0.0,
            duration: total_secs,
        }];
    }

    let parts = (size / max_bytes + 1) as usize;
    let duration = total_secs / parts as f64;

    (0..parts)
        .map(|index| SegmentSpan {
            index,
            start: index as f64 * duration,
            duration,
        })
        .collect()
}

/// Path of part `index` (zero-based) of `path`.
pub fn segment_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_part{}{ext}", index + 1))
}

/// Split `path` into parts no larger than roughly `max_bytes`.
///
/// Returns `[path]` untouched when the file already fits. On failure every
/// part written by this call is removed.
pub async fn segment_if_needed(
    executor: &dyn ProcessExecutor,
    path: &Path,
    max_bytes: u64,
    ffmpeg_program: &str,
    progress: Option<Arc<dyn ProgressSink>>,
) -> MediaResult<Vec<PathBuf>> {
    if max_bytes == 0 {
        return Err(MediaError::segment_failed("maximum part size must be positive"));
    }

    let size = file_size(path)
        .await
        .map_err(|e| MediaError::segment_caused_by("cannot get file info", e))?;
    if size <= max_bytes {
        debug!(size, max_bytes, "Audio within size limit, not segmenting");
        return Ok(vec![path.to_path_buf()]);
    }

    let progress: Arc<dyn ProgressSink> = progress.unwrap_or_else(|| Arc::new(NullProgress));
    progress.update("Splitting audio into parts...");

    let probe = FfmpegCommand::probe(path).into_spec(ffmpeg_program);
    let output = executor
        .capture(&probe)
        .await
        .map_err(|e| MediaError::segment_caused_by("failed to get duration", e))?;
    let total_secs = parse_duration(&output.combined())
        .ok_or_else(|| MediaError::segment_failed("couldn't parse duration"))?;

    let spans = plan_segments(size, max_bytes, total_secs);
    info!(
        size,
        max_bytes,
        parts = spans.len(),
        total_secs,
        "Segmenting audio"
    );

    let mut created: Vec<PathBuf> = Vec::with_capacity(spans.len());
    for span in &spans {
        let target = segment_path(path, span.index);
        let spec = FfmpegCommand::new(path, &target)
            .seek(span.start)
            .duration(span.duration)
            .stream_copy()
            .into_spec(ffmpeg_program);

        if let Err(e) = executor.run(&spec, Arc::clone(&progress)).await {
            created.push(target);
            remove_quietly(&created).await;
            return Err(MediaError::segment_caused_by(
                format!("failed to create segment {}", span.index + 1),
                e,
            ));
        }
        created.push(target);
    }

    Ok(created)
}
