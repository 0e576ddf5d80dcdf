//! Video reference resolution.
//!
//! Turns user input (a YouTube URL in one of its common shapes, or a bare
//! video ID) into the canonical ID used as cache key and filename stem.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors that can occur while resolving a video reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// Nothing left after trimming
    #[error("empty video reference")]
    Empty,
    /// Recognized URL shape, but the ID segment is missing
    #[error("video ID not found in URL: {0}")]
    VideoIdNotFound(String),
    /// Candidate ID contains characters outside `[A-Za-z0-9_-]`
    #[error("video ID has invalid format: {0}")]
    InvalidVideoId(String),
    /// ID is shaped like a summary file stem and would clash with one
    #[error("video ID clashes with summary file naming: {0}")]
    ClashesWithSummary(String),
    /// Neither a known URL shape nor a bare ID
    #[error("invalid YouTube URL or video ID: {0}")]
    Unrecognized(String),
}

/// Result type for reference resolution.
pub type ReferenceResult<T> = Result<T, ReferenceError>;

/// Characters that mark the input as a URL rather than a bare ID.
const URL_DELIMITERS: [char; 5] = ['?', '&', '#', '/', ':'];

/// URL shapes in priority order. Each captures the ID segment, which ends
/// at the first query, fragment or path delimiter.
const URL_SHAPES: [&str; 5] = [
    // youtube.com/watch?v=ID, also with v= later in the query
    r"(?i)^(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/watch\?(?:[^#\s]*?&)?v=([^?&#/\s]*)",
    // youtu.be/ID
    r"(?i)^(?:https?://)?(?:www\.)?youtu\.be/([^?&#/\s]*)",
    // youtube.com/embed/ID
    r"(?i)^(?:https?://)?(?:www\.|m\.)?youtube(?:-nocookie)?\.com/embed/([^?&#/\s]*)",
    // youtube.com/shorts/ID
    r"(?i)^(?:https?://)?(?:www\.|m\.)?youtube\.com/shorts/([^?&#/\s]*)",
    // youtube.com/v/ID
    r"(?i)^(?:https?://)?(?:www\.|m\.)?youtube\.com/v/([^?&#/\s]*)",
];

fn url_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        URL_SHAPES
            .iter()
            .map(|shape| Regex::new(shape).expect("URL shape pattern is valid"))
            .collect()
    })
}

/// Resolve a URL or bare ID to its canonical video ID.
///
/// Supported shapes:
/// - https://youtube.com/watch?v=VIDEO_ID
/// - https://youtu.be/VIDEO_ID
/// - https://youtube.com/embed/VIDEO_ID
/// - https://youtube.com/shorts/VIDEO_ID
/// - https://youtube.com/v/VIDEO_ID
/// - VIDEO_ID
///
/// The same input always resolves to the same ID or fails the same way.
pub fn resolve_video_id(input: &str) -> ReferenceResult<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ReferenceError::Empty);
    }

    for pattern in url_patterns() {
        if let Some(captures) = pattern.captures(input) {
            let id = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            if id.is_empty() {
                return Err(ReferenceError::VideoIdNotFound(input.to_string()));
            }
            return validate_video_id(id);
        }
    }

    // Bare ID fallback
    if input
        .chars()
        .any(|c| URL_DELIMITERS.contains(&c) || c.is_whitespace())
    {
        if is_youtube_domain(input) {
            return Err(ReferenceError::VideoIdNotFound(input.to_string()));
        }
        return Err(ReferenceError::Unrecognized(input.to_string()));
    }

    validate_video_id(input)
}

/// Check if the input mentions a YouTube host.
fn is_youtube_domain(input: &str) -> bool {
    let input = input.to_ascii_lowercase();
    input.contains("youtube.com") || input.contains("youtu.be")
}

/// Check if string contains only URL-safe ID characters.
fn is_valid_video_id_chars(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_video_id(id: &str) -> ReferenceResult<String> {
    if !is_valid_video_id_chars(id) {
        return Err(ReferenceError::InvalidVideoId(id.to_string()));
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_shapes_resolve_to_same_id() {
        let inputs = [
            "https://www.youtube.com/watch?v=ABC123",
            "https://youtube.com/watch?v=ABC123&list=PLrAXtmRdnEQy4qtr",
            "https://youtube.com/watch?feature=share&v=ABC123",
            "https://youtu.be/ABC123",
            "https://youtu.be/ABC123?t=30",
            "https://youtube.com/embed/ABC123",
            "https://www.youtube-nocookie.com/embed/ABC123",
            "https://youtube.com/shorts/ABC123",
            "https://youtube.com/v/ABC123",
            "youtu.be/ABC123",
            "ABC123",
        ];

        for input in inputs {
            assert_eq!(resolve_video_id(input).as_deref(), Ok("ABC123"), "input: {input}");
        }
    }

    #[test]
    fn test_real_world_ids() {
        assert_eq!(
            resolve_video_id("https://youtu.be/PebaNrEFWIs").unwrap(),
            "PebaNrEFWIs"
        );
        assert_eq!(
            resolve_video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ#t=10").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(resolve_video_id("a_b-C").unwrap(), "a_b-C");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(
            resolve_video_id("  https://youtube.com/watch?v=dQw4w9WgXcQ  ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(resolve_video_id("\tABC123\n").unwrap(), "ABC123");
    }

    #[test]
    fn test_case_insensitive_host() {
        assert_eq!(
            resolve_video_id("https://YOUTUBE.COM/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_query_characters_outside_known_shapes_fail() {
        for input in ["ABC?123", "ABC&123", "abc?v=1", "id&other=2", "?", "&"] {
            assert!(resolve_video_id(input).is_err(), "input: {input}");
        }
        assert!(matches!(
            resolve_video_id("ABC&123"),
            Err(ReferenceError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_error_cases() {
        assert_eq!(resolve_video_id(""), Err(ReferenceError::Empty));
        assert_eq!(resolve_video_id("   "), Err(ReferenceError::Empty));

        assert!(matches!(
            resolve_video_id("https://example.com/video"),
            Err(ReferenceError::Unrecognized(_))
        ));
        assert!(matches!(
            resolve_video_id("https://youtu.be/"),
            Err(ReferenceError::VideoIdNotFound(_))
        ));
        assert!(matches!(
            resolve_video_id("https://youtube.com/watch?v="),
            Err(ReferenceError::VideoIdNotFound(_))
        ));
        assert!(matches!(
            resolve_video_id("https://youtube.com/watch"),
            Err(ReferenceError::VideoIdNotFound(_))
        ));
        assert!(matches!(
            resolve_video_id("abc123def!!"),
            Err(ReferenceError::InvalidVideoId(_))
        ));
        assert!(resolve_video_id("two words").is_err());
    }

    #[test]
    fn test_rejects_youtube_url_embedded_in_other_host() {
        assert!(resolve_video_id("https://evil.example/redirect?u=https://youtube.com/watch?v=ABC123").is_err());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let input = "https://youtube.com/watch?v=ABC123&t=5";
        assert_eq!(resolve_video_id(input), resolve_video_id(input));
        let bad = "nope?";
        assert_eq!(resolve_video_id(bad), resolve_video_id(bad));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ReferenceError::Empty.to_string(), "empty video reference");
        assert_eq!(
            ReferenceError::Unrecognized("x?y".into()).to_string(),
            "invalid YouTube URL or video ID: x?y"
        );
    }
}
