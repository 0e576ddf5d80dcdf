//! Shared data models for the ytsum pipeline.
//!
//! This crate provides:
//! - Video reference resolution (URL or bare ID to a canonical [`VideoId`])
//! - Provider tags naming a (backend, prompt variant) pair
//! - The on-disk artifact layout shared by every pipeline stage

pub mod artifact;
pub mod provider_tag;
pub mod reference;
pub mod video;

// Re-export common types
pub use artifact::ArtifactLayout;
pub use provider_tag::ProviderTag;
pub use reference::{resolve_video_id, ReferenceError, ReferenceResult};
pub use video::{VideoId, VideoReference};
