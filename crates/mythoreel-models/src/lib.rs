//! Shared data models for the mythoreel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Story outlines and chapter scripts
//! - The per-build manifest (resumable asset inventory)
//! - Audio/image clips and segment pairing specs
//! - Word-level subtitle timings
//! - Encoding configuration

pub mod encoding;
pub mod manifest;
pub mod segment;
pub mod story;
pub mod timing;

// Re-export common types
pub use encoding::EncodingConfig;
pub use manifest::{BuildManifest, ManifestError};
pub use segment::{AudioClip, ImageClip, RenderedSegment, SegmentSpec};
pub use story::{Chapter, ScriptsOutput, StoryOutline};
pub use timing::{ForcedAlignment, WordTiming};
