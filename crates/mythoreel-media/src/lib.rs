#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the mythoreel assembly pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multi-input support
//! - Progress parsing from `-progress pipe:2`
//! - Duration and stream probing via FFprobe
//! - Segment rendering (image + audio slice, optional motion effect)
//! - Lossless segment concatenation and narration audio merging
//! - ASS subtitle generation and burn-in

pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod motion;
pub mod probe;
pub mod progress;
pub mod segment;
pub mod subtitle;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concatenate, merge_audio};
pub use error::{MediaError, MediaResult};
pub use filters::{fit_filter, FitLayout};
pub use motion::{motion_filter, random_effect, MotionEffect, MotionSetting};
pub use probe::{duration, probe, MediaInfo};
pub use progress::FfmpegProgress;
pub use segment::SegmentRenderer;
pub use subtitle::{build_ass, burn_subtitles, CaptionStyle};
