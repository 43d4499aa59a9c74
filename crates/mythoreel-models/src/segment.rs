//! Clip and segment pairing types.
//!
//! `SegmentSpec` is the uniform pairing triple: it always carries a
//! `start_offset` (0 when the audio clip is used whole), so every
//! branch of the pairing algorithm produces the same shape.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An ordered narration unit. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    /// 1-based sequence index defining narration order.
    pub index: usize,
    /// Path to the audio file.
    pub path: PathBuf,
    /// Probed total duration in seconds.
    pub duration: f64,
}

/// An ordered illustration unit. Images have no intrinsic duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageClip {
    /// 1-based sequence index.
    pub index: usize,
    /// Path to the image file.
    pub path: PathBuf,
}

/// One audio-slice/image pairing, the unit of segment rendering.
///
/// A sequence of specs drawn from the same source audio clip tiles
/// that clip exactly: offsets are increasing multiples of `duration`
/// and the durations sum to the clip's total duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    /// Position in the final video, 0-based.
    pub index: usize,
    /// Source audio file.
    pub audio_path: PathBuf,
    /// Illustration shown for this segment.
    pub image_path: PathBuf,
    /// Where in the source audio this segment starts, in seconds.
    #[serde(default)]
    pub start_offset: f64,
    /// Segment length in seconds. Always > 0.
    pub duration: f64,
}

impl SegmentSpec {
    /// Spec consuming an audio clip whole over a single image.
    pub fn full(index: usize, audio: &AudioClip, image: &ImageClip) -> Self {
        Self {
            index,
            audio_path: audio.path.clone(),
            image_path: image.path.clone(),
            start_offset: 0.0,
            duration: audio.duration,
        }
    }

    /// Spec for one slice of an audio clip split across several images.
    pub fn slice(
        index: usize,
        audio: &AudioClip,
        image: &ImageClip,
        start_offset: f64,
        duration: f64,
    ) -> Self {
        Self {
            index,
            audio_path: audio.path.clone(),
            image_path: image.path.clone(),
            start_offset,
            duration,
        }
    }
}

/// A rendered per-segment video file with verified stream flags.
///
/// Temporary: consumed by concatenation and then deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSegment {
    /// Path to the segment file.
    pub path: PathBuf,
    /// Whether a video stream was found when probing the file.
    pub has_video: bool,
    /// Whether an audio stream was found when probing the file.
    pub has_audio: bool,
}

impl RenderedSegment {
    /// A segment is usable for concatenation only with both streams.
    pub fn is_valid(&self) -> bool {
        self.has_video && self.has_audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(index: usize, duration: f64) -> AudioClip {
        AudioClip {
            index,
            path: PathBuf::from(format!("audio_{index}.mp3")),
            duration,
        }
    }

    fn image(index: usize) -> ImageClip {
        ImageClip {
            index,
            path: PathBuf::from(format!("image_{index}.png")),
        }
    }

    #[test]
    fn test_full_spec_covers_whole_clip() {
        let spec = SegmentSpec::full(0, &audio(1, 4.5), &image(1));
        assert_eq!(spec.start_offset, 0.0);
        assert_eq!(spec.duration, 4.5);
    }

    #[test]
    fn test_spec_start_offset_defaults_to_zero() {
        let json = r#"{"index":0,"audio_path":"a.mp3","image_path":"i.png","duration":2.0}"#;
        let spec: SegmentSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.start_offset, 0.0);
    }

    #[test]
    fn test_segment_validity_requires_both_streams() {
        let mut seg = RenderedSegment {
            path: PathBuf::from("segment_0.mp4"),
            has_video: true,
            has_audio: true,
        };
        assert!(seg.is_valid());
        seg.has_video = false;
        assert!(!seg.is_valid());
    }
}
