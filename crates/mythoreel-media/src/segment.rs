//! Per-segment rendering: one image plus one audio slice.

use std::path::Path;
use tracing::{debug, info};

use mythoreel_models::{EncodingConfig, RenderedSegment, SegmentSpec};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::fit_filter;
use crate::motion::{motion_filter, MotionSetting};
use crate::probe;

/// Renders a `SegmentSpec` into a fixed-length video segment.
///
/// The image is looped for exactly `spec.duration` seconds (static or
/// with a motion effect), scaled/padded to the target dimensions, and
/// muxed with the audio slice `[start_offset, start_offset + duration)`.
/// Every segment shares the same codec, pixel format and resolution so
/// concatenation can stream-copy.
#[derive(Debug, Clone)]
pub struct SegmentRenderer {
    encoding: EncodingConfig,
    motion: MotionSetting,
    timeout_secs: Option<u64>,
}

impl SegmentRenderer {
    /// Create a renderer with the given encoding settings.
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            motion: MotionSetting::Static,
            timeout_secs: None,
        }
    }

    /// Set the motion effect policy.
    pub fn with_motion(mut self, motion: MotionSetting) -> Self {
        self.motion = motion;
        self
    }

    /// Abort a render that runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Render one segment, overwriting `output` if present.
    ///
    /// Failures are not retried; encoding is deterministic given the
    /// same inputs, so a failure here aborts the whole build.
    pub async fn render(
        &self,
        spec: &SegmentSpec,
        output: impl AsRef<Path>,
    ) -> MediaResult<RenderedSegment> {
        let output = output.as_ref();

        if spec.duration <= 0.0 {
            return Err(MediaError::invalid_media(format!(
                "segment {} has non-positive duration {:.3}",
                spec.index, spec.duration
            )));
        }
        if !spec.image_path.exists() {
            return Err(MediaError::FileNotFound(spec.image_path.clone()));
        }
        if !spec.audio_path.exists() {
            return Err(MediaError::FileNotFound(spec.audio_path.clone()));
        }

        debug!(
            segment = spec.index,
            image = %spec.image_path.display(),
            audio = %spec.audio_path.display(),
            start_offset = spec.start_offset,
            duration = spec.duration,
            "Rendering segment"
        );

        let mut cmd = FfmpegCommand::new(output)
            .input(&spec.image_path)
            .loop_input()
            .framerate(self.encoding.framerate)
            .duration(spec.duration)
            .input(&spec.audio_path);

        if spec.start_offset > 0.0 {
            cmd = cmd.seek(spec.start_offset);
        }
        cmd = cmd.duration(spec.duration);

        let filter = match self.motion.pick() {
            Some(effect) => motion_filter(
                effect,
                spec.duration,
                self.encoding.target_width,
                self.encoding.target_height,
            ),
            None => fit_filter(self.encoding.target_width, self.encoding.target_height),
        };
        cmd = cmd
            .video_filter(filter)
            .output_args(self.encoding.to_ffmpeg_args())
            .shortest();

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        runner.run(&cmd).await.map_err(|e| match e {
            MediaError::FfmpegFailed {
                message,
                stderr,
                exit_code,
            } => MediaError::FfmpegFailed {
                message: format!("segment {}: {}", spec.index, message),
                stderr,
                exit_code,
            },
            other => other,
        })?;

        // A zero-byte output means the encoder died without reporting
        let size = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(MediaError::ffmpeg_failed(
                format!("segment {} produced an empty file", spec.index),
                None,
                None,
            ));
        }

        let info = probe::probe(output).await?;
        info!(
            segment = spec.index,
            path = %output.display(),
            duration = info.duration,
            "Segment rendered"
        );

        Ok(RenderedSegment {
            path: output.to_path_buf(),
            has_video: info.has_video,
            has_audio: info.has_audio,
        })
    }
}
