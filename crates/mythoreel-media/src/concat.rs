//! Lossless segment concatenation and audio merging.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use mythoreel_models::RenderedSegment;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{self, MediaInfo};

/// A segment that passed stream validation, with its probed geometry.
#[derive(Debug, Clone)]
struct ValidSegment {
    path: PathBuf,
    width: u32,
    height: u32,
    video_codec: String,
}

/// Join rendered segments into one continuous video at `output`.
///
/// Every segment is probed first; a segment missing either stream is
/// logged and excluded rather than aborting the batch. If exactly one
/// valid segment remains it is byte-copied to `output` (no re-encode).
/// Multiple segments are joined by concat-demuxer stream copy, which
/// requires uniform codec and resolution across segments.
pub async fn concatenate(
    segments: &[RenderedSegment],
    output: impl AsRef<Path>,
) -> MediaResult<PathBuf> {
    let output = output.as_ref();

    // Re-probe rather than trusting the flags captured at render time
    let mut probed = Vec::with_capacity(segments.len());
    for (idx, segment) in segments.iter().enumerate() {
        let info = probe::probe(&segment.path).await?;
        let segment = RenderedSegment {
            path: segment.path.clone(),
            has_video: info.has_video,
            has_audio: info.has_audio,
        };
        probed.push((idx, segment, info));
    }

    let valid = validate_segments(&probed)?;

    if valid.len() == 1 {
        // Single-segment fast path: plain copy, no re-encode
        let only = &valid[0];
        info!(
            source = %only.path.display(),
            output = %output.display(),
            "Single valid segment, copying directly"
        );
        tokio::fs::copy(&only.path, output).await?;
        return Ok(output.to_path_buf());
    }

    ensure_uniform(&valid)?;

    let list_file = write_concat_list(valid.iter().map(|s| s.path.as_path()))?;

    let cmd = FfmpegCommand::new(output)
        .input(list_file.path())
        .input_args(["-f", "concat", "-safe", "0"])
        .output_args(["-c", "copy"]);

    FfmpegRunner::new().run(&cmd).await?;

    info!(
        segments = valid.len(),
        output = %output.display(),
        "Segments concatenated"
    );
    Ok(output.to_path_buf())
}

/// Merge narration audio clips into a single MP3 track.
///
/// Used to build the full-length narration for forced alignment.
/// Returns the merged track's duration in seconds.
pub async fn merge_audio(
    audio_paths: &[PathBuf],
    output: impl AsRef<Path>,
) -> MediaResult<f64> {
    let output = output.as_ref();

    if audio_paths.is_empty() {
        return Err(MediaError::invalid_media("no audio files to merge"));
    }
    for path in audio_paths {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.clone()));
        }
    }

    let list_file = write_concat_list(audio_paths.iter().map(|p| p.as_path()))?;

    let cmd = FfmpegCommand::new(output)
        .input(list_file.path())
        .input_args(["-f", "concat", "-safe", "0"])
        .output_args(["-c:a", "libmp3lame", "-b:a", "192k"]);

    FfmpegRunner::new().run(&cmd).await?;

    probe::duration(output).await
}

/// Drop segments missing a stream; error if none survive.
fn validate_segments(
    probed: &[(usize, RenderedSegment, MediaInfo)],
) -> MediaResult<Vec<ValidSegment>> {
    let mut valid = Vec::with_capacity(probed.len());

    for (idx, segment, info) in probed {
        if segment.is_valid() {
            valid.push(ValidSegment {
                path: segment.path.clone(),
                width: info.width,
                height: info.height,
                video_codec: info.video_codec.clone(),
            });
        } else {
            warn!(
                segment = idx,
                path = %segment.path.display(),
                has_video = segment.has_video,
                has_audio = segment.has_audio,
                "Segment missing a stream, excluding from concatenation"
            );
        }
    }

    if valid.is_empty() {
        return Err(MediaError::NoValidSegments);
    }
    Ok(valid)
}

/// Stream copy requires matching codec and resolution across segments.
fn ensure_uniform(segments: &[ValidSegment]) -> MediaResult<()> {
    let first = &segments[0];
    for segment in &segments[1..] {
        if segment.width != first.width
            || segment.height != first.height
            || segment.video_codec != first.video_codec
        {
            return Err(MediaError::IncompatibleSegments(format!(
                "{} is {}x{} {}, expected {}x{} {}",
                segment.path.display(),
                segment.width,
                segment.height,
                segment.video_codec,
                first.width,
                first.height,
                first.video_codec,
            )));
        }
    }
    Ok(())
}

/// Write a concat-demuxer list file referencing `paths`.
fn write_concat_list<'a>(
    paths: impl Iterator<Item = &'a Path>,
) -> MediaResult<tempfile::NamedTempFile> {
    let mut list_file = tempfile::Builder::new()
        .prefix("concat_")
        .suffix(".txt")
        .tempfile()?;

    for path in paths {
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        // Concat demuxer quoting: single quotes, embedded quotes escaped
        let escaped = absolute.to_string_lossy().replace('\'', "'\\''");
        writeln!(list_file, "file '{escaped}'")?;
    }
    list_file.flush()?;
    Ok(list_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(has_video: bool, has_audio: bool, width: u32, height: u32, codec: &str) -> MediaInfo {
        MediaInfo {
            duration: 2.0,
            has_video,
            has_audio,
            width,
            height,
            video_codec: codec.to_string(),
        }
    }

    fn entry(
        idx: usize,
        has_video: bool,
        has_audio: bool,
    ) -> (usize, RenderedSegment, MediaInfo) {
        (
            idx,
            RenderedSegment {
                path: PathBuf::from(format!("segment_{idx}.mp4")),
                has_video,
                has_audio,
            },
            info(has_video, has_audio, 720, 1280, "h264"),
        )
    }

    #[test]
    fn test_validation_excludes_stream_less_segment() {
        // Middle segment is audio-only; batch continues with the rest
        let probed = vec![entry(0, true, true), entry(1, false, true), entry(2, true, true)];
        let valid = validate_segments(&probed).unwrap();
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].path, PathBuf::from("segment_0.mp4"));
        assert_eq!(valid[1].path, PathBuf::from("segment_2.mp4"));
    }

    #[test]
    fn test_validation_preserves_order() {
        let probed = vec![entry(0, true, true), entry(1, true, true), entry(2, true, true)];
        let valid = validate_segments(&probed).unwrap();
        let paths: Vec<_> = valid.iter().map(|s| s.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("segment_0.mp4"),
                PathBuf::from("segment_1.mp4"),
                PathBuf::from("segment_2.mp4")
            ]
        );
    }

    #[test]
    fn test_all_invalid_is_an_error() {
        let probed = vec![entry(0, false, true), entry(1, true, false)];
        let err = validate_segments(&probed).unwrap_err();
        assert!(matches!(err, MediaError::NoValidSegments));
    }

    #[test]
    fn test_uniformity_check_rejects_mismatched_resolution() {
        let valid = vec![
            ValidSegment {
                path: PathBuf::from("a.mp4"),
                width: 720,
                height: 1280,
                video_codec: "h264".to_string(),
            },
            ValidSegment {
                path: PathBuf::from("b.mp4"),
                width: 1080,
                height: 1920,
                video_codec: "h264".to_string(),
            },
        ];
        let err = ensure_uniform(&valid).unwrap_err();
        assert!(matches!(err, MediaError::IncompatibleSegments(_)));
    }

    #[test]
    fn test_uniformity_check_accepts_matching_segments() {
        let valid = vec![
            ValidSegment {
                path: PathBuf::from("a.mp4"),
                width: 720,
                height: 1280,
                video_codec: "h264".to_string(),
            },
            ValidSegment {
                path: PathBuf::from("b.mp4"),
                width: 720,
                height: 1280,
                video_codec: "h264".to_string(),
            },
        ];
        assert!(ensure_uniform(&valid).is_ok());
    }

    #[test]
    fn test_concat_list_quotes_paths() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("clip's.mp4");
        std::fs::write(&media, b"x").unwrap();

        let list = write_concat_list([media.as_path()].into_iter()).unwrap();
        let contents = std::fs::read_to_string(list.path()).unwrap();
        assert!(contents.starts_with("file '"));
        assert!(contents.contains("'\\''"));
    }

    #[tokio::test]
    async fn test_merge_audio_requires_inputs() {
        let err = merge_audio(&[], "/tmp/full.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }
}
