//! FFprobe media information.
//!
//! Used both to read audio-clip durations before pairing and to
//! validate rendered segments before concatenation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Whether the file has a video stream
    pub has_video: bool,
    /// Whether the file has an audio stream
    pub has_audio: bool,
    /// Width in pixels (0 for audio-only files)
    pub width: u32,
    /// Height in pixels (0 for audio-only files)
    pub height: u32,
    /// Video codec name (empty for audio-only files)
    pub video_codec: String,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a media file for duration and stream composition.
pub async fn probe(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe failed for {}", path.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    Ok(media_info_from_probe(parsed))
}

/// Get media duration in seconds.
pub async fn duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let info = probe(path).await?;
    Ok(info.duration)
}

fn media_info_from_probe(parsed: FfprobeOutput) -> MediaInfo {
    let video_stream = parsed.streams.iter().find(|s| s.codec_type == "video");
    let has_audio = parsed.streams.iter().any(|s| s.codec_type == "audio");

    let duration = parsed
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    MediaInfo {
        duration,
        has_video: video_stream.is_some(),
        has_audio,
        width: video_stream.and_then(|s| s.width).unwrap_or(0),
        height: video_stream.and_then(|s| s.height).unwrap_or(0),
        video_codec: video_stream
            .and_then(|s| s.codec_name.clone())
            .unwrap_or_default(),
    }
}
