//! ASS subtitle generation and burn-in.
//!
//! Captions are grouped from word-level forced-alignment timings and
//! rendered into the video pixels (not muxed as a selectable track).

use std::path::{Path, PathBuf};
use tracing::info;

use mythoreel_models::{EncodingConfig, ForcedAlignment, WordTiming};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Caption grouping parameters.
#[derive(Debug, Clone)]
pub struct CaptionStyle {
    /// Words per caption line.
    pub words_per_group: usize,
    /// Minimum on-screen time per caption, in seconds.
    pub min_duration: f64,
    /// Gap enforced between consecutive captions, in seconds.
    pub gap: f64,
    /// Font size in the ASS style.
    pub font_size: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            words_per_group: 3,
            min_duration: 0.5,
            gap: 0.05,
            font_size: 66,
        }
    }
}

/// One caption line with resolved timing.
#[derive(Debug, Clone, PartialEq)]
struct Caption {
    start: f64,
    end: f64,
    text: String,
}

/// Burn captions into `video`, writing the result to `output`.
///
/// The intermediate `.ass` file is written next to the video and
/// removed afterwards unless `keep_ass` is set.
pub async fn burn_subtitles(
    video: impl AsRef<Path>,
    alignment: &ForcedAlignment,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
    style: &CaptionStyle,
    keep_ass: bool,
) -> MediaResult<PathBuf> {
    let video = video.as_ref();
    let output = output.as_ref();

    let ass_path = video
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("subtitles.ass");
    let ass_body = build_ass(
        alignment,
        encoding.target_width,
        encoding.target_height,
        style,
    );
    tokio::fs::write(&ass_path, ass_body).await?;
    info!(path = %ass_path.display(), "Generated subtitle track");

    // The ass filter takes a plain path; escape filtergraph specials
    let ass_arg = ass_path
        .to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'");

    let cmd = FfmpegCommand::new(output)
        .input(video)
        .video_filter(format!("ass={ass_arg}"))
        .output_args(encoding.to_ffmpeg_args());

    let result = FfmpegRunner::new().run(&cmd).await;

    if !keep_ass {
        let _ = tokio::fs::remove_file(&ass_path).await;
    }
    result?;

    info!(output = %output.display(), "Subtitles burned in");
    Ok(output.to_path_buf())
}

/// Build the full ASS document for an alignment.
pub fn build_ass(
    alignment: &ForcedAlignment,
    width: u32,
    height: u32,
    style: &CaptionStyle,
) -> String {
    let captions = group_captions(alignment, style);

    let mut lines = vec![ass_header(width, height, style.font_size)];
    for caption in &captions {
        lines.push(format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            seconds_to_ass_time(caption.start),
            seconds_to_ass_time(caption.end),
            caption.text
        ));
    }
    lines.join("\n")
}

fn ass_header(width: u32, height: u32, font_size: u32) -> String {
    format!(
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, OutlineColour, BackColour, Bold, \
         Italic, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,Arial,{font_size},&H00E6E6E6,&H64000000,&H00000000,0,0,1,5,1,2,10,10,327,1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    )
}

/// Group words into caption lines with timing rules applied:
/// minimum duration, and no caption running past the next one's start.
fn group_captions(alignment: &ForcedAlignment, style: &CaptionStyle) -> Vec<Caption> {
    let words: Vec<&WordTiming> = alignment.spoken_words().collect();
    let mut captions: Vec<Caption> = Vec::new();

    for group in words.chunks(style.words_per_group.max(1)) {
        let start = group[0].start;
        let mut end = group[group.len() - 1].end;

        if end - start < style.min_duration {
            end = start + style.min_duration;
        }

        if let Some(prev) = captions.last_mut() {
            if prev.end > start - style.gap {
                prev.end = (start - style.gap).max(prev.start);
            }
        }

        let text = group
            .iter()
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        captions.push(Caption { start, end, text });
    }

    captions
}

/// Format seconds as ASS time, `H:MM:SS.cs`.
fn seconds_to_ass_time(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h}:{m:02}:{s:02}.{cs:02}")
}
