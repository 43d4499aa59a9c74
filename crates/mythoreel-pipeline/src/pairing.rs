//! Audio/image segment pairing.
//!
//! Reconciles N narration clips against M illustrations into an
//! ordered sequence of `SegmentSpec`s covering the full narration
//! with no gaps or double-counted time:
//!
//! - N = M: one-to-one in index order.
//! - N > M: each image hosts `N/M` (or one more, for the first `N%M`
//!   images) consecutive whole audio clips; no audio is split.
//! - M > N: each audio clip is divided evenly across `M/N` (or one
//!   more, for the first `M%N` clips) consecutive images; the slices
//!   tile the clip exactly.
//!
//! The result always has `max(N, M)` specs and preserves narration
//! order. Pairing is pure and deterministic.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use mythoreel_models::{AudioClip, ImageClip, SegmentSpec};

use crate::error::{PipelineError, PipelineResult};

/// Compute the segment pairing for the given clips.
///
/// Inputs must be non-empty and ordered by narration index; the
/// inputs are not mutated.
pub fn pair_segments(
    audio: &[AudioClip],
    images: &[ImageClip],
) -> PipelineResult<Vec<SegmentSpec>> {
    if audio.is_empty() {
        return Err(PipelineError::invalid_input("no audio clips to pair"));
    }
    if images.is_empty() {
        return Err(PipelineError::invalid_input("no image clips to pair"));
    }
    for clip in audio {
        if clip.duration <= 0.0 {
            return Err(PipelineError::invalid_input(format!(
                "audio clip {} has non-positive duration {:.3}",
                clip.index, clip.duration
            )));
        }
    }

    let n = audio.len();
    let m = images.len();
    info!(audio = n, images = m, "Pairing narration against illustrations");

    let specs = if n == m {
        pair_one_to_one(audio, images)
    } else if n > m {
        pair_audio_heavy(audio, images)
    } else {
        pair_image_heavy(audio, images)
    };

    debug_assert_eq!(specs.len(), n.max(m));
    Ok(specs)
}

/// N = M: full clip over its matching image.
fn pair_one_to_one(audio: &[AudioClip], images: &[ImageClip]) -> Vec<SegmentSpec> {
    debug!("Using 1:1 audio-image mapping");
    audio
        .iter()
        .zip(images)
        .enumerate()
        .map(|(idx, (clip, image))| SegmentSpec::full(idx, clip, image))
        .collect()
}

/// N > M: consecutive whole audio clips share an image.
fn pair_audio_heavy(audio: &[AudioClip], images: &[ImageClip]) -> Vec<SegmentSpec> {
    let n = audio.len();
    let m = images.len();
    let base = n / m;
    let extra = n % m;
    debug!(base, extra, "More audio than images, grouping clips per image");

    let mut specs = Vec::with_capacity(n);
    let mut audio_idx = 0;
    for (img_pos, image) in images.iter().enumerate() {
        let clips_for_image = base + usize::from(img_pos < extra);
        for _ in 0..clips_for_image {
            specs.push(SegmentSpec::full(specs.len(), &audio[audio_idx], image));
            audio_idx += 1;
        }
    }
    debug_assert_eq!(audio_idx, n);
    specs
}

/// M > N: each audio clip is split evenly over consecutive images.
fn pair_image_heavy(audio: &[AudioClip], images: &[ImageClip]) -> Vec<SegmentSpec> {
    let n = audio.len();
    let m = images.len();
    let base = m / n;
    let extra = m % n;
    debug!(base, extra, "More images than audio, splitting clips across images");

    let mut specs = Vec::with_capacity(m);
    let mut image_idx = 0;
    for (aud_pos, clip) in audio.iter().enumerate() {
        let images_for_clip = base + usize::from(aud_pos < extra);
        let slice = clip.duration / images_for_clip as f64;
        for i in 0..images_for_clip {
            specs.push(SegmentSpec::slice(
                specs.len(),
                clip,
                &images[image_idx],
                i as f64 * slice,
                slice,
            ));
            image_idx += 1;
        }
    }
    debug_assert_eq!(image_idx, m);
    specs
}

fn audio_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^audio_(\d+)\.[A-Za-z0-9]+$").unwrap())
}

fn image_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^image_(\d+)\.[A-Za-z0-9]+$").unwrap())
}

/// Extract the numeric index from a media file name.
fn parse_index(path: &Path, re: &Regex) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    re.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Build ordered `AudioClip`s from paths, probing each duration.
///
/// File names must embed a numeric index (`audio_<n>.mp3`); the clips
/// are sorted by that index, not by input order. A non-matching name
/// is rejected.
pub async fn collect_audio_clips(paths: &[PathBuf]) -> PipelineResult<Vec<AudioClip>> {
    let mut clips = Vec::with_capacity(paths.len());

    for path in paths {
        let index = parse_index(path, audio_index_re()).ok_or_else(|| {
            PipelineError::invalid_input(format!(
                "audio file name has no numeric index: {}",
                path.display()
            ))
        })?;
        let duration = mythoreel_media::probe::duration(path).await?;
        if duration <= 0.0 {
            return Err(PipelineError::invalid_input(format!(
                "audio clip has non-positive duration: {}",
                path.display()
            )));
        }
        clips.push(AudioClip {
            index,
            path: path.clone(),
            duration,
        });
    }

    clips.sort_by_key(|c| c.index);
    Ok(clips)
}

/// Build ordered `ImageClip`s from paths.
///
/// Same index convention as `collect_audio_clips` (`image_<n>.png`).
pub fn collect_image_clips(paths: &[PathBuf]) -> PipelineResult<Vec<ImageClip>> {
    let mut clips = Vec::with_capacity(paths.len());

    for path in paths {
        let index = parse_index(path, image_index_re()).ok_or_else(|| {
            PipelineError::invalid_input(format!(
                "image file name has no numeric index: {}",
                path.display()
            ))
        })?;
        clips.push(ImageClip {
            index,
            path: path.clone(),
        });
    }

    clips.sort_by_key(|c| c.index);
    Ok(clips)
}
