//! Video assembly orchestration.
//!
//! Sequences pairing, parallel segment rendering, concatenation and
//! the optional subtitle stage. This is the only component that knows
//! about the temp-file lifecycle: per-segment files live under
//! `<build>/segments/` and are removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use mythoreel_media::{
    burn_subtitles, concatenate, fs_utils, merge_audio, CaptionStyle, MotionSetting,
    SegmentRenderer,
};
use mythoreel_models::{
    BuildManifest, EncodingConfig, ForcedAlignment, RenderedSegment, ScriptsOutput, SegmentSpec,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::generate::ForcedAligner;
use crate::pairing::{collect_audio_clips, collect_image_clips, pair_segments};

/// Cached forced-alignment file inside a build directory.
pub const ALIGNMENT_FILE: &str = "forced_alignment.json";

/// Per-assembly options.
#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    /// Burn captions into the final video.
    pub subtitles: bool,
    /// Motion effect policy for still images.
    pub motion: MotionSetting,
    /// Final video path; defaults into the build directory.
    pub output: Option<PathBuf>,
}

/// Orchestrates one build directory into a finished video.
pub struct VideoAssemblyPipeline {
    config: PipelineConfig,
    encoding: EncodingConfig,
    caption_style: CaptionStyle,
    aligner: Option<Arc<dyn ForcedAligner>>,
}

impl VideoAssemblyPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let mut encoding =
            EncodingConfig::default().with_target(config.target_width, config.target_height);
        encoding.framerate = config.framerate;
        Self {
            config,
            encoding,
            caption_style: CaptionStyle::default(),
            aligner: None,
        }
    }

    /// Install a forced aligner for the subtitle stage. Without one,
    /// subtitles require a cached `forced_alignment.json`.
    pub fn with_aligner(mut self, aligner: Arc<dyn ForcedAligner>) -> Self {
        self.aligner = Some(aligner);
        self
    }

    /// Override caption grouping parameters.
    pub fn with_caption_style(mut self, style: CaptionStyle) -> Self {
        self.caption_style = style;
        self
    }

    /// Assemble the build at `build_dir` into a final video.
    ///
    /// The output path is only created by a successful terminal step;
    /// a failed build leaves no partial final video behind.
    pub async fn assemble(
        &self,
        build_dir: &Path,
        options: &AssemblyOptions,
    ) -> PipelineResult<PathBuf> {
        let manifest = BuildManifest::load(build_dir)?;
        info!(
            build = %build_dir.display(),
            title = %manifest.story.title,
            "Assembling video"
        );

        let audio_paths = manifest.resolved_audio_paths(build_dir);
        let image_paths = manifest.resolved_image_paths(build_dir);

        let audio_clips = collect_audio_clips(&audio_paths).await?;
        let image_clips = collect_image_clips(&image_paths)?;
        let specs = pair_segments(&audio_clips, &image_clips)?;
        info!(segments = specs.len(), "Pairing complete");

        let segments_dir = build_dir.join("segments");
        fs_utils::ensure_dir(&segments_dir).await?;

        let result = self
            .run_stages(build_dir, &segments_dir, &specs, &manifest, options)
            .await;

        // Segment files are scoped to this build; drop them whether or
        // not the stages succeeded.
        if !self.config.keep_segments {
            if let Err(e) = tokio::fs::remove_dir_all(&segments_dir).await {
                warn!(dir = %segments_dir.display(), error = %e, "Failed to clean up segments");
            }
        }

        result
    }

    async fn run_stages(
        &self,
        build_dir: &Path,
        segments_dir: &Path,
        specs: &[SegmentSpec],
        manifest: &BuildManifest,
        options: &AssemblyOptions,
    ) -> PipelineResult<PathBuf> {
        let segments = self.render_all(segments_dir, specs, options.motion).await?;

        let merged = build_dir.join("merged.mp4");
        concatenate(&segments, &merged).await?;

        let final_path = final_output_path(build_dir, options);

        if options.subtitles {
            let alignment = self
                .load_or_align(build_dir, manifest)
                .await?;
            burn_subtitles(
                &merged,
                &alignment,
                &final_path,
                &self.encoding,
                &self.caption_style,
                self.config.keep_subtitle_file,
            )
            .await?;
            info!(output = %final_path.display(), "Final video with subtitles created");
            Ok(final_path)
        } else {
            if final_path != merged {
                tokio::fs::copy(&merged, &final_path).await?;
            }
            info!(output = %final_path.display(), "Final video created");
            Ok(final_path)
        }
    }

    /// Render every spec on a bounded worker pool.
    ///
    /// Results are placed by spec index, never completion order, so
    /// the final video matches narration order regardless of which
    /// worker finishes first. The first failure aborts the remaining
    /// renders; no shortened video is ever produced.
    async fn render_all(
        &self,
        segments_dir: &Path,
        specs: &[SegmentSpec],
        motion: MotionSetting,
    ) -> PipelineResult<Vec<RenderedSegment>> {
        let renderer = SegmentRenderer::new(self.encoding.clone())
            .with_motion(motion)
            .with_timeout(self.config.render_timeout.as_secs());
        let semaphore = Arc::new(Semaphore::new(self.config.max_render_parallel.max(1)));

        let mut join_set = JoinSet::new();
        for spec in specs {
            let renderer = renderer.clone();
            let spec = spec.clone();
            let semaphore = semaphore.clone();
            let output = segment_path(segments_dir, spec.index);

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| PipelineError::internal("render semaphore closed"))?;
                let segment = renderer.render(&spec, &output).await?;
                Ok::<(usize, RenderedSegment), PipelineError>((spec.index, segment))
            });
        }

        let mut rendered: Vec<Option<RenderedSegment>> = vec![None; specs.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok((index, segment))) => rendered[index] = Some(segment),
                Ok(Err(e)) => {
                    join_set.abort_all();
                    return Err(e);
                }
                Err(join_err) => {
                    join_set.abort_all();
                    return Err(PipelineError::internal(format!(
                        "segment render task failed: {join_err}"
                    )));
                }
            }
        }

        rendered
            .into_iter()
            .enumerate()
            .map(|(i, seg)| {
                seg.ok_or_else(|| {
                    PipelineError::internal(format!("segment {i} was never rendered"))
                })
            })
            .collect()
    }

    /// Load the cached alignment, or compute and cache it.
    async fn load_or_align(
        &self,
        build_dir: &Path,
        manifest: &BuildManifest,
    ) -> PipelineResult<ForcedAlignment> {
        let alignment_path = build_dir.join(ALIGNMENT_FILE);
        if alignment_path.exists() {
            info!(path = %alignment_path.display(), "Reusing cached forced alignment");
            let json = tokio::fs::read_to_string(&alignment_path).await?;
            return Ok(serde_json::from_str(&json)?);
        }

        let aligner = self.aligner.as_ref().ok_or_else(|| {
            PipelineError::alignment(
                "no forced aligner configured and no cached alignment found",
            )
        })?;

        let full_audio = build_dir.join("full_audio.mp3");
        merge_audio(&manifest.resolved_audio_paths(build_dir), &full_audio).await?;

        let alignment = align_full_audio(aligner.as_ref(), &full_audio, &manifest.scripts).await?;

        let json = serde_json::to_string_pretty(&alignment)?;
        tokio::fs::write(&alignment_path, json).await?;
        info!(path = %alignment_path.display(), "Forced alignment cached");

        Ok(alignment)
    }
}

async fn align_full_audio(
    aligner: &dyn ForcedAligner,
    full_audio: &Path,
    scripts: &ScriptsOutput,
) -> PipelineResult<ForcedAlignment> {
    let alignment = aligner.align(full_audio, scripts).await?;
    if alignment.words.is_empty() {
        return Err(PipelineError::alignment("aligner returned no words"));
    }
    Ok(alignment)
}

/// Per-segment output path inside the segments directory.
fn segment_path(segments_dir: &Path, index: usize) -> PathBuf {
    segments_dir.join(format!("segment_{index}.mp4"))
}

/// Where the finished video lands: the explicit override when given,
/// otherwise `final.mp4` in the build directory (with or without
/// subtitles; `merged.mp4` stays behind as the intermediate).
fn final_output_path(build_dir: &Path, options: &AssemblyOptions) -> PathBuf {
    options
        .output
        .clone()
        .unwrap_or_else(|| build_dir.join("final.mp4"))
}
