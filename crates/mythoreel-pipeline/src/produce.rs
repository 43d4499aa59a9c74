//! Asset production: story text, illustrations and narration audio.
//!
//! Output is a build directory holding `raw/image_<n>.png`,
//! `raw/audio_<n>.mp3` and a `manifest.json`, from which assembly can
//! run (and re-run) without touching the AI services again.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

use mythoreel_media::fs_utils;
use mythoreel_models::{BuildManifest, ScriptsOutput, StoryOutline};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::generate::{
    render_with_fallback, ApprovalGate, ImageRenderer, SpeechSynthesizer, StoryGenerator,
    StoryRequest,
};
use crate::retry::RetryPolicy;

/// The injected external services.
pub struct Collaborators {
    pub story: Arc<dyn StoryGenerator>,
    pub images: Arc<dyn ImageRenderer>,
    pub image_fallback: Option<Arc<dyn ImageRenderer>>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub approval: Arc<dyn ApprovalGate>,
}

/// Drives the generation stage of a build.
pub struct AssetProducer {
    collaborators: Collaborators,
    config: PipelineConfig,
    retry: RetryPolicy,
}

impl AssetProducer {
    pub fn new(collaborators: Collaborators, config: PipelineConfig) -> Self {
        Self {
            collaborators,
            config,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy applied to image rendering.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Generate all assets for `request` into `build_dir`.
    pub async fn produce(
        &self,
        request: &StoryRequest,
        build_dir: &Path,
    ) -> PipelineResult<BuildManifest> {
        fs_utils::ensure_dir(build_dir).await?;
        let raw_dir = build_dir.join("raw");
        fs_utils::ensure_dir(&raw_dir).await?;

        let outline = self.approved_outline(request).await?;
        info!(title = %outline.title, chapters = outline.outline.len(), "Story outline approved");

        let scripts = self.approved_scripts(&outline, request).await?;
        info!(paragraphs = scripts.scripts.len(), "Scripts approved");

        let image_prompts = self
            .collaborators
            .story
            .image_prompts(&outline, &scripts)
            .await?;
        if image_prompts.is_empty() {
            return Err(PipelineError::generation("no image prompts generated"));
        }

        let image_paths = self.render_images(&image_prompts, build_dir).await?;
        let audio_paths = self.synthesize_audio(&scripts, request, build_dir).await?;

        let manifest = BuildManifest {
            story: outline,
            scripts,
            image_prompts,
            image_paths,
            audio_paths,
        };
        let manifest_path = manifest.save(build_dir)?;
        info!(path = %manifest_path.display(), "Build manifest saved");

        Ok(manifest)
    }

    /// Generate an outline, regenerating until the gate approves or
    /// the regeneration budget runs out.
    async fn approved_outline(&self, request: &StoryRequest) -> PipelineResult<StoryOutline> {
        for _ in 0..self.config.max_regenerations.max(1) {
            let outline = self.collaborators.story.outline(request).await?;
            if self.collaborators.approval.approve_outline(&outline).await {
                return Ok(outline);
            }
            info!("Outline rejected, regenerating");
        }
        Err(PipelineError::generation(format!(
            "outline rejected {} times",
            self.config.max_regenerations
        )))
    }

    async fn approved_scripts(
        &self,
        outline: &StoryOutline,
        request: &StoryRequest,
    ) -> PipelineResult<ScriptsOutput> {
        for _ in 0..self.config.max_regenerations.max(1) {
            let scripts = self.collaborators.story.scripts(outline, request).await?;
            if scripts.scripts.is_empty() {
                return Err(PipelineError::generation("generator returned no scripts"));
            }
            if self.collaborators.approval.approve_scripts(&scripts).await {
                return Ok(scripts);
            }
            info!("Scripts rejected, regenerating");
        }
        Err(PipelineError::generation(format!(
            "scripts rejected {} times",
            self.config.max_regenerations
        )))
    }

    /// Render all illustrations with bounded concurrency, preserving
    /// prompt order regardless of completion order.
    async fn render_images(
        &self,
        prompts: &[String],
        build_dir: &Path,
    ) -> PipelineResult<Vec<PathBuf>> {
        let semaphore = Semaphore::new(self.config.max_generate_parallel.max(1));

        let futures = prompts.iter().enumerate().map(|(i, prompt)| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.map_err(|_| {
                    PipelineError::generation("image render semaphore closed")
                })?;
                let bytes = render_with_fallback(
                    self.collaborators.images.as_ref(),
                    self.collaborators.image_fallback.as_deref(),
                    &self.retry,
                    prompt,
                )
                .await?;
                Ok::<(usize, Vec<u8>), PipelineError>((i, bytes))
            }
        });

        let mut paths = Vec::with_capacity(prompts.len());
        for result in join_all(futures).await {
            let (i, bytes) = result?;
            let rel = PathBuf::from(format!("raw/image_{}.png", i + 1));
            fs_utils::write_bytes(build_dir.join(&rel), &bytes).await?;
            paths.push(rel);
        }
        info!(count = paths.len(), "Illustrations rendered");
        Ok(paths)
    }

    /// Synthesize one narration clip per script paragraph.
    async fn synthesize_audio(
        &self,
        scripts: &ScriptsOutput,
        request: &StoryRequest,
        build_dir: &Path,
    ) -> PipelineResult<Vec<PathBuf>> {
        let semaphore = Semaphore::new(self.config.max_generate_parallel.max(1));

        let futures = scripts.scripts.iter().enumerate().map(|(i, paragraph)| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.map_err(|_| {
                    PipelineError::generation("speech synth semaphore closed")
                })?;
                let bytes = self
                    .collaborators
                    .speech
                    .synthesize(paragraph, &request.lang)
                    .await?;
                Ok::<(usize, Vec<u8>), PipelineError>((i, bytes))
            }
        });

        let mut paths = Vec::with_capacity(scripts.scripts.len());
        for result in join_all(futures).await {
            let (i, bytes) = result?;
            let rel = PathBuf::from(format!("raw/audio_{}.mp3", i + 1));
            fs_utils::write_bytes(build_dir.join(&rel), &bytes).await?;
            paths.push(rel);
        }
        info!(count = paths.len(), "Narration synthesized");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::AutoApprove;
    use async_trait::async_trait;
    use mythoreel_models::Chapter;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct FakeStory;

    #[async_trait]
    impl StoryGenerator for FakeStory {
        async fn outline(&self, request: &StoryRequest) -> PipelineResult<StoryOutline> {
            Ok(StoryOutline {
                title: request.topic.clone(),
                description: "desc".to_string(),
                story: "story".to_string(),
                outline: vec![Chapter {
                    title: "ch1".to_string(),
                    description: "d".to_string(),
                }],
            })
        }

        async fn scripts(
            &self,
            _outline: &StoryOutline,
            _request: &StoryRequest,
        ) -> PipelineResult<ScriptsOutput> {
            Ok(ScriptsOutput {
                scripts: vec!["para one".to_string(), "para two".to_string()],
            })
        }

        async fn image_prompts(
            &self,
            _outline: &StoryOutline,
            _scripts: &ScriptsOutput,
        ) -> PipelineResult<Vec<String>> {
            Ok(vec!["prompt a".to_string(), "prompt b".to_string(), "prompt c".to_string()])
        }
    }

    struct FakeImages;

    #[async_trait]
    impl ImageRenderer for FakeImages {
        fn name(&self) -> &str {
            "fake-images"
        }

        async fn render(&self, prompt: &str) -> PipelineResult<Vec<u8>> {
            Ok(prompt.as_bytes().to_vec())
        }
    }

    struct FakeSpeech;

    #[async_trait]
    impl SpeechSynthesizer for FakeSpeech {
        async fn synthesize(&self, text: &str, _lang: &str) -> PipelineResult<Vec<u8>> {
            Ok(text.as_bytes().to_vec())
        }
    }

    /// Gate rejecting the first `rejections` outlines.
    struct GrumpyGate {
        rejections: u32,
        seen: AtomicU32,
    }

    #[async_trait]
    impl ApprovalGate for GrumpyGate {
        async fn approve_outline(&self, _outline: &StoryOutline) -> bool {
            self.seen.fetch_add(1, Ordering::SeqCst) >= self.rejections
        }

        async fn approve_scripts(&self, _scripts: &ScriptsOutput) -> bool {
            true
        }
    }

    fn collaborators(approval: Arc<dyn ApprovalGate>) -> Collaborators {
        Collaborators {
            story: Arc::new(FakeStory),
            images: Arc::new(FakeImages),
            image_fallback: None,
            speech: Arc::new(FakeSpeech),
            approval,
        }
    }

    fn request() -> StoryRequest {
        StoryRequest {
            topic: "Abhimanyu's Chakravyuh".to_string(),
            description: String::new(),
            duration_secs: 60,
            lang: "english".to_string(),
        }
    }

    #[tokio::test]
    async fn test_produce_writes_assets_and_manifest() {
        let dir = TempDir::new().unwrap();
        let producer = AssetProducer::new(
            collaborators(Arc::new(AutoApprove)),
            PipelineConfig::default(),
        );

        let manifest = producer.produce(&request(), dir.path()).await.unwrap();

        assert_eq!(manifest.image_paths.len(), 3);
        assert_eq!(manifest.audio_paths.len(), 2);
        assert!(dir.path().join("raw/image_1.png").exists());
        assert!(dir.path().join("raw/audio_2.mp3").exists());

        // Asset content matches its source prompt/paragraph in order
        let img2 = std::fs::read(dir.path().join("raw/image_2.png")).unwrap();
        assert_eq!(img2, b"prompt b");

        let reloaded = BuildManifest::load(dir.path()).unwrap();
        assert_eq!(reloaded, manifest);
    }

    #[tokio::test]
    async fn test_rejected_outline_is_regenerated() {
        let dir = TempDir::new().unwrap();
        let gate = Arc::new(GrumpyGate {
            rejections: 1,
            seen: AtomicU32::new(0),
        });
        let producer = AssetProducer::new(collaborators(gate), PipelineConfig::default());

        assert!(producer.produce(&request(), dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_regeneration_budget_exhausted() {
        let dir = TempDir::new().unwrap();
        let gate = Arc::new(GrumpyGate {
            rejections: u32::MAX,
            seen: AtomicU32::new(0),
        });
        let producer = AssetProducer::new(collaborators(gate), PipelineConfig::default());

        let err = producer.produce(&request(), dir.path()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }
}
