//! Collaborator seams for the external AI services.
//!
//! The pipeline never talks to a vendor directly: each service is an
//! injected trait object with a narrow contract, so the orchestrator
//! runs headlessly in tests with fakes and against real providers in
//! production.

use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

use mythoreel_models::{ForcedAlignment, ScriptsOutput, StoryOutline};

use crate::error::PipelineResult;
use crate::retry::{retry_async, RetryPolicy};

/// What to generate a story about.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    /// Theme or topic, e.g. a myth or character name.
    pub topic: String,
    /// Optional free-form guidance for the generator.
    pub description: String,
    /// Target video length in seconds.
    pub duration_secs: u32,
    /// Narration language.
    pub lang: String,
}

/// Produces the story outline, narration scripts and image prompts.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn outline(&self, request: &StoryRequest) -> PipelineResult<StoryOutline>;

    async fn scripts(
        &self,
        outline: &StoryOutline,
        request: &StoryRequest,
    ) -> PipelineResult<ScriptsOutput>;

    async fn image_prompts(
        &self,
        outline: &StoryOutline,
        scripts: &ScriptsOutput,
    ) -> PipelineResult<Vec<String>>;
}

/// Renders one illustration per prompt.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &str;

    async fn render(&self, prompt: &str) -> PipelineResult<Vec<u8>>;
}

/// Synthesizes narration audio for one script paragraph.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang: &str) -> PipelineResult<Vec<u8>>;
}

/// Recovers word-level timestamps from narration audio and its script.
#[async_trait]
pub trait ForcedAligner: Send + Sync {
    async fn align(
        &self,
        audio_path: &Path,
        scripts: &ScriptsOutput,
    ) -> PipelineResult<ForcedAlignment>;
}

/// Accepts or rejects generated text before assets are produced.
///
/// Replaces the interactive approve/regenerate loop so the pipeline is
/// driver-agnostic: a CLI can prompt, CI auto-approves.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn approve_outline(&self, outline: &StoryOutline) -> bool;
    async fn approve_scripts(&self, scripts: &ScriptsOutput) -> bool;
}

/// Gate that accepts everything; the headless default.
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn approve_outline(&self, _outline: &StoryOutline) -> bool {
        true
    }

    async fn approve_scripts(&self, _scripts: &ScriptsOutput) -> bool {
        true
    }
}

/// Render an image, retrying the primary provider per `policy` and
/// then falling back to a secondary provider if configured.
pub async fn render_with_fallback(
    primary: &dyn ImageRenderer,
    fallback: Option<&dyn ImageRenderer>,
    policy: &RetryPolicy,
    prompt: &str,
) -> PipelineResult<Vec<u8>> {
    match retry_async(policy, primary.name(), || primary.render(prompt)).await {
        Ok(bytes) => Ok(bytes),
        Err(primary_err) => match fallback {
            Some(secondary) => {
                warn!(
                    primary = primary.name(),
                    fallback = secondary.name(),
                    error = %primary_err,
                    "Primary image provider exhausted, trying fallback"
                );
                retry_async(policy, secondary.name(), || secondary.render(prompt)).await
            }
            None => Err(primary_err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyRenderer {
        name: &'static str,
        calls: AtomicU32,
        fail_first: u32,
    }

    impl FlakyRenderer {
        fn new(name: &'static str, fail_first: u32) -> Self {
            Self {
                name,
                calls: AtomicU32::new(0),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl ImageRenderer for FlakyRenderer {
        fn name(&self) -> &str {
            self.name
        }

        async fn render(&self, _prompt: &str) -> PipelineResult<Vec<u8>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(PipelineError::generation("rate limited"))
            } else {
                Ok(self.name.as_bytes().to_vec())
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(2).with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_recovers_within_budget() {
        let primary = FlakyRenderer::new("primary", 1);
        let bytes = render_with_fallback(&primary, None, &fast_policy(), "a temple")
            .await
            .unwrap();
        assert_eq!(bytes, b"primary");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_used_after_primary_exhausted() {
        let primary = FlakyRenderer::new("primary", u32::MAX);
        let fallback = FlakyRenderer::new("fallback", 0);
        let bytes = render_with_fallback(&primary, Some(&fallback), &fast_policy(), "a temple")
            .await
            .unwrap();
        assert_eq!(bytes, b"fallback");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fallback_propagates_error() {
        let primary = FlakyRenderer::new("primary", u32::MAX);
        let err = render_with_fallback(&primary, None, &fast_policy(), "a temple")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }
}
