//! Pipeline orchestration for mythoreel.
//!
//! This crate ties the pieces together: generated-asset production
//! (story, images, narration), audio/image pairing, parallel segment
//! rendering, concatenation and subtitle burn-in. The AI services
//! themselves are behind the traits in [`generate`]; the pipeline only
//! depends on their contracts.

pub mod assembly;
pub mod config;
pub mod error;
pub mod generate;
pub mod pairing;
pub mod produce;
pub mod retry;

pub use assembly::{AssemblyOptions, VideoAssemblyPipeline};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use generate::{
    render_with_fallback, ApprovalGate, AutoApprove, ForcedAligner, ImageRenderer,
    SpeechSynthesizer, StoryGenerator, StoryRequest,
};
pub use pairing::{collect_audio_clips, collect_image_clips, pair_segments};
pub use produce::{AssetProducer, Collaborators};
pub use retry::RetryPolicy;
