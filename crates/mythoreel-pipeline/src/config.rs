//! Pipeline configuration.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum segment renders running in parallel
    pub max_render_parallel: usize,
    /// Maximum concurrent calls against the AI collaborators
    pub max_generate_parallel: usize,
    /// Per-segment render timeout
    pub render_timeout: Duration,
    /// Root directory for build working directories
    pub work_dir: String,
    /// Output width in pixels
    pub target_width: u32,
    /// Output height in pixels
    pub target_height: u32,
    /// Frame rate for image-to-video rendering
    pub framerate: u32,
    /// Keep the intermediate .ass subtitle file next to the video
    pub keep_subtitle_file: bool,
    /// Keep per-segment temp files after concatenation (debugging)
    pub keep_segments: bool,
    /// How many times a rejected outline/script may be regenerated
    pub max_regenerations: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_render_parallel: 4,
            max_generate_parallel: 2,
            render_timeout: Duration::from_secs(300),
            work_dir: "tmp/builds".to_string(),
            target_width: 720,
            target_height: 1280,
            framerate: 30,
            keep_subtitle_file: false,
            keep_segments: false,
            max_regenerations: 3,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_render_parallel: env_parse("MYTHOREEL_MAX_RENDER_PARALLEL", defaults.max_render_parallel),
            max_generate_parallel: env_parse(
                "MYTHOREEL_MAX_GENERATE_PARALLEL",
                defaults.max_generate_parallel,
            ),
            render_timeout: Duration::from_secs(env_parse(
                "MYTHOREEL_RENDER_TIMEOUT_SECS",
                defaults.render_timeout.as_secs(),
            )),
            work_dir: std::env::var("MYTHOREEL_WORK_DIR").unwrap_or(defaults.work_dir),
            target_width: env_parse("MYTHOREEL_TARGET_WIDTH", defaults.target_width),
            target_height: env_parse("MYTHOREEL_TARGET_HEIGHT", defaults.target_height),
            framerate: env_parse("MYTHOREEL_FRAMERATE", defaults.framerate),
            keep_subtitle_file: env_flag("MYTHOREEL_KEEP_SUBTITLE_FILE"),
            keep_segments: env_flag("MYTHOREEL_KEEP_SEGMENTS"),
            max_regenerations: env_parse("MYTHOREEL_MAX_REGENERATIONS", defaults.max_regenerations),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
