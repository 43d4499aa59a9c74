//! Per-build manifest.
//!
//! Every build directory carries a `manifest.json` recording the
//! generated story, scripts, prompts and the relative paths of every
//! image/audio artifact. A build can be resumed from the assembly
//! stage by loading the manifest instead of re-invoking the AI
//! services.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::story::{ScriptsOutput, StoryOutline};

/// File name of the manifest inside a build directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors that can occur loading or saving a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found at {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Inventory of one build's generated assets.
///
/// Artifact paths are stored relative to the build directory so the
/// directory can be moved or archived as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Generated story outline.
    pub story: StoryOutline,
    /// Narration scripts, one per audio clip.
    pub scripts: ScriptsOutput,
    /// Image prompts in illustration order.
    pub image_prompts: Vec<String>,
    /// Relative paths of rendered illustrations, in order.
    pub image_paths: Vec<PathBuf>,
    /// Relative paths of narration audio clips, in order.
    pub audio_paths: Vec<PathBuf>,
}

impl BuildManifest {
    /// Save as `manifest.json` inside `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ManifestError> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Load `manifest.json` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        if !path.exists() {
            return Err(ManifestError::NotFound(path));
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Image paths resolved against the build directory.
    pub fn resolved_image_paths(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        self.image_paths
            .iter()
            .map(|p| dir.as_ref().join(p))
            .collect()
    }

    /// Audio paths resolved against the build directory.
    pub fn resolved_audio_paths(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        self.audio_paths
            .iter()
            .map(|p| dir.as_ref().join(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::Chapter;
    use tempfile::TempDir;

    fn sample_manifest() -> BuildManifest {
        BuildManifest {
            story: StoryOutline {
                title: "Ganga's Sacrifice".to_string(),
                description: "A river goddess keeps her word".to_string(),
                story: "Long ago...".to_string(),
                outline: vec![Chapter {
                    title: "The Pact".to_string(),
                    description: "Shantanu meets Ganga".to_string(),
                }],
            },
            scripts: ScriptsOutput {
                scripts: vec!["Long ago...".to_string()],
            },
            image_prompts: vec!["A river goddess at dusk".to_string()],
            image_paths: vec![PathBuf::from("raw/image_1.png")],
            audio_paths: vec![PathBuf::from("raw/audio_1.mp3")],
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let manifest = sample_manifest();
        manifest.save(dir.path()).unwrap();

        let loaded = BuildManifest::load(dir.path()).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = BuildManifest::load(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }

    #[test]
    fn test_resolved_paths_join_build_dir() {
        let manifest = sample_manifest();
        let resolved = manifest.resolved_audio_paths("/builds/ganga");
        assert_eq!(resolved, vec![PathBuf::from("/builds/ganga/raw/audio_1.mp3")]);
    }
}
