//! Filesystem helpers for build directories and artifacts.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::MediaResult;

/// Maximum length of a sanitized file name.
const MAX_FILENAME_LEN: usize = 220;

/// Make a string safe to use as a file or directory name.
///
/// Truncates to 220 characters and replaces everything outside
/// `[A-Za-z0-9_-]` with underscores.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Create a directory (and parents) if it does not exist.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
    }
    Ok(dir.to_path_buf())
}

/// Write bytes to a file, creating the parent directory if needed.
pub async fn write_bytes(path: impl AsRef<Path>, bytes: &[u8]) -> MediaResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_replaces_special_characters() {
        assert_eq!(sanitize_filename("Bhishma's Vow!"), "Bhishma_s_Vow_");
        assert_eq!(sanitize_filename("a b/c"), "a_b_c");
        assert_eq!(sanitize_filename("ok-name_42"), "ok-name_42");
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).len(), 220);
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        ensure_dir(&nested).await.unwrap();
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_write_bytes_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw/image_1.png");
        write_bytes(&path, b"png").await.unwrap();
        assert_eq!(fs::read(&path).await.unwrap(), b"png");
    }
}
