//! Filesystem helpers shared by the fetcher, temp store and concat chain.

use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Size of a regular file in bytes, `None` if it doesn't exist.
pub async fn file_size(path: impl AsRef<Path>) -> Option<u64> {
    match fs::metadata(path.as_ref()).await {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        _ => None,
    }
}

/// Copy `src` to `dst` through a sibling temp file so `dst` never holds a
/// partial copy.
///
/// # Errors
///
/// Returns an error if:
/// - The source file doesn't exist
/// - The copy or rename operations fail
pub async fn copy_file_atomic(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<u64> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if file_size(src).await.is_none() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp_dst = dst.with_extension("partial");

    let copied = fs::copy(src, &tmp_dst).await.map_err(|e| {
        tracing::error!(
            "Failed to copy file: {} -> {}: {}",
            src.display(),
            tmp_dst.display(),
            e
        );
        MediaError::from(e)
    })?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        tracing::error!(
            "Failed to rename temp copy: {} -> {}: {}",
            tmp_dst.display(),
            dst.display(),
            e
        );
        return Err(MediaError::from(e));
    }

    Ok(copied)
}

/// Remove a file, treating "already gone" as success.
///
/// Returns `true` if a file was actually deleted.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> std::io::Result<bool> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        assert_eq!(file_size(&path).await, None);

        fs::write(&path, b"12345").await.unwrap();
        assert_eq!(file_size(&path).await, Some(5));

        // Directories are not files
        assert_eq!(file_size(dir.path()).await, None);
    }

    #[tokio::test]
    async fn test_copy_file_atomic_overwrites_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("source.mp4");
        let dst = dir.path().join("nested").join("dest.mp4");

        fs::write(&src, b"new content").await.unwrap();
        fs::create_dir_all(dst.parent().unwrap()).await.unwrap();
        fs::write(&dst, b"old").await.unwrap();

        let copied = copy_file_atomic(&src, &dst).await.unwrap();
        assert_eq!(copied, 11);
        assert!(src.exists(), "Source file should be kept");
        assert_eq!(fs::read(&dst).await.unwrap(), b"new content");
        assert!(!dst.with_extension("partial").exists());
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = copy_file_atomic(dir.path().join("missing"), dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_if_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x");
        fs::write(&path, b"x").await.unwrap();

        assert!(remove_if_exists(&path).await.unwrap());
        assert!(!remove_if_exists(&path).await.unwrap());
    }
}
