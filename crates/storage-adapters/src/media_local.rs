//! # media_local
//!
//! Local filesystem implementation of `MediaStore`.
//! Layout: `<root>/<namespace>/<name>.<ext>`, served under `<url_prefix>`.
//! The extension comes from sniffing the payload, never from the client.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use domains::media::MediaUpload;
use domains::{AppError, MediaStore, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::timeout::bounded;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
    timeout: Duration,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self { root: root.into(), url_prefix: url_prefix.into().trim_end_matches('/').to_string(), timeout }
    }

    fn namespace_dir(&self, namespace: &str) -> Result<PathBuf> {
        Ok(self.root.join(safe_segment(namespace)?))
    }
}

/// Rejects anything that could escape the namespace directory.
fn safe_segment(segment: &str) -> Result<&str> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.contains('\0');
    if invalid {
        return Err(AppError::Validation(format!("invalid media name '{segment}'")));
    }
    Ok(segment)
}

fn io_error(op: &str, err: io::Error) -> AppError {
    AppError::ExternalDependency(format!("media {op} failed: {err}"))
}

fn sniff_extension(file: &MediaUpload) -> Result<&'static str> {
    let format = image::guess_format(&file.bytes)
        .map_err(|_| AppError::Validation("upload is not a supported image".into()))?;
    format
        .extensions_str()
        .first()
        .copied()
        .ok_or_else(|| AppError::Validation("upload is not a supported image".into()))
}

async fn remove_by_stem(dir: &Path, stem: &str) -> io::Result<usize> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
    }
    Ok(removed)
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, namespace: &str, file: MediaUpload, desired_name: &str) -> Result<String> {
        if file.is_empty() {
            return Err(AppError::Validation("upload is empty".into()));
        }
        let name = safe_segment(desired_name)?;
        let ext = sniff_extension(&file)?;
        let dir = self.namespace_dir(namespace)?;
        let target = dir.join(format!("{name}.{ext}"));

        bounded("media.upload", self.timeout, async {
            fs::create_dir_all(&dir).await.map_err(|err| io_error("upload", err))?;
            fs::write(&target, &file.bytes).await.map_err(|err| io_error("upload", err))
        })
        .await?;

        info!(namespace, name, bytes = file.bytes.len(), "media stored");
        Ok(format!("{}/{namespace}/{name}.{ext}", self.url_prefix))
    }

    async fn delete(&self, namespace: &str, filename: &str) -> Result<()> {
        let stem = safe_segment(filename)?;
        let dir = self.namespace_dir(namespace)?;
        let removed = bounded("media.delete", self.timeout, async {
            remove_by_stem(&dir, stem).await.map_err(|err| io_error("delete", err))
        })
        .await?;
        debug!(namespace, filename, removed, "media delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::media::{filename_from_url, COMMENT_IMAGES};
    use uuid::Uuid;

    // Smallest valid PNG signature plus IHDR start; enough for format sniffing.
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R'];

    fn store() -> (LocalMediaStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("agora-media-{}", Uuid::now_v7()));
        (LocalMediaStore::new(&root, "/static/uploads/", Duration::from_secs(5)), root)
    }

    #[tokio::test]
    async fn upload_then_delete_by_derived_name() {
        let (store, root) = store();
        let url = store
            .upload(COMMENT_IMAGES, MediaUpload::new(PNG.to_vec(), None), "c1")
            .await
            .unwrap();
        assert_eq!(url, "/static/uploads/comments/c1.png");
        assert!(root.join("comments/c1.png").exists());

        store.delete(COMMENT_IMAGES, filename_from_url(&url).unwrap()).await.unwrap();
        assert!(!root.join("comments/c1.png").exists());

        // Already gone: still fine.
        store.delete(COMMENT_IMAGES, "c1").await.unwrap();
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn non_image_payload_is_rejected() {
        let (store, _root) = store();
        let err = store
            .upload(COMMENT_IMAGES, MediaUpload::new(b"plain text".to_vec(), None), "c2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn traversal_names_are_rejected() {
        let (store, _root) = store();
        assert!(matches!(store.delete(COMMENT_IMAGES, "..").await, Err(AppError::Validation(_))));
        assert!(matches!(store.delete("../etc", "passwd").await, Err(AppError::Validation(_))));
    }
}
