use async_trait::async_trait;
use dashmap::DashMap;
use domains::media::MediaUpload;
use domains::{AppError, MediaStore, Result};

/// Keeps uploads in memory under `(namespace, name)`. URLs look like
/// `memory://comments/<name>.<ext>`.
#[derive(Default)]
pub struct MemoryMediaStore {
    files: DashMap<(String, String), MediaUpload>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.files.contains_key(&(namespace.to_string(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, namespace: &str, file: MediaUpload, desired_name: &str) -> Result<String> {
        if file.is_empty() {
            return Err(AppError::Validation("upload is empty".into()));
        }
        let ext = file
            .content_type
            .as_ref()
            .map(|mime| mime.subtype().as_str().to_string())
            .unwrap_or_else(|| "bin".to_string());
        self.files.insert((namespace.to_string(), desired_name.to_string()), file);
        Ok(format!("memory://{namespace}/{desired_name}.{ext}"))
    }

    async fn delete(&self, namespace: &str, filename: &str) -> Result<()> {
        // Deleting an absent file is not an error.
        self.files.remove(&(namespace.to_string(), filename.to_string()));
        Ok(())
    }
}
