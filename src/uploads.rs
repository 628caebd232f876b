use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::ApiError;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const PUBLIC_PREFIX: &str = "/uploads/ads/";

/// Gate an uploaded file on MIME type, extension and size. Returns the
/// lower-cased extension to store under; the client filename itself is never
/// reused.
pub fn validate_image(
    filename: &str,
    content_type: &str,
    len: usize,
) -> Result<String, ApiError> {
    if !content_type.starts_with("image/") {
        return Err(ApiError::UploadRejected(
            "only image files are allowed".into(),
        ));
    }
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ApiError::UploadRejected(
            "only jpg, jpeg, png, gif and webp files are allowed".into(),
        ));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(ApiError::UploadRejected("image exceeds the 5MB limit".into()));
    }
    Ok(ext)
}

/// Storage seam for uploaded ad images. `save` returns the public path the
/// image is served from; `remove` takes that same path back.
#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn save(&self, ext: &str, body: Bytes) -> anyhow::Result<String>;
    async fn remove(&self, public_path: &str) -> anyhow::Result<()>;
}

/// Writes under `<root>/ads/`, which `ServeDir` exposes read-only at
/// `/uploads`.
pub struct DiskUploadStore {
    root: PathBuf,
}

impl DiskUploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ads_dir(&self) -> PathBuf {
        self.root.join("ads")
    }
}

#[async_trait]
impl UploadStore for DiskUploadStore {
    async fn save(&self, ext: &str, body: Bytes) -> anyhow::Result<String> {
        // Server-generated name: timestamp plus random suffix, never the
        // client-supplied filename.
        let millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let name = format!("ad-{millis}-{suffix}.{ext}");

        let dir = self.ads_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .context("create upload directory")?;
        tokio::fs::write(dir.join(&name), &body)
            .await
            .context("write uploaded image")?;

        debug!(name = %name, bytes = body.len(), "image stored");
        Ok(format!("{PUBLIC_PREFIX}{name}"))
    }

    async fn remove(&self, public_path: &str) -> anyhow::Result<()> {
        let name = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .with_context(|| format!("not an upload path: {public_path}"))?;
        anyhow::ensure!(
            !name.is_empty() && !name.contains('/') && !name.contains(".."),
            "refusing to remove {name}"
        );
        tokio::fs::remove_file(self.ads_dir().join(name))
            .await
            .with_context(|| format!("remove {name}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn validate_image_gates_mime_extension_and_size() {
        assert!(validate_image("banner.jpg", "image/jpeg", 1024).is_ok());
        assert_eq!(validate_image("BANNER.PNG", "image/png", 1024).unwrap(), "png");

        // non-image MIME
        assert!(validate_image("banner.jpg", "application/pdf", 1024).is_err());
        // disallowed extension
        assert!(validate_image("banner.svg", "image/svg+xml", 1024).is_err());
        assert!(validate_image("banner", "image/jpeg", 1024).is_err());
        // size boundary is inclusive
        assert!(validate_image("banner.jpg", "image/jpeg", MAX_IMAGE_BYTES).is_ok());
        assert!(validate_image("banner.jpg", "image/jpeg", MAX_IMAGE_BYTES + 1).is_err());
    }

    #[tokio::test]
    async fn disk_store_saves_under_a_generated_name_and_removes() {
        let root = std::env::temp_dir().join(format!("admarket-test-{}", Uuid::new_v4()));
        let store = DiskUploadStore::new(&root);

        let path = store
            .save("png", Bytes::from_static(b"not really a png"))
            .await
            .unwrap();
        assert!(path.starts_with("/uploads/ads/ad-"));
        assert!(path.ends_with(".png"));

        let name = path.strip_prefix("/uploads/ads/").unwrap();
        assert!(root.join("ads").join(name).is_file());

        store.remove(&path).await.unwrap();
        assert!(!root.join("ads").join(name).exists());

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn remove_refuses_paths_outside_the_upload_dir() {
        let store = DiskUploadStore::new("uploads");
        assert!(store.remove("/etc/passwd").await.is_err());
        assert!(store.remove("/uploads/ads/../secret").await.is_err());
        assert!(store.remove("/uploads/ads/a/b").await.is_err());
    }
}
