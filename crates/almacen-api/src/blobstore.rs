//! Blob-store collaborator.
//!
//! The backend treats blob storage as an opaque object store: upload, list,
//! and get-properties, addressed by container + path and resolved to public
//! URLs. [`FilesystemStore`] is the bundled implementation; the trait keeps
//! the seam open for a cloud-backed one.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use almacen_core::{defaults, Error, Result};

/// Properties of a stored blob.
#[derive(Debug, Clone)]
pub struct BlobProperties {
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
}

/// One entry from a container listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlobItem {
    /// Bare file name (last path segment).
    pub name: String,
    /// Full path within the container.
    pub path: String,
    /// Public URL.
    pub url: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// Opaque key/value object store with upload, list, and get-properties.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob and return its public URL.
    async fn put(
        &self,
        container: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String>;

    /// List blobs under a prefix.
    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<BlobItem>>;

    /// Properties of one blob, or `None` when it does not exist.
    async fn properties(&self, container: &str, path: &str) -> Result<Option<BlobProperties>>;

    /// Public URL for a blob path (whether or not it exists).
    fn public_url(&self, container: &str, path: &str) -> String;

    /// Resolve a public URL back to (container, path), when it belongs to
    /// this store.
    fn parse_public_url(&self, url: &str) -> Option<(String, String)>;
}

/// Filesystem-backed object store.
///
/// Blobs live under `{base_path}/{container}/{path}` and are served by an
/// external static host at `{public_base}/{container}/{path}`.
pub struct FilesystemStore {
    base_path: PathBuf,
    public_base: String,
}

impl FilesystemStore {
    pub fn new(base_path: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, container: &str, path: &str) -> PathBuf {
        self.base_path.join(container).join(path)
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn put(
        &self,
        container: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let full_path = self.full_path(container, path);
        debug!(
            subsystem = "blobstore",
            component = "filesystem",
            op = "put",
            blob_path = %path,
            size_bytes = data.len(),
            content_type,
            "Storing blob"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "blobstore: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &full_path).await?;

        Ok(self.public_url(container, path))
    }

    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<BlobItem>> {
        let root = self.base_path.join(container);
        let mut items = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(_) => continue, // container or prefix not created yet
            };
            while let Some(entry) = entries.next_entry().await? {
                let entry_path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(entry_path);
                    continue;
                }
                let rel = entry_path
                    .strip_prefix(&root)
                    .map_err(|e| Error::Storage(e.to_string()))?
                    .to_string_lossy()
                    .replace('\\', "/");
                if !rel.starts_with(prefix) {
                    continue;
                }
                let meta = entry.metadata().await?;
                items.push(BlobItem {
                    name: rel.rsplit('/').next().unwrap_or(&rel).to_string(),
                    url: self.public_url(container, &rel),
                    content_type: content_type_for_path(&rel).map(str::to_string),
                    size: Some(meta.len()),
                    path: rel,
                });
            }
        }

        items.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(items)
    }

    async fn properties(&self, container: &str, path: &str) -> Result<Option<BlobProperties>> {
        let full_path = self.full_path(container, path);
        match fs::metadata(&full_path).await {
            Ok(meta) => Ok(Some(BlobProperties {
                size: meta.len(),
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                content_type: content_type_for_path(path).map(str::to_string),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, container: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_base, container, path)
    }

    fn parse_public_url(&self, url: &str) -> Option<(String, String)> {
        let rest = url.strip_prefix(&self.public_base)?.strip_prefix('/')?;
        let (container, path) = rest.split_once('/')?;
        if container.is_empty() || path.is_empty() {
            return None;
        }
        Some((container.to_string(), path.to_string()))
    }
}

// =============================================================================
// BLOB NAMING
// =============================================================================

/// Generate a unique blob filename, preserving the extension when possible:
/// original filename first, then a content-type guess, then `bin`.
pub fn build_blob_name(original_name: Option<&str>, content_type: Option<&str>) -> String {
    let mut suffix = original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_string())
        .unwrap_or_default();

    if suffix.is_empty() {
        if let Some(ct) = content_type {
            let essence = ct.split(';').next().unwrap_or("").trim();
            if let Some(ext) = extension_for(essence) {
                suffix = ext.to_string();
            }
        }
    }
    if suffix.is_empty() {
        suffix = "bin".to_string();
    }

    format!("{}.{}", Uuid::new_v4().simple(), suffix)
}

/// Extension guess for common content types.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.to_ascii_lowercase().as_str() {
        "application/pdf" => Some("pdf"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "audio/mpeg" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "text/plain" => Some("txt"),
        "text/csv" => Some("csv"),
        "application/json" => Some("json"),
        "application/zip" => Some("zip"),
        _ => None,
    }
}

/// Content-type guess from a path's extension (filesystem backends do not
/// persist content types).
pub fn content_type_for_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "mp3" => Some("audio/mpeg"),
        "ogg" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "txt" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "json" => Some("application/json"),
        "zip" => Some("application/zip"),
        _ => None,
    }
}

// =============================================================================
// MEDIA KIND CLASSIFICATION
// =============================================================================

/// Simplified media kind for chat uploads: image, voice, video, or file.
pub fn classify_media_kind(declared_type: Option<&str>, content_type: Option<&str>) -> &'static str {
    let declared = declared_type.unwrap_or("").to_ascii_lowercase();
    let mime = content_type.unwrap_or("").to_ascii_lowercase();

    if matches!(declared.as_str(), "image" | "img") || mime.starts_with("image/") {
        "image"
    } else if matches!(declared.as_str(), "audio" | "voz" | "voice") || mime.starts_with("audio/") {
        "voice"
    } else if declared == "video" || mime.starts_with("video/") {
        "video"
    } else {
        "file"
    }
}

/// Container folder for a media kind.
pub fn media_folder(kind: &str) -> &'static str {
    match kind {
        "image" | "img" => "images",
        "voice" | "audio" => "audio",
        "video" => "video",
        _ => "files",
    }
}

// =============================================================================
// REMOTE COVER DOWNLOAD
// =============================================================================

/// Download a cover image from an external URL.
///
/// http(s) schemes only, the response must declare an image content type
/// when it declares one at all, and the download is capped at
/// [`defaults::COVER_MAX_BYTES`].
pub async fn fetch_remote_image(
    client: &reqwest::Client,
    url: &str,
) -> Result<(Vec<u8>, Option<String>)> {
    let lower = url.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(Error::InvalidInput(
            "La URL de carátula debe iniciar con http(s)://.".to_string(),
        ));
    }

    let resp = client
        .get(url)
        .header(reqwest::header::USER_AGENT, "catalog-uploader/1.0")
        .send()
        .await?;

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(ref ct) = content_type {
        if !ct.to_ascii_lowercase().starts_with("image/") {
            return Err(Error::InvalidInput(
                "La URL proporcionada no es una imagen.".to_string(),
            ));
        }
    }

    if let Some(len) = resp.content_length() {
        if len as usize > defaults::COVER_MAX_BYTES {
            return Err(Error::InvalidInput(
                "La imagen remota excede el tamaño permitido (10MB).".to_string(),
            ));
        }
    }

    let bytes = resp.bytes().await?;
    if bytes.len() > defaults::COVER_MAX_BYTES {
        return Err(Error::InvalidInput(
            "La imagen remota excede el tamaño permitido (10MB).".to_string(),
        ));
    }

    Ok((bytes.to_vec(), content_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_name_preserves_extension() {
        let name = build_blob_name(Some("catalogo 2026.PDF"), None);
        assert!(name.ends_with(".PDF"));
        assert_eq!(name.len(), 32 + 1 + 3); // uuid4 hex + dot + ext
    }

    #[test]
    fn test_blob_name_guesses_from_content_type() {
        let name = build_blob_name(None, Some("image/png"));
        assert!(name.ends_with(".png"));

        let name = build_blob_name(Some("noext"), Some("application/pdf; charset=binary"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_blob_name_falls_back_to_bin() {
        let name = build_blob_name(None, Some("application/x-unknown"));
        assert!(name.ends_with(".bin"));

        let name = build_blob_name(None, None);
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn test_blob_names_are_unique() {
        assert_ne!(build_blob_name(None, None), build_blob_name(None, None));
    }

    #[test]
    fn test_classify_media_kind() {
        assert_eq!(classify_media_kind(Some("img"), None), "image");
        assert_eq!(classify_media_kind(None, Some("image/jpeg")), "image");
        assert_eq!(classify_media_kind(Some("voz"), None), "voice");
        assert_eq!(classify_media_kind(None, Some("audio/ogg")), "voice");
        assert_eq!(classify_media_kind(Some("video"), None), "video");
        assert_eq!(classify_media_kind(None, Some("application/pdf")), "file");
        assert_eq!(classify_media_kind(None, None), "file");
    }

    #[test]
    fn test_media_folder() {
        assert_eq!(media_folder("image"), "images");
        assert_eq!(media_folder("voice"), "audio");
        assert_eq!(media_folder("video"), "video");
        assert_eq!(media_folder("anything"), "files");
    }

    #[test]
    fn test_public_url_roundtrip() {
        let store = FilesystemStore::new("/tmp/blobs", "https://blobs.example.com/");
        let url = store.public_url("blobcatalogos", "catalogs/abc.pdf");
        assert_eq!(url, "https://blobs.example.com/blobcatalogos/catalogs/abc.pdf");
        assert_eq!(
            store.parse_public_url(&url),
            Some(("blobcatalogos".to_string(), "catalogs/abc.pdf".to_string()))
        );
        assert_eq!(store.parse_public_url("https://other.example.com/x/y"), None);
    }

    #[tokio::test]
    async fn test_filesystem_put_list_properties() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path(), "http://localhost:9000");

        let url = store
            .put("blobcatalogos", "catalogs/test.pdf", b"%PDF-1.7", "application/pdf")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:9000/blobcatalogos/catalogs/test.pdf");

        let props = store
            .properties("blobcatalogos", "catalogs/test.pdf")
            .await
            .unwrap()
            .expect("blob should exist");
        assert_eq!(props.size, 8);
        assert_eq!(props.content_type.as_deref(), Some("application/pdf"));

        let missing = store
            .properties("blobcatalogos", "catalogs/nope.pdf")
            .await
            .unwrap();
        assert!(missing.is_none());

        let items = store.list("blobcatalogos", "catalogs/").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "test.pdf");
        assert_eq!(items[0].path, "catalogs/test.pdf");

        let none = store.list("blobcatalogos", "portadas_catalogo/").await.unwrap();
        assert!(none.is_empty());
    }
}
