use actix_multipart::Multipart;
use actix_web::web;
use futures_util::StreamExt;
use log::{debug, info, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::ApiError;

/// Multipart field carrying the image.
pub const PHOTO_FIELD: &str = "foto";
/// URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

pub struct UploadService;

impl UploadService {
    pub fn extension_for(content_type: &str) -> Option<&'static str> {
        match content_type {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            "image/gif" => Some("gif"),
            _ => None,
        }
    }

    /// Reads the `foto` field, enforcing the image type and `max_bytes`.
    /// Other fields are drained and ignored.
    pub async fn read_photo(mut payload: Multipart, max_bytes: usize) -> Result<PhotoUpload, ApiError> {
        while let Some(item) = payload.next().await {
            let mut field = item.map_err(|e| ApiError::ValidationError(format!("Invalid multipart body: {}", e)))?;

            let is_photo = field.content_disposition().get_name() == Some(PHOTO_FIELD);
            if !is_photo {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| ApiError::ValidationError(e.to_string()))?;
                }
                continue;
            }

            let content_type = field
                .content_type()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default();
            let extension = Self::extension_for(&content_type).ok_or_else(|| {
                ApiError::ValidationError(format!("Unsupported image type '{}'", content_type))
            })?;

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| ApiError::ValidationError(e.to_string()))?;
                if bytes.len() + chunk.len() > max_bytes {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "Photo exceeds the {} byte limit",
                        max_bytes
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            if bytes.is_empty() {
                return Err(ApiError::ValidationError("Photo is empty".to_string()));
            }
            debug!("Received {} byte {} upload", bytes.len(), content_type);
            return Ok(PhotoUpload { bytes, extension });
        }

        Err(ApiError::ValidationError(format!(
            "Missing '{}' file field",
            PHOTO_FIELD
        )))
    }

    /// Writes the photo under a random name and returns its public URL.
    pub fn store(dir: &Path, upload: &PhotoUpload) -> Result<String, ApiError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            ApiError::InternalError(format!("Cannot create upload dir {}: {}", dir.display(), e))
        })?;
        let file_name = format!("{}.{}", Uuid::new_v4(), upload.extension);
        let path = dir.join(&file_name);
        std::fs::write(&path, &upload.bytes).map_err(|e| {
            ApiError::InternalError(format!("Cannot write {}: {}", path.display(), e))
        })?;
        info!("Stored upload {}", path.display());
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Maps a public URL back to a file inside `dir`, refusing anything that
    /// is not a plain file name.
    pub fn local_path(dir: &Path, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return None;
        }
        Some(dir.join(name))
    }

    /// Best effort removal of a replaced photo.
    pub fn remove(dir: &Path, url: &str) {
        if let Some(path) = Self::local_path(dir, url) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Could not remove old upload {}: {}", path.display(), e);
            }
        }
    }

    /// Reads and stores the photo, then hands its URL to `attach`. The file
    /// is removed again when `attach` fails.
    pub async fn save_and_attach<T, F, Fut>(
        payload: Multipart,
        dir: String,
        max_bytes: usize,
        attach: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let upload = Self::read_photo(payload, max_bytes).await?;
        Self::store_and_attach(upload, dir, attach).await
    }

    pub async fn store_and_attach<T, F, Fut>(
        upload: PhotoUpload,
        dir: String,
        attach: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let store_dir = dir.clone();
        let url = web::block(move || Self::store(Path::new(&store_dir), &upload)).await??;

        match attach(url.clone()).await {
            Ok(attached) => Ok(attached),
            Err(e) => {
                warn!("Discarding {} after failed attach: {}", url, e);
                Self::discard(dir, Some(url)).await;
                Err(e)
            }
        }
    }

    pub async fn discard(dir: String, url: Option<String>) {
        Self::discard_all(dir, url.into_iter().collect()).await;
    }

    pub async fn discard_all(dir: String, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let _ = web::block(move || {
            for url in &urls {
                Self::remove(Path::new(&dir), url);
            }
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/jpeg", Some("jpg"))]
    #[case("image/png", Some("png"))]
    #[case("image/webp", Some("webp"))]
    #[case("application/pdf", None)]
    #[case("", None)]
    fn maps_content_types(#[case] content_type: &str, #[case] expected: Option<&str>) {
        assert_eq!(UploadService::extension_for(content_type), expected);
    }

    #[test]
    fn stores_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = UploadService::store(dir.path(), &jpeg()).unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".jpg"));

        let path = UploadService::local_path(dir.path(), &url).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF]);

        UploadService::remove(dir.path(), &url);
        assert!(!path.exists());
    }

    fn jpeg() -> PhotoUpload {
        PhotoUpload { bytes: vec![0xFF, 0xD8, 0xFF], extension: "jpg" }
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[actix_web::test]
    async fn failed_attach_removes_the_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir_name = dir.path().to_string_lossy().into_owned();

        let result: Result<(), ApiError> = UploadService::store_and_attach(jpeg(), dir_name, |_url| async {
            Err(ApiError::NotFoundError("Animal 7 not found".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ApiError::NotFoundError(_))));
        assert_eq!(file_count(dir.path()), 0);
    }

    #[actix_web::test]
    async fn successful_attach_keeps_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir_name = dir.path().to_string_lossy().into_owned();

        let url = UploadService::store_and_attach(jpeg(), dir_name, |url| async move { Ok(url) })
            .await
            .unwrap();

        assert!(UploadService::local_path(dir.path(), &url).unwrap().exists());
        assert_eq!(file_count(dir.path()), 1);
    }

    #[actix_web::test]
    async fn discard_all_removes_every_listed_photo() {
        let dir = tempfile::tempdir().unwrap();
        let first = UploadService::store(dir.path(), &jpeg()).unwrap();
        let second = UploadService::store(dir.path(), &jpeg()).unwrap();

        let dir_name = dir.path().to_string_lossy().into_owned();
        UploadService::discard_all(dir_name, vec![first, second]).await;
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn local_path_rejects_traversal() {
        let dir = Path::new("/srv/uploads");
        assert!(UploadService::local_path(dir, "/uploads/../etc/passwd").is_none());
        assert!(UploadService::local_path(dir, "/uploads/a/b.png").is_none());
        assert!(UploadService::local_path(dir, "/elsewhere/a.png").is_none());
        assert_eq!(
            UploadService::local_path(dir, "/uploads/a.png"),
            Some(PathBuf::from("/srv/uploads/a.png"))
        );
    }
}
