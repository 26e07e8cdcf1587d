use image::GenericImageView;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::image::ImageForm;
use crate::store::Store;

/// Directory, under the media root, holding re-hosted originals
pub const ORIGINALS_DIR: &str = "original_images";

/// A re-hosted image as seen by the content rewriter
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub id: i64,
    pub title: String,
    pub url: String,
}

/// Local image storage: files under `media_root`, served from `media_url`.
pub struct ImageStorage {
    media_root: PathBuf,
    media_url: String,
}

impl ImageStorage {
    pub fn new(media_root: impl Into<PathBuf>, media_url: &str) -> Self {
        Self {
            media_root: media_root.into(),
            media_url: media_url.to_string(),
        }
    }

    pub fn originals_dir(&self) -> PathBuf {
        self.media_root.join(ORIGINALS_DIR)
    }

    /// Write downloaded bytes to the media root and register the image in the store.
    /// Bytes that do not decode as an image are rejected before anything is written.
    pub fn rehost(
        &self,
        store: &dyn Store,
        file_bytes: &[u8],
        title: &str,
    ) -> Result<StoredImage, String> {
        let img = image::load_from_memory(file_bytes).map_err(|e| format!("Not an image: {}", e))?;
        let (width, height) = img.dimensions();

        // Generate unique filename
        let ext = extension_for(title, file_bytes);
        let unique_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let relative = format!("{}/{}", ORIGINALS_DIR, unique_name);

        let dir = self.originals_dir();
        fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
        fs::write(dir.join(&unique_name), file_bytes).map_err(|e| e.to_string())?;

        let form = ImageForm {
            title: title.to_string(),
            file: relative,
            width: width as i64,
            height: height as i64,
            file_size: file_bytes.len() as i64,
            file_hash: hex::encode(Sha256::digest(file_bytes)),
        };
        let id = match store.image_create(&form) {
            Ok(id) => id,
            Err(e) => {
                let _ = fs::remove_file(dir.join(&unique_name));
                return Err(e);
            }
        };

        let image = store
            .image_find_by_id(id)
            .ok_or_else(|| format!("Image {} vanished after creation", id))?;
        Ok(StoredImage {
            id,
            url: image.url(&self.media_url),
            title: image.title,
        })
    }
}

/// File extension from the title, falling back to the sniffed format
fn extension_for(title: &str, file_bytes: &[u8]) -> String {
    let from_title = Path::new(title)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_title {
        return ext;
    }
    image::guess_format(file_bytes)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("jpg")
        .to_string()
}
