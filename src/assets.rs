//! Optional background image for exported documents.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::fs;
use tracing::{debug, warn};

/// Extensions tried, in order, for `background.<ext>`.
pub const BACKGROUND_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png"];

/// A background image read once at startup.
#[derive(Clone)]
pub struct BackgroundImage {
    mime: &'static str,
    base64: String,
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("mime", &self.mime)
            .field("encoded_len", &self.base64.len())
            .finish()
    }
}

fn mime_for(ext: &str) -> &'static str {
    match ext {
        "webp" => "image/webp",
        "png" => "image/png",
        _ => "image/jpeg",
    }
}

impl BackgroundImage {
    /// Wrap raw image bytes.
    pub fn from_bytes(ext: &str, bytes: &[u8]) -> Self {
        Self {
            mime: mime_for(ext),
            base64: STANDARD.encode(bytes),
        }
    }

    /// Look for `background.{webp,jpg,jpeg,png}` in `dir` and load the first
    /// one found. Missing or unreadable images yield `None`.
    pub async fn discover(dir: &Path) -> Option<Self> {
        for ext in BACKGROUND_EXTENSIONS {
            let path = dir.join(format!("background.{ext}"));
            if !path.exists() {
                continue;
            }
            match fs::read(&path).await {
                Ok(bytes) => {
                    debug!(path = %path.display(), size = bytes.len(), "Loaded background image");
                    return Some(Self::from_bytes(ext, &bytes));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not read background image");
                    return None;
                }
            }
        }
        debug!(dir = %dir.display(), "No background image found");
        None
    }

    pub fn mime(&self) -> &str {
        self.mime
    }

    /// `data:` URI suitable for CSS `url(...)`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}
