//! Image object pass-through: upload, public URL, removal.

use uuid::Uuid;

use super::{Session, StoreClient};
use crate::error::KudosError;

const BUCKET: &str = "diary-images";

/// Upload size ceiling, enforced before any network call.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image extensions (lowercased before matching).
pub const ALLOWED_IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Validate an image candidate client-side. Returns the normalized extension.
pub fn validate_image(filename: &str, len: usize) -> Result<String, KudosError> {
    if len > MAX_IMAGE_BYTES {
        return Err(KudosError::Validation(format!(
            "image too large: {len} bytes (max {MAX_IMAGE_BYTES})"
        )));
    }

    let ext = filename
        .rsplit('.')
        .next()
        .filter(|e| *e != filename)
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_IMAGE_EXTS.contains(&ext.as_str()) {
        return Err(KudosError::Validation(format!(
            "unsupported image type: expected one of {}",
            ALLOWED_IMAGE_EXTS.join(", ")
        )));
    }
    Ok(ext)
}

impl StoreClient {
    /// Upload an image under the user's prefix and return its public URL.
    /// The stored name is random; the original filename only supplies the
    /// extension.
    pub async fn upload_image(
        &self,
        session: &Session,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, KudosError> {
        let ext = validate_image(filename, bytes.len())?;
        let path = format!("{}/{}.{ext}", session.user_id, Uuid::new_v4().simple());

        let req = self.authed(
            self.http()
                .post(self.object_url(BUCKET, &path))
                .header("Content-Type", "application/octet-stream")
                .header("Cache-Control", "max-age=3600")
                .body(bytes),
            Some(session),
        );
        self.send(req).await?;

        Ok(self.public_object_url(BUCKET, &path))
    }

    /// Remove a previously uploaded image by its public URL. The object path
    /// is the trailing `user_id/filename` of the URL.
    pub async fn remove_image(&self, session: &Session, url: &str) -> Result<(), KudosError> {
        let segments: Vec<&str> = url.rsplit('/').take(2).collect();
        let [filename, user_dir] = segments.as_slice() else {
            return Err(KudosError::Validation(format!("not an image URL: {url}")));
        };
        let path = format!("{user_dir}/{filename}");

        let req = self.authed(
            self.http().delete(self.object_url(BUCKET, &path)),
            Some(session),
        );
        self.send(req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_extensions() {
        for name in ["win.jpg", "win.JPEG", "win.png", "shot.GIF"] {
            assert!(validate_image(name, 1024).is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn rejects_unsupported_extension() {
        let err = validate_image("notes.pdf", 1024).unwrap_err();
        assert!(err.is_validation());

        // No extension at all.
        assert!(validate_image("README", 1024).is_err());
    }

    #[test]
    fn rejects_oversized_image() {
        assert!(validate_image("big.png", MAX_IMAGE_BYTES + 1).is_err());
        assert!(validate_image("fits.png", MAX_IMAGE_BYTES).is_ok());
    }
}
