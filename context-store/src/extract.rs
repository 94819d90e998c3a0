//! Text extraction from uploaded document files.
//!
//! Extraction is keyed on the file extension of the *original* upload name,
//! not the storage path. Plain-text formats are read as UTF-8 with a lossy
//! fallback; anything that decodes as valid UTF-8 is accepted even without
//! a known extension. Binary formats are rejected so the document can be
//! marked failed instead of indexing garbage.

use std::path::Path;

use tracing::debug;

use crate::errors::ContextError;

/// Extensions always treated as plain text.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "log", "csv", "json", "yaml", "yml", "toml", "rst",
];

/// Reads and extracts text content from a stored upload.
///
/// `original_name` is the filename the user uploaded; `path` is where the
/// bytes were stored on disk.
///
/// # Errors
/// - [`ContextError::Io`] if the file cannot be read
/// - [`ContextError::Extraction`] for binary content with no text extension
pub async fn extract_text(
    path: impl AsRef<Path>,
    original_name: &str,
) -> Result<String, ContextError> {
    let bytes = tokio::fs::read(path.as_ref()).await?;

    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(ext) = ext.as_deref() {
        if TEXT_EXTENSIONS.contains(&ext) {
            debug!(name = %original_name, ext, "extracting as plain text");
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(_) => Err(ContextError::Extraction(format!(
            "unsupported binary format: {original_name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("extract-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await.unwrap();
        path
    }

    #[tokio::test]
    async fn reads_markdown_as_text() {
        let path = write_temp("guide.md", b"# VPN setup\nconnect to vpn.internal").await;
        let text = extract_text(&path, "guide.md").await.unwrap();
        assert!(text.contains("VPN setup"));
    }

    #[tokio::test]
    async fn rejects_binary_without_text_extension() {
        let path = write_temp("blob.bin", &[0xff, 0xfe, 0x00, 0x01]).await;
        let err = extract_text(&path, "blob.bin").await.unwrap_err();
        assert!(matches!(err, ContextError::Extraction(_)));
    }

    #[tokio::test]
    async fn lossy_decode_for_known_text_extension() {
        let path = write_temp("notes.txt", &[b'h', b'i', 0xff]).await;
        let text = extract_text(&path, "notes.txt").await.unwrap();
        assert!(text.starts_with("hi"));
    }
}
