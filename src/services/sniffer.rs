use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Bytes read from the head of a file before classifying it
pub const SNIFF_LEN: u64 = 8192;

pub const EMPTY_MIME: &str = "inode/x-empty";
pub const TEXT_MIME: &str = "text/plain";
pub const BINARY_MIME: &str = "application/octet-stream";

/// Classifies a stored file by its content, ignoring its name.
#[async_trait]
pub trait ContentSniffer: Send + Sync {
    async fn sniff(&self, path: &Path) -> Result<String>;
}

/// Magic-number sniffer backed by `infer`
pub struct InferSniffer;

#[async_trait]
impl ContentSniffer for InferSniffer {
    async fn sniff(&self, path: &Path) -> Result<String> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;

        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        file.take(SNIFF_LEN)
            .read_to_end(&mut head)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        Ok(classify_bytes(&head).to_string())
    }
}

/// Known signatures first; otherwise empty, plain text or opaque binary.
pub fn classify_bytes(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return EMPTY_MIME;
    }
    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }
    if looks_like_text(head) {
        TEXT_MIME
    } else {
        BINARY_MIME
    }
}

// A multi-byte sequence cut off by the sniff window still counts as text.
fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
