use anyhow::{Result, anyhow};
use std::path::Path;

/// Longest stored name component, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Reduces a client-declared filename to a single safe path component.
///
/// Only the last component survives (`/` and `\` are both treated as
/// separators), reserved characters become `_`, and the result is capped at
/// [`MAX_FILENAME_LEN`] bytes. Names with nothing left (`""`, `..`, `a/..`)
/// are rejected.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {:?}", filename);
    }

    let unified = filename.replace('\\', "/");
    let name = Path::new(&unified)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("Filename {:?} has no usable name component", filename),
        }));
    }

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    Ok(sanitized)
}
