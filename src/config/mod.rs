use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the upload endpoint
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory receiving saved uploads (default: "uploads")
    pub upload_dir: PathBuf,

    /// Maximum upload size in bytes (default: 256 MB)
    pub max_upload_size: usize,

    /// Upper bound for writing one upload to disk, in seconds (default: 300)
    pub write_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_upload_size: 256 * 1024 * 1024, // 256 MB
            write_timeout_secs: 300,
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_dir: env::var("UPLOAD_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            write_timeout_secs: env::var("WRITE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.write_timeout_secs),
        }
    }

    /// Config rooted at an explicit directory, everything else default
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
