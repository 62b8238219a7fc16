use crate::api::error::AppError;
use crate::models::UploadReport;
use crate::services::extension::guess_from_extension;
use crate::services::sniffer::ContentSniffer;
use crate::services::storage::StorageService;
use crate::utils::headers::{header_string, reported_headers_subset};
use crate::utils::validation::sanitize_filename;
use axum::http::{HeaderMap, header::CONTENT_TYPE};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::info;

/// The file part of a multipart request, as declared by the client.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub content_type: Option<String>,
}

pub struct UploadService {
    storage: Arc<dyn StorageService>,
    sniffer: Arc<dyn ContentSniffer>,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageService>, sniffer: Arc<dyn ContentSniffer>) -> Self {
        Self { storage, sniffer }
    }

    /// Saves the part's bytes and reports how each source classifies them.
    ///
    /// Only a rejected filename or a failed write aborts the request; a
    /// classifier that cannot answer is recorded in the report instead.
    pub async fn receive<'a>(
        &self,
        request_headers: &HeaderMap,
        part: FilePart,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadReport, AppError> {
        let safe_name = sanitize_filename(&part.filename).map_err(AppError::InvalidFilename)?;

        let stored = self
            .storage
            .save_stream(&safe_name, reader)
            .await
            .map_err(AppError::from_storage)?;

        let magic_detected_type = match self.sniffer.sniff(&stored.path).await {
            Ok(detected) => detected,
            Err(e) => {
                tracing::warn!("Content sniffing failed for {}: {:#}", stored.path.display(), e);
                format!("magic error: {:#}", e)
            }
        };

        let report = UploadReport {
            http_request_content_type: header_string(request_headers, &CONTENT_TYPE),
            framework_detected_mimetype: part.content_type.as_deref().and_then(essence_mimetype),
            extension_guess: guess_from_extension(&part.filename),
            form_field_content_type: part.content_type,
            magic_detected_type,
            request_headers_subset: reported_headers_subset(request_headers),
            saved_path: stored.path.display().to_string(),
            filename: part.filename,
        };

        info!("\n{}", report.log_block());
        Ok(report)
    }
}

/// `type/subtype` of a declared content type, lower-cased, parameters dropped.
pub fn essence_mimetype(content_type: &str) -> Option<String> {
    let essence = match content_type.parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase(),
    };
    if essence.is_empty() { None } else { Some(essence) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sniffer::InferSniffer;
    use crate::services::storage::LocalStorageService;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::path::Path;
    use std::time::Duration;

    struct FixedSniffer(&'static str);

    #[async_trait]
    impl ContentSniffer for FixedSniffer {
        async fn sniff(&self, _path: &Path) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenSniffer;

    #[async_trait]
    impl ContentSniffer for BrokenSniffer {
        async fn sniff(&self, _path: &Path) -> anyhow::Result<String> {
            Err(anyhow!("magic database unavailable"))
        }
    }

    fn service(dir: &Path, sniffer: Arc<dyn ContentSniffer>) -> UploadService {
        let storage = Arc::new(LocalStorageService::new(dir, Duration::from_secs(5)));
        UploadService::new(storage, sniffer)
    }

    fn multipart_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=XYZ"),
        );
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        headers
    }

    #[test]
    fn test_essence_mimetype() {
        assert_eq!(
            essence_mimetype("text/plain; charset=UTF-8").as_deref(),
            Some("text/plain")
        );
        assert_eq!(essence_mimetype("Application/PDF").as_deref(), Some("application/pdf"));
        assert_eq!(essence_mimetype("weird;x=1").as_deref(), Some("weird"));
        assert_eq!(essence_mimetype(""), None);
        assert_eq!(essence_mimetype("  ; charset=utf-8"), None);
    }

    #[tokio::test]
    async fn test_receive_builds_full_report() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path(), Arc::new(InferSniffer));
        let part = FilePart {
            filename: "report.txt".to_string(),
            content_type: Some("text/plain; charset=utf-8".to_string()),
        };

        let report = svc
            .receive(&multipart_headers(), part, Box::new(&b"%PDF-1.4\n"[..]))
            .await
            .unwrap();

        assert_eq!(report.filename, "report.txt");
        assert_eq!(
            report.http_request_content_type.as_deref(),
            Some("multipart/form-data; boundary=XYZ")
        );
        assert_eq!(
            report.form_field_content_type.as_deref(),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(report.framework_detected_mimetype.as_deref(), Some("text/plain"));
        assert_eq!(report.extension_guess.as_deref(), Some("text/plain"));
        assert_eq!(report.magic_detected_type, "application/pdf");
        assert_eq!(report.request_headers_subset.len(), 1);
        assert!(report.request_headers_subset.contains_key("content-type"));
        assert!(Path::new(&report.saved_path).starts_with(tmp.path()));
        assert_eq!(std::fs::read(&report.saved_path).unwrap(), b"%PDF-1.4\n");
    }

    #[tokio::test]
    async fn test_sniffer_failure_is_reported_not_raised() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path(), Arc::new(BrokenSniffer));
        let part = FilePart {
            filename: "a.bin".to_string(),
            content_type: None,
        };

        let report = svc
            .receive(&HeaderMap::new(), part, Box::new(&b"\x00\x01"[..]))
            .await
            .unwrap();

        assert_eq!(report.magic_detected_type, "magic error: magic database unavailable");
        assert_eq!(report.form_field_content_type, None);
        assert_eq!(report.framework_detected_mimetype, None);
        assert_eq!(report.http_request_content_type, None);
        assert!(report.request_headers_subset.is_empty());
    }

    #[tokio::test]
    async fn test_traversal_name_stays_in_upload_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = tmp.path().join("uploads");
        let svc = service(&uploads, Arc::new(FixedSniffer("text/plain")));
        let part = FilePart {
            filename: "../../escape.txt".to_string(),
            content_type: Some("text/plain".to_string()),
        };

        let report = svc
            .receive(&HeaderMap::new(), part, Box::new(&b"x"[..]))
            .await
            .unwrap();

        assert_eq!(report.filename, "../../escape.txt");
        let saved = Path::new(&report.saved_path);
        assert_eq!(saved.parent().unwrap(), uploads.as_path());
        assert!(saved.file_name().unwrap().to_string_lossy().ends_with("-escape.txt"));
        assert!(!tmp.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_unusable_filename_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = tmp.path().join("uploads");
        let svc = service(&uploads, Arc::new(FixedSniffer("text/plain")));
        let part = FilePart {
            filename: "..".to_string(),
            content_type: None,
        };

        let err = svc
            .receive(&HeaderMap::new(), part, Box::new(&b"x"[..]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidFilename(_)));
        assert!(!uploads.exists());
    }
}
