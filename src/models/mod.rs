use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use utoipa::ToSchema;

pub const REPORT_START_MARKER: &str = "=== Upload Received ===";
pub const REPORT_END_MARKER: &str = "=======================";

/// How each layer of the stack classified one upload.
///
/// Wire names are fixed; clients diff them across browsers and platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadReport {
    /// Filename exactly as the client declared it
    pub filename: String,

    /// `Content-Type` of the whole request, usually `multipart/form-data; boundary=...`
    pub http_request_content_type: Option<String>,

    /// Content type the client sent for the file part
    #[serde(rename = "form_field_content_type_from_browser")]
    pub form_field_content_type: Option<String>,

    /// Declared part type reduced to `type/subtype`
    #[serde(rename = "flask_detected_mimetype")]
    pub framework_detected_mimetype: Option<String>,

    /// Lookup of the filename suffix
    #[serde(rename = "mimetypes_guess_from_extension")]
    pub extension_guess: Option<String>,

    /// Magic-number result for the saved bytes, or `magic error: ...`
    #[serde(rename = "python_magic_from_file")]
    pub magic_detected_type: String,

    pub request_headers_subset: BTreeMap<String, String>,

    #[serde(rename = "saved_to")]
    pub saved_path: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl UploadReport {
    /// Renders the report as the log block: one `key: value` line per field,
    /// in response order, between the start and end markers.
    pub fn log_block(&self) -> String {
        fn opt(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("null")
        }

        let headers = serde_json::to_string(&self.request_headers_subset)
            .unwrap_or_else(|_| format!("{:?}", self.request_headers_subset));

        let lines: [(&str, &str); 8] = [
            ("filename", self.filename.as_str()),
            ("http_request_content_type", opt(&self.http_request_content_type)),
            (
                "form_field_content_type_from_browser",
                opt(&self.form_field_content_type),
            ),
            ("flask_detected_mimetype", opt(&self.framework_detected_mimetype)),
            ("mimetypes_guess_from_extension", opt(&self.extension_guess)),
            ("python_magic_from_file", self.magic_detected_type.as_str()),
            ("request_headers_subset", headers.as_str()),
            ("saved_to", self.saved_path.as_str()),
        ];

        let mut block = String::new();
        let _ = writeln!(block, "{}", REPORT_START_MARKER);
        for (key, value) in lines {
            let _ = writeln!(block, "{}: {}", key, value);
        }
        block.push_str(REPORT_END_MARKER);
        block
    }
}
