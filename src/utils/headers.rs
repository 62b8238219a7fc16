use axum::http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT},
};
use std::collections::BTreeMap;

/// Request headers echoed back in the upload report
pub const REPORTED_HEADERS: [HeaderName; 4] = [CONTENT_TYPE, USER_AGENT, ORIGIN, REFERER];

/// Renders a header value for display; non-UTF-8 bytes are replaced.
pub fn header_value_string(value: &HeaderValue) -> String {
    match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    }
}

/// Single header as a display string, repeated values joined with `, `.
pub fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<String> = headers.get_all(name).iter().map(header_value_string).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Filters `headers` down to [`REPORTED_HEADERS`], keyed by lower-case name.
pub fn reported_headers_subset(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut subset: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        if !REPORTED_HEADERS.contains(name) {
            continue;
        }
        let value = header_value_string(value);
        subset
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    subset
}
