use axum::response::Html;

pub const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>MIME Upload Tester</title></head>
<body>
  <h1>MIME Upload Tester</h1>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <p><input type="file" name="file" required></p>
    <p><button type="submit">Upload</button></p>
  </form>
  <p>Upload the same file (DOCX, PDF, ...) from different browsers and operating systems. The server answers with the headers it actually received and how each layer classified the file.</p>
</body>
</html>
"#;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Upload form", body = String, content_type = "text/html")
    ),
    tag = "upload"
)]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
