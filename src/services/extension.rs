/// Conventional MIME type for the filename's suffix, `None` when unknown.
///
/// Only the name is consulted; the file itself is never opened.
pub fn guess_from_extension(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first_raw()
        .map(str::to_string)
}
