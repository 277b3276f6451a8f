/// Cleans user supplied markup before it is stored.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, raw: &str) -> String;
}

/// Trims the text and escapes everything HTML treats as markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, raw: &str) -> String {
        html_escape::encode_safe(raw.trim()).into_owned()
    }
}
