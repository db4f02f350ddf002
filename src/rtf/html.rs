//! Post-processing of de-encapsulated HTML.
//!
//! The extracted HTML is handed on as a Rust string, i.e. UTF-8, whatever
//! charset the original message declared. A `<meta>` declaration is inserted
//! so HTML consumers read it as such.

use once_cell::sync::Lazy;
use regex::Regex;

/// Charset declaration inserted into HTML results.
pub const UTF8_META: &str = r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8">"#;

static HEAD_TAG: Lazy<Regex> = Lazy::new(|| {
    // `<head>` or `<head ...>`, but not `<header>`
    Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid regex")
});

/// Insert [`UTF8_META`] right after the first `<head>` tag, or at the very
/// start when the document has none.
///
/// # Examples
///
/// ```rust
/// use rtfex::rtf::html::{UTF8_META, inject_utf8_meta};
///
/// let html = inject_utf8_meta("<html><HEAD></HEAD></html>");
/// assert_eq!(html, format!("<html><HEAD>{UTF8_META}</HEAD></html>"));
/// ```
pub fn inject_utf8_meta(html: &str) -> String {
    let at = HEAD_TAG.find(html).map_or(0, |m| m.end());

    let mut out = String::with_capacity(html.len() + UTF8_META.len());
    out.push_str(&html[..at]);
    out.push_str(UTF8_META);
    out.push_str(&html[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_after_head() {
        let html = inject_utf8_meta("<html><head></head><body>Hi</body></html>");
        assert_eq!(
            html,
            format!("<html><head>{UTF8_META}</head><body>Hi</body></html>")
        );
    }

    #[test]
    fn test_head_with_attributes() {
        let html = inject_utf8_meta("<html>\r\n<Head lang=\"en\">\r\n<title>x</title>");
        assert_eq!(
            html,
            format!("<html>\r\n<Head lang=\"en\">{UTF8_META}\r\n<title>x</title>")
        );
    }

    #[test]
    fn test_header_element_is_not_head() {
        let html = inject_utf8_meta("<body><header>x</header></body>");
        assert_eq!(html, format!("{UTF8_META}<body><header>x</header></body>"));
    }

    #[test]
    fn test_only_first_head() {
        let html = inject_utf8_meta("<head></head><head></head>");
        assert_eq!(html, format!("<head>{UTF8_META}</head><head></head>"));
    }

    #[test]
    fn test_no_head() {
        assert_eq!(inject_utf8_meta("<p>Hi</p>"), format!("{UTF8_META}<p>Hi</p>"));
        assert_eq!(inject_utf8_meta(""), UTF8_META);
    }
}
