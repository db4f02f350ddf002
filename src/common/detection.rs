//! RTF and encapsulation detection.
//!
//! RTF files have a simple text-based signature (`{\rtf`) that makes them easy
//! to detect. Mail clients that wrap an HTML or plain-text body in RTF mark the
//! document with `\fromhtml` or `\fromtext` near the top of the header, which
//! lets the kind of payload be decided before parsing.

use memchr::memmem;

/// RTF files start with `{\rtf` followed optionally by version number.
const RTF_SIGNATURE_MIN: &[u8] = b"{\\rtf";
const RTF_SIGNATURE_LEN: usize = 5;

const FROM_HTML: &[u8] = b"\\fromhtml";
const FROM_TEXT: &[u8] = b"\\fromtext";

/// Number of leading bytes inspected for the encapsulation markers.
pub const DEFAULT_DETECTION_WINDOW: usize = 100;

/// Kind of payload encapsulated in an RTF body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum EncapsulationKind {
    /// `\fromhtml`: the RTF wraps an HTML document
    Html,
    /// `\fromtext`: the RTF wraps a plain-text body
    Text,
    /// Neither marker was seen
    #[default]
    None,
}

impl EncapsulationKind {
    /// Whether the RTF wraps HTML.
    #[inline]
    pub fn is_html(self) -> bool {
        self == EncapsulationKind::Html
    }

    /// Whether the RTF wraps plain text.
    #[inline]
    pub fn is_text(self) -> bool {
        self == EncapsulationKind::Text
    }
}

/// Detect RTF format from byte content.
///
/// # Examples
///
/// ```rust
/// use rtfex::common::detection::detect_rtf_format;
///
/// assert!(detect_rtf_format(b"{\\rtf1\\ansi\\deff0 Hello World}"));
/// assert!(!detect_rtf_format(b"Plain text file"));
/// ```
#[inline]
pub fn detect_rtf_format(bytes: &[u8]) -> bool {
    bytes.len() >= RTF_SIGNATURE_LEN && &bytes[..RTF_SIGNATURE_LEN] == RTF_SIGNATURE_MIN
}

/// Decide which payload, if any, an RTF body encapsulates.
///
/// Only the first `window` bytes are inspected; a marker must lie entirely
/// inside that window. When both markers are present the earlier one wins.
///
/// # Examples
///
/// ```rust
/// use rtfex::common::detection::{EncapsulationKind, detect_encapsulation};
///
/// let kind = detect_encapsulation(b"{\\rtf1\\ansi\\fromhtml1 \\deff0}", 100);
/// assert_eq!(kind, EncapsulationKind::Html);
/// ```
pub fn detect_encapsulation(bytes: &[u8], window: usize) -> EncapsulationKind {
    let head = &bytes[..bytes.len().min(window)];

    match (memmem::find(head, FROM_HTML), memmem::find(head, FROM_TEXT)) {
        (Some(html), Some(text)) if text < html => EncapsulationKind::Text,
        (Some(_), _) => EncapsulationKind::Html,
        (None, Some(_)) => EncapsulationKind::Text,
        (None, None) => EncapsulationKind::None,
    }
}
