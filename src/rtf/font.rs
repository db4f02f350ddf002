//! Font table: font number to charset.

use encoding_rs::Encoding;
use std::collections::HashMap;

/// Font reference number (`\fN`).
pub type FontRef = i32;

/// Charsets declared in the document's `\fonttbl`.
///
/// Unlike group state, the table is document-wide: an entry recorded inside
/// the font table group stays valid after that group closes.
#[derive(Debug, Clone, Default)]
pub struct FontTable {
    fonts: HashMap<FontRef, &'static Encoding>,
}

impl FontTable {
    /// Create a new font table.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the charset of a font, replacing any earlier entry.
    #[inline]
    pub fn insert(&mut self, font: FontRef, encoding: &'static Encoding) {
        self.fonts.insert(font, encoding);
    }

    /// Charset of a font, `None` if the font is not declared.
    #[inline]
    pub fn get(&self, font: FontRef) -> Option<&'static Encoding> {
        self.fonts.get(&font).copied()
    }

    /// Number of fonts with a known charset.
    #[inline]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether no font charset is known.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
