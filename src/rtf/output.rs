//! Output assembly.
//!
//! Text reaches the output along two paths: raw bytes, which must be decoded
//! with the charset in effect, and UTF-16 code units from `\u` escapes and
//! control symbols, which are already decoded. Each path has a pending buffer
//! and at most one of them is non-empty: appending to one flushes the other,
//! so the original order is kept.

use encoding_rs::Encoding;

/// Builds the extracted string.
#[derive(Debug, Default)]
pub(crate) struct OutputAssembler {
    result: String,
    /// Bytes in the current charset, not yet decoded
    pending_bytes: Vec<u8>,
    /// UTF-16 code units, kept together so surrogate pairs survive
    pending_chars: Vec<u16>,
    /// Charset used by the previous byte flush
    last_encoding: Option<&'static Encoding>,
}

impl OutputAssembler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a raw byte belonging to the current charset.
    #[inline]
    pub(crate) fn push_byte(&mut self, byte: u8) {
        if !self.pending_chars.is_empty() {
            self.flush_chars();
        }
        self.pending_bytes.push(byte);
    }

    /// Append a UTF-16 code unit.
    ///
    /// Pending bytes are decoded with `encoding` first.
    #[inline]
    pub(crate) fn push_unit(&mut self, unit: u16, encoding: &'static Encoding) {
        if !self.pending_bytes.is_empty() {
            self.flush_bytes(encoding);
        }
        self.pending_chars.push(unit);
    }

    /// Append a character.
    pub(crate) fn push_char(&mut self, ch: char, encoding: &'static Encoding) {
        let mut units = [0u16; 2];
        for &unit in ch.encode_utf16(&mut units).iter() {
            self.push_unit(unit, encoding);
        }
    }

    /// Append an ASCII string.
    pub(crate) fn push_str(&mut self, text: &str, encoding: &'static Encoding) {
        for ch in text.chars() {
            self.push_char(ch, encoding);
        }
    }

    /// Move everything pending into the result.
    pub(crate) fn flush(&mut self, encoding: &'static Encoding) {
        if !self.pending_bytes.is_empty() {
            self.flush_bytes(encoding);
        }
        if !self.pending_chars.is_empty() {
            self.flush_chars();
        }
    }

    /// Drop everything produced so far, pending or not.
    pub(crate) fn discard(&mut self) {
        self.result.clear();
        self.pending_bytes.clear();
        self.pending_chars.clear();
    }

    /// Flush and return the assembled string.
    pub(crate) fn finish(mut self, encoding: &'static Encoding) -> String {
        self.flush(encoding);
        self.result
    }

    fn flush_bytes(&mut self, encoding: &'static Encoding) {
        if self.last_encoding != Some(encoding) {
            tracing::trace!(encoding = encoding.name(), "switching output charset");
            self.last_encoding = Some(encoding);
        }

        // Undecodable sequences become U+FFFD
        let (text, had_errors) = encoding.decode_without_bom_handling(&self.pending_bytes);
        if had_errors {
            tracing::trace!(
                encoding = encoding.name(),
                len = self.pending_bytes.len(),
                "replaced undecodable bytes"
            );
        }
        self.result.push_str(&text);
        self.pending_bytes.clear();
    }

    fn flush_chars(&mut self) {
        self.result.extend(
            char::decode_utf16(self.pending_chars.iter().copied())
                .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER)),
        );
        self.pending_chars.clear();
    }
}
