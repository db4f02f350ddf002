//! Configuration types for RTF de-encapsulation.

use crate::common::detection::DEFAULT_DETECTION_WINDOW;
use crate::common::encoding::{CharsetResolver, StandardCharsetResolver};
use encoding_rs::Encoding;
use std::fmt;
use std::sync::Arc;

/// Configuration options for extraction.
///
/// # Examples
///
/// ```rust
/// use rtfex::rtf::ExtractOptions;
///
/// // Create with defaults
/// let options = ExtractOptions::default();
///
/// // Or customize
/// let options = ExtractOptions::new()
///     .with_default_encoding(encoding_rs::WINDOWS_1251)
///     .with_detection_window(256)
///     .with_html_meta(false);
/// ```
#[derive(Clone)]
pub struct ExtractOptions {
    /// Document charset until the header declares one
    pub default_encoding: &'static Encoding,
    /// Leading bytes searched for `\fromhtml` / `\fromtext`
    pub detection_window: usize,
    /// Insert a UTF-8 `<meta>` charset declaration into HTML results
    pub inject_html_meta: bool,
    /// Resolves `\ansicpg` code pages
    pub resolver: Arc<dyn CharsetResolver>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            default_encoding: encoding_rs::WINDOWS_1252,
            detection_window: DEFAULT_DETECTION_WINDOW,
            inject_html_meta: true,
            resolver: Arc::new(StandardCharsetResolver::new()),
        }
    }
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("default_encoding", &self.default_encoding.name())
            .field("detection_window", &self.detection_window)
            .field("inject_html_meta", &self.inject_html_meta)
            .finish_non_exhaustive()
    }
}

impl ExtractOptions {
    /// Create a new `ExtractOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the charset assumed before `\ansi`, `\mac` or `\ansicpg`.
    #[inline]
    pub fn with_default_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    /// Set how many leading bytes are searched for the encapsulation markers.
    #[inline]
    pub fn with_detection_window(mut self, window: usize) -> Self {
        self.detection_window = window;
        self
    }

    /// Set whether HTML results get a UTF-8 `<meta>` declaration.
    #[inline]
    pub fn with_html_meta(mut self, inject: bool) -> Self {
        self.inject_html_meta = inject;
        self
    }

    /// Use a custom charset resolver.
    #[inline]
    pub fn with_resolver(mut self, resolver: Arc<dyn CharsetResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}
