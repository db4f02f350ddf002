//! rtfex - A Rust library for de-encapsulating HTML and plain text from RTF
//!
//! Outlook and Exchange store many message bodies only as RTF. When the
//! original message was HTML or plain text, that RTF is an envelope around the
//! original body ([MS-OXRTFEX]). This library unwraps it.
//!
//! # Features
//!
//! - **Streaming lexer**: Tokenizes RTF from any [`std::io::Read`]
//! - **Charset aware**: Follows `\ansicpg`, `\fcharset` and `\u` escapes
//! - **HTML and text**: Detects `\fromhtml` and `\fromtext` up front
//! - **Compressed RTF**: Unwraps `LZFu`/`MELA` containers (feature `compressed`)
//!
//! # Example - Extracting HTML
//!
//! ```rust
//! use rtfex::rtf::RtfDeEncapsulator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rtf = br"{\rtf1\ansi\fromhtml1 \pard\htmltag64<html><head></head><body>\htmltag60Hi\htmltag64</body></html>}";
//! let mut extractor = RtfDeEncapsulator::new(&rtf[..])?;
//!
//! if let Some(html) = extractor.html()? {
//!     assert!(html.starts_with("<html><head><meta "));
//!     assert!(html.ends_with("<body>Hi</body></html>"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - One-shot extraction
//!
//! ```rust
//! use rtfex::rtf::de_encapsulate;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = de_encapsulate(br"{\rtf1\ansi\fromtext\pard Hello\par World}")?;
//! assert_eq!(result.text(), Some("Hello\r\nWorld"));
//! # Ok(())
//! # }
//! ```
//!
//! [MS-OXRTFEX]: https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxrtfex

/// Format detection and charset resolution
pub mod common;

/// RTF de-encapsulation
///
/// This module provides the tokenizer, the group-state machine and the
/// charset-switching output used to recover encapsulated message bodies.
pub mod rtf;

// Re-export commonly used types for convenience
pub use rtf::{DeEncapsulated, ExtractOptions, RtfDeEncapsulator, RtfError, RtfResult, de_encapsulate};
