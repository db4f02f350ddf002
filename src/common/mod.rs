//! Common types and utilities shared by the RTF modules.
//!
//! This module holds the format sniffing and the charset resolution that the
//! de-encapsulator relies on but that are useful on their own.

// Submodule declarations
pub mod detection;
pub mod encoding;

// Re-exports for convenience
pub use detection::{EncapsulationKind, detect_encapsulation, detect_rtf_format};
pub use encoding::{CharsetResolver, StandardCharsetResolver, resolve_charset};
