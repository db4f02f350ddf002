//! RTF de-encapsulation module.
//!
//! Mail clients that send HTML or plain-text messages through an RTF-only
//! channel wrap the original body in RTF as described by [MS-OXRTFEX]. This
//! module recovers that body: it tokenizes the RTF stream, tracks the state
//! of every nested group and decodes the text with the charset in effect at
//! each point.
//!
//! # Architecture
//!
//! The extractor is organized into several components:
//! - **Lexer**: Tokenizes RTF input into control words, symbols and text bytes
//! - **Parser**: Tracks the header, font table and group stack, and decides
//!   which bytes belong to the output
//! - **Output**: Decodes byte runs with the active charset and merges them with
//!   Unicode escapes
//! - **Extractor**: Detects the encapsulated kind and memoizes the result
//!
//! # Example
//!
//! ```rust
//! use rtfex::rtf::RtfDeEncapsulator;
//!
//! let rtf = br"{\rtf1\ansi\ansicpg1251\fromtext\pard \'cf\'f0\'e8\'e2\'e5\'f2}";
//! let mut extractor = RtfDeEncapsulator::new(&rtf[..])?;
//! assert_eq!(extractor.text()?, Some("Привет"));
//! # Ok::<(), rtfex::rtf::RtfError>(())
//! ```
//!
//! [MS-OXRTFEX]: https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxrtfex

#[cfg(feature = "compressed")]
mod compressed;
mod config;
mod error;
mod extractor;
mod font;
pub mod html;
mod lexer;
mod output;
mod parser;
mod reader;
mod state;

// Re-exports
#[cfg(feature = "compressed")]
pub use compressed::{decompress, is_compressed_rtf};
pub use config::ExtractOptions;
pub use error::{RtfError, RtfResult};
pub use extractor::{DeEncapsulated, RtfDeEncapsulator, de_encapsulate};
pub use font::{FontRef, FontTable};
pub use lexer::{ControlWord, Lexer, Token};

pub use crate::common::detection::EncapsulationKind;
