//! RTF lexer/tokenizer.
//!
//! This module turns a raw RTF byte stream into primitive tokens. It works on
//! bytes rather than text: RTF is 7-bit syntax around 8-bit runs whose charset
//! is only known to the parser, so decoding happens later, in the output stage.

use super::reader::PushbackReader;
use smallvec::SmallVec;
use std::io::{self, Read};

/// Longest control word name accepted, per the RTF specification.
const MAX_WORD_LEN: usize = 32;

/// Longest numeric parameter accepted (sign included).
const MAX_PARAM_LEN: usize = 11;

/// Control word with optional parameter.
///
/// Only the words the de-encapsulator acts on are named; everything else is
/// [`ControlWord::Unknown`]. Words that require a parameter but were written
/// without one are also unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlWord {
    // Document character set
    Ansi,
    AnsiCodePage(i32),
    Mac,
    Pc,
    Pca,

    // Encapsulation markers
    FromHtml,
    FromText,

    // Fonts
    DefaultFont(i32),
    FontNumber(i32),
    FontCharset(i32),

    // Header terminators
    Par,
    Pard,
    Section,
    SectionDefault,
    Plain,
    LtrChar,
    RtlChar,

    // Breaks
    Line,
    Row,
    Tab,
    Cell,

    // Special characters
    Special(char),

    // Unicode
    Unicode(i32),
    UnicodeSkip(i32),

    // HTML encapsulation
    HtmlTag,
    HtmlRtf(bool),

    // Non-content destinations (font table, pictures, ...)
    Destination,

    // Binary data
    Binary(i32),

    // Unknown control word
    Unknown,
}

impl ControlWord {
    /// Whether this word ends the document header.
    #[inline]
    pub fn ends_header(self) -> bool {
        matches!(
            self,
            ControlWord::Par
                | ControlWord::Pard
                | ControlWord::Section
                | ControlWord::SectionDefault
                | ControlWord::Plain
                | ControlWord::LtrChar
                | ControlWord::RtlChar
        )
    }
}

/// Destination words whose content is never document text.
static DESTINATIONS: phf::Set<&'static [u8]> = phf::phf_set! {
    b"fonttbl",
    b"colortbl",
    b"stylesheet",
    b"info",
    b"pict",
    b"object",
    b"listtable",
    b"listoverridetable",
    b"revtbl",
    b"rsidtbl",
    b"generator",
    b"xmlnstbl",
    b"themedata",
    b"colorschememapping",
    b"latentstyles",
    b"datastore",
    b"filetbl",
    b"mmathPr",
};

/// Token types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Opening brace; `ignorable` is set when the group starts with `\*`
    OpenBrace { ignorable: bool },
    /// Closing brace
    CloseBrace,
    /// Control word
    Control(ControlWord),
    /// Control symbol (`\~`, `\-`, `\*`, ...)
    Symbol(u8),
    /// Byte from a `\'hh` escape
    Hex(u8),
    /// Escaped syntax character (`\{`, `\}`, `\\`, `\<CR>`, `\<LF>`)
    Escaped(u8),
    /// Plain text byte
    Text(u8),
}

/// Streaming RTF lexer.
#[derive(Debug)]
pub struct Lexer<R> {
    reader: PushbackReader<R>,
    /// Reusable buffer for control word names
    word: SmallVec<[u8; MAX_WORD_LEN]>,
}

impl<R: Read> Lexer<R> {
    /// Create a new lexer over a byte source.
    pub fn new(source: R) -> Self {
        Self {
            reader: PushbackReader::new(source),
            word: SmallVec::new(),
        }
    }

    /// Get the next token, `None` at end of input.
    ///
    /// # Errors
    ///
    /// Fails only when the byte source fails.
    pub fn next_token(&mut self) -> io::Result<Option<Token>> {
        loop {
            let Some(byte) = self.reader.read_byte()? else {
                return Ok(None);
            };

            let token = match byte {
                b'{' => Some(Token::OpenBrace {
                    ignorable: self.peek_ignorable()?,
                }),
                b'}' => Some(Token::CloseBrace),
                b'\\' => self.parse_control()?,
                // Raw line breaks are not significant in RTF
                b'\r' | b'\n' => None,
                _ => Some(Token::Text(byte)),
            };

            if let Some(token) = token {
                return Ok(Some(token));
            }
        }
    }

    /// Look for `\*` right after an opening brace without consuming it.
    fn peek_ignorable(&mut self) -> io::Result<bool> {
        let Some(first) = self.reader.read_byte()? else {
            return Ok(false);
        };
        if first != b'\\' {
            self.reader.unread(first);
            return Ok(false);
        }

        let second = self.reader.read_byte()?;
        if let Some(second) = second {
            self.reader.unread(second);
        }
        self.reader.unread(first);
        Ok(second == Some(b'*'))
    }

    /// Parse whatever follows a backslash.
    fn parse_control(&mut self) -> io::Result<Option<Token>> {
        let Some(byte) = self.reader.read_byte()? else {
            return Ok(None);
        };

        match byte {
            b'\'' => self.parse_hex(),
            b'{' | b'}' | b'\\' | b'\r' | b'\n' => Ok(Some(Token::Escaped(byte))),
            b if b.is_ascii_alphabetic() => self.parse_word(b).map(Some),
            _ => Ok(Some(Token::Symbol(byte))),
        }
    }

    /// Parse hexadecimal character escape (\').
    ///
    /// A non-hex digit is pushed back and the escape is dropped.
    fn parse_hex(&mut self) -> io::Result<Option<Token>> {
        let Some(high) = self.read_hex_digit()? else {
            return Ok(None);
        };
        let Some(low) = self.read_hex_digit()? else {
            return Ok(None);
        };
        Ok(Some(Token::Hex((high << 4) | low)))
    }

    fn read_hex_digit(&mut self) -> io::Result<Option<u8>> {
        let Some(byte) = self.reader.read_byte()? else {
            return Ok(None);
        };
        let value = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => {
                self.reader.unread(byte);
                return Ok(None);
            },
        };
        Ok(Some(value))
    }

    /// Parse a control word starting with `first`.
    fn parse_word(&mut self, first: u8) -> io::Result<Token> {
        self.word.clear();
        self.word.push(first);

        let mut next = self.reader.read_byte()?;
        while let Some(byte) = next
            && byte.is_ascii_alphabetic()
        {
            if self.word.len() < MAX_WORD_LEN {
                self.word.push(byte);
            }
            next = self.reader.read_byte()?;
        }

        let param = self.parse_numeric_parameter(next)?;

        let control = match_control_word(&self.word, param);
        if control == ControlWord::Unknown {
            tracing::trace!(
                word = %String::from_utf8_lossy(&self.word),
                ?param,
                "unhandled control word"
            );
        }

        // Skip the binary payload of \binN so it never reaches the output
        if let ControlWord::Binary(size) = control
            && size > 0
        {
            self.reader.skip(size as u64)?;
        }

        Ok(Token::Control(control))
    }

    /// Parse the optional signed parameter, starting at `next`, and the
    /// single space that may terminate the control word.
    fn parse_numeric_parameter(&mut self, mut next: Option<u8>) -> io::Result<Option<i32>> {
        let mut digits = SmallVec::<[u8; MAX_PARAM_LEN + 1]>::new();

        if next == Some(b'-') {
            let after = self.reader.read_byte()?;
            match after {
                Some(byte) if byte.is_ascii_digit() => {
                    digits.push(b'-');
                    next = after;
                },
                _ => {
                    // A lone '-' is text, not a sign
                    if let Some(byte) = after {
                        self.reader.unread(byte);
                    }
                    self.reader.unread(b'-');
                    return Ok(None);
                },
            }
        }

        while let Some(byte) = next
            && byte.is_ascii_digit()
        {
            digits.push(byte);
            next = self.reader.read_byte()?;
        }

        match next {
            Some(b' ') | None => {},
            Some(byte) => self.reader.unread(byte),
        }

        if digits.is_empty() {
            return Ok(None);
        }
        // Out-of-range parameters wrap like a 32-bit accumulator would
        Ok(atoi_simd::parse::<i64, false, false>(&digits).ok().map(|n| n as i32))
    }

    /// Consume the lexer, returning every remaining token.
    #[cfg(test)]
    pub(crate) fn tokenize(&mut self) -> io::Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Match control word name to enum variant.
#[allow(clippy::match_same_arms)]
fn match_control_word(word: &[u8], param: Option<i32>) -> ControlWord {
    match (word, param) {
        // Document
        (b"ansi", _) => ControlWord::Ansi,
        (b"ansicpg", Some(n)) => ControlWord::AnsiCodePage(n),
        (b"mac", _) => ControlWord::Mac,
        (b"pc", _) => ControlWord::Pc,
        (b"pca", _) => ControlWord::Pca,
        (b"fromhtml", _) => ControlWord::FromHtml,
        (b"fromtext", _) => ControlWord::FromText,

        // Fonts
        (b"deff", Some(n)) => ControlWord::DefaultFont(n),
        (b"f", Some(n)) => ControlWord::FontNumber(n),
        (b"fcharset", Some(n)) => ControlWord::FontCharset(n),

        // Header terminators
        (b"par", _) => ControlWord::Par,
        (b"pard", _) => ControlWord::Pard,
        (b"sect", _) => ControlWord::Section,
        (b"sectd", _) => ControlWord::SectionDefault,
        (b"plain", _) => ControlWord::Plain,
        (b"ltrch", _) => ControlWord::LtrChar,
        (b"rtlch", _) => ControlWord::RtlChar,

        // Breaks
        (b"line", _) => ControlWord::Line,
        (b"row", _) => ControlWord::Row,
        (b"tab", _) => ControlWord::Tab,
        (b"cell", _) => ControlWord::Cell,

        // Special characters
        (b"emdash", _) => ControlWord::Special('\u{2014}'),
        (b"endash", _) => ControlWord::Special('\u{2013}'),
        (b"emspace", _) => ControlWord::Special('\u{2003}'),
        (b"enspace", _) => ControlWord::Special('\u{2002}'),
        (b"qmspace", _) => ControlWord::Special('\u{2005}'),
        (b"bullet", _) => ControlWord::Special('\u{2022}'),
        (b"lquote", _) => ControlWord::Special('\u{2018}'),
        (b"rquote", _) => ControlWord::Special('\u{2019}'),
        (b"ldblquote", _) => ControlWord::Special('\u{201C}'),
        (b"rdblquote", _) => ControlWord::Special('\u{201D}'),
        (b"zwj", _) => ControlWord::Special('\u{200D}'),
        (b"zwnj", _) => ControlWord::Special('\u{200C}'),
        (b"ltrmark", _) => ControlWord::Special('\u{200E}'),
        (b"rtlmark", _) => ControlWord::Special('\u{200F}'),

        // Unicode
        (b"u", Some(n)) => ControlWord::Unicode(n),
        (b"uc", Some(n)) => ControlWord::UnicodeSkip(n),

        // HTML encapsulation
        (b"htmltag", _) => ControlWord::HtmlTag,
        (b"htmlrtf", p) => ControlWord::HtmlRtf(p.unwrap_or(1) != 0),

        // Binary data
        (b"bin", Some(n)) => ControlWord::Binary(n),

        (name, _) if DESTINATIONS.contains(name) => ControlWord::Destination,

        _ => ControlWord::Unknown,
    }
}
