//! RTF parser that drives de-encapsulation.
//!
//! The parser pulls tokens from the lexer and keeps the document-wide state:
//! the header flag, the document charset, the font table, the Unicode shadow
//! counter and the group stack. Text bytes and characters that are visible in
//! the current group go to the output assembler.

use super::font::{FontRef, FontTable};
use super::lexer::{ControlWord, Lexer, Token};
use super::output::OutputAssembler;
use super::state::GroupStack;
use crate::common::detection::EncapsulationKind;
use crate::common::encoding::{CharsetResolver, fcharset_to_encoding};
use encoding_rs::Encoding;
use std::io::{self, Read};
use std::ops::ControlFlow;

/// Output of a parse run.
#[derive(Debug)]
pub(crate) struct ParsedBody {
    pub(crate) text: String,
    /// First `\fromhtml` or `\fromtext` seen in the header
    pub(crate) marker: EncapsulationKind,
}

/// RTF Parser.
pub(crate) struct Parser<'a, R> {
    lexer: Lexer<R>,
    resolver: &'a dyn CharsetResolver,
    /// State stack (for handling groups)
    groups: GroupStack,
    fonts: FontTable,
    output: OutputAssembler,
    /// Document charset, used when the current group selects no font charset
    charset: &'static Encoding,
    default_font: Option<FontRef>,
    current_font: Option<FontRef>,
    in_header: bool,
    marker: EncapsulationKind,
    /// Fallback bytes still to drop after a `\u` escape
    unicode_shadow: u32,
}

impl<'a, R: Read> Parser<'a, R> {
    /// Create a new parser.
    pub(crate) fn new(
        lexer: Lexer<R>,
        charset: &'static Encoding,
        resolver: &'a dyn CharsetResolver,
    ) -> Self {
        Self {
            lexer,
            resolver,
            groups: GroupStack::new(),
            fonts: FontTable::new(),
            output: OutputAssembler::new(),
            charset,
            default_font: None,
            current_font: None,
            in_header: true,
            marker: EncapsulationKind::None,
            unicode_shadow: 0,
        }
    }

    /// Run the parser to the end of the document or of the input.
    ///
    /// # Errors
    ///
    /// Fails only when the byte source fails.
    pub(crate) fn parse(mut self) -> io::Result<ParsedBody> {
        while let Some(token) = self.lexer.next_token()? {
            if self.process_token(token).is_break() {
                tracing::debug!("end of RTF document");
                break;
            }
        }

        let encoding = self.effective_encoding();
        Ok(ParsedBody {
            text: self.output.finish(encoding),
            marker: self.marker,
        })
    }

    fn process_token(&mut self, token: Token) -> ControlFlow<()> {
        match token {
            Token::OpenBrace { ignorable } => {
                self.groups.push();
                if ignorable {
                    self.groups.current_mut().set_ignorable(true);
                }
            },
            Token::CloseBrace => return self.close_group(),
            Token::Control(word) => self.process_control_word(word),
            Token::Symbol(symbol) => self.process_symbol(symbol),
            Token::Hex(byte) | Token::Escaped(byte) | Token::Text(byte) => {
                self.process_text_byte(byte);
            },
        }
        ControlFlow::Continue(())
    }

    fn close_group(&mut self) -> ControlFlow<()> {
        self.flush();
        // Fallback bytes never extend past the group of their `\u`
        self.unicode_shadow = 0;

        let document_closed = self.groups.depth() <= 1;
        // Anything a header group produced (font names, generator strings) is noise
        if self.in_header && !document_closed {
            tracing::trace!(depth = self.groups.depth(), "discarding header output");
            self.output.discard();
        }

        if self.groups.pop() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn process_text_byte(&mut self, byte: u8) {
        if self.unicode_shadow > 0 {
            self.unicode_shadow -= 1;
            return;
        }
        if self.groups.current().is_visible() {
            self.output.push_byte(byte);
        }
    }

    fn process_symbol(&mut self, symbol: u8) {
        let ch = match symbol {
            b'~' => '\u{00A0}',
            b'-' => '\u{00AD}',
            b'_' => '\u{2011}',
            // `\*` was already handled when its group opened
            _ => return,
        };
        self.emit_char(ch);
    }

    fn process_control_word(&mut self, word: ControlWord) {
        if self.in_header {
            if !word.ends_header() {
                self.process_header_word(word);
                return;
            }
            self.leave_header();
        }
        self.process_body_word(word);
    }

    fn process_header_word(&mut self, word: ControlWord) {
        match word {
            ControlWord::Ansi => self.set_document_charset(encoding_rs::WINDOWS_1252),
            ControlWord::Mac => self.set_document_charset(encoding_rs::MACINTOSH),
            ControlWord::Pc => self.set_document_charset(self.resolver.resolve_codepage(437)),
            ControlWord::Pca => self.set_document_charset(self.resolver.resolve_codepage(850)),
            ControlWord::AnsiCodePage(codepage) => {
                self.set_document_charset(self.resolver.resolve_codepage(codepage));
            },
            ControlWord::FromHtml => self.record_marker(EncapsulationKind::Html),
            ControlWord::FromText => self.record_marker(EncapsulationKind::Text),
            ControlWord::FontNumber(font) => self.current_font = Some(font),
            ControlWord::DefaultFont(font) => self.default_font = Some(font),
            ControlWord::FontCharset(fcharset) => {
                let Some(font) = self.current_font else {
                    return;
                };
                match fcharset_to_encoding(fcharset) {
                    Some(encoding) => self.fonts.insert(font, encoding),
                    None => tracing::trace!(font, fcharset, "no encoding for font charset"),
                }
            },
            ControlWord::Destination => self.groups.current_mut().set_ignorable(true),
            _ => {},
        }
    }

    /// Switch the document charset; bytes so far keep the old one.
    fn set_document_charset(&mut self, encoding: &'static Encoding) {
        self.flush();
        self.charset = encoding;
    }

    fn record_marker(&mut self, kind: EncapsulationKind) {
        if self.marker == EncapsulationKind::None {
            self.marker = kind;
        }
    }

    fn leave_header(&mut self) {
        self.in_header = false;

        // The default font's charset becomes the document charset, whatever
        // group the header happens to end in
        if let Some(encoding) = self.default_font.and_then(|font| self.fonts.get(font)) {
            self.set_document_charset(encoding);
        }

        tracing::debug!(
            charset = self.charset.name(),
            fonts = self.fonts.len(),
            "end of RTF header"
        );
    }

    fn process_body_word(&mut self, word: ControlWord) {
        match word {
            ControlWord::FontNumber(font) => {
                self.flush();
                self.current_font = Some(font);
                let encoding = self.fonts.get(font);
                tracing::trace!(font, encoding = encoding.map(Encoding::name), "font switch");
                self.groups.current_mut().font_charset = encoding;
            },
            ControlWord::UnicodeSkip(skip) => {
                self.groups.current_mut().unicode_skip = u32::try_from(skip).unwrap_or(0);
            },
            ControlWord::Unicode(code) => {
                // No flush: a surrogate pair spans two escapes
                if self.groups.current().is_visible() {
                    let encoding = self.effective_encoding();
                    // Negative parameters encode code units above 0x7FFF
                    self.output.push_unit(code as u16, encoding);
                }
                self.unicode_shadow = self.groups.current().unicode_skip;
            },
            ControlWord::HtmlTag => {
                self.flush();
                self.groups.current_mut().toggle_html_tag();
            },
            ControlWord::HtmlRtf(enabled) => {
                self.flush();
                self.groups.current_mut().set_html_rtf(enabled);
            },
            ControlWord::Destination => self.groups.current_mut().set_ignorable(true),
            ControlWord::Par | ControlWord::Line | ControlWord::Row => self.emit_str("\r\n"),
            ControlWord::Tab | ControlWord::Cell => self.emit_char('\t'),
            ControlWord::Special(ch) => self.emit_char(ch),
            _ => {},
        }
    }

    fn emit_char(&mut self, ch: char) {
        if self.groups.current().is_visible() {
            let encoding = self.effective_encoding();
            self.output.push_char(ch, encoding);
        }
    }

    fn emit_str(&mut self, text: &str) {
        if self.groups.current().is_visible() {
            let encoding = self.effective_encoding();
            self.output.push_str(text, encoding);
        }
    }

    fn flush(&mut self) {
        let encoding = self.effective_encoding();
        self.output.flush(encoding);
    }

    /// Charset of the current group's font, else the document charset.
    #[inline]
    fn effective_encoding(&self) -> &'static Encoding {
        self.groups.current().font_charset.unwrap_or(self.charset)
    }
}
