//! De-encapsulation entry points.
//!
//! [`RtfDeEncapsulator`] wraps one RTF byte stream. The encapsulation kind is
//! decided once, from the leading bytes, when the extractor is built; the body
//! is parsed on the first call to [`RtfDeEncapsulator::extract`] and cached.

use super::config::ExtractOptions;
use super::error::{RtfError, RtfResult};
use super::html::inject_utf8_meta;
use super::lexer::Lexer;
use super::parser::{ParsedBody, Parser};
use crate::common::detection::{EncapsulationKind, detect_encapsulation};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Cursor, Read};

/// Peeked prefix followed by the rest of the stream.
type Source<R> = io::Chain<Cursor<Vec<u8>>, R>;

/// Extracts the HTML or plain-text body wrapped in an RTF message body.
///
/// # Examples
///
/// ```rust
/// use rtfex::rtf::RtfDeEncapsulator;
///
/// let rtf = br"{\rtf1\ansi\fromtext\pard Hello\par World}";
/// let mut extractor = RtfDeEncapsulator::new(&rtf[..])?;
///
/// assert!(extractor.is_text());
/// assert_eq!(extractor.extract()?, "Hello\r\nWorld");
/// # Ok::<(), rtfex::rtf::RtfError>(())
/// ```
pub struct RtfDeEncapsulator<R> {
    /// Taken by the first extraction
    source: Option<Source<R>>,
    kind: EncapsulationKind,
    options: ExtractOptions,
    result: Option<String>,
}

impl<R: Read> RtfDeEncapsulator<R> {
    /// Create an extractor with default options.
    ///
    /// # Errors
    ///
    /// Fails if reading the leading bytes for detection fails.
    pub fn new(reader: R) -> RtfResult<Self> {
        Self::with_options(reader, ExtractOptions::default())
    }

    /// Create an extractor with custom options.
    ///
    /// Up to `options.detection_window` bytes are read ahead to detect the
    /// encapsulation kind. They are replayed to the parser, so nothing is lost.
    ///
    /// # Errors
    ///
    /// Fails if reading the leading bytes for detection fails.
    pub fn with_options(mut reader: R, options: ExtractOptions) -> RtfResult<Self> {
        let mut head = Vec::new();
        reader
            .by_ref()
            .take(options.detection_window as u64)
            .read_to_end(&mut head)?;

        let kind = detect_encapsulation(&head, options.detection_window);
        tracing::debug!(?kind, window = options.detection_window, "detected RTF encapsulation");

        Ok(Self {
            source: Some(Cursor::new(head).chain(reader)),
            kind,
            options,
            result: None,
        })
    }

    /// Kind of payload detected in the leading bytes.
    #[inline]
    pub fn kind(&self) -> EncapsulationKind {
        self.kind
    }

    /// Whether the document was marked `\fromhtml`.
    #[inline]
    pub fn is_html(&self) -> bool {
        self.kind.is_html()
    }

    /// Whether the document was marked `\fromtext`.
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind.is_text()
    }

    /// Extract the encapsulated body.
    ///
    /// The first call parses the whole stream; later calls return the cached
    /// result. HTML results get a UTF-8 `<meta>` declaration unless disabled in
    /// the options.
    ///
    /// # Errors
    ///
    /// Fails only when the underlying reader fails. A later call after such a
    /// failure returns [`RtfError::SourceConsumed`].
    pub fn extract(&mut self) -> RtfResult<&str> {
        let text = match self.result.take() {
            Some(text) => text,
            None => self.parse_source()?,
        };
        Ok(self.result.insert(text).as_str())
    }

    /// The extracted HTML, or `None` if the document does not wrap HTML.
    ///
    /// # Errors
    ///
    /// See [`extract`](Self::extract).
    pub fn html(&mut self) -> RtfResult<Option<&str>> {
        if !self.kind.is_html() {
            return Ok(None);
        }
        self.extract().map(Some)
    }

    /// The extracted plain text, or `None` if the document does not wrap text.
    ///
    /// # Errors
    ///
    /// See [`extract`](Self::extract).
    pub fn text(&mut self) -> RtfResult<Option<&str>> {
        if !self.kind.is_text() {
            return Ok(None);
        }
        self.extract().map(Some)
    }

    /// Extract the body and consume the extractor.
    ///
    /// # Errors
    ///
    /// See [`extract`](Self::extract).
    pub fn into_body(mut self) -> RtfResult<String> {
        self.extract()?;
        Ok(self.result.unwrap_or_default())
    }

    fn parse_source(&mut self) -> RtfResult<String> {
        let source = self.source.take().ok_or(RtfError::SourceConsumed)?;

        let parser = Parser::new(
            Lexer::new(source),
            self.options.default_encoding,
            self.options.resolver.as_ref(),
        );
        let ParsedBody { text, marker } = parser.parse()?;
        if marker != self.kind {
            tracing::debug!(
                detected = ?self.kind,
                ?marker,
                "header marker disagrees with detection window"
            );
        }

        if self.kind.is_html() && self.options.inject_html_meta {
            Ok(inject_utf8_meta(&text))
        } else {
            Ok(text)
        }
    }
}

impl<'a> RtfDeEncapsulator<Cursor<Cow<'a, [u8]>>> {
    /// Create an extractor over an in-memory RTF body.
    ///
    /// Compressed RTF containers (`LZFu`/`MELA`) are decompressed first.
    ///
    /// # Errors
    ///
    /// Fails if the data is a corrupt compressed container.
    pub fn from_bytes(data: &'a [u8]) -> RtfResult<Self> {
        Self::from_bytes_with_options(data, ExtractOptions::default())
    }

    /// Create an extractor over an in-memory RTF body with custom options.
    ///
    /// # Errors
    ///
    /// Fails if the data is a corrupt compressed container.
    pub fn from_bytes_with_options(data: &'a [u8], options: ExtractOptions) -> RtfResult<Self> {
        Self::with_options(Cursor::new(unpack(data)?), options)
    }
}

impl<R> fmt::Debug for RtfDeEncapsulator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtfDeEncapsulator")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .field("extracted", &self.result.is_some())
            .finish_non_exhaustive()
    }
}

/// Raw RTF bytes, decompressed if `data` is a compressed container.
fn unpack(data: &[u8]) -> RtfResult<Cow<'_, [u8]>> {
    #[cfg(feature = "compressed")]
    {
        if super::compressed::is_compressed_rtf(data) {
            return super::compressed::decompress(data).map(Cow::Owned);
        }
    }
    Ok(Cow::Borrowed(data))
}

/// Result of a one-shot de-encapsulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeEncapsulated {
    /// Detected payload kind
    pub kind: EncapsulationKind,
    /// Extracted body
    pub body: String,
}

impl DeEncapsulated {
    /// The body if it is HTML.
    pub fn html(&self) -> Option<&str> {
        self.kind.is_html().then_some(self.body.as_str())
    }

    /// The body if it is plain text.
    pub fn text(&self) -> Option<&str> {
        self.kind.is_text().then_some(self.body.as_str())
    }
}

/// Detect and extract the body of an in-memory RTF message body.
///
/// # Errors
///
/// Fails if the data is a corrupt compressed container.
///
/// # Examples
///
/// ```rust
/// use rtfex::rtf::de_encapsulate;
///
/// let rtf = br"{\rtf1\ansi\fromhtml1 \pard\htmltag64<p>\htmltag60Hi\htmltag64</p>}";
/// let result = de_encapsulate(rtf)?;
///
/// assert!(result.html().unwrap().ends_with("<p>Hi</p>"));
/// assert_eq!(result.text(), None);
/// # Ok::<(), rtfex::rtf::RtfError>(())
/// ```
pub fn de_encapsulate(data: &[u8]) -> RtfResult<DeEncapsulated> {
    let extractor = RtfDeEncapsulator::from_bytes(data)?;
    let kind = extractor.kind();
    let body = extractor.into_body()?;
    Ok(DeEncapsulated { kind, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::encoding::CharsetResolver;
    use crate::rtf::html::UTF8_META;
    use encoding_rs::Encoding;
    use std::sync::Arc;

    /// Yields its data, then fails.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream closed")),
                n => Ok(n),
            }
        }
    }

    fn extract(rtf: &[u8]) -> String {
        RtfDeEncapsulator::new(rtf).unwrap().into_body().unwrap()
    }

    #[test]
    fn test_detect_html() {
        let extractor = RtfDeEncapsulator::new(&br"{\rtf1\ansi\fromhtml1 x}"[..]).unwrap();
        assert!(extractor.is_html());
        assert!(!extractor.is_text());
    }

    #[test]
    fn test_detect_text() {
        let extractor = RtfDeEncapsulator::new(&br"{\rtf1\ansi\fromtext x}"[..]).unwrap();
        assert!(!extractor.is_html());
        assert!(extractor.is_text());
    }

    #[test]
    fn test_detect_outside_window() {
        let mut rtf = br"{\rtf1\ansi ".to_vec();
        rtf.extend(std::iter::repeat_n(b' ', 100));
        rtf.extend_from_slice(br"\fromhtml1 x}");

        let extractor = RtfDeEncapsulator::new(&rtf[..]).unwrap();
        assert_eq!(extractor.kind(), EncapsulationKind::None);

        let options = ExtractOptions::new().with_detection_window(200);
        let extractor = RtfDeEncapsulator::with_options(&rtf[..], options).unwrap();
        assert!(extractor.is_html());
    }

    #[test]
    fn test_detection_does_not_lose_bytes() {
        let options = ExtractOptions::new().with_detection_window(3);
        let mut extractor =
            RtfDeEncapsulator::with_options(&br"{\rtf1\ansi\pard abc}"[..], options).unwrap();
        assert_eq!(extractor.extract().unwrap(), "abc");
    }

    #[test]
    fn test_unbounded_detection_window() {
        let options = ExtractOptions::new().with_detection_window(usize::MAX);
        let mut extractor =
            RtfDeEncapsulator::with_options(&br"{\rtf1\ansi\fromhtml1 \pard\htmltag64<p>}"[..], options)
                .unwrap();

        assert!(extractor.is_html());
        assert_eq!(extractor.html().unwrap(), Some(format!("{UTF8_META}<p>").as_str()));
    }

    #[test]
    fn test_end_to_end_text() {
        let rtf = br"{\rtf1\ansi\deff0{\fonttbl{\f0\fcharset0 Arial;}}\fromtext\pard\f0 Hello\par World}";
        let mut extractor = RtfDeEncapsulator::new(&rtf[..]).unwrap();

        assert!(extractor.is_text());
        assert_eq!(extractor.extract().unwrap(), "Hello\r\nWorld");
        assert_eq!(extractor.text().unwrap(), Some("Hello\r\nWorld"));
        assert_eq!(extractor.html().unwrap(), None);
    }

    #[test]
    fn test_end_to_end_html() {
        let rtf = br"{\rtf1\ansi\fromhtml1 \pard\htmltag64<html><head></head><body>\htmltag60Hi\htmltag64</body></html>}";
        let mut extractor = RtfDeEncapsulator::new(&rtf[..]).unwrap();

        assert!(extractor.is_html());
        assert_eq!(
            extractor.html().unwrap(),
            Some(format!("<html><head>{UTF8_META}</head><body>Hi</body></html>").as_str())
        );
    }

    #[test]
    fn test_html_meta_can_be_disabled() {
        let rtf = br"{\rtf1\ansi\fromhtml1 \pard\htmltag64<head></head>}";
        let options = ExtractOptions::new().with_html_meta(false);
        let body = RtfDeEncapsulator::with_options(&rtf[..], options)
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(body, "<head></head>");
    }

    #[test]
    fn test_text_is_not_given_meta() {
        assert_eq!(extract(br"{\rtf1\ansi\fromtext\pard <head>}"), "<head>");
    }

    #[test]
    fn test_extract_is_memoized() {
        let mut extractor =
            RtfDeEncapsulator::new(&br"{\rtf1\ansi\pard caf\'e9\u8364?}"[..]).unwrap();
        let first = extractor.extract().unwrap().to_owned();
        assert!(extractor.source.is_none());
        let second = extractor.extract().unwrap();
        assert_eq!(first, second);
        assert_eq!(second, "café\u{20AC}");
    }

    #[test]
    fn test_io_error_propagates() {
        let reader = FailingReader {
            data: Cursor::new(br"{\rtf1\ansi\pard Hello".to_vec()),
        };
        let options = ExtractOptions::new().with_detection_window(5);
        let mut extractor = RtfDeEncapsulator::with_options(reader, options).unwrap();

        assert!(matches!(extractor.extract(), Err(RtfError::Io(_))));
        assert!(matches!(extractor.extract(), Err(RtfError::SourceConsumed)));
    }

    #[test]
    fn test_io_error_during_detection() {
        let reader = FailingReader {
            data: Cursor::new(br"{\rtf1}".to_vec()),
        };
        assert!(matches!(RtfDeEncapsulator::new(reader), Err(RtfError::Io(_))));
    }

    #[test]
    fn test_default_encoding_option() {
        let options = ExtractOptions::new().with_default_encoding(encoding_rs::WINDOWS_1251);
        let body = RtfDeEncapsulator::with_options(&br"{\rtf1\pard \'c4}"[..], options)
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(body, "Д");
    }

    #[test]
    fn test_custom_resolver() {
        struct Greek;

        impl CharsetResolver for Greek {
            fn resolve(&self, _name: &str) -> &'static Encoding {
                encoding_rs::WINDOWS_1253
            }

            fn resolve_codepage(&self, _codepage: i32) -> &'static Encoding {
                encoding_rs::WINDOWS_1253
            }
        }

        let options = ExtractOptions::new().with_resolver(Arc::new(Greek));
        let body =
            RtfDeEncapsulator::with_options(&br"{\rtf1\ansi\ansicpg1252\pard \'e1}"[..], options)
                .unwrap()
                .into_body()
                .unwrap();
        assert_eq!(body, "\u{03B1}");
    }

    #[test]
    fn test_outlook_style_html() {
        let rtf = br"{\rtf1\ansi\ansicpg1252\fromhtml1 \deff0{\fonttbl
{\f0\fswiss\fcharset0 Arial;}
{\f1\fmodern Courier New;}
{\f2\fnil\fcharset2 Symbol;}}
{\colortbl\red0\green0\blue0;\red0\green0\blue255;}
\uc1\pard\plain\deftab360 \f0\fs24 
{\*\htmltag19 <html>}
{\*\htmltag34 <head>}
{\*\htmltag1 \par }
{\*\htmltag241 <style>p \{margin:0\}</style>}
{\*\htmltag41 </head>}
{\*\htmltag50 <body>}
{\*\htmltag64 <p>}\htmlrtf {\htmlrtf0 Caf\'e9 \u8364? ok\htmlrtf }\htmlrtf0 {\*\htmltag244 <o:p>}{\*\htmltag84 &nbsp;}\htmlrtf\par\htmlrtf0 {\*\htmltag72 </p>}
{\*\htmltag58 </body>}
{\*\htmltag27 </html>}}";

        let result = de_encapsulate(rtf).unwrap();
        assert_eq!(result.kind, EncapsulationKind::Html);
        assert_eq!(
            result.html().unwrap(),
            format!(
                "<html><head>{UTF8_META}\r\n<style>p {{margin:0}}</style></head>\
                 <body><p>Caf\u{e9} \u{20AC} ok<o:p>&nbsp;</p></body></html>"
            )
        );
    }

    #[test]
    fn test_de_encapsulate_plain_rtf() {
        let result = de_encapsulate(br"{\rtf1\ansi\pard plain}").unwrap();
        assert_eq!(result.kind, EncapsulationKind::None);
        assert_eq!(result.body, "plain");
        assert_eq!(result.html(), None);
        assert_eq!(result.text(), None);
    }

    #[cfg(feature = "compressed")]
    #[test]
    fn test_from_bytes_decompresses() {
        const SIMPLE_LZFU: &[u8] = &[
            0x2d, 0x00, 0x00, 0x00, 0x2b, 0x00, 0x00, 0x00, 0x4c, 0x5a, 0x46, 0x75, 0xf1, 0xc5,
            0xc7, 0xa7, 0x03, 0x00, 0x0a, 0x00, 0x72, 0x63, 0x70, 0x67, 0x31, 0x32, 0x35, 0x42,
            0x32, 0x0a, 0xf3, 0x20, 0x68, 0x65, 0x6c, 0x09, 0x00, 0x20, 0x62, 0x77, 0x05, 0xb0,
            0x6c, 0x64, 0x7d, 0x0a, 0x80, 0x0f, 0xa0,
        ];

        let mut extractor = RtfDeEncapsulator::from_bytes(SIMPLE_LZFU).unwrap();
        assert_eq!(extractor.extract().unwrap(), "hello world");

        let mut corrupt = SIMPLE_LZFU.to_vec();
        corrupt[12] ^= 1;
        assert!(matches!(
            RtfDeEncapsulator::from_bytes(&corrupt),
            Err(RtfError::InvalidCompressed(_))
        ));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// Runs of ASCII text that contain no RTF syntax characters
        fn segment_strategy() -> impl Strategy<Value = String> {
            "[a-zA-Z0-9 .,;:!?']{0,20}"
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn prop_ascii_with_par_round_trips(
                segments in prop::collection::vec(segment_strategy(), 1..6)
            ) {
                let rtf = format!("{{\\rtf1\\ansi {}}}", segments.join("\\par "));
                let body = extract(rtf.as_bytes());
                prop_assert_eq!(body, segments.join("\r\n"));
            }

            #[test]
            fn prop_ascii_with_breaks_round_trips(
                first in segment_strategy(),
                rest in prop::collection::vec((segment_strategy(), any::<bool>()), 0..6)
            ) {
                let mut rtf = format!("{{\\rtf1\\ansi\\pard {first}");
                let mut expected = first;
                for (segment, use_line) in rest {
                    rtf.push_str(if use_line { "\\line " } else { "\\par " });
                    rtf.push_str(&segment);
                    expected.push_str("\r\n");
                    expected.push_str(&segment);
                }
                rtf.push('}');

                prop_assert_eq!(extract(rtf.as_bytes()), expected);
            }

            #[test]
            fn prop_arbitrary_bytes_never_fail(data in prop::collection::vec(any::<u8>(), 0..512)) {
                let result = RtfDeEncapsulator::new(&data[..]).and_then(|e| e.into_body());
                prop_assert!(result.is_ok(), "extraction failed: {:?}", result.err());
            }

            #[test]
            fn prop_visible_symbols(prefix in segment_strategy(), suffix in segment_strategy()) {
                let rtf = format!("{{\\rtf1\\ansi\\pard {prefix}\\~\\-\\_{suffix}}}");
                prop_assert_eq!(
                    extract(rtf.as_bytes()),
                    format!("{prefix}\u{00A0}\u{00AD}\u{2011}{suffix}")
                );
            }
        }
    }
}
