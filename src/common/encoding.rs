//! Character set resolution for RTF byte runs.
//!
//! RTF names the encoding of its 8-bit text in three ways: a Windows code page
//! (`\ansicpg1252`), an RTF font charset (`\fcharset204`), or, in the wider mail
//! pipeline, a loosely spelled charset label (`"ISO 8859-1"`, `"cp-1252"`,
//! `"win1251"`). This module maps all of them onto `encoding_rs` encodings.
//!
//! Resolution never fails: anything unknown falls back to windows-1252, the
//! WHATWG superset of both ASCII and ISO-8859-1.

use encoding_rs::Encoding;
use phf::phf_map;

/// Encoding used whenever a name or code page cannot be resolved.
pub static FALLBACK_ENCODING: &Encoding = &encoding_rs::WINDOWS_1252_INIT;

/// Labels `encoding_rs` does not know, mapped to the closest code page.
static EXTRA_LABELS: phf::Map<&'static str, u32> = phf_map! {
    "ascii" => 1252,
    "us-ascii" => 1252,
    "ansi" => 1252,
    "mac" => 10000,
    "macroman" => 10000,
    "mac-roman" => 10000,
    "x-mac-roman" => 10000,
    "maccyrillic" => 10007,
    "pc" => 437,
    "pca" => 850,
    "dos" => 437,
    "oem" => 437,
    "sjis" => 932,
    "ms-kanji" => 932,
    "johab" => 1361,
    "utf-7" => 65000,
    "unicode" => 1200,
    "unicodefffe" => 1201,
};

/// Map Windows codepage identifier to encoding_rs Encoding.
///
/// Code pages `encoding_rs` does not carry are approximated by the closest
/// encoding it does (e.g. the DOS code pages 437 and 850).
///
/// # Examples
/// ```
/// use rtfex::common::encoding::codepage_to_encoding;
///
/// let encoding = codepage_to_encoding(936).unwrap();
/// assert_eq!(encoding.name(), "GBK");
/// ```
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        // DOS codepages
        437 => Some(encoding_rs::IBM866), // IBM866 (close approximation to CP437)
        850 => Some(encoding_rs::IBM866), // DOS Latin 1 (approximation)
        866 => Some(encoding_rs::IBM866),

        // Windows codepages (Western scripts)
        874 => Some(encoding_rs::WINDOWS_874),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),

        // East Asian codepages
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        1361 => Some(encoding_rs::EUC_KR), // Johab (approximation)
        20932 => Some(encoding_rs::EUC_JP),
        20936 => Some(encoding_rs::GBK),
        50220 | 50221 | 50222 => Some(encoding_rs::ISO_2022_JP),
        51932 => Some(encoding_rs::EUC_JP),
        51949 => Some(encoding_rs::EUC_KR),
        54936 => Some(encoding_rs::GB18030),

        // ISO 8859 series
        28591 => Some(encoding_rs::WINDOWS_1252), // ISO-8859-1 approximation
        28592 => Some(encoding_rs::ISO_8859_2),
        28593 => Some(encoding_rs::ISO_8859_3),
        28594 => Some(encoding_rs::ISO_8859_4),
        28595 => Some(encoding_rs::ISO_8859_5),
        28596 => Some(encoding_rs::ISO_8859_6),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 | 38598 => Some(encoding_rs::ISO_8859_8),
        28599 => Some(encoding_rs::WINDOWS_1254), // Latin 5 is a subset of 1254
        28603 => Some(encoding_rs::ISO_8859_13),
        28605 => Some(encoding_rs::ISO_8859_15),

        // KOI8 series
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),

        // Macintosh
        10000 => Some(encoding_rs::MACINTOSH),
        10001 => Some(encoding_rs::SHIFT_JIS), // Mac Japanese
        10002 => Some(encoding_rs::BIG5),      // Mac Traditional Chinese
        10003 => Some(encoding_rs::EUC_KR),    // Mac Korean
        10004 => Some(encoding_rs::ISO_8859_6), // Mac Arabic (approximation)
        10005 => Some(encoding_rs::WINDOWS_1255), // Mac Hebrew (approximation)
        10006 => Some(encoding_rs::WINDOWS_1253), // Mac Greek (approximation)
        10007 => Some(encoding_rs::X_MAC_CYRILLIC),
        10008 => Some(encoding_rs::GBK),       // Mac Simplified Chinese
        10021 => Some(encoding_rs::WINDOWS_874), // Mac Thai (approximation)
        10029 => Some(encoding_rs::WINDOWS_1250), // Mac Central European (approximation)
        10081 => Some(encoding_rs::WINDOWS_1254), // Mac Turkish (approximation)

        // Unicode
        1200 => Some(encoding_rs::UTF_16LE),
        1201 => Some(encoding_rs::UTF_16BE),
        65000 => Some(encoding_rs::UTF_8), // UTF-7 (use UTF-8 as fallback)
        65001 => Some(encoding_rs::UTF_8),

        _ => None,
    }
}

/// Map an RTF `\fcharsetN` value to its Windows code page.
///
/// Returns `None` for charsets that carry no code page of their own
/// (`1`, the "default" charset, and `2`, the symbol charset) and for
/// values outside the RTF table.
#[inline]
pub fn fcharset_to_codepage(fcharset: i32) -> Option<u32> {
    let codepage = match fcharset {
        0 => 1252,   // ANSI
        77 => 10000, // Mac Roman
        78 => 10001, // Mac Shift Jis
        79 => 10003, // Mac Hangul
        80 => 10008, // Mac GB2312
        81 => 10002, // Mac Big5
        82 => 1361,  // Mac Johab
        83 => 10005, // Mac Hebrew
        84 => 10004, // Mac Arabic
        85 => 10006, // Mac Greek
        86 => 10081, // Mac Turkish
        87 => 10021, // Mac Thai
        88 => 10029, // Mac East Europe
        89 => 10007, // Mac Russian
        128 => 932,  // Shift JIS
        129 => 949,  // Hangul
        130 => 1361, // Johab
        134 => 936,  // GB2312
        136 => 950,  // Big5
        161 => 1253, // Greek
        162 => 1254, // Turkish
        163 => 1258, // Vietnamese
        177 => 1255, // Hebrew
        178 => 1256, // Arabic
        179 => 1256, // Arabic Traditional
        180 => 1256, // Arabic user
        181 => 1255, // Hebrew user
        186 => 1257, // Baltic
        204 => 1251, // Russian
        222 => 874,  // Thai
        238 => 1250, // Eastern European
        254 => 437,  // PC 437
        255 => 850,  // OEM
        _ => return None,
    };
    Some(codepage)
}

/// Map an RTF `\fcharsetN` value straight to an encoding.
#[inline]
pub fn fcharset_to_encoding(fcharset: i32) -> Option<&'static Encoding> {
    fcharset_to_codepage(fcharset).and_then(codepage_to_encoding)
}

/// Resolves charset names and code pages to concrete encodings.
///
/// Implementations must never fail: unknown input resolves to a fallback
/// encoding. Additional encoding providers can be plugged in by wrapping
/// [`StandardCharsetResolver`].
pub trait CharsetResolver: Send + Sync {
    /// Resolve a (possibly misspelled) charset label or numeric code page.
    fn resolve(&self, name: &str) -> &'static Encoding;

    /// Resolve a Windows code page number.
    fn resolve_codepage(&self, codepage: i32) -> &'static Encoding {
        self.resolve(&codepage.to_string())
    }
}

/// Resolver backed by `encoding_rs` and the static tables of this module.
#[derive(Debug, Clone, Copy)]
pub struct StandardCharsetResolver {
    fallback: &'static Encoding,
}

impl StandardCharsetResolver {
    /// Create a resolver that falls back to windows-1252.
    pub fn new() -> Self {
        Self {
            fallback: FALLBACK_ENCODING,
        }
    }

    /// Create a resolver with a custom fallback encoding.
    pub fn with_fallback(fallback: &'static Encoding) -> Self {
        Self { fallback }
    }

    /// Resolve without applying the fallback.
    pub fn try_resolve(&self, name: &str) -> Option<&'static Encoding> {
        let label = name.trim().to_ascii_lowercase();
        if label.is_empty() {
            return None;
        }

        if let Some(codepage) = parse_codepage(&label) {
            return codepage_to_encoding(codepage);
        }

        let label = normalize_iso8859(&label).unwrap_or(label);
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return Some(encoding);
        }

        let squeezed: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        EXTRA_LABELS
            .get(squeezed.as_str())
            .copied()
            .and_then(codepage_to_encoding)
            .or_else(|| Encoding::for_label(squeezed.as_bytes()))
    }
}

impl Default for StandardCharsetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CharsetResolver for StandardCharsetResolver {
    fn resolve(&self, name: &str) -> &'static Encoding {
        self.try_resolve(name).unwrap_or(self.fallback)
    }

    fn resolve_codepage(&self, codepage: i32) -> &'static Encoding {
        u32::try_from(codepage)
            .ok()
            .and_then(codepage_to_encoding)
            .unwrap_or(self.fallback)
    }
}

/// Resolve a charset label with the standard resolver.
///
/// # Examples
/// ```
/// use rtfex::common::encoding::resolve_charset;
///
/// assert_eq!(resolve_charset("cp-1251").name(), "windows-1251");
/// assert_eq!(resolve_charset("ISO 8859-2").name(), "ISO-8859-2");
/// assert_eq!(resolve_charset("no-such-charset").name(), "windows-1252");
/// ```
#[inline]
pub fn resolve_charset(name: &str) -> &'static Encoding {
    StandardCharsetResolver::new().resolve(name)
}

/// Extract a code page from labels such as `1252`, `cp-1252`, `win1252`,
/// `windows-1252`, `ibm437` or `ms936`.
fn parse_codepage(label: &str) -> Option<u32> {
    let digits = ["windows", "win", "cp", "ibm", "ms"]
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix))
        .unwrap_or(label)
        .trim_start_matches(['-', '_', ' ']);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok()
}

/// Rewrite `iso 8859-x`, `iso8859x` and `iso_8859_x` into `iso-8859-x`.
fn normalize_iso8859(label: &str) -> Option<String> {
    let rest = label.strip_prefix("iso")?;
    let rest = rest.trim_start_matches(['-', '_', ' ']);
    let part = rest.strip_prefix("8859")?;
    let part = part.trim_start_matches(['-', '_', ' ']);
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("iso-8859-{part}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codepage_table() {
        assert_eq!(codepage_to_encoding(1252), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(codepage_to_encoding(10000), Some(encoding_rs::MACINTOSH));
        assert_eq!(codepage_to_encoding(99999), None);
    }

    #[test]
    fn test_fcharset_table() {
        assert_eq!(fcharset_to_encoding(0), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(fcharset_to_encoding(204), Some(encoding_rs::WINDOWS_1251));
        assert_eq!(fcharset_to_encoding(128), Some(encoding_rs::SHIFT_JIS));
        assert_eq!(fcharset_to_encoding(1), None);
        assert_eq!(fcharset_to_encoding(2), None);
        assert_eq!(fcharset_to_encoding(-5), None);
    }

    #[test]
    fn test_resolve_misspellings() {
        let resolver = StandardCharsetResolver::new();
        assert_eq!(resolver.resolve("windows-1250"), encoding_rs::WINDOWS_1250);
        assert_eq!(resolver.resolve("win1251"), encoding_rs::WINDOWS_1251);
        assert_eq!(resolver.resolve("CP-1253"), encoding_rs::WINDOWS_1253);
        assert_eq!(resolver.resolve("cp936"), encoding_rs::GBK);
        assert_eq!(resolver.resolve("iso 8859-2"), encoding_rs::ISO_8859_2);
        assert_eq!(resolver.resolve("ISO8859-15"), encoding_rs::ISO_8859_15);
        assert_eq!(resolver.resolve("iso_8859_5"), encoding_rs::ISO_8859_5);
        assert_eq!(resolver.resolve("Mac Roman"), encoding_rs::MACINTOSH);
        assert_eq!(resolver.resolve(" utf-8 "), encoding_rs::UTF_8);
        assert_eq!(resolver.resolve("1252"), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_resolve_fallback() {
        let resolver = StandardCharsetResolver::new();
        assert_eq!(resolver.resolve(""), FALLBACK_ENCODING);
        assert_eq!(resolver.resolve("klingon"), FALLBACK_ENCODING);
        assert_eq!(resolver.resolve_codepage(-1), FALLBACK_ENCODING);
        assert_eq!(resolver.resolve_codepage(4242), FALLBACK_ENCODING);

        let resolver = StandardCharsetResolver::with_fallback(encoding_rs::UTF_8);
        assert_eq!(resolver.resolve("klingon"), encoding_rs::UTF_8);
    }
}
