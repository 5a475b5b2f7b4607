//! Font-aware decoding of shown strings.
//!
//! Each page's `/Font` resources are resolved once into a `FontDecoder`.
//! lopdf handles the standard one-byte tables and Type0 fonts carrying a
//! `/ToUnicode` map; `/Differences` encodings are read here; everything else
//! goes through `decode_pdf_string`.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use tracing::{debug, warn};

/// Decoders for one page, keyed by resource name (`F1`, `T1_0`, ...).
pub type FontMap<'a> = HashMap<Vec<u8>, FontDecoder<'a>>;

/// pdfTeX OT1 text fonts put the f-ligatures in these slots.
const OT1_LIGATURES: [(char, &str); 5] = [
    ('\u{0B}', "ff"),
    ('\u{0C}', "fi"),
    ('\u{0D}', "fl"),
    ('\u{0E}', "ffi"),
    ('\u{0F}', "ffl"),
];

const ONE_BYTE_ENCODINGS: [&str; 5] = [
    "StandardEncoding",
    "MacRomanEncoding",
    "MacExpertEncoding",
    "WinAnsiEncoding",
    "PDFDocEncoding",
];

pub enum FontDecoder<'a> {
    /// Named one-byte tables and Identity-H/V with `/ToUnicode`.
    Lopdf(Encoding<'a>),
    /// `/Encoding << /Differences [...] >>`; unlisted codes decode raw.
    Differences(HashMap<u8, String>),
    /// No usable encoding information.
    Raw,
}

impl std::fmt::Debug for FontDecoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontDecoder::Lopdf(enc) => f.debug_tuple("Lopdf").field(enc).finish(),
            FontDecoder::Differences(map) => f.debug_tuple("Differences").field(&map.len()).finish(),
            FontDecoder::Raw => f.write_str("Raw"),
        }
    }
}

impl<'a> FontDecoder<'a> {
    pub fn for_font(doc: &'a Document, font: &'a Dictionary) -> Self {
        if !font.type_is(b"Font") {
            return FontDecoder::Raw;
        }
        match font.get_deref(b"Encoding", doc) {
            Ok(Object::Name(name)) => {
                let name = String::from_utf8_lossy(name);
                let lopdf_handles = match name.as_ref() {
                    "Identity-H" | "Identity-V" => font.has(b"ToUnicode"),
                    other => ONE_BYTE_ENCODINGS.contains(&other),
                };
                if !lopdf_handles {
                    return FontDecoder::Raw;
                }
                match font.get_font_encoding(doc) {
                    Ok(encoding) => FontDecoder::Lopdf(encoding),
                    Err(e) => {
                        warn!(encoding = %name, error = %e, "Unreadable font encoding, decoding raw");
                        FontDecoder::Raw
                    }
                }
            }
            Ok(Object::Dictionary(dict)) => FontDecoder::Differences(differences(dict)),
            _ => FontDecoder::Raw,
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            FontDecoder::Lopdf(encoding) => match Document::decode_text(encoding, bytes) {
                Ok(text) => blank_controls(&text),
                Err(e) => {
                    debug!(error = %e, "Font decode failed, decoding raw");
                    decode_pdf_string(bytes)
                }
            },
            FontDecoder::Differences(map) => {
                let text: String = bytes
                    .iter()
                    .map(|b| match map.get(b) {
                        Some(glyph) => glyph.clone(),
                        None => (*b as char).to_string(),
                    })
                    .collect();
                blank_controls(&text)
            }
            FontDecoder::Raw => decode_pdf_string(bytes),
        }
    }
}

/// Resolve every font a page can reference.
pub fn page_fonts(doc: &Document, page_id: ObjectId) -> FontMap<'_> {
    match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts
            .into_iter()
            .map(|(name, font)| (name, FontDecoder::for_font(doc, font)))
            .collect(),
        Err(e) => {
            debug!(error = %e, "Page fonts unavailable, decoding raw");
            FontMap::new()
        }
    }
}

fn differences(encoding: &Dictionary) -> HashMap<u8, String> {
    let mut map = HashMap::new();
    let Ok(items) = encoding.get(b"Differences").and_then(Object::as_array) else {
        return map;
    };
    let mut code: i64 = 0;
    for item in items {
        match item {
            Object::Integer(start) => code = *start,
            Object::Name(name) => {
                let glyph = String::from_utf8_lossy(name);
                if let (Ok(byte), Some(text)) = (u8::try_from(code), glyph_text(&glyph)) {
                    map.insert(byte, text);
                }
                code += 1;
            }
            _ => {}
        }
    }
    map
}

/// Text for an Adobe glyph name. Covers what turns up in paper fonts:
/// single letters, digits, punctuation, ligatures, quotes and `uniXXXX`.
fn glyph_text(name: &str) -> Option<String> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c.to_string());
        }
    }
    if let Some(hex) = name.strip_prefix("uni") {
        return u32::from_str_radix(hex.get(..4)?, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    let text = match name {
        "ff" | "fi" | "fl" | "ffi" | "ffl" => name,
        "space" => " ",
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "period" => ".",
        "comma" => ",",
        "colon" => ":",
        "semicolon" => ";",
        "hyphen" | "minus" => "-",
        "endash" => "\u{2013}",
        "emdash" => "\u{2014}",
        "parenleft" => "(",
        "parenright" => ")",
        "bracketleft" => "[",
        "bracketright" => "]",
        "slash" => "/",
        "exclam" => "!",
        "question" => "?",
        "quoteright" => "\u{2019}",
        "quoteleft" => "\u{2018}",
        "quotesingle" => "'",
        "quotedblleft" => "\u{201C}",
        "quotedblright" => "\u{201D}",
        "quotedbl" => "\"",
        "percent" => "%",
        "equal" => "=",
        "plus" => "+",
        _ => return None,
    };
    Some(text.to_string())
}

/// Decode a string shown with an unknown font: UTF-16BE with BOM, UTF-8,
/// else Latin-1. OT1 ligature slots become their letters, other control
/// characters become spaces.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    let raw: String = if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    } else if let Ok(s) = std::str::from_utf8(bytes) {
        s.to_string()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    };

    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match OT1_LIGATURES.iter().find(|(slot, _)| *slot == c) {
            Some((_, letters)) => out.push_str(letters),
            None if c.is_control() => out.push(' '),
            None => out.push(c),
        }
    }
    out
}

fn blank_controls(text: &str) -> String {
    text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_utf16_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9];
        assert_eq!(decode_pdf_string(&bytes), "Aé");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let bytes = [b'c', b'a', b'f', 0xE9];
        assert_eq!(decode_pdf_string(&bytes), "café");
    }

    #[test]
    fn test_ot1_ligature_slots_decode_to_letters() {
        assert_eq!(decode_pdf_string(b"e\x0Ecient \x0Cne \x0Dow"), "efficient fine flow");
        assert_eq!(decode_pdf_string(b"a\x01b"), "a b");
    }

    #[test]
    fn test_glyph_names() {
        assert_eq!(glyph_text("fi").as_deref(), Some("fi"));
        assert_eq!(glyph_text("Q").as_deref(), Some("Q"));
        assert_eq!(glyph_text("seven").as_deref(), Some("7"));
        assert_eq!(glyph_text("uni00E9").as_deref(), Some("é"));
        assert_eq!(glyph_text("a123"), None);
    }

    #[test]
    fn test_differences_array_assigns_consecutive_codes() {
        let encoding = dictionary! {
            "Type" => "Encoding",
            "Differences" => vec![
                11.into(),
                Object::Name(b"ff".to_vec()),
                Object::Name(b"fi".to_vec()),
                Object::Name(b"fl".to_vec()),
                39.into(),
                Object::Name(b"quoteright".to_vec()),
            ],
        };
        let map = differences(&encoding);
        assert_eq!(map.get(&12).map(String::as_str), Some("fi"));
        assert_eq!(map.get(&13).map(String::as_str), Some("fl"));
        assert_eq!(map.get(&39).map(String::as_str), Some("\u{2019}"));

        let decoder = FontDecoder::Differences(map);
        assert_eq!(decoder.decode(b"e\x0Bect\x27s"), "effect\u{2019}s");
    }

    #[test]
    fn test_win_ansi_font_uses_lopdf_table() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
            "Encoding" => "WinAnsiEncoding",
        };
        let decoder = FontDecoder::for_font(&doc, &font);
        assert!(matches!(decoder, FontDecoder::Lopdf(_)));
        assert_eq!(decoder.decode(b"Caf\xE9 \x93quoted\x94"), "Café \u{201C}quoted\u{201D}");
    }

    #[test]
    fn test_identity_font_without_to_unicode_decodes_raw() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "Encoding" => "Identity-H",
        };
        assert!(matches!(FontDecoder::for_font(&doc, &font), FontDecoder::Raw));
    }

    #[test]
    fn test_font_without_encoding_decodes_raw() {
        let doc = Document::with_version("1.5");
        let font = dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica" };
        let decoder = FontDecoder::for_font(&doc, &font);
        assert!(matches!(decoder, FontDecoder::Raw));
        assert_eq!(decoder.decode(b"Plain text"), "Plain text");
    }
}
