//! In-memory PDF builder so extraction can be tested on real bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Glyph id = Unicode code point minus this, for the Identity-H font.
const GLYPH_OFFSET: u16 = 29;

/// ToUnicode map for the Identity-H font: glyphs 0x0003..=0x0061 cover
/// printable ASCII.
const IDENTITY_TO_UNICODE: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo <<
/Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0003> <0061> <0020>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

#[derive(Debug, Clone)]
struct TextLine {
    font: &'static str,
    shown: Object,
    x: f32,
    y: f32,
    size: f32,
}

/// Builds a PDF with one `Tj` per line. `F1` is Helvetica without an
/// `/Encoding`; `F2` is a Type0 Identity-H font with a `/ToUnicode` map.
///
/// ```ignore
/// let bytes = PdfBuilder::new()
///     .text("Attention Is All You Need", 72.0, 720.0)
///     .page()
///     .text("2 Background", 72.0, 700.0)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct PdfBuilder {
    pages: Vec<Vec<TextLine>>,
}

impl PdfBuilder {
    /// Starts with one empty page.
    pub fn new() -> Self {
        Self { pages: vec![Vec::new()] }
    }

    /// A document with no pages at all.
    pub fn empty() -> Self {
        Self { pages: Vec::new() }
    }

    /// Start a new page; following lines land on it.
    pub fn page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    pub fn text(self, text: impl Into<String>, x: f32, y: f32) -> Self {
        self.text_sized(text, x, y, DEFAULT_FONT_SIZE)
    }

    pub fn text_sized(self, text: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        let text: String = text.into();
        self.push("F1", Object::string_literal(text.as_str()), x, y, size)
    }

    /// Raw string bytes shown with `F1`, e.g. OT1 ligature codes.
    pub fn text_bytes(self, bytes: &[u8], x: f32, y: f32) -> Self {
        let shown = Object::String(bytes.to_vec(), StringFormat::Hexadecimal);
        self.push("F1", shown, x, y, DEFAULT_FONT_SIZE)
    }

    /// ASCII text shown as two-byte glyph ids with the Identity-H font.
    pub fn text_identity(self, text: &str, x: f32, y: f32) -> Self {
        let glyphs: Vec<u8> = text
            .chars()
            .flat_map(|c| (c as u16).saturating_sub(GLYPH_OFFSET).to_be_bytes())
            .collect();
        let shown = Object::String(glyphs, StringFormat::Hexadecimal);
        self.push("F2", shown, x, y, DEFAULT_FONT_SIZE)
    }

    fn push(mut self, font: &'static str, shown: Object, x: f32, y: f32, size: f32) -> Self {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        if let Some(page) = self.pages.last_mut() {
            page.push(TextLine { font, shown, x, y, size });
        }
        self
    }

    /// Lay out `lines` top-down on the current page, 14pt apart from `top`.
    pub fn lines(self, lines: &[&str], top: f32) -> Self {
        lines
            .iter()
            .enumerate()
            .fold(self, |b, (i, line)| b.text(*line, 72.0, top - 14.0 * i as f32))
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! {},
            IDENTITY_TO_UNICODE.as_bytes().to_vec(),
        ));
        let identity_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ArialMT",
            "Encoding" => "Identity-H",
            "ToUnicode" => to_unicode_id,
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id, "F2" => identity_font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in &self.pages {
            let mut operations = Vec::new();
            for line in lines {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec![line.font.into(), line.size.into()]));
                operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
                operations.push(Operation::new("Tj", vec![line.shown.clone()]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let encoded = content.encode().expect("content stream encodes");
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("in-memory save");
        bytes
    }
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_produces_pdf_header() {
        let bytes = PdfBuilder::new().text("Hello", 72.0, 700.0).build();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_pages_round_trip_through_lopdf() {
        let bytes = PdfBuilder::new()
            .text("One", 72.0, 700.0)
            .page()
            .text("Two", 72.0, 700.0)
            .build();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
