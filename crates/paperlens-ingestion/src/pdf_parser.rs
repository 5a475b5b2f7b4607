//! lopdf-based PDF parsing into positioned text fragments.
//!
//! Each page's content stream is walked operator by operator. The text
//! matrix is tracked just far enough to know where every shown string
//! starts (`BT`, `Tm`, `Td`, `TD`, `TL`, `T*`, `'`, `"`, `Tf`), and strings
//! that share a baseline are merged into one fragment per line. Strings are
//! decoded with the font selected by the last `Tf`.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};
use tracing::{debug, instrument, warn};

use crate::error::{ExtractionError, Result};
use crate::fonts::{decode_pdf_string, page_fonts, FontMap};
use crate::layout::build_document;
use crate::models::{ExtractedFragment, ParsedDocument, PdfPage};

/// Two pieces closer than this (vertically) sit on the same line.
const BASELINE_TOLERANCE: f32 = 1.0;
/// Average glyph width as a fraction of the font size.
const GLYPH_WIDTH_EM: f32 = 0.5;
/// Horizontal gap (in em) treated as a word break.
const WORD_GAP_EM: f32 = 0.15;
/// TJ kerning (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Parse PDF bytes and run layout inference over the result.
#[instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn extract_document(bytes: &[u8]) -> Result<ParsedDocument> {
    let pages = parse_pdf_pages(bytes)?;
    if pages.is_empty() {
        return Err(ExtractionError::EmptyDocument("PDF contains no pages".to_string()));
    }

    let doc = build_document(&pages);
    if doc.full_text.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument(
            "no extractable text (scanned or image-only PDF?)".to_string(),
        ));
    }

    debug!(
        pages = doc.page_count,
        chars = doc.full_text.len(),
        sections = doc.sections.len(),
        title = %doc.title,
        "PDF extracted"
    );
    Ok(doc)
}

/// Parse PDF bytes into per-page fragment lists.
pub fn parse_pdf_pages(bytes: &[u8]) -> Result<Vec<PdfPage>> {
    let pdf = Document::load_mem(bytes)?;

    let mut pages = Vec::new();
    for (page_num, page_id) in pdf.get_pages() {
        let fragments = match pdf.get_page_content(page_id) {
            Ok(data) => match Content::decode(&data) {
                Ok(content) => {
                    let fonts = page_fonts(&pdf, page_id);
                    fragments_from_operations(&content.operations, page_num, &fonts)
                }
                Err(e) => {
                    warn!(page = page_num, error = %e, "Undecodable content stream, page skipped");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(page = page_num, error = %e, "Page has no readable content");
                Vec::new()
            }
        };
        pages.push(PdfPage { number: page_num, fragments });
    }

    Ok(pages)
}

// ── Content-stream walk ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct TextCursor {
    x: f32,
    y: f32,
    line_x: f32,
    line_y: f32,
    leading: f32,
    font_size: f32,
    scale: f32,
    font: Vec<u8>,
}

impl TextCursor {
    fn begin_text(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.line_x = 0.0;
        self.line_y = 0.0;
        self.scale = 1.0;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx * self.scale;
        self.line_y += ty * self.scale;
        self.x = self.line_x;
        self.y = self.line_y;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn em(&self) -> f32 {
        let size = if self.font_size > 0.0 { self.font_size } else { 10.0 };
        size * if self.scale > 0.0 { self.scale } else { 1.0 }
    }

    fn advance(&mut self, text: &str) {
        self.x += text.chars().count() as f32 * self.em() * GLYPH_WIDTH_EM;
    }

    fn decode(&self, fonts: &FontMap<'_>, bytes: &[u8]) -> String {
        match fonts.get(&self.font) {
            Some(decoder) => decoder.decode(bytes),
            None => decode_pdf_string(bytes),
        }
    }
}

/// Accumulates pieces that share a baseline.
struct LineBuilder {
    page: u32,
    current: Option<(ExtractedFragment, f32)>, // fragment + x where the last piece ended
    done: Vec<ExtractedFragment>,
}

impl LineBuilder {
    fn new(page: u32) -> Self {
        Self { page, current: None, done: Vec::new() }
    }

    fn push(&mut self, text: &str, x: f32, y: f32, end_x: f32, em: f32) {
        if text.is_empty() {
            return;
        }
        let same_line = matches!(
            &self.current,
            Some((frag, _)) if (frag.y - y).abs() < BASELINE_TOLERANCE
        );
        if !same_line {
            self.flush();
            self.current = Some((ExtractedFragment::new(text, x, y, self.page), end_x));
            return;
        }
        if let Some((frag, last_end)) = self.current.as_mut() {
            let gap = x - *last_end;
            let needs_space = gap > em * WORD_GAP_EM
                && !frag.text.ends_with(char::is_whitespace)
                && !text.starts_with(char::is_whitespace);
            if needs_space {
                frag.text.push(' ');
            }
            frag.text.push_str(text);
            *last_end = end_x;
        }
    }

    fn flush(&mut self) {
        if let Some((mut frag, _)) = self.current.take() {
            let normalised = frag.text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !normalised.is_empty() {
                frag.text = normalised;
                self.done.push(frag);
            }
        }
    }

    fn finish(mut self) -> Vec<ExtractedFragment> {
        self.flush();
        self.done
    }
}

fn fragments_from_operations(
    ops: &[Operation],
    page: u32,
    fonts: &FontMap<'_>,
) -> Vec<ExtractedFragment> {
    let mut cursor = TextCursor { scale: 1.0, ..Default::default() };
    let mut line = LineBuilder::new(page);

    for op in ops {
        let num = |i: usize| op.operands.get(i).and_then(object_to_f32).unwrap_or(0.0);
        match op.operator.as_str() {
            "BT" => cursor.begin_text(),
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    cursor.font = name.clone();
                }
                cursor.font_size = num(1);
            }
            "TL" => cursor.leading = num(0),
            "Tm" => {
                let (a, b) = (num(0), num(1));
                cursor.scale = (a * a + b * b).sqrt();
                cursor.line_x = num(4);
                cursor.line_y = num(5);
                cursor.x = cursor.line_x;
                cursor.y = cursor.line_y;
            }
            "Td" => cursor.move_line(num(0), num(1)),
            "TD" => {
                cursor.leading = -num(1);
                cursor.move_line(num(0), num(1));
            }
            "T*" => cursor.next_line(),
            "Tj" => show_string(op.operands.first(), &mut cursor, &mut line, fonts),
            "'" => {
                cursor.next_line();
                show_string(op.operands.first(), &mut cursor, &mut line, fonts);
            }
            "\"" => {
                cursor.next_line();
                show_string(op.operands.get(2), &mut cursor, &mut line, fonts);
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    show_array(items, &mut cursor, &mut line, fonts);
                }
            }
            _ => {}
        }
    }

    line.finish()
}

fn show_string(
    operand: Option<&Object>,
    cursor: &mut TextCursor,
    line: &mut LineBuilder,
    fonts: &FontMap<'_>,
) {
    if let Some(Object::String(bytes, _)) = operand {
        let text = cursor.decode(fonts, bytes);
        let (x, y) = (cursor.x, cursor.y);
        cursor.advance(&text);
        line.push(&text, x, y, cursor.x, cursor.em());
    }
}

fn show_array(
    items: &[Object],
    cursor: &mut TextCursor,
    line: &mut LineBuilder,
    fonts: &FontMap<'_>,
) {
    let start = (cursor.x, cursor.y);
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => {
                let piece = cursor.decode(fonts, bytes);
                cursor.advance(&piece);
                text.push_str(&piece);
            }
            other => {
                if let Some(kern) = object_to_f32(other) {
                    cursor.x -= kern / 1000.0 * cursor.em();
                    if kern < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }
    }
    line.push(&text, start.0, start.1, cursor.x, cursor.em());
}

fn object_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
