//! Layout inference over positioned fragments.
//!
//! PDF pages carry no semantic tags, so everything here is best-effort:
//! a wrong title is acceptable, a panic or an empty field is not. Every
//! heuristic miss degrades to a fixed fallback value.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{
    DocumentSection, ExtractedFragment, ParsedDocument, PdfPage, NO_ABSTRACT, UNKNOWN_AUTHORS,
    UNTITLED_PAPER,
};

/// How many top-of-page candidates the title scan inspects.
const TITLE_SCAN_LIMIT: usize = 20;
const TITLE_MIN_CHARS: usize = 5;
const TITLE_MAX_CHARS: usize = 150;
const TITLE_MAX_WORDS: usize = 15;
const AUTHOR_MIN_CHARS: usize = 3;
const AUTHOR_MAX_CHARS: usize = 200;
const HEADING_MIN_CHARS: usize = 3;
const HEADING_MAX_CHARS: usize = 100;
const HEADING_MAX_WORDS: usize = 12;
/// Headings without a "3." / "IV." marker must be this short.
const UNNUMBERED_HEADING_MAX_WORDS: usize = 6;
/// Fallback sections must be longer than this.
const FALLBACK_SECTION_MIN_CHARS: usize = 100;
const MAX_ABSTRACT_CHARS: usize = 3000;

lazy_static! {
    static ref ABSTRACT_RE: Regex = Regex::new(
        r"(?is)\babstract\b[\s:.\-–—]*(.+?)(?:\n\s*\n|\bintroduction\b|\n\s*(?:\d+|[ivx]+)\.?\s+(?-i:[A-Z])|\bkeywords\b|\z)"
    ).unwrap();
    static ref HEADING_RE: Regex = Regex::new(
        r"^(?:(?:\d+(?:\.\d+)*|[IVXLC]+)\.?\s+)?[A-Z][A-Za-z0-9][A-Za-z0-9 ,:;&()'/\-]*$"
    ).unwrap();
    static ref HEADING_MARKER_RE: Regex = Regex::new(r"^(?:\d+(?:\.\d+)*|[IVXLC]+)\.?\s+").unwrap();
    static ref BLANK_LINE_RE: Regex = Regex::new(r"\n[ \t]*\n").unwrap();
}

/// Run every layout heuristic over an extracted page list.
pub fn build_document(pages: &[PdfPage]) -> ParsedDocument {
    let (full_text, _) = join_pages(pages);
    let (lines, line_page_starts) = join_lines(pages);

    let first_page: &[ExtractedFragment] = pages
        .first()
        .map(|p| p.fragments.as_slice())
        .unwrap_or(&[]);
    let ranked = rank_by_position(first_page);

    let title_match = infer_title(&ranked);
    let authors = infer_authors(&ranked, title_match.as_ref().map(|(rank, _)| *rank));

    let mut sections = detect_sections(&lines, &line_page_starts);
    if sections.is_empty() {
        sections = fallback_sections(&lines, &line_page_starts);
    }

    ParsedDocument {
        title: title_match.map(|(_, t)| t).unwrap_or_else(|| UNTITLED_PAPER.to_string()),
        authors: authors.unwrap_or_else(|| UNKNOWN_AUTHORS.to_string()),
        abstract_text: extract_abstract(&lines),
        full_text,
        sections,
        page_count: pages.len(),
    }
}

/// Space-join fragments within a page, newline-join pages.
/// Also returns the byte offset at which each page starts.
pub fn join_pages(pages: &[PdfPage]) -> (String, Vec<usize>) {
    join_with(pages, " ", "\n")
}

/// One fragment per line, pages separated by a blank line. Each merged
/// fragment is one baseline, so heading and abstract scans run over this.
pub fn join_lines(pages: &[PdfPage]) -> (String, Vec<usize>) {
    join_with(pages, "\n", "\n\n")
}

fn join_with(pages: &[PdfPage], fragment_sep: &str, page_sep: &str) -> (String, Vec<usize>) {
    let mut text = String::new();
    let mut page_starts = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            text.push_str(page_sep);
        }
        page_starts.push(text.len());
        for (j, fragment) in page.fragments.iter().enumerate() {
            if j > 0 {
                text.push_str(fragment_sep);
            }
            text.push_str(&fragment.text);
        }
    }
    (text, page_starts)
}

/// Fragments sorted topmost first. Ties keep content-stream order.
pub fn rank_by_position(fragments: &[ExtractedFragment]) -> Vec<&ExtractedFragment> {
    let mut ranked: Vec<&ExtractedFragment> = fragments.iter().collect();
    ranked.sort_by(|a, b| b.y.total_cmp(&a.y));
    ranked
}

// ── Title ────────────────────────────────────────────────────────────────────

/// Pick the title from top-ranked first-page fragments.
/// Returns the rank it was found at together with the trimmed text.
pub fn infer_title(ranked: &[&ExtractedFragment]) -> Option<(usize, String)> {
    ranked
        .iter()
        .enumerate()
        .map(|(rank, f)| (rank, f.text.trim()))
        .filter(|(_, t)| (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&t.chars().count()))
        .take(TITLE_SCAN_LIMIT)
        .find(|(_, t)| looks_like_title(t))
        .map(|(rank, t)| (rank, t.to_string()))
}

fn looks_like_title(text: &str) -> bool {
    let lower = text.to_lowercase();
    if ["arxiv", "preprint", "abstract"].iter().any(|w| lower.contains(w)) {
        return false;
    }
    if is_numeric(text) || is_abbreviation(text) {
        return false;
    }
    let words = text.split_whitespace().count();
    words > 1 && words <= TITLE_MAX_WORDS
}

/// Digits with optional separators only ("2017", "1-12", "3.2").
fn is_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || ".,:;-/".contains(c))
}

/// Short all-caps run such as "NEURIPS 2017" or "IEEE TPAMI".
fn is_abbreviation(text: &str) -> bool {
    let has_letters = text.chars().any(|c| c.is_alphabetic());
    let all_upper = text.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase());
    has_letters && all_upper && text.split_whitespace().count() <= 3
}

// ── Authors ──────────────────────────────────────────────────────────────────

/// Pick the author line: the topmost fragment that looks like one, other
/// than the fragment the title came from.
pub fn infer_authors(ranked: &[&ExtractedFragment], title_rank: Option<usize>) -> Option<String> {
    ranked
        .iter()
        .enumerate()
        .filter(|(rank, _)| Some(*rank) != title_rank)
        .map(|(_, f)| f.text.trim())
        .find(|t| looks_like_authors(t))
        .map(str::to_string)
}

fn looks_like_authors(text: &str) -> bool {
    let len = text.chars().count();
    if !(AUTHOR_MIN_CHARS..=AUTHOR_MAX_CHARS).contains(&len) {
        return false;
    }
    if !(text.contains(' ') || text.contains(',')) {
        return false;
    }
    let lower = text.to_lowercase();
    !lower.contains("university") && !lower.contains("abstract")
}

// ── Abstract ─────────────────────────────────────────────────────────────────

/// Text following "Abstract" up to the first blank line, "Introduction",
/// numbered heading or "Keywords". Whitespace is collapsed.
pub fn extract_abstract(full_text: &str) -> String {
    let Some(body) = ABSTRACT_RE.captures(full_text).and_then(|c| c.get(1)) else {
        return NO_ABSTRACT.to_string();
    };
    let collapsed = body.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return NO_ABSTRACT.to_string();
    }
    if collapsed.chars().count() > MAX_ABSTRACT_CHARS {
        return collapsed.chars().take(MAX_ABSTRACT_CHARS).collect();
    }
    collapsed
}

// ── Sections ─────────────────────────────────────────────────────────────────

/// Headings are whole lines: an optional "3.", "2.1" or "IV." marker followed
/// by a capitalised phrase without sentence punctuation. Unnumbered headings
/// must also be short and in title case, since body lines wrap anywhere.
pub fn is_heading(line: &str) -> bool {
    let line = line.trim();
    let len = line.chars().count();
    let words = line.split_whitespace().count();
    if !(HEADING_MIN_CHARS..=HEADING_MAX_CHARS).contains(&len)
        || words > HEADING_MAX_WORDS
        || !HEADING_RE.is_match(line)
    {
        return false;
    }
    HEADING_MARKER_RE.is_match(line)
        || (words <= UNNUMBERED_HEADING_MAX_WORDS && !line.contains(',') && is_title_case(line))
}

/// Every word longer than three letters starts with a capital.
fn is_title_case(line: &str) -> bool {
    line.split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .all(|w| w.chars().next().is_some_and(|c| !c.is_lowercase()))
}

/// Split the text at heading lines. Headings with no body are dropped.
pub fn detect_sections(full_text: &str, page_starts: &[usize]) -> Vec<DocumentSection> {
    let mut headings: Vec<(usize, usize, &str)> = Vec::new(); // (line start, body start, title)
    let mut offset = 0;
    for line in full_text.split_inclusive('\n') {
        if is_heading(line) {
            headings.push((offset, offset + line.len(), line.trim()));
        }
        offset += line.len();
    }

    let mut sections = Vec::new();
    for (i, &(start, body_start, title)) in headings.iter().enumerate() {
        let body_end = headings.get(i + 1).map(|h| h.0).unwrap_or(full_text.len());
        let content = collapse_whitespace(&full_text[body_start..body_end]);
        if content.is_empty() {
            continue;
        }
        sections.push(DocumentSection {
            title: title.to_string(),
            content,
            page: page_at(page_starts, start),
        });
    }
    sections
}

/// Blank-line blocks longer than the minimum become numbered sections.
pub fn fallback_sections(full_text: &str, page_starts: &[usize]) -> Vec<DocumentSection> {
    let mut blocks: Vec<(usize, &str)> = Vec::new();
    let mut cursor = 0;
    for sep in BLANK_LINE_RE.find_iter(full_text) {
        blocks.push((cursor, &full_text[cursor..sep.start()]));
        cursor = sep.end();
    }
    blocks.push((cursor, &full_text[cursor..]));

    blocks
        .into_iter()
        .map(|(start, block)| (start, collapse_whitespace(block)))
        .filter(|(_, block)| block.chars().count() > FALLBACK_SECTION_MIN_CHARS)
        .enumerate()
        .map(|(n, (start, block))| DocumentSection {
            title: format!("Section {}", n + 1),
            content: block,
            page: page_at(page_starts, start),
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 1-based page containing byte `offset`.
fn page_at(page_starts: &[usize], offset: usize) -> u32 {
    page_starts.partition_point(|&s| s <= offset).max(1) as u32
}
