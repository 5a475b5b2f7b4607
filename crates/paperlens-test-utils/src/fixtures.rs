//! Canned fragments and model replies.

use paperlens_ingestion::ExtractedFragment;
use serde_json::json;

/// First page of "Attention Is All You Need" as fragments, content-stream order.
/// The arXiv stamp sits in the left margin, below the front matter.
pub fn attention_first_page() -> Vec<ExtractedFragment> {
    vec![
        ExtractedFragment::new("Preprint", 72.0, 760.0, 1),
        ExtractedFragment::new("arXiv:1706.03762v7 [cs.CL] 2 Aug 2023", 20.0, 300.0, 1),
        ExtractedFragment::new("Attention Is All You Need", 200.0, 700.0, 1),
        ExtractedFragment::new("Ashish Vaswani, Noam Shazeer, Niki Parmar", 150.0, 670.0, 1),
        ExtractedFragment::new("Google Brain", 250.0, 655.0, 1),
        ExtractedFragment::new("Abstract", 280.0, 600.0, 1),
    ]
}

/// Chunk-0 reply carrying the document-level fields.
pub fn first_chunk_reply() -> String {
    json!({
        "overview": "X",
        "complexity": "Advanced",
        "readingTime": "10 min",
        "keyConcepts": ["a", "b"],
        "sections": [
            {"id": "s0", "title": "Intro", "originalContent": "...", "explanation": "..."}
        ]
    })
    .to_string()
}

/// Reply for any later chunk.
pub fn later_chunk_reply() -> String {
    json!({
        "keyConcepts": ["b", "c"],
        "sections": [
            {"id": "s1", "title": "Method", "originalContent": "...", "explanation": "..."}
        ]
    })
    .to_string()
}

/// Reply for a later chunk with the given concepts and one section.
pub fn chunk_reply(section_title: &str, concepts: &[&str]) -> String {
    json!({
        "keyConcepts": concepts,
        "sections": [
            {"id": section_title.to_lowercase(), "title": section_title,
             "originalContent": "...", "explanation": "..."}
        ]
    })
    .to_string()
}

/// `count` paragraphs of `len` characters each, joined by blank lines.
pub fn paragraphs(count: usize, len: usize) -> String {
    (0..count)
        .map(|i| {
            let letter = (b'a' + (i % 26) as u8) as char;
            letter.to_string().repeat(len)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
