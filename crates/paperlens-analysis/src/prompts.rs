//! Prompt text for the analysis calls.

pub const SYSTEM_PROMPT: &str = "You are an expert research assistant who explains academic papers \
to curious non-specialists. You always answer with a single JSON object and nothing else.";

const SECTIONS_SCHEMA: &str = r#""sections": [
    {"id": "section-1", "title": "...", "originalContent": "short excerpt", "explanation": "plain-language explanation"}
  ],
  "keyConcepts": ["concept", "..."]"#;

/// Prompt for chunk 0, which also asks for the document-level fields.
pub fn first_chunk_prompt(title: &str, authors: &str, chunk: &str, chunk_count: usize) -> String {
    format!(
        "Paper: \"{title}\" by {authors}.\n\
         This is part 1 of {chunk_count}.\n\n\
         Return JSON with these fields:\n\
         {{\n  \"overview\": \"3-5 sentence summary of the whole paper\",\n  \
         \"complexity\": \"Beginner\" | \"Intermediate\" | \"Advanced\",\n  \
         \"readingTime\": \"estimated reading time, e.g. 15 min\",\n  \
         \"generatedTitle\": \"clear, descriptive title for a general audience\",\n  \
         {SECTIONS_SCHEMA}\n}}\n\n\
         Text:\n{chunk}"
    )
}

/// Prompt for any chunk after the first.
pub fn later_chunk_prompt(
    title: &str,
    chunk: &str,
    chunk_index: usize,
    chunk_count: usize,
) -> String {
    format!(
        "Paper: \"{title}\".\n\
         This is part {part} of {chunk_count}; continue the section-by-section analysis.\n\n\
         Return JSON with these fields:\n\
         {{\n  {SECTIONS_SCHEMA}\n}}\n\n\
         Text:\n{chunk}",
        part = chunk_index + 1,
    )
}

/// Prompt for the optional title-generation call.
pub fn title_prompt(overview: &str, key_concepts: &[String]) -> String {
    let concepts = key_concepts.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    format!(
        "Write a clear, engaging title for a paper explanation.\n\
         Overview: {overview}\n\
         Key concepts: {concepts}\n\n\
         Return JSON: {{\"title\": \"...\"}}"
    )
}
