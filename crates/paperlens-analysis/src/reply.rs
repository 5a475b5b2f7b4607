//! Lenient parsing of model replies.
//!
//! A reply that is not a JSON object at all is an error. Inside the object
//! every field is optional: wrong types and missing keys degrade to empty
//! values instead of failing the analysis.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::models::{AnalysisSection, CallStage, ChunkAnalysisResult, Complexity};

/// Generated titles must be strictly longer than this...
pub const TITLE_MIN_CHARS: usize = 10;
/// ...and strictly shorter than this.
pub const TITLE_MAX_CHARS: usize = 150;

/// Pull the JSON payload out of a reply that may be wrapped in a code
/// fence or surrounded by prose. A reply that already parses is returned
/// as-is, so fences inside string values are never touched.
pub fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();
    if serde_json::from_str::<Value>(trimmed).is_ok() {
        return trimmed;
    }

    if let Some(after_tick) = trimmed.strip_prefix("```") {
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].rfind("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

fn parse_object(reply: &str, stage: CallStage) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(extract_json(reply)).map_err(|e| {
        AnalysisError::MalformedReply { stage, reason: e.to_string() }
    })?;
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(AnalysisError::MalformedReply {
            stage,
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

/// Parse one chunk reply. Document-level fields are read for chunk 0 only.
pub fn parse_chunk_reply(reply: &str, stage: CallStage) -> Result<ChunkAnalysisResult> {
    let obj = parse_object(reply, stage)?;
    let chunk_index = match stage {
        CallStage::Chunk(i) => i,
        CallStage::Title    => 0,
    };

    let sections = obj
        .get("sections")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| parse_section(item, chunk_index, i))
                .collect()
        })
        .unwrap_or_default();

    let key_concepts = obj
        .get("keyConcepts")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(non_empty_str).collect())
        .unwrap_or_default();

    let mut result = ChunkAnalysisResult { sections, key_concepts, ..Default::default() };
    if chunk_index == 0 {
        result.overview = obj.get("overview").and_then(non_empty_str);
        result.complexity = obj
            .get("complexity")
            .and_then(Value::as_str)
            .and_then(Complexity::parse_lenient);
        result.reading_time = obj.get("readingTime").and_then(non_empty_str);
        result.generated_title = obj.get("generatedTitle").and_then(non_empty_str);
    }

    debug!(
        %stage,
        sections = result.sections.len(),
        key_concepts = result.key_concepts.len(),
        "Parsed chunk reply"
    );
    Ok(result)
}

/// Parse the title-generation reply, `{"title": "..."}`.
pub fn parse_title_reply(reply: &str) -> Result<Option<String>> {
    let obj = parse_object(reply, CallStage::Title)?;
    Ok(obj.get("title").and_then(non_empty_str))
}

/// Length window a generated title must fall in, exclusive on both ends.
pub fn is_usable_title(title: &str) -> bool {
    let len = title.trim().chars().count();
    len > TITLE_MIN_CHARS && len < TITLE_MAX_CHARS
}

fn parse_section(item: &Value, chunk_index: usize, position: usize) -> Option<AnalysisSection> {
    if !item.is_object() {
        return None;
    }
    let mut section: AnalysisSection = serde_json::from_value(item.clone()).ok()?;
    if section.id.trim().is_empty() {
        section.id = format!("chunk{}-section{}", chunk_index, position + 1);
    }
    Some(section)
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_json_from_fence() {
        let reply = "Here you go:\n```json\n{\"keyConcepts\": []}\n```\nDone.";
        assert_eq!(extract_json(reply), r#"{"keyConcepts": []}"#);
    }

    #[test]
    fn test_fenced_reply_keeps_fences_inside_strings() {
        let reply = "```json\n{\"sections\":[{\"id\":\"s1\",\"originalContent\":\"```python\\nprint(1)\\n```\"}]}\n```";
        let r = parse_chunk_reply(reply, CallStage::Chunk(1)).unwrap();
        assert_eq!(r.sections[0].original_content, "```python\nprint(1)\n```");
    }

    #[test]
    fn test_code_fence_inside_json_string_survives() {
        let reply = r#"{"keyConcepts":["code"],
            "sections":[{"id":"s1","title":"Listing",
            "originalContent":"```python\nprint(1)\n```","explanation":"Prints one."}]}"#;
        assert_eq!(extract_json(reply), reply.trim());
        let r = parse_chunk_reply(reply, CallStage::Chunk(1)).unwrap();
        assert_eq!(r.sections.len(), 1);
        assert_eq!(r.sections[0].original_content, "```python\nprint(1)\n```");
        assert_eq!(r.key_concepts, vec!["code"]);
    }

    #[test]
    fn test_extract_json_with_prefix() {
        assert_eq!(extract_json("Sure! {\"a\": 1} hope that helps"), r#"{"a": 1}"#);
    }

    #[test]
    fn test_first_chunk_reads_document_fields() {
        let reply = r#"{"overview":"X","complexity":"Advanced","readingTime":"10 min",
            "generatedTitle":"A Friendly Guide to Attention",
            "keyConcepts":["a","b"],
            "sections":[{"id":"s0","title":"Intro","originalContent":"...","explanation":"..."}]}"#;
        let r = parse_chunk_reply(reply, CallStage::Chunk(0)).unwrap();
        assert_eq!(r.overview.as_deref(), Some("X"));
        assert_eq!(r.complexity, Some(Complexity::Advanced));
        assert_eq!(r.reading_time.as_deref(), Some("10 min"));
        assert_eq!(r.generated_title.as_deref(), Some("A Friendly Guide to Attention"));
        assert_eq!(r.key_concepts, vec!["a", "b"]);
        assert_eq!(r.sections[0].title, "Intro");
    }

    #[test]
    fn test_later_chunk_ignores_document_fields() {
        let reply = r#"{"overview":"ignored","keyConcepts":["c"],"sections":[]}"#;
        let r = parse_chunk_reply(reply, CallStage::Chunk(3)).unwrap();
        assert_eq!(r.overview, None);
        assert_eq!(r.key_concepts, vec!["c"]);
    }

    #[test]
    fn test_missing_and_mistyped_fields_degrade() {
        let reply = r#"{"complexity":"genius","keyConcepts":"not a list",
            "sections":[{"title":"No id"}, 42, {"title": 7}]}"#;
        let r = parse_chunk_reply(reply, CallStage::Chunk(0)).unwrap();
        assert_eq!(r.complexity, None);
        assert!(r.key_concepts.is_empty());
        assert_eq!(r.overview, None);
        assert_eq!(r.sections.len(), 1);
        assert_eq!(r.sections[0].id, "chunk0-section1");
    }

    #[test]
    fn test_blank_concepts_are_dropped() {
        let reply = r#"{"keyConcepts":["  ", "attention", 3, ""]}"#;
        let r = parse_chunk_reply(reply, CallStage::Chunk(1)).unwrap();
        assert_eq!(r.key_concepts, vec!["attention"]);
    }

    #[test]
    fn test_non_json_reply_is_malformed() {
        let err = parse_chunk_reply("I cannot help with that.", CallStage::Chunk(2)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MalformedReply { stage: CallStage::Chunk(2), .. }
        ));
    }

    #[test]
    fn test_array_reply_is_malformed() {
        assert!(parse_chunk_reply("[1, 2]", CallStage::Chunk(0)).is_err());
    }

    #[test]
    fn test_title_reply() {
        assert_eq!(
            parse_title_reply(r#"{"title":"  Attention, Explained  "}"#).unwrap().as_deref(),
            Some("Attention, Explained")
        );
        assert_eq!(parse_title_reply(r#"{"name":"x"}"#).unwrap(), None);
    }

    #[test]
    fn test_title_window_is_exclusive() {
        assert!(!is_usable_title(&"x".repeat(10)));
        assert!(is_usable_title(&"x".repeat(11)));
        assert!(is_usable_title(&"x".repeat(149)));
        assert!(!is_usable_title(&"x".repeat(150)));
    }
}
