//! Token-bounded chunker.
//!
//! Packs paragraphs greedily into chunks of at most `max_tokens * 4`
//! characters. A paragraph that cannot fit on its own is packed again at
//! sentence granularity; a sentence that still does not fit becomes its own
//! oversized chunk.

/// Fixed approximation used for sizing only. Billing uses reported counts.
pub const CHARS_PER_TOKEN: usize = 4;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SENTENCE_SEPARATOR: &str = ". ";

/// Configuration for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Approximate token budget per chunk.
    pub max_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { max_tokens: 15_000 }
    }
}

impl ChunkerConfig {
    pub fn max_chars(&self) -> usize {
        self.max_tokens.saturating_mul(CHARS_PER_TOKEN)
    }
}

/// Separator that followed a chunk in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkBoundary {
    Paragraph,
    Sentence,
    /// Last chunk of the document.
    End,
}

impl ChunkBoundary {
    pub fn separator(&self) -> &'static str {
        match self {
            ChunkBoundary::Paragraph => PARAGRAPH_SEPARATOR,
            ChunkBoundary::Sentence  => SENTENCE_SEPARATOR,
            ChunkBoundary::End       => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
    pub boundary: ChunkBoundary,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Split `text` into ordered chunks. Empty input yields no chunks; any other
/// input yields at least one.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }
    let max_chars = config.max_chars();
    if text.chars().count() <= max_chars {
        return vec![Chunk {
            index: 0,
            content: text.to_string(),
            boundary: ChunkBoundary::End,
        }];
    }

    let mut out = Emitter::default();
    let mut paragraphs = Accumulator::new(PARAGRAPH_SEPARATOR, max_chars);
    let mut pieces = text.split(PARAGRAPH_SEPARATOR).peekable();

    while let Some(paragraph) = pieces.next() {
        if paragraph.chars().count() <= max_chars {
            paragraphs.push(paragraph, &mut out, ChunkBoundary::Paragraph);
            continue;
        }

        paragraphs.flush(&mut out, ChunkBoundary::Paragraph);
        let mut sentences = Accumulator::new(SENTENCE_SEPARATOR, max_chars);
        for sentence in paragraph.split(SENTENCE_SEPARATOR) {
            sentences.push(sentence, &mut out, ChunkBoundary::Sentence);
        }
        let after = if pieces.peek().is_some() {
            ChunkBoundary::Paragraph
        } else {
            ChunkBoundary::End
        };
        sentences.flush(&mut out, after);
    }
    paragraphs.flush(&mut out, ChunkBoundary::End);

    let chunks = out.finish(text);
    tracing::debug!(
        chunks = chunks.len(),
        max_chars,
        oversized = chunks.iter().filter(|c| c.char_len() > max_chars).count(),
        "Chunked document"
    );
    chunks
}

/// Concatenate chunks with the separators they were split on.
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&chunk.content);
        out.push_str(chunk.boundary.separator());
    }
    out
}

/// Rough token estimate at 4 characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Collects emitted chunks. An empty piece never becomes a chunk; the
/// separator after it is carried into the next chunk's content instead.
#[derive(Default)]
struct Emitter {
    chunks: Vec<Chunk>,
    carry: String,
}

impl Emitter {
    fn emit(&mut self, content: String, boundary: ChunkBoundary) {
        if content.is_empty() {
            self.carry.push_str(boundary.separator());
            return;
        }
        let content = if self.carry.is_empty() {
            content
        } else {
            std::mem::take(&mut self.carry) + &content
        };
        self.chunks.push(Chunk { index: self.chunks.len(), content, boundary });
    }

    /// Close the last chunk, folding in anything still carried.
    fn finish(mut self, text: &str) -> Vec<Chunk> {
        if self.chunks.is_empty() {
            return vec![Chunk { index: 0, content: text.to_string(), boundary: ChunkBoundary::End }];
        }
        if let Some(last) = self.chunks.last_mut() {
            last.content.push_str(last.boundary.separator());
            last.content.push_str(&self.carry);
            last.boundary = ChunkBoundary::End;
        }
        self.chunks
    }
}

/// Greedy packer for one granularity (paragraphs or sentences).
struct Accumulator {
    separator: &'static str,
    max_chars: usize,
    buf: Option<String>,
    buf_len: usize,
}

impl Accumulator {
    fn new(separator: &'static str, max_chars: usize) -> Self {
        Self { separator, max_chars, buf: None, buf_len: 0 }
    }

    fn push(&mut self, piece: &str, out: &mut Emitter, boundary: ChunkBoundary) {
        let len = piece.chars().count();
        let joined_len = self.buf_len + self.separator.len() + len;
        if self.buf.is_some() && joined_len > self.max_chars {
            self.flush(out, boundary);
        }

        match self.buf.as_mut() {
            Some(buf) => {
                buf.push_str(self.separator);
                buf.push_str(piece);
                self.buf_len = joined_len;
            }
            None => {
                self.buf = Some(piece.to_string());
                self.buf_len = len;
            }
        }
    }

    fn flush(&mut self, out: &mut Emitter, boundary: ChunkBoundary) {
        if let Some(content) = self.buf.take() {
            out.emit(content, boundary);
        }
        self.buf_len = 0;
    }
}
