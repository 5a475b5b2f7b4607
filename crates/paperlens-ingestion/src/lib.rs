//! paperlens-ingestion: Getting a paper from bytes (or an arXiv link) to text.
//! - PDF content-stream parsing into positioned fragments, decoded per font
//! - Layout heuristics: title, authors, abstract, section headings
//! - Token-bounded chunking for the analysis stage
//! - arXiv identifier validation, metadata lookup and PDF download

pub mod chunker;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod models;
pub mod pdf_parser;
pub mod sources;

pub use error::ExtractionError;
pub use models::{DocumentSection, ExtractedFragment, ParsedDocument, PdfPage};
