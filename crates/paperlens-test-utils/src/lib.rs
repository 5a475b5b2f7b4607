//! Shared testing utilities for the PaperLens workspace.

pub mod fixtures;
pub mod pdf;
pub mod scripted;

pub use pdf::PdfBuilder;
pub use scripted::{ScriptedBackend, ScriptedReply};
