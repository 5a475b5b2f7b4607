//! paperlens-llm: Language-model collaborator layer.
//! The orchestrator only ever sees the `LlmBackend` trait; concrete
//! providers are chosen at startup through `router::build_backend`.

pub mod audit;
pub mod backend;
pub mod router;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, ResponseFormat};
