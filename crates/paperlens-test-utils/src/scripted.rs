//! Scripted `LlmBackend` for orchestrator tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use paperlens_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};

/// One scripted outcome, consumed in call order.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Content {
        content: String,
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    /// Fail the call the way a transport error would.
    Fail(String),
    /// Never answer. Used to exercise call timeouts.
    Hang,
}

/// Backend that replays a fixed script and records every request it saw.
pub struct ScriptedBackend {
    model: String,
    script: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            model: "scripted-model".to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply with a fixed usage of 1000 prompt / 200 completion tokens.
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.reply_with_usage(content, 1_000, 200)
    }

    pub fn reply_with_usage(
        self,
        content: impl Into<String>,
        prompt_tokens: u32,
        completion_tokens: u32,
    ) -> Self {
        self.push(ScriptedReply::Content {
            content: content.into(),
            prompt_tokens,
            completion_tokens,
        })
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(ScriptedReply::Fail(message.into()))
    }

    pub fn hang(self) -> Self {
        self.push(ScriptedReply::Hang)
    }

    fn push(self, reply: ScriptedReply) -> Self {
        self.script.lock().unwrap().push_back(reply);
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(req);
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(ScriptedReply::Content { content, prompt_tokens, completion_tokens }) => {
                Ok(LlmResponse {
                    content,
                    model: self.model.clone(),
                    prompt_tokens,
                    completion_tokens,
                })
            }
            Some(ScriptedReply::Fail(message)) => Err(LlmError::Unavailable(message)),
            Some(ScriptedReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Unavailable("scripted hang elapsed".to_string()))
            }
            None => Err(LlmError::Unavailable("script exhausted".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn is_local(&self) -> bool {
        true
    }
}
