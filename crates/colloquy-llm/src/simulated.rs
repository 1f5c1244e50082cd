use anyhow::Result;
use async_trait::async_trait;

use crate::traits::{FragmentStream, GenerateRequest, InferenceClient};
use crate::types::Role;

const REPLY_TEMPLATES: &[&str] = &[
    "That's a fair question. The answer depends on the surrounding context and on what you are trying to accomplish.",
    "Looking at this step by step: the key factors interact, and the outcome follows from how they combine.",
    "There are a few ways to approach this. The most direct one is usually the best starting point.",
    "Based on what you've described, the most likely explanation is the simplest one consistent with the details given.",
];

/// Local inference backend that simulates completions without a model.
///
/// Replies are deterministic functions of the last user turn, which keeps
/// tests and development runs reproducible. Failure injection mimics an
/// unreachable or erroring backend.
pub struct SimulatedInferenceClient {
    fail_with: Option<String>,
}

impl SimulatedInferenceClient {
    pub fn new() -> Self {
        Self { fail_with: None }
    }

    /// Every generate call will fail with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
        }
    }

    fn reply_for(&self, request: &GenerateRequest) -> String {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.content.as_str())
            .unwrap_or("");

        // Template choice keyed off the prompt keeps replies varied but stable
        let template = REPLY_TEMPLATES[last_user.len() % REPLY_TEMPLATES.len()];

        if last_user.is_empty() {
            template.to_string()
        } else {
            format!("Regarding \"{}\": {}", truncate(last_user, 60), template)
        }
    }
}

impl Default for SimulatedInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl InferenceClient for SimulatedInferenceClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }

        let reply = self.reply_for(&request);
        tracing::debug!("Simulated completion ({} chars)", reply.len());
        Ok(reply)
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<FragmentStream> {
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }

        let reply = self.reply_for(&request);
        let words: Vec<String> = reply
            .split_inclusive(' ')
            .map(|w| w.to_string())
            .collect();

        Ok(Box::pin(futures::stream::iter(
            words.into_iter().map(Ok),
        )))
    }
}
