use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

use crate::types::ChatTurn;

/// Lazy, finite sequence of text fragments produced by a streaming backend.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for inference backends.
///
/// A backend takes an ordered list of role/content turns plus generation
/// parameters and produces a completion, either whole or as a fragment
/// stream. Backends are opaque, possibly slow, possibly failing remote
/// dependencies; any failure surfaces as a single error the caller maps to
/// its own outcome.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Non-streaming completion: await the full response text.
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Streaming completion: fragments as the backend produces them.
    ///
    /// The stream ends normally when the backend signals completion, or with
    /// an error item if the connection drops mid-generation. Fragments are
    /// not guaranteed to be whole tokens or words.
    async fn generate_stream(&self, request: GenerateRequest) -> Result<FragmentStream>;
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatTurn>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }
}
