//! The abstract model-gateway contract the cache decorates.
//!
//! Concrete providers (OpenAI, Anthropic, ...) live outside this crate; here
//! we define only the capability surface the decorator wraps, plus the
//! request/response shapes it canonicalizes for key derivation.

pub mod cached;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use cached::CachedGateway;

/// Role tag for a single prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A fully assembled prompt plus sampling parameters, ready for a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptBundle {
    /// Ordered conversation messages.
    pub messages: Vec<Message>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl PromptBundle {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Deterministic string form used as the cache's prompt text.
    ///
    /// One flat JSON object with sorted keys, so two bundles with identical
    /// content always canonicalize identically.
    pub fn canonical_string(&self) -> String {
        let mut map = std::collections::BTreeMap::new();
        map.insert(
            "messages",
            serde_json::to_value(&self.messages).unwrap_or(Value::Null),
        );
        map.insert(
            "temperature",
            self.temperature.map(Value::from).unwrap_or(Value::Null),
        );
        map.insert(
            "max_tokens",
            self.max_tokens.map(Value::from).unwrap_or(Value::Null),
        );
        serde_json::to_string(&map).unwrap_or_default()
    }
}

/// Token accounting for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A gateway response (or, for streaming, one chunk of it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    /// Raw provider payload, when the gateway keeps it around.
    #[serde(default)]
    pub raw_response: Option<Value>,
    /// Latency of the upstream call that originally produced this response.
    /// A cache hit preserves the value recorded at write time.
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Lazy, sequential, non-restartable chunk sequence from a streaming call.
pub type ResponseStream = BoxStream<'static, Result<LlmResponse>>;

/// Capability surface of a model gateway.
///
/// The caching decorator implements this same trait over any inner gateway,
/// so callers cannot tell a wrapped gateway from a bare one.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Provider identity (openai, anthropic, ...).
    fn provider(&self) -> &str;

    /// Model identity.
    fn model(&self) -> &str;

    /// One-shot completion call.
    async fn call(&self, bundle: &PromptBundle) -> Result<LlmResponse>;

    /// Streaming completion call.
    async fn stream(&self, bundle: &PromptBundle) -> Result<ResponseStream>;

    /// Whether the provider is currently reachable.
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> PromptBundle {
        PromptBundle::new(vec![
            Message::new(Role::System, "You are a translator."),
            Message::new(Role::User, "Translate 'Hello world' to Chinese"),
        ])
        .with_temperature(0.7)
        .with_max_tokens(4096)
    }

    #[test]
    fn test_canonical_string_deterministic() {
        assert_eq!(bundle().canonical_string(), bundle().canonical_string());
    }

    #[test]
    fn test_canonical_string_content_sensitive() {
        let other = PromptBundle::new(vec![Message::new(Role::User, "different")])
            .with_temperature(0.7)
            .with_max_tokens(4096);
        assert_ne!(bundle().canonical_string(), other.canonical_string());
    }

    #[test]
    fn test_token_usage_deserialize_defaults() {
        let usage: TokenUsage = serde_json::from_str("{}").unwrap();
        assert_eq!(usage, TokenUsage::default());
    }

    #[test]
    fn test_response_deserialize_with_missing_optionals() {
        let resp: LlmResponse = serde_json::from_str(
            r#"{"content": "hi", "provider": "openai", "model": "gpt-4o"}"#,
        )
        .unwrap();
        assert_eq!(resp.latency_ms, 0);
        assert_eq!(resp.usage, TokenUsage::default());
        assert!(resp.raw_response.is_none());
    }
}
