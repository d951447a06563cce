//! External service port traits (narration, image generation).

use async_trait::async_trait;
use serde_json::Value;

use questkeeper_domain::DmModel;

use super::error::{ImageGenError, NarrationError};
use super::types::{ChatHandle, ChatSetup, Part, RawTurn, Transcript};

// =============================================================================
// Narration
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrationPort: Send + Sync {
    /// Start a new conversation.
    async fn open(&self, setup: ChatSetup) -> Result<ChatHandle, NarrationError>;

    /// Send one user turn. The handle's transcript only grows on success.
    async fn send(&self, chat: &mut ChatHandle, payload: Vec<Part>)
        -> Result<RawTurn, NarrationError>;

    /// Conversation history so far.
    async fn history(&self, chat: &ChatHandle) -> Result<Transcript, NarrationError>;

    /// Start a conversation seeded with an earlier transcript.
    async fn reopen(
        &self,
        setup: ChatSetup,
        transcript: Transcript,
    ) -> Result<ChatHandle, NarrationError>;

    /// One-shot structured generation outside any conversation.
    async fn complete_json(
        &self,
        model: &DmModel,
        prompt: String,
        schema: Value,
    ) -> Result<Value, NarrationError>;
}

// =============================================================================
// Image Generation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    /// e.g. "1:1"
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    /// Base64-encoded image bytes.
    pub data_base64: String,
    pub mime_type: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenPort: Send + Sync {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError>;
}
