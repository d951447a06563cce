//! Conversation types shared by the narration port and its adapters.
//!
//! Transcript entries use the same shape as the Gemini `contents` array so a
//! saved history can be replayed verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use questkeeper_domain::{ChatId, DmModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Inline binary data, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl Blob {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// One part of a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(Blob),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn inline(blob: Blob) -> Self {
        Part::InlineData(blob)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }
}

/// Ordered conversation history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(pub Vec<Content>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Content] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Content> {
        self.0.last()
    }

    pub fn push(&mut self, content: Content) {
        self.0.push(content);
    }
}

/// A function the narrator may call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments.
    pub parameters: Value,
}

/// Everything needed to open a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSetup {
    pub model: DmModel,
    pub system_instruction: String,
    pub tools: Vec<ToolDefinition>,
}

/// A sequential conversation with the narrator.
///
/// Each send depends on every earlier turn, so a handle must only be used by
/// one action at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatHandle {
    id: ChatId,
    setup: ChatSetup,
    transcript: Transcript,
}

impl ChatHandle {
    pub fn new(id: ChatId, setup: ChatSetup, transcript: Transcript) -> Self {
        Self {
            id,
            setup,
            transcript,
        }
    }

    pub fn id(&self) -> ChatId {
        self.id
    }

    pub fn model(&self) -> &DmModel {
        &self.setup.model
    }

    pub fn setup(&self) -> &ChatSetup {
        &self.setup
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Record a completed exchange. Only called after a successful send.
    pub fn record_exchange(&mut self, user: Content, reply: Content) {
        self.transcript.push(user);
        self.transcript.push(reply);
    }
}

/// A structured call returned by the narrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnPart {
    Text(String),
    Call(ToolCall),
}

/// Undecoded narrator reply: ordered text and call parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTurn {
    pub parts: Vec<TurnPart>,
}

impl RawTurn {
    pub fn new(parts: Vec<TurnPart>) -> Self {
        Self { parts }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![TurnPart::Text(text.into())])
    }

    pub fn with_call(mut self, name: impl Into<String>, arguments: Value) -> Self {
        self.parts.push(TurnPart::Call(ToolCall {
            name: name.into(),
            arguments,
        }));
        self
    }

    /// Build from the model content of a reply.
    pub fn from_content(content: &Content) -> Self {
        let parts = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(TurnPart::Text(text.clone())),
                Part::FunctionCall(call) => Some(TurnPart::Call(ToolCall {
                    name: call.name.clone(),
                    arguments: call.args.clone(),
                })),
                _ => None,
            })
            .collect();
        Self { parts }
    }
}
