//! Gemini narration client (generateContent REST API)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use questkeeper_domain::{ChatId, DmModel};

use crate::infrastructure::ports::{
    Blob, ChatHandle, ChatSetup, Content, FunctionCall, FunctionResponse, NarrationError,
    NarrationPort, Part, RawTurn, Role, ToolDefinition, Transcript,
};
use crate::infrastructure::settings::{EngineConfig, DEFAULT_GEMINI_BASE_URL};

/// Client for the Gemini `generateContent` endpoint.
///
/// Conversations are held client side: every send replays the handle's
/// transcript, so reopening a chat from a saved history needs no server state.
#[derive(Clone)]
pub struct GeminiNarrationClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiNarrationClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            &config.gemini_base_url,
            &config.gemini_api_key,
            config.narration_timeout,
        )
    }

    /// Client against the public endpoint with the default timeout.
    pub fn with_api_key(api_key: &str) -> Self {
        Self::new(DEFAULT_GEMINI_BASE_URL, api_key, Duration::from_secs(120))
    }

    async fn generate(
        &self,
        model: &DmModel,
        request: &GenerateContentRequest,
    ) -> Result<Content, NarrationError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url,
                model.id()
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| NarrationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .map_err(|e| NarrationError::RequestFailed(e.to_string()))?;
            return Err(NarrationError::RequestFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::InvalidResponse(e.to_string()))?;

        first_candidate(api_response)
    }
}

#[async_trait]
impl NarrationPort for GeminiNarrationClient {
    async fn open(&self, setup: ChatSetup) -> Result<ChatHandle, NarrationError> {
        tracing::debug!(model = %setup.model, "Opening narration chat");
        Ok(ChatHandle::new(ChatId::new(), setup, Transcript::new()))
    }

    async fn send(
        &self,
        chat: &mut ChatHandle,
        payload: Vec<Part>,
    ) -> Result<RawTurn, NarrationError> {
        let user = user_turn(chat.transcript(), payload);
        let request = build_chat_request(chat.setup(), chat.transcript(), &user);

        tracing::debug!(
            chat_id = %chat.id(),
            model = %chat.model(),
            history_len = chat.transcript().len(),
            "Sending narration turn"
        );

        let reply = self.generate(chat.model(), &request).await?;
        let turn = RawTurn::from_content(&reply);
        chat.record_exchange(user, reply);
        Ok(turn)
    }

    async fn history(&self, chat: &ChatHandle) -> Result<Transcript, NarrationError> {
        Ok(chat.transcript().clone())
    }

    async fn reopen(
        &self,
        setup: ChatSetup,
        transcript: Transcript,
    ) -> Result<ChatHandle, NarrationError> {
        tracing::debug!(
            model = %setup.model,
            history_len = transcript.len(),
            "Reopening narration chat"
        );
        Ok(ChatHandle::new(ChatId::new(), setup, transcript))
    }

    async fn complete_json(
        &self,
        model: &DmModel,
        prompt: String,
        schema: Value,
    ) -> Result<Value, NarrationError> {
        let request = GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::user(vec![Part::text(prompt)])],
            tools: Vec::new(),
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        };

        let reply = self.generate(model, &request).await?;
        let text = reply
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<String>();

        if text.trim().is_empty() {
            return Err(NarrationError::Empty);
        }

        serde_json::from_str(text.trim()).map_err(|e| {
            NarrationError::InvalidResponse(format!("Structured reply is not JSON: {}", e))
        })
    }
}

/// The user content for a send.
///
/// A model turn that made function calls must be answered with function
/// responses before anything else, so those acknowledgements lead the parts.
fn user_turn(transcript: &Transcript, payload: Vec<Part>) -> Content {
    let mut parts: Vec<Part> = transcript
        .last()
        .filter(|c| c.role == Role::Model)
        .map(|c| {
            c.function_calls()
                .map(|call| {
                    Part::FunctionResponse(FunctionResponse {
                        name: call.name.clone(),
                        response: json!({ "result": "ok" }),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    parts.extend(payload);
    Content::user(parts)
}

fn build_chat_request(
    setup: &ChatSetup,
    transcript: &Transcript,
    user: &Content,
) -> GenerateContentRequest {
    let mut contents = transcript.entries().to_vec();
    contents.push(user.clone());

    GenerateContentRequest {
        system_instruction: Some(SystemInstruction {
            parts: vec![TextPart {
                text: setup.system_instruction.clone(),
            }],
        }),
        contents,
        tools: if setup.tools.is_empty() {
            Vec::new()
        } else {
            vec![ToolSet {
                function_declarations: setup.tools.iter().map(FunctionDeclaration::from).collect(),
            }]
        },
        generation_config: None,
    }
}

fn first_candidate(response: GenerateContentResponse) -> Result<Content, NarrationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(NarrationError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(NarrationError::Empty)?;

    let parts: Vec<Part> = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(WirePart::into_part).collect())
        .unwrap_or_default();

    if parts.is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "RECITATION")) => {
                Err(NarrationError::Blocked(reason.to_string()))
            }
            _ => Err(NarrationError::Empty),
        };
    }

    Ok(Content::model(parts))
}

// =============================================================================
// Gemini API types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolSet {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&ToolDefinition> for FunctionDeclaration {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

/// Response parts carry optional siblings (thought signatures etc.) next to
/// the payload key, so they are read field by field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    text: Option<String>,
    function_call: Option<FunctionCall>,
    inline_data: Option<Blob>,
    #[serde(default)]
    thought: bool,
}

impl WirePart {
    fn into_part(self) -> Option<Part> {
        if self.thought {
            return None;
        }
        if let Some(call) = self.function_call {
            return Some(Part::FunctionCall(call));
        }
        if let Some(blob) = self.inline_data {
            return Some(Part::InlineData(blob));
        }
        self.text.map(Part::Text)
    }
}
