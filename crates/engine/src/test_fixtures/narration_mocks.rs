//! Scripted narrator for use case tests.
//!
//! Replies are queued up front; every payload, `open` and `reopen` is
//! recorded so tests can assert on what was sent.
//!
//! ```rust,ignore
//! let narration = ScriptedNarration::new()
//!     .reply(RawTurn::text("You find 10 gold."))
//!     .fail(NarrationError::RequestFailed("down".into()));
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use questkeeper_domain::{ChatId, DmModel};

use crate::infrastructure::ports::{
    ChatHandle, ChatSetup, Content, FunctionCall, NarrationError, NarrationPort, Part, RawTurn,
    Transcript, TurnPart,
};

#[derive(Default)]
pub struct ScriptedNarration {
    replies: Mutex<VecDeque<Result<RawTurn, NarrationError>>>,
    /// Served once the queue is empty.
    repeat: Option<RawTurn>,
    json_replies: Mutex<VecDeque<Result<Value, NarrationError>>>,
    reopen_error: Option<NarrationError>,
    sent: Mutex<Vec<Vec<Part>>>,
    opened: Mutex<Vec<ChatSetup>>,
    reopened: Mutex<Vec<(ChatSetup, Transcript)>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedNarration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, turn: RawTurn) -> Self {
        self.replies.lock().unwrap().push_back(Ok(turn));
        self
    }

    pub fn fail(self, error: NarrationError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Answer every send with the same turn.
    pub fn repeating(mut self, turn: RawTurn) -> Self {
        self.repeat = Some(turn);
        self
    }

    pub fn json_reply(self, value: Value) -> Self {
        self.json_replies.lock().unwrap().push_back(Ok(value));
        self
    }

    pub fn json_fail(self, error: NarrationError) -> Self {
        self.json_replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn failing_reopen(mut self, error: NarrationError) -> Self {
        self.reopen_error = Some(error);
        self
    }

    pub fn sent(&self) -> Vec<Vec<Part>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn opened(&self) -> Vec<ChatSetup> {
        self.opened.lock().unwrap().clone()
    }

    pub fn reopened(&self) -> Vec<(ChatSetup, Transcript)> {
        self.reopened.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

/// Model content equivalent to a raw turn.
pub fn turn_content(turn: &RawTurn) -> Content {
    Content::model(
        turn.parts
            .iter()
            .map(|part| match part {
                TurnPart::Text(text) => Part::Text(text.clone()),
                TurnPart::Call(call) => Part::FunctionCall(FunctionCall {
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                }),
            })
            .collect(),
    )
}

#[async_trait]
impl NarrationPort for ScriptedNarration {
    async fn open(&self, setup: ChatSetup) -> Result<ChatHandle, NarrationError> {
        self.opened.lock().unwrap().push(setup.clone());
        Ok(ChatHandle::new(ChatId::new(), setup, Transcript::new()))
    }

    async fn send(
        &self,
        chat: &mut ChatHandle,
        payload: Vec<Part>,
    ) -> Result<RawTurn, NarrationError> {
        self.sent.lock().unwrap().push(payload.clone());
        let next = self.replies.lock().unwrap().pop_front();
        let reply = match next {
            Some(reply) => reply,
            None => self.repeat.clone().ok_or(NarrationError::Empty),
        }?;
        chat.record_exchange(Content::user(payload), turn_content(&reply));
        Ok(reply)
    }

    async fn history(&self, chat: &ChatHandle) -> Result<Transcript, NarrationError> {
        Ok(chat.transcript().clone())
    }

    async fn reopen(
        &self,
        setup: ChatSetup,
        transcript: Transcript,
    ) -> Result<ChatHandle, NarrationError> {
        if let Some(error) = &self.reopen_error {
            return Err(error.clone());
        }
        self.reopened
            .lock()
            .unwrap()
            .push((setup.clone(), transcript.clone()));
        Ok(ChatHandle::new(ChatId::new(), setup, transcript))
    }

    async fn complete_json(
        &self,
        _model: &DmModel,
        prompt: String,
        _schema: Value,
    ) -> Result<Value, NarrationError> {
        self.prompts.lock().unwrap().push(prompt);
        self.json_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(NarrationError::Empty))
    }
}
