//! Turn Orchestrator.
//!
//! Drives one player-visible action through the narrator: compose, send,
//! decode and apply, then resolve requested dice rolls for a bounded number of
//! follow-up rounds.

pub mod apply;
pub mod compose;
pub mod decoder;

use std::sync::Arc;

use questkeeper_domain::{DiceRoll, EntityId};

use crate::infrastructure::ports::{
    ChatHandle, NarrationError, NarrationPort, Part, RandomPort, RawTurn,
};
use crate::prompt_templates;
use crate::stores::{SessionEvent, SessionStore};

pub use apply::build_delta;
pub use compose::{compose, Attachment, Composition, PlayerInput};
pub use decoder::{decode_turn, QuestAdd, TurnResult};

/// Narrator round-trips allowed per player action.
pub const MAX_DICE_ROUNDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("No adventure is running")]
    NotStarted,
    #[error("Another action is still being resolved")]
    ActionInFlight,
    #[error("Narration failed: {0}")]
    Narration(#[from] NarrationError),
}

/// What happened during one action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnOutcome {
    /// Narrator round-trips made (0 when there was nothing to send).
    pub rounds: usize,
    /// Rolls resolved on the narrator's behalf, in order.
    pub rolls: Vec<DiceRoll>,
    /// The narrator still wanted a roll when the round limit was hit.
    pub truncated: bool,
}

pub struct TurnOrchestrator {
    narration: Arc<dyn NarrationPort>,
    store: Arc<SessionStore>,
    random: Arc<dyn RandomPort>,
    max_rounds: usize,
}

impl TurnOrchestrator {
    pub fn new(
        narration: Arc<dyn NarrationPort>,
        store: Arc<SessionStore>,
        random: Arc<dyn RandomPort>,
        max_rounds: usize,
    ) -> Self {
        Self {
            narration,
            store,
            random,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Run one player action to completion.
    pub async fn execute(&self, input: PlayerInput) -> Result<TurnOutcome, TurnError> {
        let _action = self
            .store
            .try_begin_action()
            .ok_or(TurnError::ActionInFlight)?;

        let state = self.store.snapshot();
        let mut chat = match (&state.chat, state.game_started) {
            (Some(chat), true) => chat.clone(),
            _ => return Err(TurnError::NotStarted),
        };
        if state.is_loading {
            return Err(TurnError::ActionInFlight);
        }

        let Some(Composition {
            parts,
            log_text,
            consumed_note,
            consumed_portraits,
        }) = compose(
            state.pending_ooc_note.as_deref(),
            &state.pending_portraits,
            &input,
        ) else {
            tracing::debug!("Nothing to send for player action");
            return Ok(TurnOutcome::default());
        };

        self.store
            .dispatch(SessionEvent::AppendPlayerMessage(log_text));
        self.store.dispatch(SessionEvent::SetLoading(true));

        let reply = match self.narration.send(&mut chat, parts).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(error = %error, "Narrator send failed, rolling back player message");
                self.store.dispatch(SessionEvent::RevertLastPlayerMessage);
                self.store
                    .dispatch(SessionEvent::SetError(Some(unavailable_message(&error))));
                return Err(error.into());
            }
        };

        self.store.dispatch(SessionEvent::SetChatHandle(chat.clone()));
        self.consume_pending(consumed_note.as_deref(), consumed_portraits);

        self.resolve_turns(chat, reply).await
    }

    /// Apply a reply and any dice rounds that follow it, then settle.
    ///
    /// `first` is the reply to the action's first send, which counts as round 1.
    pub(crate) async fn resolve_turns(
        &self,
        mut chat: ChatHandle,
        first: RawTurn,
    ) -> Result<TurnOutcome, TurnError> {
        let mut outcome = TurnOutcome {
            rounds: 1,
            ..Default::default()
        };
        let mut reply = first;

        loop {
            let result = decode_turn(&reply, self.random.as_ref());
            let delta = build_delta(&self.store.snapshot(), &result, self.random.as_ref());
            self.store.dispatch(SessionEvent::ApplyTurn(delta));

            let Some(request) = result.dice_roll_request else {
                break;
            };

            if outcome.rounds >= self.max_rounds {
                tracing::warn!(
                    rounds = outcome.rounds,
                    reason = %request.reason,
                    "Dice round limit reached, leaving roll unresolved"
                );
                self.store.dispatch(SessionEvent::AppendSystemMessage(format!(
                    "[SYSTEM] The Dungeon Master asked for another roll ({}), but the automatic roll limit for this action was reached.",
                    request.reason
                )));
                outcome.truncated = true;
                break;
            }

            let roll = request.resolve(|min, max| self.random.gen_range(min, max));
            tracing::info!(
                reason = %roll.reason,
                total = roll.total,
                "Resolved narrator dice request"
            );
            self.store.dispatch(SessionEvent::AppendSystemMessage(format!(
                "[SYSTEM] Rolled for {}: {}",
                roll.reason,
                roll.breakdown()
            )));

            let follow_up = vec![Part::text(prompt_templates::dice_follow_up(&roll))];
            outcome.rolls.push(roll);

            match self.narration.send(&mut chat, follow_up).await {
                Ok(next) => {
                    self.store.dispatch(SessionEvent::SetChatHandle(chat.clone()));
                    outcome.rounds += 1;
                    reply = next;
                }
                Err(error) => {
                    tracing::warn!(
                        round = outcome.rounds + 1,
                        error = %error,
                        "Dice follow-up failed"
                    );
                    self.store
                        .dispatch(SessionEvent::SetError(Some(unavailable_message(&error))));
                    return Err(error.into());
                }
            }
        }

        self.store.dispatch(SessionEvent::SetLoading(false));
        Ok(outcome)
    }

    /// Drop the note and portraits the first send delivered.
    fn consume_pending(&self, sent_note: Option<&str>, sent_portraits: Vec<EntityId>) {
        if let Some(sent) = sent_note {
            let current = self.store.read(|s| s.pending_ooc_note.clone());
            match current.as_deref().and_then(|c| c.strip_prefix(sent)) {
                Some(rest) if !rest.trim().is_empty() => self
                    .store
                    .dispatch(SessionEvent::SetPendingOocNote(rest.trim_start().to_string())),
                Some(_) => self.store.dispatch(SessionEvent::ClearPendingOocNote),
                None => {}
            }
        }
        if !sent_portraits.is_empty() {
            self.store
                .dispatch(SessionEvent::ClearPendingPortraits(sent_portraits));
        }
    }
}

pub(crate) fn unavailable_message(error: &NarrationError) -> String {
    format!(
        "The Dungeon Master is unavailable right now ({}). Please try again.",
        error
    )
}
