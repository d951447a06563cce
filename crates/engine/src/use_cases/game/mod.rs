//! Starting an adventure and switching the narrator model.

use std::sync::Arc;

use questkeeper_domain::sheet::format_sheet;
use questkeeper_domain::{AdventureDetails, CharacterSheet, DmModel};

use crate::dm_tools::tool_vocabulary;
use crate::infrastructure::ports::{ChatSetup, NarrationPort, Part};
use crate::prompt_templates;
use crate::stores::{SessionEvent, SessionStore};
use crate::use_cases::turn::{TurnOrchestrator, TurnOutcome};
use crate::use_cases::SessionActionError;

pub struct GameUseCases {
    pub start: Arc<StartGame>,
    pub switch_model: Arc<SwitchModel>,
}

impl GameUseCases {
    pub fn new(start: Arc<StartGame>, switch_model: Arc<SwitchModel>) -> Self {
        Self {
            start,
            switch_model,
        }
    }
}

/// Conversation setup for a character and world.
pub fn chat_setup(sheet: &CharacterSheet, details: &AdventureDetails, model: DmModel) -> ChatSetup {
    ChatSetup {
        model,
        system_instruction: prompt_templates::system_instruction(&format_sheet(sheet), details),
        tools: tool_vocabulary(),
    }
}

pub struct StartGame {
    narration: Arc<dyn NarrationPort>,
    store: Arc<SessionStore>,
    turns: Arc<TurnOrchestrator>,
}

impl StartGame {
    pub fn new(
        narration: Arc<dyn NarrationPort>,
        store: Arc<SessionStore>,
        turns: Arc<TurnOrchestrator>,
    ) -> Self {
        Self {
            narration,
            store,
            turns,
        }
    }

    /// Open the conversation and play the narrator's opening turn.
    pub async fn execute(
        &self,
        sheet: CharacterSheet,
        details: AdventureDetails,
    ) -> Result<TurnOutcome, SessionActionError> {
        let _action = self
            .store
            .try_begin_action()
            .ok_or(SessionActionError::ActionInFlight)?;

        let model = self.store.read(|s| s.dm_model.clone());
        tracing::info!(
            character = %sheet.character_name(),
            world = %details.world_name,
            model = %model,
            "Starting adventure"
        );
        self.store.dispatch(SessionEvent::SetLoading(true));

        let setup = chat_setup(&sheet, &details, model);
        let opened = async {
            let mut chat = self.narration.open(setup).await?;
            let reply = self
                .narration
                .send(&mut chat, vec![Part::text(prompt_templates::opening_message())])
                .await?;
            Ok::<_, SessionActionError>((chat, reply))
        }
        .await;

        let (chat, reply) = match opened {
            Ok(opened) => opened,
            Err(error) => {
                tracing::warn!(error = %error, "Failed to start adventure");
                self.store.dispatch(SessionEvent::SetError(Some(format!(
                    "Could not start the adventure: {}",
                    error
                ))));
                return Err(error);
            }
        };

        self.store.dispatch(SessionEvent::BeginGame {
            sheet,
            adventure_details: details,
            chat: chat.clone(),
        });

        Ok(self.turns.resolve_turns(chat, reply).await?)
    }
}

pub struct SwitchModel {
    narration: Arc<dyn NarrationPort>,
    store: Arc<SessionStore>,
}

impl SwitchModel {
    pub fn new(narration: Arc<dyn NarrationPort>, store: Arc<SessionStore>) -> Self {
        Self { narration, store }
    }

    /// Move the running conversation to another model.
    ///
    /// Returns `false` when nothing changed. Before the game starts only the
    /// stored selection changes.
    pub async fn execute(&self, model: DmModel) -> Result<bool, SessionActionError> {
        let _action = self
            .store
            .try_begin_action()
            .ok_or(SessionActionError::ActionInFlight)?;

        let state = self.store.snapshot();
        if state.dm_model == model || state.is_loading {
            return Ok(false);
        }
        let started = state.game_started;
        let Some(chat) = state.chat.clone().filter(|_| started) else {
            self.store.dispatch(SessionEvent::SetModel(model));
            return Ok(true);
        };

        self.store.dispatch(SessionEvent::SetLoading(true));

        let setup = match (&state.character_sheet, &state.adventure_details) {
            (Some(sheet), Some(details)) => chat_setup(sheet, details, model.clone()),
            _ => ChatSetup {
                model: model.clone(),
                ..chat.setup().clone()
            },
        };

        let reopened = async {
            let transcript = self.narration.history(&chat).await?;
            self.narration.reopen(setup, transcript).await
        }
        .await;

        match reopened {
            Ok(handle) => {
                tracing::info!(from = %state.dm_model, to = %model, "Switched narrator model");
                self.store.dispatch(SessionEvent::SetModel(model.clone()));
                self.store.dispatch(SessionEvent::SetChatHandle(handle));
                self.store.dispatch(SessionEvent::AppendSystemMessage(format!(
                    "[SYSTEM] Dungeon Master model has been switched to {}.",
                    model
                )));
                self.store.dispatch(SessionEvent::SetLoading(false));
                Ok(true)
            }
            Err(error) => {
                tracing::warn!(error = %error, "Model switch failed");
                self.store.dispatch(SessionEvent::SetError(Some(format!(
                    "Could not switch the Dungeon Master model: {}",
                    error
                ))));
                Err(error.into())
            }
        }
    }
}
