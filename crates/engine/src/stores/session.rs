//! Session state and its reducer.
//!
//! The running game lives in one [`SessionState`] value. It only changes
//! through [`SessionEvent`]s applied by the pure [`reduce`] function;
//! [`SessionStore`] holds the current value and notifies subscribers.

use tokio::sync::{watch, Mutex, MutexGuard};

use questkeeper_domain::{
    AdventureDetails, CharacterSheet, DmModel, EntityId, GameMessage, MapState, PersonalNote,
    Quest, RollMode, Sender,
};

use crate::infrastructure::ports::{Blob, ChatHandle};

/// A portrait generated since the last action, waiting to be shown to the
/// narrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPortrait {
    pub entity_id: EntityId,
    pub label: String,
    pub image: Blob,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub game_log: Vec<GameMessage>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub game_started: bool,
    pub character_sheet: Option<CharacterSheet>,
    pub quests: Vec<Quest>,
    pub personal_notes: Vec<PersonalNote>,
    pub dm_model: DmModel,
    pub chat: Option<ChatHandle>,
    pub map_state: Option<MapState>,
    pub pending_ooc_note: Option<String>,
    pub pending_portraits: Vec<PendingPortrait>,
    pub roll_mode: RollMode,
    pub adventure_details: Option<AdventureDetails>,
}

/// Everything one narrator reply changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnDelta {
    pub messages: Vec<GameMessage>,
    pub sheet: Option<CharacterSheet>,
    pub new_quests: Vec<Quest>,
    /// Replace the quest with the same id.
    pub updated_quests: Vec<Quest>,
    /// Replaces the whole map.
    pub map: Option<MapState>,
}

/// A restored session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    pub character_sheet: CharacterSheet,
    pub quests: Vec<Quest>,
    pub personal_notes: Vec<PersonalNote>,
    pub map_state: Option<MapState>,
    pub dm_model: DmModel,
    pub chat: ChatHandle,
    pub game_log: Vec<GameMessage>,
    pub adventure_details: AdventureDetails,
    pub roll_mode: RollMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    BeginGame {
        sheet: CharacterSheet,
        adventure_details: AdventureDetails,
        chat: ChatHandle,
    },
    LoadGame(Box<LoadedSession>),
    SetLoading(bool),
    SetError(Option<String>),
    AppendPlayerMessage(String),
    AppendSystemMessage(String),
    ApplyTurn(TurnDelta),
    /// Undo the player message of an action the narrator never acknowledged.
    RevertLastPlayerMessage,
    ReplaceSheet(CharacterSheet),
    ReplaceNotes(Vec<PersonalNote>),
    SetModel(DmModel),
    SetChatHandle(ChatHandle),
    SetPendingOocNote(String),
    ClearPendingOocNote,
    SetRollMode(RollMode),
    /// Attach a portrait to a map entity and queue it for the next action.
    PatchEntityImage {
        entity_id: EntityId,
        image: Blob,
    },
    /// Drop queued portraits that have been sent.
    ClearPendingPortraits(Vec<EntityId>),
}

/// Apply one event. No I/O.
pub fn reduce(mut state: SessionState, event: SessionEvent) -> SessionState {
    match event {
        SessionEvent::BeginGame {
            sheet,
            adventure_details,
            chat,
        } => {
            state.game_started = true;
            state.chat = Some(chat);
            state.character_sheet = Some(sheet);
            state.adventure_details = Some(adventure_details);
            state.error = None;
            state.game_log.clear();
            state.map_state = None;
            state.pending_portraits.clear();
        }
        SessionEvent::LoadGame(loaded) => {
            let loaded = *loaded;
            state = SessionState {
                game_log: loaded.game_log,
                is_loading: false,
                error: None,
                game_started: true,
                character_sheet: Some(loaded.character_sheet),
                quests: loaded.quests,
                personal_notes: loaded.personal_notes,
                dm_model: loaded.dm_model,
                chat: Some(loaded.chat),
                map_state: loaded.map_state,
                pending_ooc_note: None,
                pending_portraits: Vec::new(),
                roll_mode: loaded.roll_mode,
                adventure_details: Some(loaded.adventure_details),
            };
        }
        SessionEvent::SetLoading(loading) => {
            state.is_loading = loading;
            if loading {
                state.error = None;
            }
        }
        SessionEvent::SetError(error) => {
            state.error = error;
            state.is_loading = false;
        }
        SessionEvent::AppendPlayerMessage(text) => {
            state.game_log.push(GameMessage::player(text));
        }
        SessionEvent::AppendSystemMessage(text) => {
            state.game_log.push(GameMessage::system(text));
        }
        SessionEvent::ApplyTurn(delta) => {
            state.game_log.extend(delta.messages);
            if let Some(sheet) = delta.sheet {
                state.character_sheet = Some(sheet);
            }
            state.quests.extend(delta.new_quests);
            for updated in delta.updated_quests {
                if let Some(slot) = state.quests.iter_mut().find(|q| q.id == updated.id) {
                    *slot = updated;
                }
            }
            if let Some(map) = delta.map {
                state.map_state = Some(map);
            }
        }
        SessionEvent::RevertLastPlayerMessage => {
            if let Some(index) = state
                .game_log
                .iter()
                .rposition(|m| m.sender == Sender::Player)
            {
                state.game_log.remove(index);
            }
        }
        SessionEvent::ReplaceSheet(sheet) => {
            state.character_sheet = Some(sheet);
        }
        SessionEvent::ReplaceNotes(notes) => {
            state.personal_notes = notes;
        }
        SessionEvent::SetModel(model) => {
            state.dm_model = model;
        }
        SessionEvent::SetChatHandle(chat) => {
            state.chat = Some(chat);
        }
        SessionEvent::SetPendingOocNote(note) => {
            state.pending_ooc_note = Some(note);
        }
        SessionEvent::ClearPendingOocNote => {
            state.pending_ooc_note = None;
        }
        SessionEvent::SetRollMode(mode) => {
            state.roll_mode = mode;
        }
        SessionEvent::PatchEntityImage { entity_id, image } => {
            let patched = state
                .map_state
                .as_ref()
                .and_then(|map| map.with_entity_image(entity_id, image.data.clone()));
            if let Some(map) = patched {
                let label = map
                    .entity(entity_id)
                    .map(|e| e.label())
                    .unwrap_or_default();
                state.map_state = Some(map);
                state.pending_portraits.retain(|p| p.entity_id != entity_id);
                state.pending_portraits.push(PendingPortrait {
                    entity_id,
                    label,
                    image,
                });
            }
        }
        SessionEvent::ClearPendingPortraits(sent) => {
            state
                .pending_portraits
                .retain(|p| !sent.contains(&p.entity_id));
        }
    }
    state
}

/// Holds the current session and serializes player actions.
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    action_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_state(SessionState::default())
    }

    pub fn with_state(state: SessionState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            state: tx,
            action_lock: Mutex::new(()),
        }
    }

    pub fn dispatch(&self, event: SessionEvent) {
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, event);
        });
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Read part of the state without cloning all of it.
    pub fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Exclusive right to drive the narrator conversation.
    ///
    /// `None` while another action holds it.
    pub fn try_begin_action(&self) -> Option<MutexGuard<'_, ()>> {
        self.action_lock.try_lock().ok()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
