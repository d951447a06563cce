//! Session Serializer: save documents and restoring from them.
//!
//! The chat handle itself cannot be persisted, so a save carries the transcript
//! and restoring reopens a conversation seeded with it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use questkeeper_domain::{
    AdventureDetails, CharacterSheet, DmModel, GameMessage, MapState, PersonalNote, Quest,
    RollMode,
};

use crate::infrastructure::ports::{ClockPort, NarrationError, NarrationPort, Transcript};
use crate::infrastructure::save_files::{read_save, write_save, SaveFileError};
use crate::stores::{LoadedSession, SessionEvent, SessionState, SessionStore};
use crate::use_cases::game::chat_setup;

/// Newest save format this build reads and the one it writes.
pub const SAVE_VERSION: u64 = 1;

/// Fields without which a document is not a save at all.
pub const REQUIRED_FIELDS: [&str; 4] = ["version", "characterSheet", "chatHistory", "adventureDetails"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub version: u64,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
    pub character_sheet: CharacterSheet,
    #[serde(default)]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub personal_notes: Vec<PersonalNote>,
    #[serde(default)]
    pub map_state: Option<MapState>,
    #[serde(default)]
    pub model_id: DmModel,
    pub chat_history: Transcript,
    #[serde(default)]
    pub game_log: Vec<GameMessage>,
    pub adventure_details: AdventureDetails,
    #[serde(default)]
    pub roll_mode: RollMode,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("No adventure is running")]
    NotStarted,
    #[error("Another action is still being resolved")]
    ActionInFlight,
    #[error("Save document must be a JSON object")]
    NotAnObject,
    #[error("Save document is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Unsupported save version: {0}")]
    UnsupportedVersion(String),
    #[error("Save document is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("Narration failed: {0}")]
    Narration(#[from] NarrationError),
    #[error(transparent)]
    File(#[from] SaveFileError),
}

pub struct SaveUseCases {
    pub serialize: Arc<SerializeSession>,
    pub restore: Arc<RestoreSession>,
}

impl SaveUseCases {
    pub fn new(serialize: Arc<SerializeSession>, restore: Arc<RestoreSession>) -> Self {
        Self { serialize, restore }
    }
}

/// Build a save document from the current state and conversation history.
pub fn serialize(
    state: &SessionState,
    chat_history: Transcript,
    saved_at: DateTime<Utc>,
) -> Result<SaveData, SaveError> {
    let (Some(sheet), Some(details)) = (&state.character_sheet, &state.adventure_details) else {
        return Err(SaveError::NotStarted);
    };

    Ok(SaveData {
        version: SAVE_VERSION,
        saved_at,
        character_sheet: sheet.clone(),
        quests: state.quests.clone(),
        personal_notes: state.personal_notes.clone(),
        map_state: state.map_state.clone(),
        model_id: state.dm_model.clone(),
        chat_history,
        game_log: state.game_log.clone(),
        adventure_details: details.clone(),
        roll_mode: state.roll_mode,
    })
}

/// Structural checks that run before anything else touches the document.
pub fn validate(document: &Value) -> Result<(), SaveError> {
    let object = document.as_object().ok_or(SaveError::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        if object.get(field).map_or(true, Value::is_null) {
            return Err(SaveError::MissingField(field));
        }
    }

    match object.get("version").and_then(Value::as_u64) {
        Some(version) if (1..=SAVE_VERSION).contains(&version) => Ok(()),
        _ => Err(SaveError::UnsupportedVersion(
            object
                .get("version")
                .map(Value::to_string)
                .unwrap_or_default(),
        )),
    }
}

pub struct SerializeSession {
    narration: Arc<dyn NarrationPort>,
    store: Arc<SessionStore>,
    clock: Arc<dyn ClockPort>,
}

impl SerializeSession {
    pub fn new(
        narration: Arc<dyn NarrationPort>,
        store: Arc<SessionStore>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            narration,
            store,
            clock,
        }
    }

    pub async fn execute(&self) -> Result<SaveData, SaveError> {
        let state = self.store.snapshot();
        let chat = state
            .chat
            .as_ref()
            .filter(|_| state.game_started)
            .ok_or(SaveError::NotStarted)?;

        let history = self.narration.history(chat).await?;
        serialize(&state, history, self.clock.now())
    }

    /// Serialize and write to `dir`. Returns the file written.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf, SaveError> {
        let data = self.execute().await?;
        let path = write_save(
            dir,
            data.character_sheet.character_name(),
            data.saved_at.date_naive(),
            &data,
        )
        .await?;
        Ok(path)
    }
}

pub struct RestoreSession {
    narration: Arc<dyn NarrationPort>,
    store: Arc<SessionStore>,
}

impl RestoreSession {
    pub fn new(narration: Arc<dyn NarrationPort>, store: Arc<SessionStore>) -> Self {
        Self { narration, store }
    }

    /// Replace the running session with a saved one.
    ///
    /// Nothing is dispatched unless the whole restore succeeds.
    pub async fn execute(&self, document: Value) -> Result<(), SaveError> {
        let _action = self
            .store
            .try_begin_action()
            .ok_or(SaveError::ActionInFlight)?;

        validate(&document)?;
        let data: SaveData = serde_json::from_value(document).map_err(SaveError::Malformed)?;

        let setup = chat_setup(
            &data.character_sheet,
            &data.adventure_details,
            data.model_id.clone(),
        );
        let chat = self.narration.reopen(setup, data.chat_history).await?;

        tracing::info!(
            character = %data.character_sheet.character_name(),
            saved_at = %data.saved_at,
            transcript_len = chat.transcript().len(),
            "Session restored"
        );
        self.store
            .dispatch(SessionEvent::LoadGame(Box::new(LoadedSession {
                character_sheet: data.character_sheet,
                quests: data.quests,
                personal_notes: data.personal_notes,
                map_state: data.map_state,
                dm_model: data.model_id,
                chat,
                game_log: data.game_log,
                adventure_details: data.adventure_details,
                roll_mode: data.roll_mode,
            })));
        Ok(())
    }

    pub async fn load_from(&self, path: &Path) -> Result<(), SaveError> {
        let document = read_save(path).await?;
        self.execute(document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{ChatHandle, ChatSetup, MockNarrationPort};
    use crate::test_fixtures::{started_state, started_store};
    use chrono::TimeZone;
    use questkeeper_domain::{ChatId, EntityId, EntityType, MapEntity};
    use std::sync::Mutex;

    fn saved_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 20, 30, 0).unwrap()
    }

    fn populated_store() -> Arc<SessionStore> {
        let mut state = started_state();
        state.map_state = Some(
            MapState::new(
                5,
                5,
                vec![
                    MapEntity::new(EntityId::new(), EntityType::Player, 0, 0),
                    MapEntity::new(EntityId::new(), EntityType::Door, 4, 2),
                ],
            )
            .unwrap(),
        );
        state.roll_mode = RollMode::Advantage;
        Arc::new(SessionStore::with_state(state))
    }

    fn narration_with_history() -> MockNarrationPort {
        let mut narration = MockNarrationPort::new();
        narration
            .expect_history()
            .returning(|chat| Ok(chat.transcript().clone()));
        narration
    }

    #[tokio::test]
    async fn test_save_load_round_trip_reseeds_transcript() {
        let source = populated_store();
        let original = source.snapshot();
        let saver = SerializeSession::new(
            Arc::new(narration_with_history()),
            source.clone(),
            Arc::new(FixedClock(saved_at())),
        );
        let data = saver.execute().await.unwrap();
        assert_eq!(data.version, SAVE_VERSION);
        assert_eq!(data.saved_at, saved_at());

        let document = serde_json::to_value(&data).unwrap();

        let captured: Arc<Mutex<Option<(ChatSetup, Transcript)>>> = Arc::default();
        let mut narration = MockNarrationPort::new();
        let sink = captured.clone();
        narration
            .expect_reopen()
            .times(1)
            .returning(move |setup, transcript| {
                *sink.lock().unwrap() = Some((setup.clone(), transcript.clone()));
                Ok(ChatHandle::new(ChatId::new(), setup, transcript))
            });

        let target = Arc::new(SessionStore::new());
        RestoreSession::new(Arc::new(narration), target.clone())
            .execute(document)
            .await
            .unwrap();

        let restored = target.snapshot();
        assert!(restored.game_started);
        assert_eq!(restored.character_sheet, original.character_sheet);
        assert_eq!(restored.quests, original.quests);
        assert_eq!(restored.personal_notes, original.personal_notes);
        assert_eq!(restored.map_state, original.map_state);
        assert_eq!(restored.game_log, original.game_log);
        assert_eq!(restored.roll_mode, RollMode::Advantage);

        let (setup, transcript) = captured.lock().unwrap().clone().unwrap();
        assert_eq!(&transcript, original.chat.unwrap().transcript());
        assert_eq!(setup.model, original.dm_model);
        assert!(setup.system_instruction.contains("Lyra Moonwhisper"));
    }

    #[tokio::test]
    async fn test_missing_required_field_fails_before_reopen() {
        let store = populated_store();
        let data = serialize(&store.snapshot(), Transcript::new(), saved_at()).unwrap();

        for field in REQUIRED_FIELDS {
            let mut document = serde_json::to_value(&data).unwrap();
            document.as_object_mut().unwrap().remove(field);

            let mut narration = MockNarrationPort::new();
            narration.expect_reopen().never();
            let target = Arc::new(started_store());
            let before = target.snapshot();

            let result = RestoreSession::new(Arc::new(narration), target.clone())
                .execute(document)
                .await;

            assert!(
                matches!(result, Err(SaveError::MissingField(f)) if f == field),
                "{field} should be required"
            );
            assert_eq!(target.snapshot(), before);
        }
    }

    #[tokio::test]
    async fn test_null_field_counts_as_missing() {
        let data = serialize(&started_state(), Transcript::new(), saved_at()).unwrap();
        let mut document = serde_json::to_value(&data).unwrap();
        document["chatHistory"] = Value::Null;

        let mut narration = MockNarrationPort::new();
        narration.expect_reopen().never();

        let result = RestoreSession::new(Arc::new(narration), Arc::new(SessionStore::new()))
            .execute(document)
            .await;
        assert!(matches!(result, Err(SaveError::MissingField("chatHistory"))));
    }

    #[tokio::test]
    async fn test_newer_version_is_rejected() {
        let data = serialize(&started_state(), Transcript::new(), saved_at()).unwrap();
        let mut document = serde_json::to_value(&data).unwrap();
        document["version"] = Value::from(SAVE_VERSION + 1);

        let mut narration = MockNarrationPort::new();
        narration.expect_reopen().never();

        let result = RestoreSession::new(Arc::new(narration), Arc::new(SessionStore::new()))
            .execute(document)
            .await;
        assert!(matches!(result, Err(SaveError::UnsupportedVersion(_))));
    }

    #[tokio::test]
    async fn test_failed_reopen_leaves_state_untouched() {
        let data = serialize(&started_state(), Transcript::new(), saved_at()).unwrap();
        let document = serde_json::to_value(&data).unwrap();

        let mut narration = MockNarrationPort::new();
        narration
            .expect_reopen()
            .returning(|_, _| Err(NarrationError::RequestFailed("offline".into())));
        let target = Arc::new(SessionStore::new());

        let result = RestoreSession::new(Arc::new(narration), target.clone())
            .execute(document)
            .await;

        assert!(matches!(result, Err(SaveError::Narration(_))));
        assert_eq!(target.snapshot(), SessionState::default());
    }

    #[tokio::test]
    async fn test_save_before_start_is_rejected() {
        let mut narration = MockNarrationPort::new();
        narration.expect_history().never();
        let saver = SerializeSession::new(
            Arc::new(narration),
            Arc::new(SessionStore::new()),
            Arc::new(FixedClock(saved_at())),
        );

        assert!(matches!(saver.execute().await, Err(SaveError::NotStarted)));
    }

    #[tokio::test]
    async fn test_save_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let saver = SerializeSession::new(
            Arc::new(narration_with_history()),
            populated_store(),
            Arc::new(FixedClock(saved_at())),
        );

        let path = saver.save_to(dir.path()).await.unwrap();
        assert!(path.ends_with("Lyra_Moonwhisper_2024-05-17.json"));

        let mut narration = MockNarrationPort::new();
        narration
            .expect_reopen()
            .returning(|setup, transcript| Ok(ChatHandle::new(ChatId::new(), setup, transcript)));
        let target = Arc::new(SessionStore::new());
        RestoreSession::new(Arc::new(narration), target.clone())
            .load_from(&path)
            .await
            .unwrap();

        assert_eq!(
            target.read(|s| s.character_sheet.clone()),
            populated_store().read(|s| s.character_sheet.clone())
        );
    }
}
