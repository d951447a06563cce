//! Shared helpers for use case tests.

pub mod narration_mocks;

pub use narration_mocks::ScriptedNarration;

use questkeeper_domain::{
    AdventureDetails, AdventureDifficulty, CharacterSheet, ChatId, DmModel, GameMessage, NoteId,
    PersonalNote, Quest, QuestId,
};

use crate::dm_tools::tool_vocabulary;
use crate::infrastructure::ports::{ChatHandle, ChatSetup, Content, Part, Transcript};
use crate::stores::{SessionState, SessionStore};

/// A level 3 rogue with 10 gold.
pub fn sample_sheet() -> CharacterSheet {
    let mut sheet = CharacterSheet::default();
    sheet.core_identity.character_name = "Lyra Moonwhisper".to_string();
    sheet.core_identity.class_name = "Rogue".to_string();
    sheet.core_identity.level = "3".to_string();
    sheet.stats.abilities.dexterity = "16".to_string();
    sheet.equipment.list = "a rope, thieves' tools".to_string();
    sheet.equipment.money.gp = "10".to_string();
    sheet
}

pub fn sample_details() -> AdventureDetails {
    AdventureDetails::new(
        AdventureDifficulty::Medium,
        "Eldoria",
        "A city of canals and secrets.",
    )
}

pub fn chat_setup(model: DmModel) -> ChatSetup {
    ChatSetup {
        model,
        system_instruction: "You are the DM.".to_string(),
        tools: tool_vocabulary(),
    }
}

/// A chat that has already exchanged one turn.
pub fn chat_handle(model: DmModel) -> ChatHandle {
    let mut transcript = Transcript::new();
    transcript.push(Content::user(vec![Part::text("I am ready to begin.")]));
    transcript.push(Content::model(vec![Part::text("You wake in a cellar.")]));
    ChatHandle::new(ChatId::new(), chat_setup(model), transcript)
}

/// A game in progress, as if `StartGame` had already run.
pub fn started_state() -> SessionState {
    SessionState {
        game_log: vec![GameMessage::dm("You wake in a cellar.")],
        game_started: true,
        character_sheet: Some(sample_sheet()),
        quests: vec![Quest::new(QuestId::new(), "Find the Key", "The cellar is locked.")],
        personal_notes: vec![PersonalNote::new(NoteId::new(), "Trust nobody.")],
        chat: Some(chat_handle(DmModel::Pro)),
        adventure_details: Some(sample_details()),
        ..Default::default()
    }
}

pub fn started_store() -> SessionStore {
    SessionStore::with_state(started_state())
}
