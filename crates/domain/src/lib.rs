//! Questkeeper domain.
//!
//! Pure types and functions for the character sheet, the quest journal, the
//! tile map and dice. Nothing in this crate performs I/O.

pub mod character_sheet;
pub mod entities;
pub mod error;
pub mod ids;
pub mod sheet;
pub mod value_objects;

pub use character_sheet::{
    Abilities, ArmorTraining, Attack, AttacksSpellcasting, CharacterDetails, CharacterSheet,
    Combat, CoreIdentity, DeathSaves, Equipment, EquipmentProficiencies, FeaturesTraits, HitDice,
    HitPoints, Money, Proficiency, SavingThrows, Skills, SpellSlot, Spellcasting, Stats,
};
pub use entities::{
    joined_contents, EntityType, GameMessage, MapEntity, MapState, PersonalNote, Quest,
    QuestPatch, QuestStatus, QuestUpdate, Sender,
};
pub use error::DomainError;
pub use ids::{ChatId, EntityId, NoteId, QuestId};
pub use sheet::{SheetChange, SheetPath, SheetUpdate, SheetUpdates};
pub use value_objects::{
    signed, AdventureDetails, AdventureDifficulty, DiceRoll, DiceRollRequest, Die, DmModel,
    ModedRoll, RollMode, MAX_MODIFIER,
};
