//! Entities - journal, map and log records that persist across turns.

mod game_message;
mod map;
mod note;
mod quest;

pub use game_message::{GameMessage, Sender};
pub use map::{EntityType, MapEntity, MapState};
pub use note::{joined_contents, PersonalNote};
pub use quest::{Quest, QuestPatch, QuestStatus, QuestUpdate};
