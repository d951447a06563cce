//! Questkeeper Engine library.
//!
//! Client core of a Dungeon Master driven adventure: the narrator is an
//! external chat model, everything else (sheet, quests, map, dice, saves)
//! lives here.
//!
//! ## Structure
//!
//! - `infrastructure/` - Ports and their Gemini, clock and file adapters
//! - `dm_tools` / `prompt_templates` - What the narrator is told and may call
//! - `stores/` - Session state and its reducer
//! - `use_cases/` - Player intents, the turn orchestrator and save/restore
//! - `app` - Application composition

pub mod app;
pub mod dm_tools;
pub mod infrastructure;
pub mod prompt_templates;
pub mod stores;
pub mod use_cases;

/// Test fixtures shared by use case tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
