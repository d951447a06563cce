//! Use cases - player intents orchestrated across ports and the session store.
//!
//! Each module contains the use cases for one area of play.

pub mod character_sheet;
mod error;
pub mod game;
pub mod player_action;
pub mod portrait;
pub mod save;
pub mod turn;

pub use character_sheet::CharacterSheetUseCases;
pub use error::SessionActionError;
pub use game::GameUseCases;
pub use player_action::PlayerActionUseCases;
pub use portrait::GeneratePortrait;
pub use save::SaveUseCases;
pub use turn::TurnOrchestrator;
