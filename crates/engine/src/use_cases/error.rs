//! Errors shared by the player-intent use cases.

use questkeeper_domain::EntityId;

use crate::infrastructure::ports::{ImageGenError, NarrationError};
use crate::use_cases::turn::TurnError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionActionError {
    #[error("No adventure is running")]
    NotStarted,
    #[error("Another action is still being resolved")]
    ActionInFlight,
    #[error("Map entity not found: {0}")]
    EntityNotFound(EntityId),
    #[error("The uploaded document is empty")]
    EmptyDocument,
    #[error("Unexpected narrator response: {0}")]
    InvalidResponse(String),
    #[error("Narration failed: {0}")]
    Narration(#[from] NarrationError),
    #[error("Image generation failed: {0}")]
    ImageGen(#[from] ImageGenError),
}

impl From<TurnError> for SessionActionError {
    fn from(error: TurnError) -> Self {
        match error {
            TurnError::NotStarted => Self::NotStarted,
            TurnError::ActionInFlight => Self::ActionInFlight,
            TurnError::Narration(e) => Self::Narration(e),
        }
    }
}
