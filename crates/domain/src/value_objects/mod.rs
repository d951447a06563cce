//! Value objects - immutable values without identity.

mod adventure;
mod dice;
mod dm_model;

pub use adventure::{AdventureDetails, AdventureDifficulty};
pub use dice::{signed, DiceRoll, MAX_MODIFIER, DiceRollRequest, Die, ModedRoll, RollMode};
pub use dm_model::DmModel;
