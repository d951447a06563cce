//! Adventure setup chosen before the first turn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdventureDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Hardcore,
}

impl fmt::Display for AdventureDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdventureDifficulty::Easy => "Easy",
            AdventureDifficulty::Medium => "Medium",
            AdventureDifficulty::Hard => "Hard",
            AdventureDifficulty::Hardcore => "Hardcore",
        };
        f.write_str(label)
    }
}

impl FromStr for AdventureDifficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "hardcore" => Ok(Self::Hardcore),
            other => Err(DomainError::parse(format!("Unknown difficulty: '{}'", other))),
        }
    }
}

/// World framing handed to the narrator when the game starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureDetails {
    pub difficulty: AdventureDifficulty,
    pub world_name: String,
    #[serde(default)]
    pub additional_info: String,
}

impl AdventureDetails {
    pub fn new(
        difficulty: AdventureDifficulty,
        world_name: impl Into<String>,
        additional_info: impl Into<String>,
    ) -> Self {
        Self {
            difficulty,
            world_name: world_name.into(),
            additional_info: additional_info.into(),
        }
    }
}
