use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Player,
    Dm,
    System,
}

/// One line of the visible game log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMessage {
    pub sender: Sender,
    pub text: String,
}

impl GameMessage {
    pub fn player(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Player,
            text: text.into(),
        }
    }

    pub fn dm(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Dm,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
        }
    }
}
