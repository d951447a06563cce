use serde::{Deserialize, Serialize};

use crate::NoteId;

/// A journal note owned by the player. Never shown to or changed by the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalNote {
    pub id: NoteId,
    pub content: String,
}

impl PersonalNote {
    pub fn new(id: NoteId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }
}

/// Concatenated note contents, used to detect edits.
pub fn joined_contents(notes: &[PersonalNote]) -> String {
    notes
        .iter()
        .map(|n| n.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
