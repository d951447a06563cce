//! Journal quests tracked on behalf of the narrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DomainError, QuestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestStatus::Active => "active",
            QuestStatus::Completed => "completed",
            QuestStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

impl FromStr for QuestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::parse(format!("Unknown quest status: '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub status: QuestStatus,
}

impl Quest {
    /// New quests always start active.
    pub fn new(id: QuestId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status: QuestStatus::Active,
        }
    }

    /// Case-insensitive, otherwise exact, title comparison.
    pub fn matches_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}

/// Fields the narrator may change on an existing quest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestPatch {
    pub new_title: Option<String>,
    pub new_description: Option<String>,
    pub new_status: Option<QuestStatus>,
}

impl QuestPatch {
    pub fn is_empty(&self) -> bool {
        self.new_title.is_none() && self.new_description.is_none() && self.new_status.is_none()
    }

    pub fn apply(&self, quest: &Quest) -> Quest {
        let mut updated = quest.clone();
        if let Some(title) = &self.new_title {
            updated.title = title.clone();
        }
        if let Some(description) = &self.new_description {
            updated.description = description.clone();
        }
        if let Some(status) = self.new_status {
            updated.status = status;
        }
        updated
    }

    /// Human-readable summary, e.g. `status changed to "completed"`.
    pub fn describe(&self) -> String {
        let mut changes = Vec::new();
        if let Some(title) = &self.new_title {
            changes.push(format!("title changed to \"{}\"", title));
        }
        if let Some(description) = &self.new_description {
            changes.push(format!("description changed to \"{}\"", description));
        }
        if let Some(status) = self.new_status {
            changes.push(format!("status changed to \"{}\"", status));
        }
        changes.join(", ")
    }
}

/// An update addressed to a quest by its title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestUpdate {
    pub title_to_match: String,
    pub patch: QuestPatch,
}

impl QuestUpdate {
    /// Resolve the update against a quest list.
    ///
    /// Returns the updated copy of the first quest whose title matches, or
    /// `None` when nothing matches.
    pub fn resolve(&self, quests: &[Quest]) -> Option<Quest> {
        quests
            .iter()
            .find(|q| q.matches_title(&self.title_to_match))
            .map(|q| self.patch.apply(q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest(title: &str) -> Quest {
        Quest::new(QuestId::new(), title, "desc")
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        assert!(quest("Find the Key").matches_title("find the key"));
        assert!(!quest("Find the Key").matches_title("find the key "));
        assert!(!quest("Find the Key").matches_title("find a key"));
    }

    #[test]
    fn test_update_resolves_only_matching_quest() {
        let quests = vec![quest("Slay the Dragon"), quest("Find the Key")];
        let update = QuestUpdate {
            title_to_match: "find the key".to_string(),
            patch: QuestPatch {
                new_status: Some(QuestStatus::Completed),
                ..Default::default()
            },
        };

        let updated = update.resolve(&quests).unwrap();
        assert_eq!(updated.id, quests[1].id);
        assert_eq!(updated.title, "Find the Key");
        assert_eq!(updated.status, QuestStatus::Completed);
    }

    #[test]
    fn test_update_without_match_is_none() {
        let quests = vec![quest("Slay the Dragon")];
        let update = QuestUpdate {
            title_to_match: "Rescue the cat".to_string(),
            patch: QuestPatch {
                new_title: Some("x".to_string()),
                ..Default::default()
            },
        };
        assert!(update.resolve(&quests).is_none());
    }

    #[test]
    fn test_describe_lists_changed_fields() {
        let patch = QuestPatch {
            new_title: Some("Find the Golden Key".to_string()),
            new_description: None,
            new_status: Some(QuestStatus::Failed),
        };
        assert_eq!(
            patch.describe(),
            "title changed to \"Find the Golden Key\", status changed to \"failed\""
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Completed".parse::<QuestStatus>().unwrap(), QuestStatus::Completed);
        assert!("abandoned".parse::<QuestStatus>().is_err());
    }
}
