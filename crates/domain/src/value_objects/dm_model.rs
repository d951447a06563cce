//! Narrator model selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model identifier used for narration.
///
/// Known models have dedicated variants; anything else is carried verbatim so a
/// save written by a newer client still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DmModel {
    Flash,
    #[default]
    Pro,
    Other(String),
}

impl DmModel {
    pub fn id(&self) -> &str {
        match self {
            DmModel::Flash => "gemini-2.5-flash",
            DmModel::Pro => "gemini-2.5-pro",
            DmModel::Other(id) => id,
        }
    }
}

impl From<String> for DmModel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "gemini-2.5-flash" | "flash" => DmModel::Flash,
            "gemini-2.5-pro" | "pro" => DmModel::Pro,
            _ => DmModel::Other(value),
        }
    }
}

impl From<&str> for DmModel {
    fn from(value: &str) -> Self {
        DmModel::from(value.to_string())
    }
}

impl From<DmModel> for String {
    fn from(value: DmModel) -> Self {
        value.id().to_string()
    }
}

impl fmt::Display for DmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
