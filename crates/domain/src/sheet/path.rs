use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Dot-separated address of a field in the character sheet,
/// e.g. `combat.hitPoints.current`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetPath {
    raw: String,
    segments: Vec<String>,
}

impl SheetPath {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::parse("Sheet path is empty"));
        }
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(DomainError::parse(format!(
                "Sheet path '{}' has an empty segment",
                raw
            )));
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Human-readable form, e.g. `Combat > Hit Points > Current`.
    pub fn pretty(&self) -> String {
        self.segments
            .iter()
            .map(|s| humanize_key(s))
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl fmt::Display for SheetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for SheetPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split a camelCase key into capitalized words (`hitPoints` -> `Hit Points`).
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

/// One path-addressed replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetUpdate {
    pub path: String,
    pub value: String,
}

/// Ordered set of sheet updates.
///
/// Iteration follows first-insertion order; inserting an existing path
/// replaces its value in place (last write wins).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetUpdates {
    entries: Vec<SheetUpdate>,
}

impl SheetUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) {
        let path = path.into();
        let value = value.into();
        match self.entries.iter_mut().find(|u| u.path == path) {
            Some(existing) => existing.value = value,
            None => self.entries.push(SheetUpdate { path, value }),
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|u| u.path == path)
            .map(|u| u.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SheetUpdate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extend(&mut self, other: SheetUpdates) {
        for update in other.entries {
            self.insert(update.path, update.value);
        }
    }
}

impl<P: Into<String>, V: Into<String>> FromIterator<(P, V)> for SheetUpdates {
    fn from_iter<T: IntoIterator<Item = (P, V)>>(iter: T) -> Self {
        let mut updates = SheetUpdates::new();
        for (path, value) in iter {
            updates.insert(path, value);
        }
        updates
    }
}

impl IntoIterator for SheetUpdates {
    type Item = SheetUpdate;
    type IntoIter = std::vec::IntoIter<SheetUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(SheetPath::parse("").is_err());
        assert!(SheetPath::parse("combat..speed").is_err());
        assert!(SheetPath::parse(".combat").is_err());
        assert_eq!(
            SheetPath::parse("combat.hitPoints.current").unwrap().segments(),
            ["combat", "hitPoints", "current"]
        );
    }

    #[test]
    fn test_pretty_path() {
        let path = SheetPath::parse("equipment.money.gp").unwrap();
        assert_eq!(path.pretty(), "Equipment > Money > Gp");
        assert_eq!(humanize_key("backstoryAndPersonality"), "Backstory And Personality");
    }

    #[test]
    fn test_updates_last_write_wins_in_place() {
        let mut updates = SheetUpdates::new();
        updates.insert("a.b", "1");
        updates.insert("c", "2");
        updates.insert("a.b", "3");

        let collected: Vec<_> = updates.iter().map(|u| (u.path.as_str(), u.value.as_str())).collect();
        assert_eq!(collected, vec![("a.b", "3"), ("c", "2")]);
        assert_eq!(updates.get("a.b"), Some("3"));
        assert_eq!(updates.len(), 2);
    }
}
