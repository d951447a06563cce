//! Path-addressed replacement of character sheet fields.
//!
//! The sheet is walked as its serialized JSON tree. Every update is applied
//! independently: an update whose path does not resolve, or whose value cannot
//! be stored in the addressed field, is dropped with a warning and the rest of
//! the batch still applies. The input sheet is never mutated.

use serde_json::{Number, Value};

use super::path::{SheetPath, SheetUpdates};
use crate::CharacterSheet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Segment '{segment}' does not exist")]
    MissingSegment { segment: String },
    #[error("Segment '{segment}' is not an object")]
    NotAnObject { segment: String },
    #[error("Expected a {expected} value, got '{value}'")]
    TypeMismatch {
        expected: &'static str,
        value: String,
    },
    #[error("Field '{field}' cannot hold the value")]
    Rejected { field: String },
}

/// An update that was dropped and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedUpdate {
    pub path: String,
    pub reason: PatchError,
}

/// Result of applying a batch of updates.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchReport {
    pub sheet: CharacterSheet,
    /// Paths that were applied, in application order.
    pub applied: Vec<String>,
    pub rejected: Vec<RejectedUpdate>,
}

/// Apply `updates` to a copy of `sheet`.
pub fn apply_updates(sheet: &CharacterSheet, updates: &SheetUpdates) -> CharacterSheet {
    apply_updates_with_report(sheet, updates).sheet
}

/// Apply `updates` to a copy of `sheet`, reporting which updates were dropped.
pub fn apply_updates_with_report(sheet: &CharacterSheet, updates: &SheetUpdates) -> PatchReport {
    let mut current = sheet.clone();
    let mut applied = Vec::new();
    let mut rejected = Vec::new();

    let mut tree = match serde_json::to_value(sheet) {
        Ok(tree) => tree,
        Err(e) => {
            tracing::error!(error = %e, "Character sheet could not be serialized for patching");
            return PatchReport {
                sheet: current,
                applied,
                rejected: updates
                    .iter()
                    .map(|u| RejectedUpdate {
                        path: u.path.clone(),
                        reason: PatchError::Rejected {
                            field: u.path.clone(),
                        },
                    })
                    .collect(),
            };
        }
    };

    for update in updates.iter() {
        match apply_one(&tree, &update.path, &update.value) {
            Ok((next_tree, next_sheet)) => {
                tree = next_tree;
                current = next_sheet;
                applied.push(update.path.clone());
            }
            Err(reason) => {
                tracing::warn!(
                    path = %update.path,
                    error = %reason,
                    "Dropping character sheet update"
                );
                rejected.push(RejectedUpdate {
                    path: update.path.clone(),
                    reason,
                });
            }
        }
    }

    PatchReport {
        sheet: current,
        applied,
        rejected,
    }
}

fn apply_one(
    tree: &Value,
    raw_path: &str,
    raw_value: &str,
) -> Result<(Value, CharacterSheet), PatchError> {
    let path = SheetPath::parse(raw_path).map_err(|e| PatchError::InvalidPath(e.to_string()))?;
    let mut candidate = tree.clone();
    let stored = set_leaf(&mut candidate, &path, raw_value)?;

    let reject = || PatchError::Rejected {
        field: path.as_str().to_string(),
    };

    // The typed sheet decides whether the field exists and can hold the value.
    let sheet: CharacterSheet = serde_json::from_value(candidate).map_err(|_| reject())?;
    let round_trip = serde_json::to_value(&sheet).map_err(|_| reject())?;
    if lookup(&round_trip, path.segments()) != Some(&stored) {
        return Err(reject());
    }

    Ok((round_trip, sheet))
}

/// Store `raw_value` at `path`, returning the JSON value that was written.
fn set_leaf(tree: &mut Value, path: &SheetPath, raw_value: &str) -> Result<Value, PatchError> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(PatchError::InvalidPath(path.to_string()));
    };

    let mut node = tree;
    for segment in parents {
        let child = node
            .as_object_mut()
            .and_then(|obj| obj.get_mut(segment))
            .ok_or_else(|| PatchError::MissingSegment {
                segment: segment.clone(),
            })?;
        if !child.is_object() {
            return Err(PatchError::NotAnObject {
                segment: segment.clone(),
            });
        }
        node = child;
    }

    let object = node.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
        segment: last.clone(),
    })?;
    let value = match object.get(last) {
        Some(existing) => coerce(existing, raw_value)?,
        None => new_field_value(raw_value),
    };
    object.insert(last.clone(), value.clone());
    Ok(value)
}

/// Value for a key that does not exist yet (open maps such as spell slots).
fn new_field_value(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(|v| v.is_object() || v.is_array())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Convert the string form of a value into the JSON type of the field it replaces.
fn coerce(existing: &Value, raw: &str) -> Result<Value, PatchError> {
    let mismatch = |expected: &'static str| PatchError::TypeMismatch {
        expected,
        value: raw.to_string(),
    };

    match existing {
        Value::String(_) | Value::Null => Ok(Value::String(raw.to_string())),
        Value::Bool(_) => match raw.trim().to_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch("boolean")),
        },
        Value::Number(_) => {
            let trimmed = raw.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Value::from(n));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch("number"))
        }
        Value::Array(_) => match serde_json::from_str::<Value>(raw) {
            Ok(v @ Value::Array(_)) => Ok(v),
            _ => Err(mismatch("list")),
        },
        Value::Object(_) => match serde_json::from_str::<Value>(raw) {
            Ok(v @ Value::Object(_)) => Ok(v),
            _ => Err(mismatch("object")),
        },
    }
}

pub(crate) fn lookup<'a>(tree: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(tree, |node, segment| node.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> CharacterSheet {
        let mut sheet = CharacterSheet::default();
        sheet.core_identity.character_name = "Mira".to_string();
        sheet.equipment.money.gp = "10".to_string();
        sheet
    }

    fn updates(pairs: &[(&str, &str)]) -> SheetUpdates {
        pairs.iter().map(|(p, v)| (*p, *v)).collect()
    }

    #[test]
    fn test_applies_string_leaf() {
        let patched = apply_updates(&sheet(), &updates(&[("combat.hitPoints.current", "7")]));
        assert_eq!(patched.combat.hit_points.current, "7");
        assert_eq!(patched.combat.hit_points.max, "10");
    }

    #[test]
    fn test_input_is_not_mutated() {
        let original = sheet();
        let _ = apply_updates(&original, &updates(&[("equipment.money.gp", "99")]));
        assert_eq!(original.equipment.money.gp, "10");
    }

    #[test]
    fn test_bad_path_is_isolated() {
        let original = sheet();
        let report = apply_updates_with_report(
            &original,
            &updates(&[("combat.hitPoints.current", "7"), ("no.such.field", "x")]),
        );

        let mut expected = original.clone();
        expected.combat.hit_points.current = "7".to_string();
        assert_eq!(report.sheet, expected);
        assert_eq!(report.applied, vec!["combat.hitPoints.current"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(
            report.rejected[0].reason,
            PatchError::MissingSegment {
                segment: "no".to_string()
            }
        );
    }

    #[test]
    fn test_only_bad_paths_returns_equal_sheet() {
        let original = sheet();
        let patched = apply_updates(
            &original,
            &updates(&[("no.such.field", "x"), ("combat..speed", "1"), ("", "y")]),
        );
        assert_eq!(patched, original);
    }

    #[test]
    fn test_intermediate_leaf_is_rejected() {
        let report = apply_updates_with_report(
            &sheet(),
            &updates(&[("equipment.list.first", "rope")]),
        );
        assert!(report.applied.is_empty());
        assert_eq!(
            report.rejected[0].reason,
            PatchError::NotAnObject {
                segment: "list".to_string()
            }
        );
    }

    #[test]
    fn test_arrays_are_not_walked() {
        let report = apply_updates_with_report(
            &sheet(),
            &updates(&[("attacksSpellcasting.attacks.0", "x")]),
        );
        assert!(report.applied.is_empty());
    }

    #[test]
    fn test_unknown_final_field_is_rejected() {
        let original = sheet();
        let report = apply_updates_with_report(&original, &updates(&[("combat.mana", "5")]));
        assert_eq!(report.sheet, original);
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn test_open_map_accepts_new_key() {
        let patched = apply_updates(
            &sheet(),
            &updates(&[(
                "attacksSpellcasting.spellSlots.10",
                r#"{"total":"1","expended":"0"}"#,
            )]),
        );
        let slot = patched.attacks_spellcasting.spell_slots.get("10").unwrap();
        assert_eq!(slot.total, "1");
    }

    #[test]
    fn test_coerces_to_existing_types() {
        let patched = apply_updates(
            &sheet(),
            &updates(&[
                ("stats.skills.stealth.proficient", "true"),
                ("combat.deathSaves.failures", "2"),
                ("equipment.proficiencies.armorTraining.heavy", "TRUE"),
            ]),
        );
        assert!(patched.stats.skills.stealth.proficient);
        assert_eq!(patched.combat.death_saves.failures, 2);
        assert!(patched.equipment.proficiencies.armor_training.heavy);
    }

    #[test]
    fn test_type_mismatch_is_dropped() {
        let original = sheet();
        let report = apply_updates_with_report(
            &original,
            &updates(&[
                ("stats.skills.stealth.proficient", "maybe"),
                ("combat.deathSaves.failures", "many"),
                ("combat.deathSaves.successes", "300"),
            ]),
        );
        assert_eq!(report.sheet, original);
        assert_eq!(report.rejected.len(), 3);
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let batch = updates(&[
            ("equipment.money.gp", "20"),
            ("characterDetails.languages", "Common, Elvish"),
            ("stats.savingThrows.wisdom.proficient", "true"),
        ]);
        let once = apply_updates(&sheet(), &batch);
        let twice = apply_updates(&once, &batch);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_whole_object_replacement() {
        let patched = apply_updates(
            &sheet(),
            &updates(&[(
                "combat.hitPoints",
                r#"{"max":"30","current":"12","temporary":"5"}"#,
            )]),
        );
        assert_eq!(patched.combat.hit_points.max, "30");
        assert_eq!(patched.combat.hit_points.temporary, "5");
    }
}
