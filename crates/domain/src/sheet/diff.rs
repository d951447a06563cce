//! Field-level differences between two sheets.
//!
//! Plain objects are compared key by key; arrays and scalars are compared as
//! whole values. Fields missing from the newer sheet are not reported, since a
//! field can be overwritten but never removed.

use serde_json::{Map, Value};

use super::path::SheetUpdates;
use crate::CharacterSheet;

/// One changed field.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetChange {
    pub path: String,
    pub from: Value,
    pub to: Value,
}

impl SheetChange {
    /// New value in the string form accepted by the patcher.
    pub fn value_string(&self) -> String {
        match &self.to {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Changes that turn `before` into `after`, in sheet order.
pub fn diff(before: &CharacterSheet, after: &CharacterSheet) -> Vec<SheetChange> {
    match (serde_json::to_value(before), serde_json::to_value(after)) {
        (Ok(a), Ok(b)) => diff_values(&a, &b),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "Character sheet could not be serialized for diffing");
            Vec::new()
        }
    }
}

/// Changes between two JSON documents.
pub fn diff_values(before: &Value, after: &Value) -> Vec<SheetChange> {
    let mut changes = Vec::new();
    match (before.as_object(), after.as_object()) {
        (Some(a), Some(b)) => diff_objects("", a, b, &mut changes),
        _ if before != after => changes.push(SheetChange {
            path: String::new(),
            from: before.clone(),
            to: after.clone(),
        }),
        _ => {}
    }
    changes
}

/// Convert changes into updates that reproduce them.
pub fn to_updates(changes: &[SheetChange]) -> SheetUpdates {
    changes
        .iter()
        .map(|c| (c.path.clone(), c.value_string()))
        .collect()
}

fn diff_objects(
    prefix: &str,
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    out: &mut Vec<SheetChange>,
) {
    let keys = before
        .keys()
        .chain(after.keys().filter(|k| !before.contains_key(*k)));

    for key in keys {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        let Some(new_value) = after.get(key) else {
            continue;
        };
        let old_value = before.get(key);

        match (old_value.and_then(Value::as_object), new_value.as_object()) {
            (Some(a), Some(b)) => diff_objects(&path, a, b, out),
            _ if old_value != Some(new_value) => out.push(SheetChange {
                path,
                from: old_value.cloned().unwrap_or(Value::Null),
                to: new_value.clone(),
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::apply_updates;
    use crate::{Attack, SpellSlot};
    use serde_json::json;

    #[test]
    fn test_identical_sheets_have_no_changes() {
        let sheet = CharacterSheet::default();
        assert!(diff(&sheet, &sheet.clone()).is_empty());
    }

    #[test]
    fn test_reports_leaf_changes_with_paths() {
        let before = CharacterSheet::default();
        let mut after = before.clone();
        after.equipment.money.gp = "25".to_string();
        after.stats.skills.arcana.proficient = true;

        let changes = diff(&before, &after);
        let paths: Vec<_> = changes.iter().map(|c| c.path.as_str()).collect();
        assert!(paths.contains(&"equipment.money.gp"));
        assert!(paths.contains(&"stats.skills.arcana.proficient"));
        assert_eq!(changes.len(), 2);

        let gp = changes.iter().find(|c| c.path == "equipment.money.gp").unwrap();
        assert_eq!(gp.from, json!("0"));
        assert_eq!(gp.to, json!("25"));
    }

    #[test]
    fn test_arrays_compare_as_whole_values() {
        let before = CharacterSheet::default();
        let mut after = before.clone();
        after.attacks_spellcasting.attacks[1] = Attack {
            name: "Longsword".to_string(),
            bonus: "+5".to_string(),
            damage: "1d8+3 slashing".to_string(),
            notes: String::new(),
        };

        let changes = diff(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "attacksSpellcasting.attacks");
    }

    #[test]
    fn test_removed_fields_are_not_reported() {
        let before = json!({ "a": { "b": "1", "c": "2" } });
        let after = json!({ "a": { "b": "1" } });
        assert!(diff_values(&before, &after).is_empty());
    }

    #[test]
    fn test_added_fields_are_reported() {
        let before = json!({ "a": {} });
        let after = json!({ "a": { "n": 3 } });
        let changes = diff_values(&before, &after);
        assert_eq!(changes[0].path, "a.n");
        assert_eq!(changes[0].from, Value::Null);
        assert_eq!(changes[0].value_string(), "3");
    }

    #[test]
    fn test_patch_of_diff_reproduces_target() {
        let a = CharacterSheet::default();
        let mut b = a.clone();
        b.core_identity.character_name = "Thorin".to_string();
        b.combat.hit_points.current = "3".to_string();
        b.combat.death_saves.successes = 2;
        b.stats.saving_throws.constitution.proficient = true;
        b.equipment.list = "rope, lantern".to_string();
        b.attacks_spellcasting.attacks[0].name = "Axe".to_string();
        b.attacks_spellcasting.spell_slots.insert(
            "1".to_string(),
            SpellSlot {
                total: "4".to_string(),
                expended: "1".to_string(),
            },
        );

        let patched = apply_updates(&a, &to_updates(&diff(&a, &b)));
        assert_eq!(patched, b);
    }
}
