//! Character creation helpers backed by structured generation.
//!
//! Both run before a game starts and return values for the caller to pass to
//! `StartGame`; neither touches the session state.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use questkeeper_domain::sheet::format_sheet;
use questkeeper_domain::{AdventureDetails, AdventureDifficulty, CharacterSheet};

use crate::infrastructure::ports::NarrationPort;
use crate::prompt_templates;
use crate::stores::SessionStore;
use crate::use_cases::SessionActionError;

pub struct CharacterSheetUseCases {
    pub import: Arc<ImportCharacterSheet>,
    pub suggest_adventure: Arc<SuggestAdventureDetails>,
}

impl CharacterSheetUseCases {
    pub fn new(
        import: Arc<ImportCharacterSheet>,
        suggest_adventure: Arc<SuggestAdventureDetails>,
    ) -> Self {
        Self {
            import,
            suggest_adventure,
        }
    }
}

/// Response schema describing a blank sheet's shape.
pub fn sheet_schema() -> Value {
    match serde_json::to_value(CharacterSheet::default()) {
        Ok(template) => schema_for(&template),
        Err(e) => {
            tracing::error!(error = %e, "Blank character sheet could not be serialized");
            json!({ "type": "OBJECT" })
        }
    }
}

fn schema_for(value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let properties: Map<String, Value> = fields
                .iter()
                .filter(|(_, v)| !matches!(v, Value::Object(o) if o.is_empty()))
                .map(|(k, v)| (k.clone(), schema_for(v)))
                .collect();
            json!({ "type": "OBJECT", "properties": properties })
        }
        Value::Array(items) => json!({
            "type": "ARRAY",
            "items": items.first().map(schema_for).unwrap_or_else(|| json!({ "type": "STRING" })),
        }),
        Value::Bool(_) => json!({ "type": "BOOLEAN" }),
        Value::Number(_) => json!({ "type": "NUMBER" }),
        _ => json!({ "type": "STRING" }),
    }
}

/// Coerce generated values toward the template's leaf types.
///
/// Models often answer `3` where the sheet stores `"3"`; those are converted
/// instead of failing the whole import.
fn conform(template: &Value, value: Value) -> Value {
    match (template, value) {
        (Value::Object(shape), Value::Object(mut fields)) => {
            for (key, expected) in shape {
                if let Some(found) = fields.remove(key) {
                    fields.insert(key.clone(), conform(expected, found));
                }
            }
            Value::Object(fields)
        }
        (Value::Array(shape), Value::Array(items)) => match shape.first() {
            Some(expected) => Value::Array(items.into_iter().map(|v| conform(expected, v)).collect()),
            None => Value::Array(items),
        },
        (Value::String(_), Value::Number(n)) => Value::String(n.to_string()),
        (Value::String(_), Value::Bool(b)) => Value::String(b.to_string()),
        (Value::String(_), Value::Null) => Value::String(String::new()),
        (Value::Number(_), Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or(Value::from(0)),
        (Value::Bool(_), Value::String(s)) => Value::Bool(s.trim().eq_ignore_ascii_case("true")),
        (_, value) => value,
    }
}

pub struct ImportCharacterSheet {
    narration: Arc<dyn NarrationPort>,
    store: Arc<SessionStore>,
}

impl ImportCharacterSheet {
    pub fn new(narration: Arc<dyn NarrationPort>, store: Arc<SessionStore>) -> Self {
        Self { narration, store }
    }

    /// Convert an uploaded character sheet or stat block into a sheet.
    pub async fn execute(&self, document: &str) -> Result<CharacterSheet, SessionActionError> {
        if document.trim().is_empty() {
            return Err(SessionActionError::EmptyDocument);
        }

        let model = self.store.read(|s| s.dm_model.clone());
        let generated = self
            .narration
            .complete_json(&model, prompt_templates::sheet_parse_prompt(document), sheet_schema())
            .await?;

        let template = serde_json::to_value(CharacterSheet::default())
            .map_err(|e| SessionActionError::InvalidResponse(e.to_string()))?;
        let sheet: CharacterSheet = serde_json::from_value(conform(&template, generated))
            .map_err(|e| {
                tracing::warn!(error = %e, "Imported character sheet did not match the sheet shape");
                SessionActionError::InvalidResponse(e.to_string())
            })?;

        tracing::info!(character = %sheet.character_name(), "Character sheet imported");
        Ok(sheet)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdventureSuggestion {
    #[serde(default)]
    world_name: String,
    #[serde(default)]
    additional_info: String,
}

pub struct SuggestAdventureDetails {
    narration: Arc<dyn NarrationPort>,
    store: Arc<SessionStore>,
}

impl SuggestAdventureDetails {
    pub fn new(narration: Arc<dyn NarrationPort>, store: Arc<SessionStore>) -> Self {
        Self { narration, store }
    }

    pub async fn execute(
        &self,
        difficulty: AdventureDifficulty,
        sheet: &CharacterSheet,
    ) -> Result<AdventureDetails, SessionActionError> {
        let model = self.store.read(|s| s.dm_model.clone());
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "worldName": { "type": "STRING" },
                "additionalInfo": { "type": "STRING" }
            },
            "required": ["worldName", "additionalInfo"]
        });
        let prompt = prompt_templates::adventure_suggestion_prompt(difficulty, &format_sheet(sheet));

        let generated = self.narration.complete_json(&model, prompt, schema).await?;
        let suggestion: AdventureSuggestion = serde_json::from_value(generated)
            .map_err(|e| SessionActionError::InvalidResponse(e.to_string()))?;

        if suggestion.world_name.trim().is_empty() {
            return Err(SessionActionError::InvalidResponse(
                "suggestion has no world name".to_string(),
            ));
        }

        Ok(AdventureDetails::new(
            difficulty,
            suggestion.world_name.trim(),
            suggestion.additional_info.trim(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::NarrationError;
    use crate::test_fixtures::{sample_sheet, ScriptedNarration};

    #[test]
    fn test_schema_mirrors_sheet_sections() {
        let schema = sheet_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(
            schema["properties"]["combat"]["properties"]["hitPoints"]["properties"]["current"]["type"],
            "STRING"
        );
        assert_eq!(
            schema["properties"]["attacksSpellcasting"]["properties"]["attacks"]["type"],
            "ARRAY"
        );
    }

    #[test]
    fn test_schema_lists_spell_slot_levels() {
        let schema = sheet_schema();
        let slots = &schema["properties"]["attacksSpellcasting"]["properties"]["spellSlots"];
        assert_eq!(slots["properties"]["1"]["type"], "OBJECT");
        assert_eq!(slots["properties"]["9"]["type"], "OBJECT");
        assert_eq!(
            schema["properties"]["combat"]["properties"]["deathSaves"]["properties"]["successes"]["type"],
            "NUMBER"
        );
    }

    #[test]
    fn test_conform_stringifies_numbers() {
        let template = json!({ "level": "1", "flag": false });
        let conformed = conform(&template, json!({ "level": 5, "flag": "TRUE", "extra": 1 }));
        assert_eq!(conformed, json!({ "level": "5", "flag": true, "extra": 1 }));
    }

    #[tokio::test]
    async fn test_import_fills_missing_fields_with_defaults() {
        let narration = Arc::new(ScriptedNarration::new().json_reply(json!({
            "coreIdentity": { "characterName": "Brom", "className": "Fighter", "level": 4 },
            "combat": { "hitPoints": { "max": "38", "current": "38" } }
        })));
        let store = Arc::new(SessionStore::new());

        let sheet = ImportCharacterSheet::new(narration.clone(), store)
            .execute("Brom, level 4 fighter, 38 HP")
            .await
            .unwrap();

        assert_eq!(sheet.character_name(), "Brom");
        assert_eq!(sheet.core_identity.level, "4");
        assert_eq!(sheet.combat.hit_points.current, "38");
        assert_eq!(sheet.equipment, CharacterSheet::default().equipment);
        assert!(narration.prompts()[0].contains("Brom, level 4 fighter"));
    }

    #[tokio::test]
    async fn test_import_rejects_empty_document() {
        let narration = Arc::new(ScriptedNarration::new());
        let result = ImportCharacterSheet::new(narration.clone(), Arc::new(SessionStore::new()))
            .execute("   ")
            .await;

        assert_eq!(result, Err(SessionActionError::EmptyDocument));
        assert!(narration.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_import_surfaces_narration_failure() {
        let narration =
            Arc::new(ScriptedNarration::new().json_fail(NarrationError::Blocked("SAFETY".into())));
        let result = ImportCharacterSheet::new(narration, Arc::new(SessionStore::new()))
            .execute("A lich.")
            .await;

        assert!(matches!(result, Err(SessionActionError::Narration(_))));
    }

    #[tokio::test]
    async fn test_suggestion_builds_adventure_details() {
        let narration = Arc::new(ScriptedNarration::new().json_reply(json!({
            "worldName": "  The Sunken Vale ",
            "additionalInfo": "A drowned kingdom stirs."
        })));

        let details = SuggestAdventureDetails::new(narration.clone(), Arc::new(SessionStore::new()))
            .execute(AdventureDifficulty::Hard, &sample_sheet())
            .await
            .unwrap();

        assert_eq!(details.world_name, "The Sunken Vale");
        assert_eq!(details.difficulty, AdventureDifficulty::Hard);
        let prompt = &narration.prompts()[0];
        assert!(prompt.contains("Hard"));
        assert!(prompt.contains("Lyra Moonwhisper"));
    }

    #[tokio::test]
    async fn test_suggestion_without_world_name_is_invalid() {
        let narration = Arc::new(ScriptedNarration::new().json_reply(json!({ "additionalInfo": "x" })));
        let result = SuggestAdventureDetails::new(narration, Arc::new(SessionStore::new()))
            .execute(AdventureDifficulty::Easy, &sample_sheet())
            .await;

        assert!(matches!(result, Err(SessionActionError::InvalidResponse(_))));
    }
}
