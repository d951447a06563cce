//! Prompts sent to the narrator.
//!
//! Every template has a hard-coded default that can be overridden through an
//! environment variable (see [`key_to_env_var`]). Placeholders are written as
//! `{name}` and filled with [`render`].

use questkeeper_domain::{AdventureDetails, AdventureDifficulty, DiceRoll, MapEntity};

/// All prompt template keys as constants.
pub mod keys {
    /// Role, tone and rules of the Dungeon Master.
    pub const DM_SYSTEM_PROMPT: &str = "dm.system_prompt";
    /// How the narrator must use its tools.
    pub const DM_MECHANICS: &str = "dm.mechanics";
    /// First user message of a new adventure.
    pub const DM_OPENING_MESSAGE: &str = "dm.opening_message";
    /// Follow-up message after a requested roll was resolved.
    pub const DM_DICE_FOLLOW_UP: &str = "dm.dice_follow_up";
    /// Converts an uploaded document into a character sheet.
    pub const SHEET_PARSE: &str = "sheet.parse";
    /// Suggests a world name and premise for a new adventure.
    pub const ADVENTURE_SUGGESTION: &str = "adventure.suggestion";
    /// Portrait of a map entity.
    pub const PORTRAIT: &str = "portrait.prompt";
}

/// Default values for all prompt templates.
pub mod defaults {
    pub const DM_SYSTEM_PROMPT: &str = r#"You are the Dungeon Master (DM) for a text-based role-playing game based on Dungeons & Dragons 5th Edition rules.
Your goal is to create a rich, engaging, and challenging fantasy adventure.
You describe the world, the non-player characters and the situations the player finds themselves in.
React to the player's actions, describe the consequences, and call for dice rolls when an outcome is uncertain.
Keep your responses concise but descriptive. Use markdown for emphasis where appropriate.

ADVENTURE:
- World: {world_name}
- Difficulty: {difficulty}
{additional_info}
The player's character sheet is below. Use it to tailor the adventure and to decide the success or failure of their actions.
---
CHARACTER SHEET:
{character_sheet}
---
"#;

    pub const DM_MECHANICS: &str = r#"GAME MECHANICS:
- 'updateCharacterSheet' changes fields on the character sheet. Call it whenever hit points, items, money or stats change. Each update has a dot-separated 'path' (e.g. 'combat.hitPoints.current' or 'equipment.money.gp') and the complete new 'value' as a string.
- List-like fields such as 'equipment.list' or 'characterDetails.languages' are single strings. Always send the entire new string, including the old entries you keep.
- 'addQuest' adds a quest to the player's journal. 'updateQuest' changes a quest found by its current title.
- 'updateMap' replaces the tactical map. Always send the whole map; entities you leave out disappear.
- 'requestDiceRoll' asks the game to roll for you. Wait for the result before narrating the outcome.
- Out-of-character messages starting with "OOC:" or "[SYSTEM]" come from the game, not from the story.
- After calling a tool, still describe the change in your narration.
"#;

    pub const DM_OPENING_MESSAGE: &str = "I am ready to begin.";

    pub const DM_DICE_FOLLOW_UP: &str = "[SYSTEM] The roll for {reason} resulted in {total} ({breakdown}). Narrate the outcome.";

    pub const SHEET_PARSE: &str = r#"You are an expert assistant for Dungeons & Dragons 5th Edition. Parse the text of a character sheet or a monster/NPC stat block and convert it into a JSON object that follows the provided schema.

Rules:
1. Output only the raw JSON object.
2. Follow the schema structure exactly. Every value except proficiency flags is a string.
3. For saving throws and skills, set 'proficient' to true when the listed modifier is higher than the base ability modifier.
4. Several sections of the text may belong to one field. Join them with newlines.
5. Set 'combat.hitPoints.current' to the same value as 'combat.hitPoints.max'.
6. Use sensible defaults ("0", "", false) for information that is missing.

---
CHARACTER INFORMATION TO PARSE:
{document}
---
"#;

    pub const ADVENTURE_SUGGESTION: &str = r#"Suggest a setting for a new {difficulty} Dungeons & Dragons adventure for the character below.
Return JSON with 'worldName' (a short evocative name) and 'additionalInfo' (two or three sentences describing the premise and the first hook).
---
{character_sheet}
---
"#;

    pub const PORTRAIT: &str = "Fantasy character portrait, painterly style, head and shoulders, dramatic lighting. Subject: {label}, a {entity_type} encountered in the world of {world_name}.";
}

/// Convert a template key to its environment variable name.
pub fn key_to_env_var(key: &str) -> String {
    format!("QUESTKEEPER_PROMPT_{}", key.to_uppercase().replace('.', "_"))
}

/// Get the default value for a template key.
pub fn get_default(key: &str) -> Option<&'static str> {
    match key {
        keys::DM_SYSTEM_PROMPT => Some(defaults::DM_SYSTEM_PROMPT),
        keys::DM_MECHANICS => Some(defaults::DM_MECHANICS),
        keys::DM_OPENING_MESSAGE => Some(defaults::DM_OPENING_MESSAGE),
        keys::DM_DICE_FOLLOW_UP => Some(defaults::DM_DICE_FOLLOW_UP),
        keys::SHEET_PARSE => Some(defaults::SHEET_PARSE),
        keys::ADVENTURE_SUGGESTION => Some(defaults::ADVENTURE_SUGGESTION),
        keys::PORTRAIT => Some(defaults::PORTRAIT),
        _ => None,
    }
}

/// Template text: environment override first, then the default.
pub fn resolve(key: &str) -> String {
    std::env::var(key_to_env_var(key))
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| get_default(key).map(str::to_string))
        .unwrap_or_default()
}

/// Replace `{name}` placeholders.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
}

/// Full system instruction for a chat.
pub fn system_instruction(formatted_sheet: &str, details: &AdventureDetails) -> String {
    let additional_info = if details.additional_info.trim().is_empty() {
        String::new()
    } else {
        format!("- Notes: {}\n", details.additional_info.trim())
    };
    let difficulty = details.difficulty.to_string();

    let mut out = render(
        &resolve(keys::DM_SYSTEM_PROMPT),
        &[
            ("world_name", details.world_name.as_str()),
            ("difficulty", difficulty.as_str()),
            ("additional_info", additional_info.as_str()),
            ("character_sheet", formatted_sheet),
        ],
    );
    out.push('\n');
    out.push_str(&resolve(keys::DM_MECHANICS));
    out
}

pub fn opening_message() -> String {
    resolve(keys::DM_OPENING_MESSAGE)
}

pub fn dice_follow_up(roll: &DiceRoll) -> String {
    let total = roll.total.to_string();
    let breakdown = roll.breakdown();
    render(
        &resolve(keys::DM_DICE_FOLLOW_UP),
        &[
            ("reason", roll.reason.as_str()),
            ("total", total.as_str()),
            ("breakdown", breakdown.as_str()),
        ],
    )
}

pub fn sheet_parse_prompt(document: &str) -> String {
    render(&resolve(keys::SHEET_PARSE), &[("document", document)])
}

pub fn adventure_suggestion_prompt(difficulty: AdventureDifficulty, formatted_sheet: &str) -> String {
    let difficulty = difficulty.to_string();
    render(
        &resolve(keys::ADVENTURE_SUGGESTION),
        &[
            ("difficulty", difficulty.as_str()),
            ("character_sheet", formatted_sheet),
        ],
    )
}

pub fn portrait_prompt(entity: &MapEntity, world_name: &str) -> String {
    let label = entity.label();
    let entity_type = format!("{:?}", entity.entity_type).to_lowercase();
    render(
        &resolve(keys::PORTRAIT),
        &[
            ("label", label.as_str()),
            ("entity_type", entity_type.as_str()),
            ("world_name", world_name),
        ],
    )
}
