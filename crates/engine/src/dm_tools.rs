//! Structured calls the narrator may make, and their JSON schemas.

use serde_json::{json, Map, Value};

use questkeeper_domain::{
    DiceRollRequest, Die, EntityType, QuestPatch, QuestStatus, QuestUpdate, SheetUpdate,
    MAX_MODIFIER,
};

use crate::infrastructure::ports::{ToolCall, ToolDefinition};

/// Tool names as the narrator sees them.
pub mod names {
    pub const UPDATE_CHARACTER_SHEET: &str = "updateCharacterSheet";
    pub const ADD_QUEST: &str = "addQuest";
    pub const UPDATE_QUEST: &str = "updateQuest";
    pub const UPDATE_MAP: &str = "updateMap";
    pub const REQUEST_DICE_ROLL: &str = "requestDiceRoll";
}

/// A map entity as described by the narrator, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    pub entity_type: EntityType,
    pub x: u32,
    pub y: u32,
    pub name: Option<String>,
    pub color: Option<String>,
    pub image_base64: Option<String>,
}

/// A decoded narrator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmTool {
    UpdateCharacterSheet(Vec<SheetUpdate>),
    AddQuest {
        title: String,
        description: String,
    },
    UpdateQuest(QuestUpdate),
    UpdateMap {
        width: u32,
        height: u32,
        entities: Vec<EntitySpec>,
    },
    RequestDiceRoll(DiceRollRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolArgError {
    #[error("missing argument '{0}'")]
    Missing(&'static str),
    #[error("invalid argument '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ToolArgError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl DmTool {
    /// Decode a call.
    ///
    /// Unknown names and malformed arguments yield `None`; both are logged.
    pub fn from_call(call: &ToolCall) -> Option<Self> {
        match Self::parse(&call.name, &call.arguments) {
            Ok(Some(tool)) => Some(tool),
            Ok(None) => {
                tracing::debug!(tool = %call.name, "Ignoring unknown narrator call");
                None
            }
            Err(error) => {
                tracing::warn!(
                    tool = %call.name,
                    error = %error,
                    "Skipping narrator call with malformed arguments"
                );
                None
            }
        }
    }

    /// `Ok(None)` for names outside the vocabulary.
    pub fn parse(name: &str, arguments: &Value) -> Result<Option<Self>, ToolArgError> {
        let empty = Map::new();
        let args = arguments.as_object().unwrap_or(&empty);

        let tool = match name {
            names::UPDATE_CHARACTER_SHEET => parse_sheet_updates(args)?,
            names::ADD_QUEST => DmTool::AddQuest {
                title: required_str(args, "title")?,
                description: optional_str(args, "description").unwrap_or_default(),
            },
            names::UPDATE_QUEST => parse_quest_update(args)?,
            names::UPDATE_MAP => parse_map(args)?,
            names::REQUEST_DICE_ROLL => parse_dice_request(args)?,
            _ => return Ok(None),
        };
        Ok(Some(tool))
    }
}

fn parse_sheet_updates(args: &Map<String, Value>) -> Result<DmTool, ToolArgError> {
    let entries = args
        .get("updates")
        .ok_or(ToolArgError::Missing("updates"))?
        .as_array()
        .ok_or_else(|| ToolArgError::invalid("updates", "expected an array"))?;

    let mut updates = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.get("path").and_then(Value::as_str);
        let value = entry.get("value");
        match (path, value) {
            (Some(path), Some(value)) if !path.trim().is_empty() => updates.push(SheetUpdate {
                path: path.trim().to_string(),
                value: stringify(value),
            }),
            _ => tracing::warn!(entry = %entry, "Skipping sheet update without path or value"),
        }
    }
    Ok(DmTool::UpdateCharacterSheet(updates))
}

fn parse_quest_update(args: &Map<String, Value>) -> Result<DmTool, ToolArgError> {
    let new_status = optional_str(args, "newStatus")
        .map(|raw| {
            raw.parse::<QuestStatus>()
                .map_err(|e| ToolArgError::invalid("newStatus", e.to_string()))
        })
        .transpose()?;

    Ok(DmTool::UpdateQuest(QuestUpdate {
        title_to_match: required_str(args, "questTitleToUpdate")?,
        patch: QuestPatch {
            new_title: optional_str(args, "newTitle"),
            new_description: optional_str(args, "newDescription"),
            new_status,
        },
    }))
}

fn parse_map(args: &Map<String, Value>) -> Result<DmTool, ToolArgError> {
    let width = required_int(args, "width")?;
    let height = required_int(args, "height")?;
    if width <= 0 || height <= 0 {
        return Err(ToolArgError::invalid(
            "width",
            format!("map must be at least 1x1, got {}x{}", width, height),
        ));
    }
    let width = u32::try_from(width).map_err(|e| ToolArgError::invalid("width", e.to_string()))?;
    let height =
        u32::try_from(height).map_err(|e| ToolArgError::invalid("height", e.to_string()))?;

    let entities = match args.get("entities") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(parse_entity).collect(),
        Some(_) => return Err(ToolArgError::invalid("entities", "expected an array")),
    };

    Ok(DmTool::UpdateMap {
        width,
        height,
        entities,
    })
}

/// Entities that cannot be placed are dropped individually.
fn parse_entity(value: &Value) -> Option<EntitySpec> {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    let parsed = (|| {
        let entity_type = required_str(obj, "type")?
            .parse::<EntityType>()
            .map_err(|e| ToolArgError::invalid("type", e.to_string()))?;
        let x = u32::try_from(required_int(obj, "x")?)
            .map_err(|_| ToolArgError::invalid("x", "must not be negative"))?;
        let y = u32::try_from(required_int(obj, "y")?)
            .map_err(|_| ToolArgError::invalid("y", "must not be negative"))?;
        Ok::<_, ToolArgError>(EntitySpec {
            entity_type,
            x,
            y,
            name: optional_str(obj, "name"),
            color: optional_str(obj, "color"),
            image_base64: optional_str(obj, "imageBase64"),
        })
    })();

    match parsed {
        Ok(spec) => Some(spec),
        Err(error) => {
            tracing::warn!(entity = %value, error = %error, "Dropping map entity");
            None
        }
    }
}

fn parse_dice_request(args: &Map<String, Value>) -> Result<DmTool, ToolArgError> {
    let raw_die = optional_str(args, "dice")
        .or_else(|| optional_str(args, "die"))
        .ok_or(ToolArgError::Missing("dice"))?;
    let die = raw_die
        .parse::<Die>()
        .map_err(|e| ToolArgError::invalid("dice", e.to_string()))?;

    let count = match optional_int(args, "count")? {
        None => 1,
        Some(n) => u8::try_from(n)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| ToolArgError::invalid("count", format!("{} is out of range", n)))?,
    };
    let modifier = match optional_int(args, "modifier")? {
        None => 0,
        Some(n) => i32::try_from(n)
            .ok()
            .filter(|m| (-MAX_MODIFIER..=MAX_MODIFIER).contains(m))
            .ok_or_else(|| ToolArgError::invalid("modifier", format!("{} is out of range", n)))?,
    };
    let reason = optional_str(args, "reason").unwrap_or_else(|| "an unnamed check".to_string());

    DiceRollRequest::new(reason, die, count, modifier)
        .map(DmTool::RequestDiceRoll)
        .map_err(|e| ToolArgError::invalid("count", e.to_string()))
}

// =============================================================================
// Argument helpers
// =============================================================================

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn optional_str(args: &Map<String, Value>, field: &str) -> Option<String> {
    match args.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn required_str(args: &Map<String, Value>, field: &'static str) -> Result<String, ToolArgError> {
    optional_str(args, field)
        .filter(|s| !s.trim().is_empty())
        .ok_or(ToolArgError::Missing(field))
}

/// Integers may arrive as JSON numbers or numeric strings.
fn optional_int(args: &Map<String, Value>, field: &'static str) -> Result<Option<i64>, ToolArgError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| ToolArgError::invalid(field, format!("{} is not an integer", n))),
        Some(Value::String(s)) => s
            .trim()
            .trim_start_matches('+')
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ToolArgError::invalid(field, format!("'{}' is not an integer", s))),
        Some(other) => Err(ToolArgError::invalid(
            field,
            format!("{} is not an integer", other),
        )),
    }
}

fn required_int(args: &Map<String, Value>, field: &'static str) -> Result<i64, ToolArgError> {
    optional_int(args, field)?.ok_or(ToolArgError::Missing(field))
}

// =============================================================================
// Tool definitions
// =============================================================================

/// Every call the narrator may make, in the order they are described to it.
pub fn tool_vocabulary() -> Vec<ToolDefinition> {
    vec![
        build_update_character_sheet_tool(),
        build_add_quest_tool(),
        build_update_quest_tool(),
        build_update_map_tool(),
        build_request_dice_roll_tool(),
    ]
}

fn build_update_character_sheet_tool() -> ToolDefinition {
    ToolDefinition {
        name: names::UPDATE_CHARACTER_SHEET.to_string(),
        description: "Update one or more fields on the player's character sheet. Use whenever hit points, items, money, stats or other sheet values change.".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "updates": {
                    "type": "ARRAY",
                    "description": "The fields to change",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "path": {
                                "type": "STRING",
                                "description": "Dot-separated path of the field, e.g. 'combat.hitPoints.current' or 'equipment.money.gp'"
                            },
                            "value": {
                                "type": "STRING",
                                "description": "The complete new value of the field, as a string"
                            }
                        },
                        "required": ["path", "value"]
                    }
                }
            },
            "required": ["updates"]
        }),
    }
}

fn build_add_quest_tool() -> ToolDefinition {
    ToolDefinition {
        name: names::ADD_QUEST.to_string(),
        description: "Add a new quest to the player's journal when they accept or discover an objective.".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "title": {
                    "type": "STRING",
                    "description": "Short unique title of the quest"
                },
                "description": {
                    "type": "STRING",
                    "description": "What the player has to do and why"
                }
            },
            "required": ["title", "description"]
        }),
    }
}

fn build_update_quest_tool() -> ToolDefinition {
    ToolDefinition {
        name: names::UPDATE_QUEST.to_string(),
        description: "Update an existing quest, found by its current title. Use to complete or fail a quest or to change its details.".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "questTitleToUpdate": {
                    "type": "STRING",
                    "description": "The current title of the quest"
                },
                "newTitle": {
                    "type": "STRING",
                    "description": "Optional new title"
                },
                "newDescription": {
                    "type": "STRING",
                    "description": "Optional new description"
                },
                "newStatus": {
                    "type": "STRING",
                    "enum": ["active", "completed", "failed"],
                    "description": "Optional new status"
                }
            },
            "required": ["questTitleToUpdate"]
        }),
    }
}

fn build_update_map_tool() -> ToolDefinition {
    ToolDefinition {
        name: names::UPDATE_MAP.to_string(),
        description: "Replace the tactical map around the player. Send the complete map every time; entities not listed are removed.".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "width": {
                    "type": "INTEGER",
                    "description": "Number of columns"
                },
                "height": {
                    "type": "INTEGER",
                    "description": "Number of rows"
                },
                "entities": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "type": {
                                "type": "STRING",
                                "enum": ["player", "wall", "enemy", "object", "door"]
                            },
                            "x": {
                                "type": "INTEGER",
                                "description": "Column, 0 is the left edge"
                            },
                            "y": {
                                "type": "INTEGER",
                                "description": "Row, 0 is the top edge"
                            },
                            "name": { "type": "STRING" },
                            "color": {
                                "type": "STRING",
                                "description": "CSS color for the tile"
                            }
                        },
                        "required": ["type", "x", "y"]
                    }
                }
            },
            "required": ["width", "height", "entities"]
        }),
    }
}

fn build_request_dice_roll_tool() -> ToolDefinition {
    let dice: Vec<&str> = Die::ALL.iter().map(|d| d.as_str()).collect();
    ToolDefinition {
        name: names::REQUEST_DICE_ROLL.to_string(),
        description: "Ask the game to roll dice for an uncertain outcome. The result is sent back to you to narrate.".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "reason": {
                    "type": "STRING",
                    "description": "What the roll is for, e.g. 'Goblin attack'"
                },
                "dice": {
                    "type": "STRING",
                    "enum": dice,
                    "description": "Die to roll"
                },
                "count": {
                    "type": "INTEGER",
                    "description": "Number of dice, default 1"
                },
                "modifier": {
                    "type": "INTEGER",
                    "description": "Flat modifier added to the sum, default 0"
                }
            },
            "required": ["reason", "dice"]
        }),
    }
}
