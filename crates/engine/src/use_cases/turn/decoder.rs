//! Turn Result Decoder: raw narrator reply -> [`TurnResult`].

use questkeeper_domain::{
    DiceRollRequest, EntityId, MapEntity, MapState, QuestUpdate, SheetUpdates,
};

use crate::dm_tools::{DmTool, EntitySpec};
use crate::infrastructure::ports::{RandomPort, RawTurn, TurnPart};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestAdd {
    pub title: String,
    pub description: String,
}

/// Everything one narrator reply asks for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnResult {
    /// Text parts joined in order.
    pub narration_text: String,
    /// Folded across every sheet call in the turn; later writes win.
    pub sheet_updates: Option<SheetUpdates>,
    pub quest_adds: Vec<QuestAdd>,
    pub quest_updates: Vec<QuestUpdate>,
    /// Last map call of the turn.
    pub map_snapshot: Option<MapState>,
    /// Last dice request of the turn.
    pub dice_roll_request: Option<DiceRollRequest>,
}

/// Decode a reply. Never fails: unknown or malformed calls are skipped.
///
/// Map entities get fresh ids from `random`.
pub fn decode_turn(raw: &RawTurn, random: &dyn RandomPort) -> TurnResult {
    let mut result = TurnResult::default();

    for part in &raw.parts {
        let call = match part {
            TurnPart::Text(text) => {
                result.narration_text.push_str(text);
                continue;
            }
            TurnPart::Call(call) => call,
        };

        let Some(tool) = DmTool::from_call(call) else {
            continue;
        };

        match tool {
            DmTool::UpdateCharacterSheet(updates) => {
                let folded = result.sheet_updates.get_or_insert_with(SheetUpdates::new);
                for update in updates {
                    folded.insert(update.path, update.value);
                }
            }
            DmTool::AddQuest { title, description } => {
                result.quest_adds.push(QuestAdd { title, description });
            }
            DmTool::UpdateQuest(update) => {
                result.quest_updates.push(update);
            }
            DmTool::UpdateMap {
                width,
                height,
                entities,
            } => {
                let entities = entities
                    .into_iter()
                    .map(|spec| place_entity(spec, random))
                    .collect();
                match MapState::new(width, height, entities) {
                    Ok(map) => result.map_snapshot = Some(map),
                    Err(error) => {
                        tracing::warn!(error = %error, "Skipping map update");
                    }
                }
            }
            DmTool::RequestDiceRoll(request) => {
                result.dice_roll_request = Some(request);
            }
        }
    }

    result
}

fn place_entity(spec: EntitySpec, random: &dyn RandomPort) -> MapEntity {
    let mut entity = MapEntity::new(
        EntityId::from_uuid(random.gen_uuid()),
        spec.entity_type,
        spec.x,
        spec.y,
    );
    entity.name = spec.name;
    entity.color = spec.color;
    entity.image_base64 = spec.image_base64;
    entity
}
