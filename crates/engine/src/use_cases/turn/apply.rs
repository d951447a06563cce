//! Turns a decoded reply into a [`TurnDelta`] against the current state.

use questkeeper_domain::sheet::apply_updates_with_report;
use questkeeper_domain::{GameMessage, Quest, QuestId, SheetPath};

use crate::infrastructure::ports::RandomPort;
use crate::stores::{SessionState, TurnDelta};

use super::decoder::TurnResult;

/// Longest sheet value echoed back in the log.
const LOGGED_VALUE_LIMIT: usize = 75;

/// Build the state change for one reply.
///
/// Sheet updates apply to the sheet in `state`, which already includes any
/// earlier round of the same action.
pub fn build_delta(state: &SessionState, result: &TurnResult, random: &dyn RandomPort) -> TurnDelta {
    let mut delta = TurnDelta::default();

    let narration = result.narration_text.trim();
    if !narration.is_empty() {
        delta.messages.push(GameMessage::dm(narration));
    }

    if let (Some(updates), Some(sheet)) = (&result.sheet_updates, &state.character_sheet) {
        if !updates.is_empty() {
            let report = apply_updates_with_report(sheet, updates);
            if !report.applied.is_empty() {
                let details = report
                    .applied
                    .iter()
                    .map(|path| {
                        let pretty = SheetPath::parse(path)
                            .map(|p| p.pretty())
                            .unwrap_or_else(|_| path.clone());
                        let value = updates.get(path).unwrap_or_default();
                        format!(
                            "Updated section '{}' ({}) to {}",
                            pretty,
                            path,
                            quoted(value, LOGGED_VALUE_LIMIT)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(". ");
                delta.messages.push(GameMessage::system(format!(
                    "[SYSTEM] Character sheet updated: {}.",
                    details
                )));
                delta.sheet = Some(report.sheet);
            }
        }
    }

    for add in &result.quest_adds {
        let quest = Quest::new(
            QuestId::from_uuid(random.gen_uuid()),
            add.title.clone(),
            add.description.clone(),
        );
        delta.messages.push(GameMessage::system(format!(
            "[SYSTEM] New quest added to journal: \"{}\".",
            quest.title
        )));
        delta.new_quests.push(quest);
    }

    for update in &result.quest_updates {
        // Quests added earlier in the same reply can be updated too.
        let known: Vec<Quest> = state
            .quests
            .iter()
            .map(|q| {
                delta
                    .updated_quests
                    .iter()
                    .find(|u| u.id == q.id)
                    .unwrap_or(q)
                    .clone()
            })
            .chain(delta.new_quests.iter().cloned())
            .collect();

        let Some(updated) = update.resolve(&known) else {
            tracing::debug!(
                title = %update.title_to_match,
                "Quest update matched no quest"
            );
            continue;
        };

        let summary = update.patch.describe();
        delta.messages.push(GameMessage::system(if summary.is_empty() {
            format!("[SYSTEM] Quest \"{}\" updated.", update.title_to_match)
        } else {
            format!(
                "[SYSTEM] Quest \"{}\" updated: {}.",
                update.title_to_match, summary
            )
        }));

        if let Some(slot) = delta.new_quests.iter_mut().find(|q| q.id == updated.id) {
            *slot = updated;
        } else if let Some(slot) = delta.updated_quests.iter_mut().find(|q| q.id == updated.id) {
            *slot = updated;
        } else {
            delta.updated_quests.push(updated);
        }
    }

    delta.map = result.map_snapshot.clone();
    delta
}

/// `"value"`, cut to `limit` characters with a trailing ellipsis.
pub(crate) fn quoted(value: &str, limit: usize) -> String {
    if value.chars().count() > limit {
        let cut: String = value.chars().take(limit).collect();
        format!("\"{}...\"", cut)
    } else {
        format!("\"{}\"", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockRandomPort;
    use crate::use_cases::turn::decoder::QuestAdd;
    use questkeeper_domain::{
        CharacterSheet, EntityId, EntityType, MapEntity, MapState, QuestPatch, QuestStatus,
        QuestUpdate, Sender, SheetUpdates,
    };
    use uuid::Uuid;

    fn random() -> MockRandomPort {
        let mut random = MockRandomPort::new();
        random.expect_gen_uuid().returning(Uuid::new_v4);
        random
    }

    fn state_with_sheet() -> SessionState {
        let mut sheet = CharacterSheet::default();
        sheet.equipment.money.gp = "10".to_string();
        SessionState {
            game_started: true,
            character_sheet: Some(sheet),
            ..Default::default()
        }
    }

    fn status_update(title: &str, status: QuestStatus) -> QuestUpdate {
        QuestUpdate {
            title_to_match: title.to_string(),
            patch: QuestPatch {
                new_status: Some(status),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_sheet_update_logs_path() {
        let result = TurnResult {
            narration_text: "You find 10 gold.".to_string(),
            sheet_updates: Some(SheetUpdates::from_iter([("equipment.money.gp", "20")])),
            ..Default::default()
        };

        let delta = build_delta(&state_with_sheet(), &result, &random());

        assert_eq!(delta.sheet.unwrap().equipment.money.gp, "20");
        assert_eq!(delta.messages[0], GameMessage::dm("You find 10 gold."));
        assert_eq!(delta.messages[1].sender, Sender::System);
        assert!(delta.messages[1].text.contains("equipment.money.gp"));
        assert!(delta.messages[1].text.contains("Equipment > Money > Gp"));
    }

    #[test]
    fn test_only_applied_paths_are_logged() {
        let result = TurnResult {
            sheet_updates: Some(SheetUpdates::from_iter([
                ("combat.hitPoints.current", "7"),
                ("no.such.field", "x"),
            ])),
            ..Default::default()
        };

        let delta = build_delta(&state_with_sheet(), &result, &random());

        assert_eq!(delta.sheet.unwrap().combat.hit_points.current, "7");
        assert_eq!(delta.messages.len(), 1);
        assert!(!delta.messages[0].text.contains("no.such.field"));
    }

    #[test]
    fn test_all_invalid_updates_leave_sheet_alone() {
        let result = TurnResult {
            sheet_updates: Some(SheetUpdates::from_iter([("no.such.field", "x")])),
            ..Default::default()
        };
        let delta = build_delta(&state_with_sheet(), &result, &random());
        assert_eq!(delta.sheet, None);
        assert!(delta.messages.is_empty());
    }

    #[test]
    fn test_quest_update_matches_title_case_insensitively() {
        let mut state = state_with_sheet();
        let key = Quest::new(QuestId::new(), "Find the Key", "");
        let other = Quest::new(QuestId::new(), "Find the Keys", "");
        state.quests = vec![key.clone(), other];

        let result = TurnResult {
            quest_updates: vec![status_update("find the key", QuestStatus::Completed)],
            ..Default::default()
        };
        let delta = build_delta(&state, &result, &random());

        assert_eq!(delta.updated_quests.len(), 1);
        assert_eq!(delta.updated_quests[0].id, key.id);
        assert_eq!(delta.updated_quests[0].status, QuestStatus::Completed);
        assert_eq!(
            delta.messages[0].text,
            "[SYSTEM] Quest \"find the key\" updated: status changed to \"completed\"."
        );
    }

    #[test]
    fn test_unmatched_quest_update_is_silent() {
        let mut state = state_with_sheet();
        state.quests = vec![Quest::new(QuestId::new(), "Find the Key", "")];

        let result = TurnResult {
            quest_updates: vec![status_update("Slay the Dragon", QuestStatus::Failed)],
            ..Default::default()
        };
        let delta = build_delta(&state, &result, &random());

        assert!(delta.updated_quests.is_empty());
        assert!(delta.messages.is_empty());
    }

    #[test]
    fn test_quest_added_and_updated_in_same_reply() {
        let result = TurnResult {
            quest_adds: vec![QuestAdd {
                title: "Escape".to_string(),
                description: "Get out".to_string(),
            }],
            quest_updates: vec![status_update("escape", QuestStatus::Completed)],
            ..Default::default()
        };
        let delta = build_delta(&state_with_sheet(), &result, &random());

        assert_eq!(delta.new_quests.len(), 1);
        assert_eq!(delta.new_quests[0].status, QuestStatus::Completed);
        assert!(delta.updated_quests.is_empty());
        assert_eq!(delta.messages.len(), 2);
    }

    #[test]
    fn test_map_is_passed_through() {
        let map = MapState::new(
            2,
            2,
            vec![MapEntity::new(EntityId::new(), EntityType::Player, 0, 0)],
        )
        .unwrap();
        let result = TurnResult {
            map_snapshot: Some(map.clone()),
            ..Default::default()
        };
        assert_eq!(build_delta(&state_with_sheet(), &result, &random()).map, Some(map));
    }

    #[test]
    fn test_quoted_truncates_long_values() {
        assert_eq!(quoted("short", 10), "\"short\"");
        assert_eq!(quoted("abcdefghij", 4), "\"abcd...\"");
    }
}
