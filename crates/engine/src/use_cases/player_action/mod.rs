//! Player intents other than free-text actions.
//!
//! Dice rolls and checks become player actions; sheet and journal edits are
//! reported to the narrator through the pending out-of-character note.

use std::sync::Arc;

use questkeeper_domain::sheet::diff;
use questkeeper_domain::{
    joined_contents, signed, CharacterSheet, Die, ModedRoll, PersonalNote, RollMode, SheetChange,
};

use crate::infrastructure::ports::RandomPort;
use crate::stores::{SessionEvent, SessionStore};
use crate::use_cases::turn::apply::quoted;
use crate::use_cases::turn::{PlayerInput, TurnOrchestrator, TurnOutcome};
use crate::use_cases::SessionActionError;

const NOTE_VALUE_LIMIT: usize = 50;

pub struct PlayerActionUseCases {
    pub act: Arc<TurnOrchestrator>,
    pub roll_dice: Arc<RollDice>,
    pub stat_check: Arc<StatCheck>,
    pub save_sheet: Arc<SaveSheet>,
    pub save_notes: Arc<SaveNotes>,
    pub roll_mode: Arc<SetRollMode>,
}

impl PlayerActionUseCases {
    pub fn new(
        act: Arc<TurnOrchestrator>,
        roll_dice: Arc<RollDice>,
        stat_check: Arc<StatCheck>,
        save_sheet: Arc<SaveSheet>,
        save_notes: Arc<SaveNotes>,
        roll_mode: Arc<SetRollMode>,
    ) -> Self {
        Self {
            act,
            roll_dice,
            stat_check,
            save_sheet,
            save_notes,
            roll_mode,
        }
    }
}

/// A roll made by the player and the action it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRoll {
    pub roll: ModedRoll,
    pub message: String,
    pub turn: TurnOutcome,
}

/// Shared by dice rolls and checks: validate, roll, consume the mode, send.
struct RollAction {
    store: Arc<SessionStore>,
    random: Arc<dyn RandomPort>,
    turns: Arc<TurnOrchestrator>,
}

impl RollAction {
    async fn run(
        &self,
        die: Die,
        describe: impl FnOnce(&ModedRoll) -> String,
    ) -> Result<PlayerRoll, SessionActionError> {
        let (started, loading, mode) =
            self.store
                .read(|s| (s.game_started, s.is_loading, s.roll_mode));
        if !started {
            return Err(SessionActionError::NotStarted);
        }
        if loading {
            return Err(SessionActionError::ActionInFlight);
        }

        let roll = mode.roll(die, |min, max| self.random.gen_range(min, max));
        let message = describe(&roll);
        tracing::debug!(die = %die, kept = roll.kept, "Player rolled");
        let turn = self
            .turns
            .execute(PlayerInput::text(message.clone()))
            .await?;

        // Advantage and disadvantage last for one delivered d20 roll.
        if roll.mode != RollMode::Normal {
            self.store
                .dispatch(SessionEvent::SetRollMode(RollMode::Normal));
        }

        Ok(PlayerRoll {
            roll,
            message,
            turn,
        })
    }
}

fn mode_suffix(roll: &ModedRoll) -> String {
    match roll.mode {
        RollMode::Normal => String::new(),
        mode => format!(
            " (rolled with {}: {})",
            mode,
            roll.rolls
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(" and ")
        ),
    }
}

pub struct RollDice {
    inner: RollAction,
}

impl RollDice {
    pub fn new(
        store: Arc<SessionStore>,
        random: Arc<dyn RandomPort>,
        turns: Arc<TurnOrchestrator>,
    ) -> Self {
        Self {
            inner: RollAction {
                store,
                random,
                turns,
            },
        }
    }

    pub async fn execute(&self, die: Die) -> Result<PlayerRoll, SessionActionError> {
        self.inner
            .run(die, |roll| {
                format!(
                    "Player rolls a {} and gets: {}.{}",
                    roll.die,
                    roll.kept,
                    mode_suffix(roll)
                )
            })
            .await
    }
}

pub struct StatCheck {
    inner: RollAction,
}

impl StatCheck {
    pub fn new(
        store: Arc<SessionStore>,
        random: Arc<dyn RandomPort>,
        turns: Arc<TurnOrchestrator>,
    ) -> Self {
        Self {
            inner: RollAction {
                store,
                random,
                turns,
            },
        }
    }

    /// d20 + modifier for an ability, skill or saving throw.
    pub async fn execute(
        &self,
        name: &str,
        modifier: i32,
    ) -> Result<PlayerRoll, SessionActionError> {
        self.inner
            .run(Die::D20, |roll| {
                let critical = if roll.is_natural_20() {
                    " (Critical Success!)"
                } else if roll.is_natural_1() {
                    " (Critical Failure!)"
                } else {
                    ""
                };
                format!(
                    "Player rolls for a {} check and gets: {}{}. (Roll: {}, Modifier: {}){}",
                    name,
                    roll.kept.saturating_add(modifier),
                    critical,
                    roll.kept,
                    signed(modifier),
                    mode_suffix(roll)
                )
            })
            .await
    }
}

/// Append to the pending out-of-character note.
fn queue_note(store: &SessionStore, note: String) {
    let combined = match store.read(|s| s.pending_ooc_note.clone()) {
        Some(existing) if !existing.trim().is_empty() => format!("{}\n\n{}", existing, note),
        _ => note,
    };
    store.dispatch(SessionEvent::SetPendingOocNote(combined));
}

pub struct SaveSheet {
    store: Arc<SessionStore>,
}

impl SaveSheet {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Replace the sheet with the player's edit. Returns the changed fields.
    pub fn execute(&self, sheet: CharacterSheet) -> Result<Vec<SheetChange>, SessionActionError> {
        let current = self
            .store
            .read(|s| s.character_sheet.clone())
            .ok_or(SessionActionError::NotStarted)?;

        let changes = diff(&current, &sheet);
        if changes.is_empty() {
            return Ok(changes);
        }

        self.store.dispatch(SessionEvent::ReplaceSheet(sheet));
        queue_note(&self.store, sheet_note(&changes));
        tracing::info!(changes = changes.len(), "Player edited character sheet");
        Ok(changes)
    }
}

fn sheet_note(changes: &[SheetChange]) -> String {
    let lines = changes
        .iter()
        .map(|change| {
            let section = questkeeper_domain::SheetPath::parse(&change.path)
                .map(|p| p.pretty())
                .unwrap_or_else(|_| change.path.clone());
            format!(
                "- Section '{}' was changed to {}.",
                section,
                quoted(&change.value_string(), NOTE_VALUE_LIMIT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "OOC: The player has updated their character sheet with the following changes:\n{}",
        lines
    )
}

pub struct SaveNotes {
    store: Arc<SessionStore>,
}

impl SaveNotes {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Replace the journal notes. Returns whether anything changed.
    pub fn execute(&self, notes: Vec<PersonalNote>) -> bool {
        let unchanged = self
            .store
            .read(|s| joined_contents(&s.personal_notes) == joined_contents(&notes));
        if unchanged {
            return false;
        }

        self.store.dispatch(SessionEvent::ReplaceNotes(notes));
        queue_note(
            &self.store,
            "OOC: The player has updated their personal notes in their journal.".to_string(),
        );
        true
    }
}

pub struct SetRollMode {
    store: Arc<SessionStore>,
}

impl SetRollMode {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn execute(&self, mode: RollMode) {
        self.store.dispatch(SessionEvent::SetRollMode(mode));
    }
}
