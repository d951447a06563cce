//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::ports::{ClockPort, ImageGenPort, NarrationPort, RandomPort};
use crate::infrastructure::settings::EngineConfig;
use crate::stores::SessionStore;
use crate::use_cases;

/// Main application state.
///
/// Holds the session store and every use case wired against it. A
/// presentation layer drives the game through `use_cases` and renders from
/// `store`.
pub struct App {
    pub store: Arc<SessionStore>,
    pub use_cases: UseCases,
    pub config: EngineConfig,
}

/// Container for all use cases.
pub struct UseCases {
    pub game: use_cases::GameUseCases,
    pub player_action: use_cases::PlayerActionUseCases,
    pub save: use_cases::SaveUseCases,
    pub portrait: Arc<use_cases::GeneratePortrait>,
    pub character_sheet: use_cases::CharacterSheetUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        narration: Arc<dyn NarrationPort>,
        image_gen: Arc<dyn ImageGenPort>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        config: EngineConfig,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        store.dispatch(crate::stores::SessionEvent::SetModel(config.dm_model.clone()));

        let turns = Arc::new(use_cases::TurnOrchestrator::new(
            narration.clone(),
            store.clone(),
            random.clone(),
            config.max_dice_rounds,
        ));

        let game = use_cases::GameUseCases::new(
            Arc::new(use_cases::game::StartGame::new(
                narration.clone(),
                store.clone(),
                turns.clone(),
            )),
            Arc::new(use_cases::game::SwitchModel::new(
                narration.clone(),
                store.clone(),
            )),
        );

        let player_action = use_cases::PlayerActionUseCases::new(
            turns.clone(),
            Arc::new(use_cases::player_action::RollDice::new(
                store.clone(),
                random.clone(),
                turns.clone(),
            )),
            Arc::new(use_cases::player_action::StatCheck::new(
                store.clone(),
                random.clone(),
                turns.clone(),
            )),
            Arc::new(use_cases::player_action::SaveSheet::new(store.clone())),
            Arc::new(use_cases::player_action::SaveNotes::new(store.clone())),
            Arc::new(use_cases::player_action::SetRollMode::new(store.clone())),
        );

        let save = use_cases::SaveUseCases::new(
            Arc::new(use_cases::save::SerializeSession::new(
                narration.clone(),
                store.clone(),
                clock,
            )),
            Arc::new(use_cases::save::RestoreSession::new(
                narration.clone(),
                store.clone(),
            )),
        );

        let portrait = Arc::new(use_cases::GeneratePortrait::new(image_gen, store.clone()));

        let character_sheet = use_cases::CharacterSheetUseCases::new(
            Arc::new(use_cases::character_sheet::ImportCharacterSheet::new(
                narration.clone(),
                store.clone(),
            )),
            Arc::new(use_cases::character_sheet::SuggestAdventureDetails::new(
                narration,
                store.clone(),
            )),
        );

        Self {
            store,
            use_cases: UseCases {
                game,
                player_action,
                save,
                portrait,
                character_sheet,
            },
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::ports::{MockImageGenPort, RawTurn};
    use crate::test_fixtures::{sample_details, sample_sheet, ScriptedNarration};
    use crate::use_cases::turn::PlayerInput;
    use chrono::Utc;
    use questkeeper_domain::DmModel;

    #[tokio::test]
    async fn test_app_plays_start_then_action() {
        let narration = Arc::new(
            ScriptedNarration::new()
                .reply(RawTurn::text("The tavern is loud."))
                .reply(RawTurn::text("The barkeep nods.")),
        );
        let config = EngineConfig {
            dm_model: DmModel::Flash,
            ..EngineConfig::default()
        };
        let app = App::new(
            narration.clone(),
            Arc::new(MockImageGenPort::new()),
            Arc::new(FixedClock(Utc::now())),
            Arc::new(FixedRandom(10)),
            config,
        );

        app.use_cases
            .game
            .start
            .execute(sample_sheet(), sample_details())
            .await
            .unwrap();
        app.use_cases
            .player_action
            .act
            .execute(PlayerInput::text("I order an ale"))
            .await
            .unwrap();

        assert_eq!(narration.opened()[0].model, DmModel::Flash);
        let state = app.store.snapshot();
        assert_eq!(state.game_log.len(), 3);
        assert_eq!(state.chat.unwrap().transcript().len(), 4);
    }
}
