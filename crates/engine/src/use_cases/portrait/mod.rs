//! Portraits for map entities.
//!
//! Runs beside narration: the image is shown locally right away and queued for
//! the narrator's next action.

use std::sync::Arc;

use questkeeper_domain::EntityId;

use crate::infrastructure::ports::{Blob, ImageGenPort, ImageRequest};
use crate::prompt_templates;
use crate::stores::{PendingPortrait, SessionEvent, SessionStore};
use crate::use_cases::SessionActionError;

const PORTRAIT_ASPECT_RATIO: &str = "1:1";

pub struct GeneratePortrait {
    image_gen: Arc<dyn ImageGenPort>,
    store: Arc<SessionStore>,
}

impl GeneratePortrait {
    pub fn new(image_gen: Arc<dyn ImageGenPort>, store: Arc<SessionStore>) -> Self {
        Self { image_gen, store }
    }

    pub async fn execute(&self, entity_id: EntityId) -> Result<PendingPortrait, SessionActionError> {
        let (entity, world_name) = self.store.read(|s| {
            (
                s.map_state
                    .as_ref()
                    .and_then(|m| m.entity(entity_id))
                    .cloned(),
                s.adventure_details
                    .as_ref()
                    .map(|d| d.world_name.clone())
                    .unwrap_or_default(),
            )
        });
        let entity = entity.ok_or(SessionActionError::EntityNotFound(entity_id))?;

        let request = ImageRequest {
            prompt: prompt_templates::portrait_prompt(&entity, &world_name),
            aspect_ratio: PORTRAIT_ASPECT_RATIO.to_string(),
        };
        let image = self.image_gen.generate(request).await?;

        self.store.dispatch(SessionEvent::PatchEntityImage {
            entity_id,
            image: Blob::new(image.mime_type, image.data_base64),
        });

        // The map may have been replaced while the image was generating.
        self.store
            .read(|s| {
                s.pending_portraits
                    .iter()
                    .find(|p| p.entity_id == entity_id)
                    .cloned()
            })
            .ok_or_else(|| {
                tracing::warn!(entity_id = %entity_id, "Portrait target left the map before the image arrived");
                SessionActionError::EntityNotFound(entity_id)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{ImageGenError, ImageResult, MockImageGenPort};
    use crate::test_fixtures::started_state;
    use questkeeper_domain::{EntityType, MapEntity, MapState};

    fn store_with_goblin() -> (Arc<SessionStore>, EntityId) {
        let goblin = EntityId::new();
        let mut state = started_state();
        state.map_state = Some(
            MapState::new(
                4,
                4,
                vec![MapEntity::new(goblin, EntityType::Enemy, 2, 1).with_name("Goblin Scout")],
            )
            .unwrap(),
        );
        (Arc::new(SessionStore::with_state(state)), goblin)
    }

    #[tokio::test]
    async fn test_portrait_patches_map_and_queues_image() {
        let (store, goblin) = store_with_goblin();
        let mut image_gen = MockImageGenPort::new();
        image_gen
            .expect_generate()
            .withf(|request| {
                request.prompt.contains("Goblin Scout")
                    && request.prompt.contains("Eldoria")
                    && request.aspect_ratio == "1:1"
            })
            .times(1)
            .returning(|_| {
                Ok(ImageResult {
                    data_base64: "iVBORw0K".to_string(),
                    mime_type: "image/png".to_string(),
                })
            });

        let portrait = GeneratePortrait::new(Arc::new(image_gen), store.clone())
            .execute(goblin)
            .await
            .unwrap();

        assert_eq!(portrait.label, "Goblin Scout");
        let state = store.snapshot();
        let map = state.map_state.unwrap();
        assert_eq!(
            map.entity(goblin).unwrap().image_base64.as_deref(),
            Some("iVBORw0K")
        );
        assert_eq!(state.pending_portraits.len(), 1);
        assert_eq!(state.pending_portraits[0].image.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_unknown_entity_skips_generation() {
        let (store, _) = store_with_goblin();
        let mut image_gen = MockImageGenPort::new();
        image_gen.expect_generate().never();
        let missing = EntityId::new();

        let result = GeneratePortrait::new(Arc::new(image_gen), store)
            .execute(missing)
            .await;

        assert_eq!(result, Err(SessionActionError::EntityNotFound(missing)));
    }

    #[tokio::test]
    async fn test_generation_failure_changes_nothing() {
        let (store, goblin) = store_with_goblin();
        let before = store.snapshot();
        let mut image_gen = MockImageGenPort::new();
        image_gen
            .expect_generate()
            .returning(|_| Err(ImageGenError::GenerationFailed("quota".into())));

        let result = GeneratePortrait::new(Arc::new(image_gen), store.clone())
            .execute(goblin)
            .await;

        assert!(matches!(result, Err(SessionActionError::ImageGen(_))));
        assert_eq!(store.snapshot(), before);
    }
}
