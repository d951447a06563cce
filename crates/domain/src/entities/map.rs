//! Tile map of the player's surroundings.
//!
//! Coordinates are zero-indexed with (0, 0) at the top-left. The map is always
//! replaced wholesale; entities are never merged across snapshots.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{DomainError, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Player,
    Wall,
    Enemy,
    Object,
    Door,
}

impl FromStr for EntityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "player" => Ok(Self::Player),
            "wall" => Ok(Self::Wall),
            "enemy" => Ok(Self::Enemy),
            "object" => Ok(Self::Object),
            "door" => Ok(Self::Door),
            other => Err(DomainError::parse(format!("Unknown entity type: '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub x: u32,
    pub y: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl MapEntity {
    pub fn new(id: EntityId, entity_type: EntityType, x: u32, y: u32) -> Self {
        Self {
            id,
            entity_type,
            x,
            y,
            name: None,
            color: None,
            image_base64: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display label used when talking about the entity.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{:?}", self.entity_type).to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapState {
    pub width: u32,
    pub height: u32,
    pub entities: Vec<MapEntity>,
}

impl MapState {
    pub fn new(width: u32, height: u32, entities: Vec<MapEntity>) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::validation(format!(
                "Map dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            entities,
        })
    }

    pub fn entity(&self, id: EntityId) -> Option<&MapEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Copy of the map with a portrait attached to one entity.
    ///
    /// Returns `None` if the entity is no longer on the map.
    pub fn with_entity_image(&self, id: EntityId, image_base64: String) -> Option<Self> {
        let mut map = self.clone();
        let entity = map.entities.iter_mut().find(|e| e.id == id)?;
        entity.image_base64 = Some(image_base64);
        Some(map)
    }
}
