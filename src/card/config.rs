use color_eyre::eyre::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::card::{DEFAULT_MAX_HEIGHT, DEFAULT_MIN_HEIGHT};
use crate::hass::{States, DOMAIN_BINARY_SENSOR, DOMAIN_COVER, DOMAIN_SENSOR};
use crate::hass::EntityId;
use crate::localize::localize;

/// A named target height reachable with one action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub label: String,
    pub target: f64,
}

/// The card configuration document. Owned and persisted by the host; the
/// widgets only read it whole and (from the editor) emit it whole.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub desk: EntityId,
    #[serde(default)]
    pub height_sensor: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_number_entity: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving_sensor: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_sensor: Option<EntityId>,
    #[serde(default = "default_min_height")]
    pub min_height: f64,
    #[serde(default = "default_max_height")]
    pub max_height: f64,
    #[serde(default)]
    pub presets: Vec<Preset>,
}

fn default_min_height() -> f64 {
    DEFAULT_MIN_HEIGHT
}

fn default_max_height() -> f64 {
    DEFAULT_MAX_HEIGHT
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            name: None,
            desk: EntityId::default(),
            height_sensor: EntityId::default(),
            height_number_entity: None,
            moving_sensor: None,
            connection_sensor: None,
            min_height: DEFAULT_MIN_HEIGHT,
            max_height: DEFAULT_MAX_HEIGHT,
            presets: Vec::new(),
        }
    }
}

impl CardConfig {
    /// Every configuration-set path goes through here; a document that fails
    /// must not replace a previously accepted one.
    pub fn validate(&self) -> Result<()> {
        if self.desk.is_empty() || self.height_sensor.is_empty() {
            bail!("{}", localize("common.desk_and_height_required"));
        }
        if self.min_height >= self.max_height {
            bail!("{}", localize("common.invalid_height_range"));
        }
        Ok(())
    }

    /// Travel range in height units.
    pub fn travel(&self) -> f64 {
        self.max_height - self.min_height
    }

    /// The configured entities whose state changes warrant a re-render.
    pub fn watched_entities(&self) -> Vec<&EntityId> {
        let mut watched = vec![&self.desk, &self.height_sensor];
        watched.extend(self.moving_sensor.as_ref());
        watched.extend(self.connection_sensor.as_ref());
        watched
    }

    /// Guess a configuration from a state snapshot, for hosts that add the
    /// card before any document exists. The guess still has to pass
    /// [`CardConfig::validate`] before it is adopted.
    pub fn stub(states: &States) -> Self {
        let desk = states
            .ids_in_domain(DOMAIN_COVER)
            .into_iter()
            .find(|id| id.object_id().contains("desk"))
            .unwrap_or_default();
        let height_sensor = states
            .ids_in_domain(DOMAIN_SENSOR)
            .into_iter()
            .find(|id| id.object_id().contains("height") || id.object_id().contains("desk"))
            .unwrap_or_default();
        let moving_sensor = states
            .ids_in_domain(DOMAIN_BINARY_SENSOR)
            .into_iter()
            .find(|id| id.object_id().contains("moving"));

        Self {
            desk,
            height_sensor,
            moving_sensor,
            ..Self::default()
        }
    }
}
