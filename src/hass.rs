//! Host-side types: the entity/state registry pushed into components and the
//! service calls flowing back out. The wire transport behind these types is
//! not ours; `sim` provides an in-process stand-in for development.

pub mod sim;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use derive_deref::{Deref, DerefMut};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DOMAIN_COVER: &str = "cover";
pub const DOMAIN_SENSOR: &str = "sensor";
pub const DOMAIN_BINARY_SENSOR: &str = "binary_sensor";
pub const DOMAIN_NUMBER: &str = "number";

pub const SERVICE_OPEN_COVER: &str = "open_cover";
pub const SERVICE_CLOSE_COVER: &str = "close_cover";
pub const SERVICE_STOP_COVER: &str = "stop_cover";
pub const SERVICE_SET_COVER_POSITION: &str = "set_cover_position";
pub const SERVICE_SET_VALUE: &str = "set_value";

/// Sentinel states reported by entities without a usable reading.
pub const STATE_UNAVAILABLE: &str = "unavailable";
pub const STATE_UNKNOWN: &str = "unknown";
pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";

/// Entity identifier of the form `<domain>.<object_id>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Text before the first `.`; empty when the id is malformed.
    pub fn domain(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }

    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map(|(_, o)| o).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Current record for one entity. Only `state` matters to the card logic;
/// attributes ride along for display purposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub state: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    pub last_changed: DateTime<Utc>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Map::new(),
            last_changed: Utc::now(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.state == STATE_ON
    }
}

/// One whole registry snapshot. The host pushes a fresh snapshot on every
/// update tick; components keep the previously applied one for diffing.
#[derive(Clone, Debug, Default, PartialEq, Deref, DerefMut, Serialize, Deserialize)]
pub struct States(HashMap<EntityId, EntityState>);

impl States {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: impl Into<EntityId>, state: EntityState) {
        self.0.insert(id.into(), state);
    }

    /// Entity ids with the given domain prefix, sorted for stable listings.
    pub fn ids_in_domain(&self, domain: &str) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .0
            .keys()
            .filter(|id| id.domain() == domain)
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

/// A `call(domain, service, {entity_id, ...})` record, fire-and-forget from
/// the caller's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl ServiceCall {
    fn cover(service: &str, entity_id: EntityId) -> Self {
        Self {
            domain: DOMAIN_COVER.into(),
            service: service.into(),
            entity_id,
            data: Map::new(),
        }
    }

    pub fn open_cover(entity_id: EntityId) -> Self {
        Self::cover(SERVICE_OPEN_COVER, entity_id)
    }

    pub fn close_cover(entity_id: EntityId) -> Self {
        Self::cover(SERVICE_CLOSE_COVER, entity_id)
    }

    pub fn stop_cover(entity_id: EntityId) -> Self {
        Self::cover(SERVICE_STOP_COVER, entity_id)
    }

    pub fn set_cover_position(entity_id: EntityId, position: u8) -> Self {
        let mut call = Self::cover(SERVICE_SET_COVER_POSITION, entity_id);
        call.data.insert("position".into(), position.into());
        call
    }

    pub fn set_number_value(entity_id: EntityId, value: f64) -> Self {
        let mut data = Map::new();
        data.insert("value".into(), value.into());
        Self {
            domain: DOMAIN_NUMBER.into(),
            service: SERVICE_SET_VALUE.into(),
            entity_id,
            data,
        }
    }
}

impl fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}", self.domain, self.service, self.entity_id)?;
        if !self.data.is_empty() {
            write!(f, " {}", Value::Object(self.data.clone()))?;
        }
        Ok(())
    }
}
