use crate::card::config::{CardConfig, Preset};
use crate::hass::EntityId;

/// Editable height values are kept inside a sane physical range regardless
/// of what gets typed.
pub const HEIGHT_INPUT_MIN: f64 = 30.0;
pub const HEIGHT_INPUT_MAX: f64 = 200.0;

pub const PRESET_DEFAULT_TARGET: f64 = 70.0;

/// Scalar fields of the configuration document the editor can address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigField {
    Name,
    Desk,
    HeightSensor,
    HeightNumberEntity,
    ConnectionSensor,
    MovingSensor,
    MinHeight,
    MaxHeight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresetField {
    Label,
    Target,
}

/// Declared input type of a form field; raw input is coerced accordingly
/// before it touches the draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
    Integer,
}

impl ConfigField {
    pub fn field_type(self) -> FieldType {
        match self {
            Self::MinHeight | Self::MaxHeight => FieldType::Number,
            _ => FieldType::Text,
        }
    }
}

/// Lenient numeric coercion: unparseable or non-finite input becomes 0.
pub fn coerce_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Integer coercion truncates fractional input and falls back to 0.
pub fn coerce_integer(raw: &str) -> i64 {
    coerce_number(raw) as i64
}

fn clamp_height_input(value: f64) -> f64 {
    value.clamp(HEIGHT_INPUT_MIN, HEIGHT_INPUT_MAX)
}

fn coerce_entity(raw: &str) -> Option<EntityId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(EntityId::from(trimmed))
    }
}

/// The editor's working copy of the configuration document.
///
/// Every mutation that actually changes something returns the full updated
/// document for the host's configuration-changed channel; mutations that
/// would be no-ops return `None` and emit nothing. The draft never
/// cross-validates `min_height < max_height`; that stays with the display
/// widget's configuration-set path.
#[derive(Clone, Debug)]
pub struct EditorDraft {
    config: CardConfig,
}

impl EditorDraft {
    pub fn new(config: CardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Replace one scalar field from raw form input.
    pub fn set_field(&mut self, field: ConfigField, raw: &str) -> Option<CardConfig> {
        let changed = match field {
            ConfigField::Name => {
                let value = match raw.trim() {
                    "" => None,
                    name => Some(name.to_string()),
                };
                replace(&mut self.config.name, value)
            }
            ConfigField::Desk => {
                let value = coerce_entity(raw).unwrap_or_default();
                replace(&mut self.config.desk, value)
            }
            ConfigField::HeightSensor => {
                let value = coerce_entity(raw).unwrap_or_default();
                replace(&mut self.config.height_sensor, value)
            }
            ConfigField::HeightNumberEntity => {
                replace(&mut self.config.height_number_entity, coerce_entity(raw))
            }
            ConfigField::ConnectionSensor => {
                replace(&mut self.config.connection_sensor, coerce_entity(raw))
            }
            ConfigField::MovingSensor => {
                replace(&mut self.config.moving_sensor, coerce_entity(raw))
            }
            ConfigField::MinHeight => {
                let value = clamp_height_input(coerce_number(raw));
                replace(&mut self.config.min_height, value)
            }
            ConfigField::MaxHeight => {
                let value = clamp_height_input(coerce_number(raw));
                replace(&mut self.config.max_height, value)
            }
        };
        changed.then(|| self.config.clone())
    }

    /// Append a preset with a generated label and the default target.
    pub fn add_preset(&mut self) -> CardConfig {
        let label = format!("Preset {}", self.config.presets.len() + 1);
        self.config.presets.push(Preset {
            label,
            target: PRESET_DEFAULT_TARGET,
        });
        self.config.clone()
    }

    /// Delete the preset at `index`; out-of-range indices are ignored.
    pub fn remove_preset(&mut self, index: usize) -> Option<CardConfig> {
        if index >= self.config.presets.len() {
            return None;
        }
        self.config.presets.remove(index);
        Some(self.config.clone())
    }

    /// Replace one key of the preset at `index`.
    pub fn set_preset_field(
        &mut self,
        index: usize,
        field: PresetField,
        raw: &str,
    ) -> Option<CardConfig> {
        let preset = self.config.presets.get_mut(index)?;
        let changed = match field {
            PresetField::Label => replace(&mut preset.label, raw.to_string()),
            PresetField::Target => {
                let value = clamp_height_input(coerce_number(raw));
                replace(&mut preset.target, value)
            }
        };
        changed.then(|| self.config.clone())
    }
}

/// Write `value` into `slot`, reporting whether anything changed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
