use crate::card::config::CardConfig;
use crate::hass::{EntityState, States, STATE_UNAVAILABLE, STATE_UNKNOWN};

/// Presentation values derived fresh from each snapshot. Nothing in here is
/// retained beyond the render that consumed it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeskStatus {
    /// Absolute height reading, 0.0 when the sensor has no usable value.
    pub height: f64,
    pub moving: bool,
    pub connected: bool,
    /// Position fraction within the configured travel range, always in [0, 1].
    pub alpha: f64,
}

impl DeskStatus {
    /// `hold_active` is the movement session's activity flag; it stands in
    /// for the moving sensor when none is configured.
    pub fn derive(states: &States, config: &CardConfig, hold_active: bool) -> Self {
        let height = states
            .get(&config.height_sensor)
            .map(|entity| parse_height(&entity.state))
            .unwrap_or(0.0);

        let moving = match &config.moving_sensor {
            Some(sensor) => states.get(sensor).map(EntityState::is_on).unwrap_or(false),
            None => hold_active,
        };

        let connected = match &config.connection_sensor {
            Some(sensor) => states.get(sensor).map(EntityState::is_on).unwrap_or(false),
            None => true,
        };

        Self {
            height,
            moving,
            connected,
            alpha: alpha(height, config.min_height, config.max_height),
        }
    }

    /// Offset for placing a layer of the desk figure: the drawable extent
    /// scaled by how far the desk is from its top position.
    pub fn visual_offset(&self, max_extent: u16) -> u16 {
        (f64::from(max_extent) * (1.0 - self.alpha)).round() as u16
    }
}

/// Raw reading -> height. Sentinel states and parse failures normalize to
/// 0.0; they are expected while an entity is still loading, never an error.
fn parse_height(state: &str) -> f64 {
    if state == STATE_UNAVAILABLE || state == STATE_UNKNOWN {
        return 0.0;
    }
    state.trim().parse().unwrap_or(0.0)
}

/// Clamped position fraction; out-of-range readings saturate instead of
/// being rejected.
fn alpha(height: f64, min_height: f64, max_height: f64) -> f64 {
    ((height - min_height) / (max_height - min_height)).clamp(0.0, 1.0)
}
