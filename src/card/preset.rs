use crate::card::config::CardConfig;
use crate::hass::ServiceCall;

/// Decide the single service call for a preset target, or `None` when the
/// preset must be dropped. Session/entity/connection guards are the
/// caller's job; this only looks at the target and the configuration.
pub fn preset_call(target: f64, config: &CardConfig) -> Option<ServiceCall> {
    if target > config.max_height || target < config.min_height {
        log::warn!(
            "preset target {target} outside configured range {}..{}, ignoring",
            config.min_height,
            config.max_height
        );
        return None;
    }

    // A directly settable number entity takes the exact target; no position
    // math applies.
    if let Some(number) = &config.height_number_entity {
        return Some(ServiceCall::set_number_value(number.clone(), target));
    }

    let position = ((target - config.min_height) / config.travel() * 100.0).round();
    // A malformed travel range yields a non-finite position; drop the preset
    // rather than sending garbage to the device.
    if !position.is_finite() {
        return None;
    }

    Some(ServiceCall::set_cover_position(
        config.desk.clone(),
        position as u8,
    ))
}
