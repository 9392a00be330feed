use std::time::Duration;

use color_eyre::eyre::{ErrReport, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::hass::{
    EntityState, ServiceCall, States, DOMAIN_COVER, DOMAIN_NUMBER, SERVICE_CLOSE_COVER,
    SERVICE_OPEN_COVER, SERVICE_SET_COVER_POSITION, SERVICE_SET_VALUE, SERVICE_STOP_COVER,
    STATE_OFF, STATE_ON,
};

pub const SIM_DESK: &str = "cover.desk";
pub const SIM_HEIGHT_SENSOR: &str = "sensor.desk_height";
pub const SIM_HEIGHT_NUMBER: &str = "number.desk_height";
pub const SIM_MOVING_SENSOR: &str = "binary_sensor.desk_moving";
pub const SIM_CONNECTION_SENSOR: &str = "binary_sensor.desk_connection";

/// Behavior of the built-in desk simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub initial_height: f64,
    pub min_height: f64,
    pub max_height: f64,
    /// Movement speed in height units per second.
    pub speed: f64,
    pub tick_ms: u64,
    /// A nudge command keeps the desk moving for this long; the controller
    /// is expected to repeat the command while a button is held.
    pub nudge_ms: u64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            initial_height: 72.0,
            min_height: 58.42,
            max_height: 119.38,
            speed: 4.0,
            tick_ms: 100,
            nudge_ms: 400,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// In-process stand-in for a home automation core with one desk in it.
/// Consumes service calls, advances a little physics model, and publishes a
/// full state snapshot whenever something changed.
pub struct SimProcess {
    settings: SimSettings,
    height: f64,
    target: Option<f64>,
    nudge: Option<(Direction, Instant)>,
    moving: bool,
    state_tx: tokio::sync::mpsc::UnboundedSender<States>,
    call_rx: tokio::sync::mpsc::UnboundedReceiver<ServiceCall>,
    terminate_rx: tokio::sync::mpsc::UnboundedReceiver<()>,
}

type NewSimProcess = (
    tokio::sync::mpsc::UnboundedReceiver<States>,
    tokio::sync::mpsc::UnboundedSender<ServiceCall>,
    tokio::sync::mpsc::UnboundedSender<()>,
    SimProcess,
);

impl SimProcess {
    pub fn new(settings: SimSettings) -> Result<NewSimProcess> {
        let (state_tx, state_rx) = tokio::sync::mpsc::unbounded_channel();
        let (call_tx, call_rx) = tokio::sync::mpsc::unbounded_channel();
        let (terminate_tx, terminate_rx) = tokio::sync::mpsc::unbounded_channel();

        let height = settings
            .initial_height
            .clamp(settings.min_height, settings.max_height);
        Ok((
            state_rx,
            call_tx,
            terminate_tx,
            Self {
                settings,
                height,
                target: None,
                nudge: None,
                moving: false,
                state_tx,
                call_rx,
                terminate_rx,
            },
        ))
    }

    pub fn run(mut self) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(self.settings.tick_ms));
            self.publish()?;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.step() {
                            self.publish()?;
                        }
                    }
                    Some(call) = self.call_rx.recv() => {
                        if self.apply(&call) {
                            self.publish()?;
                        }
                    }
                    _ = self.terminate_rx.recv() => break,
                }
            }

            Ok::<(), ErrReport>(())
        });
    }

    fn apply(&mut self, call: &ServiceCall) -> bool {
        let entity = call.entity_id.as_str();
        match (call.domain.as_str(), call.service.as_str()) {
            (DOMAIN_COVER, _) if entity != SIM_DESK => {
                log::warn!("sim has no entity {}", call.entity_id);
                false
            }
            (DOMAIN_NUMBER, _) if entity != SIM_HEIGHT_NUMBER => {
                log::warn!("sim has no entity {}", call.entity_id);
                false
            }
            (DOMAIN_COVER, SERVICE_OPEN_COVER) => {
                self.target = None;
                self.nudge = Some((Direction::Up, Instant::now() + self.nudge_window()));
                true
            }
            (DOMAIN_COVER, SERVICE_CLOSE_COVER) => {
                self.target = None;
                self.nudge = Some((Direction::Down, Instant::now() + self.nudge_window()));
                true
            }
            (DOMAIN_COVER, SERVICE_STOP_COVER) => {
                self.target = None;
                self.nudge = None;
                true
            }
            (DOMAIN_COVER, SERVICE_SET_COVER_POSITION) => {
                match call.data.get("position").and_then(Value::as_f64) {
                    Some(position) => {
                        let travel = self.settings.max_height - self.settings.min_height;
                        self.nudge = None;
                        self.target =
                            Some(self.settings.min_height + travel * (position / 100.0).clamp(0.0, 1.0));
                        true
                    }
                    None => {
                        log::warn!("set_cover_position without a position: {call}");
                        false
                    }
                }
            }
            (DOMAIN_NUMBER, SERVICE_SET_VALUE) => {
                match call.data.get("value").and_then(Value::as_f64) {
                    Some(value) => {
                        self.nudge = None;
                        self.target =
                            Some(value.clamp(self.settings.min_height, self.settings.max_height));
                        true
                    }
                    None => {
                        log::warn!("set_value without a value: {call}");
                        false
                    }
                }
            }
            _ => {
                log::warn!("sim does not handle {call}");
                false
            }
        }
    }

    fn nudge_window(&self) -> Duration {
        Duration::from_millis(self.settings.nudge_ms)
    }

    /// Advance one tick of movement. Returns whether anything observable
    /// changed.
    fn step(&mut self) -> bool {
        let dt = self.settings.tick_ms as f64 / 1000.0;
        let stride = self.settings.speed * dt;
        let before_height = self.height;
        let before_moving = self.moving;

        if let Some(target) = self.target {
            if (target - self.height).abs() <= stride {
                self.height = target;
                self.target = None;
            } else if target > self.height {
                self.height += stride;
            } else {
                self.height -= stride;
            }
        } else if let Some((direction, until)) = self.nudge {
            if Instant::now() >= until {
                self.nudge = None;
            } else {
                match direction {
                    Direction::Up => self.height += stride,
                    Direction::Down => self.height -= stride,
                }
            }
        }

        self.height = self
            .height
            .clamp(self.settings.min_height, self.settings.max_height);
        self.moving = self.height != before_height;

        self.height != before_height || self.moving != before_moving
    }

    fn cover_state(&self) -> &'static str {
        if self.moving {
            return match (self.target, self.nudge) {
                (Some(target), _) if target < self.height => "closing",
                (Some(_), _) => "opening",
                (_, Some((Direction::Down, _))) => "closing",
                _ => "opening",
            };
        }
        if (self.height - self.settings.min_height).abs() < 0.005 {
            "closed"
        } else {
            "open"
        }
    }

    fn snapshot(&self) -> States {
        let mut states = States::new();
        states.set(SIM_DESK, EntityState::new(self.cover_state()));
        states.set(
            SIM_HEIGHT_SENSOR,
            EntityState::new(format!("{:.1}", self.height)),
        );
        states.set(
            SIM_HEIGHT_NUMBER,
            EntityState::new(format!("{:.1}", self.height)),
        );
        states.set(
            SIM_MOVING_SENSOR,
            EntityState::new(if self.moving { STATE_ON } else { STATE_OFF }),
        );
        states.set(SIM_CONNECTION_SENSOR, EntityState::new(STATE_ON));
        states
    }

    fn publish(&self) -> Result<()> {
        self.state_tx.send(self.snapshot())?;
        Ok(())
    }
}
