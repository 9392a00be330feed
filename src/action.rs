use crossterm::event::KeyEvent;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::card::CardConfig;
use crate::hass::{ServiceCall, States};

#[derive(Debug, Clone, PartialEq, Serialize, Display, Deserialize)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    Refresh,
    Error(String),
    Key(KeyEvent),
    /// Host pushed a fresh entity-state snapshot.
    StateChanged(States),
    /// A component wants the host to run a device command.
    CallService(ServiceCall),
    /// Editor emitted a full updated configuration document.
    ConfigChanged(CardConfig),
    /// Host accepted a document and pushes it into the display widget.
    SetCardConfig(CardConfig),
    HoldUp,
    HoldDown,
    ReleaseHold,
    ActivatePreset(usize),
    OpenEditor,
    CloseEditor,
    SystemMessage(String),
}
