//! The desk card domain: configuration document, derived status, the
//! hold-to-move session and preset dispatch. UI-free; the `components`
//! module renders on top of this.

pub mod config;
pub mod editor;
pub mod hold;
pub mod preset;
pub mod status;

use std::time::Duration;

pub use config::{CardConfig, Preset};
pub use editor::EditorDraft;
pub use hold::{HoldSession, MoveDirection};
pub use preset::preset_call;
pub use status::DeskStatus;

/// Factory travel range of the megadesk controller, in cm.
pub const DEFAULT_MIN_HEIGHT: f64 = 58.42;
pub const DEFAULT_MAX_HEIGHT: f64 = 119.38;

/// One movement command fires immediately on press; repetition starts after
/// the initial delay and then runs on the command interval until released.
pub const MOVEMENT_INITIAL_DELAY: Duration = Duration::from_millis(500);
pub const MOVEMENT_COMMAND_INTERVAL: Duration = Duration::from_millis(100);
