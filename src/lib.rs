//! # Desktui - Standing Desk TUI Dashboard
//!
//! A terminal dashboard for a height-adjustable standing desk, built with
//! Ratatui on top of a Home-Assistant-style entity registry.
//!
//! ## Architecture Overview
//!
//! The crate follows a component/action loop:
//!
//! - **State** (`hass`): Entity snapshots pushed by the host
//! - **Action** (`action`): Events that flow between host and components
//! - **Card logic** (`card`): Configuration, derived status, hold gestures
//! - **View** (`components`, `widgets`): UI rendering from derived status
//!
//! ## Example Usage
//!
//! ```rust
//! use desktui::card::{CardConfig, DeskStatus};
//! use desktui::hass::{EntityState, States};
//!
//! let mut states = States::new();
//! states.set("cover.desk", EntityState::new("open"));
//! states.set("sensor.desk_height", EntityState::new("83.5"));
//!
//! // Guess a configuration from the snapshot, then derive display values.
//! let config = CardConfig::stub(&states);
//! assert!(config.validate().is_ok());
//!
//! let status = DeskStatus::derive(&states, &config, false);
//! assert_eq!(status.height, 83.5);
//! ```
//!
//! ## Modules
//!
//! - [`hass`] - Entity ids, state snapshots, service calls, the simulation
//! - [`card`] - Card configuration and movement logic
//! - [`components`] - The dashboard card, its editor, and the status bar
//! - [`registry`] - Card metadata for hosts that list installable cards
//! - [`config`] - Configuration and keybinding management

#![allow(dead_code)]

pub mod action;
pub mod app;
pub mod card;
pub mod cli;
pub mod components;
pub mod config;
pub mod hass;
pub mod localize;
pub mod mode;
pub mod registry;
pub mod text;
pub mod tui;
pub mod utils;
pub mod widgets;

// Re-exports for convenience
pub use card::{CardConfig, DeskStatus};
pub use registry::{CardInfo, CardRegistry};

/// Result type used throughout the library
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
