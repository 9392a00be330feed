use std::fs;
use std::path::PathBuf;

use color_eyre::eyre::Result;
use crossterm::event::{KeyEvent, KeyEventKind};
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use crate::{
    action::Action,
    card::CardConfig,
    components::{CardEditor, Component, DeskCard, StatusBar},
    config::Config,
    hass::sim::SimProcess,
    mode::Mode,
    tui,
    utils::get_data_dir,
};

pub struct App {
    pub config: Config,
    pub tick_rate: f64,
    pub frame_rate: f64,
    pub components: Vec<Box<dyn Component>>,
    pub should_quit: bool,
    pub should_suspend: bool,
    pub mode: Mode,
    pub last_tick_key_events: Vec<KeyEvent>,
    /// The card configuration document as the host knows it. Components get
    /// a copy through `Action::SetCardConfig` and never mutate it in place.
    card_config: Option<CardConfig>,
}

impl App {
    pub fn new(tick_rate: f64, frame_rate: f64) -> Result<Self> {
        let card = DeskCard::new();
        let editor = CardEditor::new();
        let status_bar = StatusBar::new();
        let config = Config::new()?;
        let card_config = load_card_config().or_else(|| config.card.clone());
        let mode = Mode::Dashboard;
        Ok(Self {
            tick_rate,
            frame_rate,
            components: vec![Box::new(card), Box::new(editor), Box::new(status_bar)],
            should_quit: false,
            should_suspend: false,
            config,
            mode,
            last_tick_key_events: Vec::new(),
            card_config,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();

        let mut tui = tui::Tui::new()?
            .tick_rate(self.tick_rate)
            .frame_rate(self.frame_rate)
            .mouse(true);
        tui.enter()?;

        for component in self.components.iter_mut() {
            component.register_action_handler(action_tx.clone())?;
        }

        for component in self.components.iter_mut() {
            component.register_config_handler(self.config.clone())?;
        }

        let size = tui.size()?;
        for component in self.components.iter_mut() {
            component.init(Rect::new(0, 0, size.width, size.height))?;
        }

        let (mut state_rx, call_tx, terminate_tx, sim) = SimProcess::new(self.config.sim.clone())?;
        sim.run();

        if let Some(card_config) = self.card_config.clone() {
            action_tx.send(Action::SetCardConfig(card_config))?;
        }

        loop {
            if let Some(e) = tui.next().await {
                match e {
                    tui::Event::Quit => action_tx.send(Action::Quit)?,
                    tui::Event::Tick => action_tx.send(Action::Tick)?,
                    tui::Event::Render => action_tx.send(Action::Render)?,
                    tui::Event::Resize(x, y) => action_tx.send(Action::Resize(x, y))?,
                    // A terminal losing focus never reports the key release,
                    // so treat it as one.
                    tui::Event::FocusLost => action_tx.send(Action::ReleaseHold)?,
                    tui::Event::Key(key) => {
                        action_tx.send(Action::Key(key))?;

                        if let Some(keymap) = self.config.keybindings.get(&self.mode) {
                            if let Some(action) = keymap.get(&vec![key]) {
                                log::info!("Got action: {action:?}");
                                action_tx.send(action.clone())?;
                            } else if key.kind == KeyEventKind::Press {
                                // If the key was not handled as a single key action,
                                // then consider it for multi-key combinations.
                                self.last_tick_key_events.push(key);

                                // Check for multi-key combinations
                                if let Some(action) = keymap.get(&self.last_tick_key_events) {
                                    log::info!("Got action: {action:?}");
                                    action_tx.send(action.clone())?;
                                }
                            }
                        };
                    }
                    _ => {}
                }
                for component in self.components.iter_mut() {
                    if let Some(action) = component.handle_events(Some(e.clone()))? {
                        action_tx.send(action)?;
                    }
                }
            }

            while let Ok(states) = state_rx.try_recv() {
                if self.card_config.is_none() {
                    let stub = CardConfig::stub(&states);
                    if stub.validate().is_ok() {
                        log::info!("Adopting a guessed card configuration: {stub:?}");
                        self.card_config = Some(stub.clone());
                        action_tx.send(Action::SetCardConfig(stub))?;
                    }
                }
                action_tx.send(Action::StateChanged(states))?;
            }

            while let Ok(action) = action_rx.try_recv() {
                if action != Action::Tick && action != Action::Render {
                    log::debug!("{action:?}");
                }
                match action {
                    Action::Tick => {
                        self.last_tick_key_events.drain(..);
                    }
                    Action::Quit => self.should_quit = true,
                    Action::Suspend => self.should_suspend = true,
                    Action::Resume => self.should_suspend = false,
                    Action::OpenEditor => self.mode = Mode::Editor,
                    Action::CloseEditor => self.mode = Mode::Dashboard,
                    Action::Resize(w, h) => {
                        tui.resize(Rect::new(0, 0, w, h))?;
                        tui.draw(|f| {
                            for component in self.components.iter_mut() {
                                let r = component.draw(f, f.area());
                                if let Err(e) = r {
                                    action_tx
                                        .send(Action::Error(format!("Failed to draw: {:?}", e)))
                                        .unwrap();
                                }
                            }
                        })?;
                    }
                    Action::Render => {
                        tui.draw(|f| {
                            for component in self.components.iter_mut() {
                                let r = component.draw(f, f.area());
                                if let Err(e) = r {
                                    action_tx
                                        .send(Action::Error(format!("Failed to draw: {:?}", e)))
                                        .unwrap();
                                }
                            }
                        })?;
                    }
                    Action::CallService(ref call) => {
                        log::info!("Calling service: {call}");
                        call_tx.send(call.clone())?;
                    }
                    Action::ConfigChanged(ref card_config) => {
                        self.card_config = Some(card_config.clone());
                        match save_card_config(card_config) {
                            Ok(path) => {
                                action_tx.send(Action::SystemMessage(format!(
                                    "[Saved] {}",
                                    path.display()
                                )))?;
                            }
                            Err(e) => {
                                log::error!("Failed to save the card configuration: {e:?}");
                                action_tx
                                    .send(Action::SystemMessage(format!("Failed to save: {e}")))?;
                            }
                        }
                        action_tx.send(Action::SetCardConfig(card_config.clone()))?;
                    }
                    _ => {}
                }
                for component in self.components.iter_mut() {
                    if let Some(action) = component.update(action.clone())? {
                        action_tx.send(action)?
                    };
                }
            }
            if self.should_suspend {
                tui.suspend()?;
                action_tx.send(Action::Resume)?;
                tui = tui::Tui::new()?
                    .tick_rate(self.tick_rate)
                    .frame_rate(self.frame_rate)
                    .mouse(true);
                tui.enter()?;
            } else if self.should_quit {
                terminate_tx.send(())?;
                tui.stop()?;
                break;
            }
        }
        tui.exit()?;
        Ok(())
    }
}

fn card_config_path() -> PathBuf {
    get_data_dir().join("card.json")
}

/// The persisted document wins over the `card` section of the config file,
/// which acts as a seed for fresh installs.
fn load_card_config() -> Option<CardConfig> {
    let path = card_config_path();
    let raw = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {e:?}", path.display());
            None
        }
    }
}

fn save_card_config(config: &CardConfig) -> Result<PathBuf> {
    let path = card_config_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(path)
}
