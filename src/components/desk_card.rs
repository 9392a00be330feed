use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{layout::Position, prelude::*, widgets::*};
use tokio::sync::mpsc::UnboundedSender;

use super::{Component, Frame};
use crate::{
    action::Action,
    card::{preset_call, CardConfig, DeskStatus, HoldSession, MoveDirection},
    config::Config,
    hass::States,
    localize::localize,
    text,
    widgets::{DeskFigure, HeightReadout},
};

/// The desk dashboard card. Shows the desk figure and height readout for
/// the configured entities and turns hold gestures and preset activations
/// into cover and number service calls.
pub struct DeskCard {
    config: Config,
    card_config: Option<CardConfig>,
    config_error: Option<String>,
    states: Option<States>,
    status: DeskStatus,
    session: HoldSession,
    visible: bool,
    up_area: Rect,
    down_area: Rect,
    preset_areas: Vec<Rect>,
}

impl Default for DeskCard {
    fn default() -> Self {
        Self {
            config: Config::default(),
            card_config: None,
            config_error: None,
            states: None,
            status: DeskStatus::default(),
            session: HoldSession::new(),
            visible: true,
            up_area: Rect::ZERO,
            down_area: Rect::ZERO,
            preset_areas: Vec::new(),
        }
    }
}

impl DeskCard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a configuration document. A document that fails validation is
    /// kept as an error message only; it never replaces the previous one.
    pub fn set_config(&mut self, card_config: CardConfig) {
        match card_config.validate() {
            Ok(()) => {
                self.card_config = Some(card_config);
                self.config_error = None;
                self.refresh();
            }
            Err(e) => {
                log::warn!("rejected card config: {e}");
                self.config_error = Some(e.to_string());
            }
        }
    }

    pub fn card_config(&self) -> Option<&CardConfig> {
        self.card_config.as_ref()
    }

    /// Movement and preset commands are suppressed unless the desk entity is
    /// present in the snapshot and reported reachable.
    fn command_config(&self) -> Option<&CardConfig> {
        let card_config = self.card_config.as_ref()?;
        let states = self.states.as_ref()?;
        if !states.contains_key(&card_config.desk) {
            return None;
        }
        if !self.status.connected {
            return None;
        }
        Some(card_config)
    }

    fn derive_status(&self) -> DeskStatus {
        match (&self.card_config, &self.states) {
            (Some(card_config), Some(states)) => {
                DeskStatus::derive(states, card_config, self.session.is_active())
            }
            _ => DeskStatus::default(),
        }
    }

    fn refresh(&mut self) {
        let status = self.derive_status();
        // A gesture cannot reach a desk that dropped off the network; kill
        // its timers without the (equally unreachable) stop command.
        if !status.connected && self.session.abort() {
            self.status = self.derive_status();
        } else {
            self.status = status;
        }
    }

    /// Snapshot churn on unrelated entities must not recompute the view.
    fn watched_changed(&self, new_states: &States) -> bool {
        match (&self.card_config, &self.states) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(card_config), Some(old)) => card_config
                .watched_entities()
                .iter()
                .any(|id| old.get(id) != new_states.get(id)),
        }
    }

    fn press(&mut self, direction: MoveDirection) {
        let Some(desk) = self.command_config().map(|c| c.desk.clone()) else {
            return;
        };
        if self.session.press(direction, &desk) {
            self.refresh();
        }
    }

    fn release(&mut self) {
        if self.session.stop() {
            self.refresh();
        }
    }

    fn activate_preset(&mut self, index: usize) -> Option<Action> {
        // A positional move under an ongoing hold gesture would fight it.
        if self.session.is_active() {
            return None;
        }
        let card_config = self.command_config()?;
        let preset = card_config.presets.get(index)?;
        preset_call(preset.target, card_config).map(Action::CallService)
    }

    fn clear_hit_areas(&mut self) {
        self.up_area = Rect::ZERO;
        self.down_area = Rect::ZERO;
        self.preset_areas.clear();
    }

    fn figure_style(&self) -> Style {
        if self.status.connected {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }

    fn knob_line(&self) -> Line<'static> {
        let style = if self.command_config().is_some() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Line::from(vec![
            Span::styled("[ ▲ u ]", style),
            Span::raw(" "),
            Span::styled("[ ▼ d ]", style),
        ])
    }

    fn preset_lines(&self, card_config: &CardConfig, width: u16) -> Vec<Line<'static>> {
        let mut lines = vec![Line::styled(
            localize("card.presets"),
            Style::default().fg(Color::Gray),
        )];
        for (i, preset) in card_config.presets.iter().enumerate().take(9) {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", i + 1), Style::default().fg(Color::Cyan)),
                Span::raw(text::truncate_to_width(
                    &preset.label,
                    usize::from(width).saturating_sub(12),
                )),
                Span::styled(
                    format!("  {}", text::format_height(preset.target, &localize("card.unit"))),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }
        lines
    }

    fn draw_notice(&mut self, f: &mut Frame<'_>, area: Rect, notice: Text<'_>) {
        self.clear_hit_areas();
        f.render_widget(
            Paragraph::new(notice)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

impl Component for DeskCard {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.session.register(tx);
        Ok(())
    }

    fn register_config_handler(&mut self, config: Config) -> Result<()> {
        self.config = config;
        Ok(())
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.visible {
            return Ok(None);
        }
        // Key releases only arrive on terminals with the enhanced keyboard
        // protocol; elsewhere the explicit release binding does the job.
        if key.kind == KeyEventKind::Release
            && matches!(
                key.code,
                KeyCode::Up | KeyCode::Down | KeyCode::Char('u') | KeyCode::Char('d')
            )
        {
            return Ok(Some(Action::ReleaseHold));
        }
        Ok(None)
    }

    fn handle_mouse_events(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if !self.visible {
            return Ok(None);
        }
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.up_area.contains(position) {
                    return Ok(Some(Action::HoldUp));
                }
                if self.down_area.contains(position) {
                    return Ok(Some(Action::HoldDown));
                }
                for (i, area) in self.preset_areas.iter().enumerate() {
                    if area.contains(position) {
                        return Ok(Some(Action::ActivatePreset(i)));
                    }
                }
                Ok(None)
            }
            MouseEventKind::Up(_) => Ok(Some(Action::ReleaseHold)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::SetCardConfig(card_config) => self.set_config(card_config),
            Action::StateChanged(states) => {
                let changed = self.watched_changed(&states);
                self.states = Some(states);
                if changed {
                    self.refresh();
                }
            }
            Action::HoldUp => self.press(MoveDirection::Up),
            Action::HoldDown => self.press(MoveDirection::Down),
            Action::ReleaseHold => self.release(),
            Action::ActivatePreset(index) => return Ok(self.activate_preset(index)),
            Action::OpenEditor => self.visible = false,
            Action::CloseEditor => self.visible = true,
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if !self.visible {
            return Ok(());
        }

        let mut block = Block::default().borders(Borders::ALL);
        if let Some(name) = self.card_config.as_ref().and_then(|c| c.name.as_deref()) {
            block = block.title(name.to_string());
        }
        let inner = block.inner(area);
        f.render_widget(block, area);

        if let Some(message) = self.config_error.clone() {
            self.draw_notice(
                f,
                inner,
                Text::styled(message, Style::default().fg(Color::Red)),
            );
            return Ok(());
        }
        let Some(card_config) = self.card_config.clone() else {
            self.draw_notice(f, inner, Text::raw(localize("card.not_configured")));
            return Ok(());
        };
        if self.states.is_none() {
            self.draw_notice(f, inner, Text::raw(localize("card.waiting_for_states")));
            return Ok(());
        }

        let [figure_area, control_area] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .areas(inner);
        f.render_widget(
            DeskFigure::new(self.status).style(self.figure_style()),
            figure_area,
        );

        let [readout_area, knob_area, presets_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(control_area);

        f.render_widget(HeightReadout::new(self.status), readout_area);

        let [up_area, _, down_area, _] = Layout::horizontal([
            Constraint::Length(7),
            Constraint::Length(1),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .areas(knob_area);
        self.up_area = up_area;
        self.down_area = down_area;
        f.render_widget(Paragraph::new(self.knob_line()), knob_area);

        let lines = self.preset_lines(&card_config, presets_area.width);
        self.preset_areas = (0..card_config.presets.len().min(9))
            .map(|i| {
                let y = presets_area.y + 1 + i as u16;
                if y < presets_area.bottom() {
                    Rect::new(presets_area.x, y, presets_area.width, 1)
                } else {
                    Rect::ZERO
                }
            })
            .collect();
        f.render_widget(Paragraph::new(lines), presets_area);

        Ok(())
    }
}
