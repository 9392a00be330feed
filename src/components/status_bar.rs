use color_eyre::eyre::Result;
use ratatui::{prelude::*, widgets::*};

use crate::action::Action;
use crate::components::{Component, Frame};
use crate::hass::EntityId;
use crate::localize::localize;
use crate::mode::Mode;

pub struct StatusBar {
    mode: Mode,
    desk: Option<EntityId>,
    message: Option<String>,
    is_loading: bool,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            mode: Mode::Dashboard,
            desk: None,
            message: None,
            is_loading: true,
        }
    }

    pub fn context(&self) -> String {
        match &self.desk {
            Some(desk) => format!("{} {}", localize("common.name"), desk),
            None => localize("common.name"),
        }
    }

    fn hints(&self) -> &'static str {
        match self.mode {
            Mode::Dashboard => "q quit | e edit | u/d hold | s release | 1-9 presets",
            Mode::Editor => "Esc back to the dashboard",
        }
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for StatusBar {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::StateChanged(_) => self.is_loading = false,
            Action::SetCardConfig(config) => self.desk = Some(config.desk),
            Action::SystemMessage(message) => self.message = Some(message),
            Action::OpenEditor => self.mode = Mode::Editor,
            Action::CloseEditor => self.mode = Mode::Dashboard,
            _ => {}
        };

        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let layout = Layout::new(
            Direction::Vertical,
            [
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ],
        )
        .split(area);
        f.render_widget(Clear, layout[1]);
        f.render_widget(Clear, layout[2]);

        let context = Span::styled(self.context(), Style::default().fg(Color::Gray).italic());
        let status_line = Paragraph::new(context).style(Style::default().bg(Color::Black));
        f.render_widget(status_line, layout[1]);

        let message_line = if self.is_loading {
            Paragraph::new("Loading...")
        } else {
            match self.message.clone() {
                Some(message) => Paragraph::new(message),
                None => Paragraph::new(self.hints()).style(Style::default().fg(Color::DarkGray)),
            }
        };
        f.render_widget(message_line, layout[2]);

        Ok(())
    }
}
