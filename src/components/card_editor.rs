use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{prelude::*, widgets::*};
use tui_textarea::{CursorMove, TextArea};

use super::{Component, Frame};
use crate::{
    action::Action,
    card::editor::{ConfigField, EditorDraft, PresetField},
    card::CardConfig,
    config::Config,
    hass::{EntityId, States, DOMAIN_BINARY_SENSOR, DOMAIN_COVER, DOMAIN_NUMBER, DOMAIN_SENSOR},
    localize::localize,
};

const LABEL_WIDTH: u16 = 28;

/// One selectable line of the editor form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditorRow {
    Field(ConfigField),
    Preset(usize, PresetField),
    RemovePreset(usize),
    AddPreset,
}

/// Form over the configuration document. Every accepted mutation leaves as
/// [`Action::ConfigChanged`] carrying the whole document; the editor never
/// patches the host's copy in place.
pub struct CardEditor {
    config: Config,
    draft: EditorDraft,
    states: Option<States>,
    selected: usize,
    scroll: usize,
    input: Option<(EditorRow, TextArea<'static>)>,
    visible: bool,
}

impl Default for CardEditor {
    fn default() -> Self {
        Self {
            config: Config::default(),
            draft: EditorDraft::new(CardConfig::default()),
            states: None,
            selected: 0,
            scroll: 0,
            input: None,
            visible: false,
        }
    }
}

fn field_label(field: ConfigField) -> String {
    match field {
        ConfigField::Name => localize("editor.name"),
        ConfigField::Desk => localize("editor.desk"),
        ConfigField::HeightSensor => localize("editor.height_sensor"),
        ConfigField::HeightNumberEntity => localize("editor.height_number_entity"),
        ConfigField::ConnectionSensor => localize("editor.connection_sensor"),
        ConfigField::MovingSensor => localize("editor.moving_sensor"),
        ConfigField::MinHeight => localize("editor.min_height"),
        ConfigField::MaxHeight => localize("editor.max_height"),
    }
}

fn entity_domain(field: ConfigField) -> Option<&'static str> {
    match field {
        ConfigField::Desk => Some(DOMAIN_COVER),
        ConfigField::HeightSensor => Some(DOMAIN_SENSOR),
        ConfigField::HeightNumberEntity => Some(DOMAIN_NUMBER),
        ConfigField::ConnectionSensor | ConfigField::MovingSensor => Some(DOMAIN_BINARY_SENSOR),
        _ => None,
    }
}

/// Required entity fields have no empty choice to cycle to.
fn entity_is_required(field: ConfigField) -> bool {
    matches!(field, ConfigField::Desk | ConfigField::HeightSensor)
}

impl CardEditor {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Vec<EditorRow> {
        let mut rows = vec![
            EditorRow::Field(ConfigField::Name),
            EditorRow::Field(ConfigField::Desk),
            EditorRow::Field(ConfigField::HeightSensor),
            EditorRow::Field(ConfigField::HeightNumberEntity),
            EditorRow::Field(ConfigField::ConnectionSensor),
            EditorRow::Field(ConfigField::MovingSensor),
            EditorRow::Field(ConfigField::MinHeight),
            EditorRow::Field(ConfigField::MaxHeight),
        ];
        for i in 0..self.draft.config().presets.len() {
            rows.push(EditorRow::Preset(i, PresetField::Label));
            rows.push(EditorRow::Preset(i, PresetField::Target));
            rows.push(EditorRow::RemovePreset(i));
        }
        rows.push(EditorRow::AddPreset);
        rows
    }

    fn row_label(&self, row: EditorRow) -> String {
        match row {
            EditorRow::Field(field) => field_label(field),
            EditorRow::Preset(i, PresetField::Label) => {
                format!("Preset {}: {}", i + 1, localize("editor.preset_label"))
            }
            EditorRow::Preset(i, PresetField::Target) => {
                format!("Preset {}: {}", i + 1, localize("editor.preset_target"))
            }
            EditorRow::RemovePreset(i) => {
                format!("Preset {}: {}", i + 1, localize("editor.remove_preset"))
            }
            EditorRow::AddPreset => localize("editor.add_preset"),
        }
    }

    fn entity_value(&self, field: ConfigField) -> Option<&EntityId> {
        let config = self.draft.config();
        match field {
            ConfigField::Desk => (!config.desk.is_empty()).then_some(&config.desk),
            ConfigField::HeightSensor => {
                (!config.height_sensor.is_empty()).then_some(&config.height_sensor)
            }
            ConfigField::HeightNumberEntity => config.height_number_entity.as_ref(),
            ConfigField::ConnectionSensor => config.connection_sensor.as_ref(),
            ConfigField::MovingSensor => config.moving_sensor.as_ref(),
            _ => None,
        }
    }

    fn row_value(&self, row: EditorRow) -> String {
        let config = self.draft.config();
        match row {
            EditorRow::Field(ConfigField::Name) => config.name.clone().unwrap_or_default(),
            EditorRow::Field(ConfigField::MinHeight) => format!("{}", config.min_height),
            EditorRow::Field(ConfigField::MaxHeight) => format!("{}", config.max_height),
            EditorRow::Field(field) => self
                .entity_value(field)
                .map(|id| id.to_string())
                .unwrap_or_else(|| localize("editor.none")),
            EditorRow::Preset(i, PresetField::Label) => config
                .presets
                .get(i)
                .map(|preset| preset.label.clone())
                .unwrap_or_default(),
            EditorRow::Preset(i, PresetField::Target) => config
                .presets
                .get(i)
                .map(|preset| format!("{}", preset.target))
                .unwrap_or_default(),
            EditorRow::RemovePreset(_) | EditorRow::AddPreset => String::new(),
        }
    }

    /// Raw value a text edit starts from; unlike [`Self::row_value`] this
    /// never substitutes placeholders.
    fn edit_seed(&self, row: EditorRow) -> String {
        match row {
            EditorRow::Field(field) if entity_domain(field).is_some() => self
                .entity_value(field)
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            _ => self.row_value(row),
        }
    }

    fn candidates(&self, field: ConfigField) -> Vec<Option<EntityId>> {
        let Some(domain) = entity_domain(field) else {
            return Vec::new();
        };
        let Some(states) = &self.states else {
            return Vec::new();
        };
        let mut candidates: Vec<Option<EntityId>> = Vec::new();
        if !entity_is_required(field) {
            candidates.push(None);
        }
        candidates.extend(states.ids_in_domain(domain).into_iter().map(Some));
        candidates
    }

    /// Step an entity field through its snapshot candidates.
    fn cycle(&mut self, field: ConfigField, delta: isize) -> Option<Action> {
        let candidates = self.candidates(field);
        if candidates.is_empty() {
            return None;
        }
        let current = self.entity_value(field).cloned();
        let next = match candidates
            .iter()
            .position(|candidate| candidate.as_ref() == current.as_ref())
        {
            Some(position) => {
                (position as isize + delta).rem_euclid(candidates.len() as isize) as usize
            }
            None if delta < 0 => candidates.len() - 1,
            None => 0,
        };
        let raw = candidates[next]
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        self.draft.set_field(field, &raw).map(Action::ConfigChanged)
    }

    fn start_edit(&mut self, row: EditorRow) {
        let mut textarea = TextArea::new(vec![self.edit_seed(row)]);
        textarea.move_cursor(CursorMove::End);
        self.input = Some((row, textarea));
    }

    fn commit_edit(&mut self) -> Option<Action> {
        let (row, textarea) = self.input.take()?;
        let raw = textarea.lines().first().cloned().unwrap_or_default();
        match row {
            EditorRow::Field(field) => self.draft.set_field(field, &raw),
            EditorRow::Preset(i, field) => self.draft.set_preset_field(i, field, &raw),
            _ => None,
        }
        .map(Action::ConfigChanged)
    }

    fn activate(&mut self, row: EditorRow) -> Option<Action> {
        match row {
            EditorRow::AddPreset => Some(Action::ConfigChanged(self.draft.add_preset())),
            EditorRow::RemovePreset(i) => {
                let action = self.draft.remove_preset(i).map(Action::ConfigChanged);
                self.clamp_selection();
                action
            }
            EditorRow::Field(_) | EditorRow::Preset(..) => {
                self.start_edit(row);
                None
            }
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.rows().len().saturating_sub(1));
    }

    fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn select_next(&mut self) {
        self.selected = (self.selected + 1).min(self.rows().len() - 1);
    }

    fn hint(&self) -> &'static str {
        if self.input.is_some() {
            "Enter save | Esc cancel"
        } else {
            "Up/Down select | Left/Right pick entity | Enter edit | Esc close"
        }
    }
}

impl Component for CardEditor {
    fn register_config_handler(&mut self, config: Config) -> Result<()> {
        self.config = config;
        Ok(())
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.visible || key.kind == KeyEventKind::Release {
            return Ok(None);
        }

        if self.input.is_some() {
            return Ok(match key.code {
                KeyCode::Enter => self.commit_edit(),
                KeyCode::Esc => {
                    self.input = None;
                    None
                }
                KeyCode::Tab | KeyCode::BackTab => None,
                _ => {
                    if let Some((_, textarea)) = &mut self.input {
                        textarea.input(key);
                    }
                    None
                }
            });
        }

        let row = self.rows()[self.selected.min(self.rows().len() - 1)];
        let action = match key.code {
            KeyCode::Esc => Some(Action::CloseEditor),
            KeyCode::Up | KeyCode::BackTab => {
                self.select_previous();
                None
            }
            KeyCode::Down | KeyCode::Tab => {
                self.select_next();
                None
            }
            KeyCode::Left => match row {
                EditorRow::Field(field) if entity_domain(field).is_some() => {
                    self.cycle(field, -1)
                }
                _ => None,
            },
            KeyCode::Right => match row {
                EditorRow::Field(field) if entity_domain(field).is_some() => self.cycle(field, 1),
                _ => None,
            },
            KeyCode::Enter => self.activate(row),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::StateChanged(states) => self.states = Some(states),
            Action::SetCardConfig(config) => {
                // Our own emissions echo back through the host; only a
                // genuinely different document resets the draft.
                if self.input.is_none() && self.draft.config() != &config {
                    self.draft = EditorDraft::new(config);
                    self.clamp_selection();
                }
            }
            Action::OpenEditor => {
                self.visible = true;
                self.selected = 0;
                self.scroll = 0;
                self.input = None;
            }
            Action::CloseEditor => {
                self.visible = false;
                self.input = None;
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if !self.visible {
            return Ok(());
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(localize("editor.title"));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let [list_area, hint_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);
        let window = usize::from(list_area.height);
        if window == 0 {
            return Ok(());
        }

        let rows = self.rows();
        self.selected = self.selected.min(rows.len() - 1);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        }
        if self.selected >= self.scroll + window {
            self.scroll = self.selected + 1 - window;
        }

        for (i, row) in rows.iter().enumerate().skip(self.scroll).take(window) {
            let y = list_area.y + (i - self.scroll) as u16;
            let label_area = Rect::new(list_area.x, y, LABEL_WIDTH.min(list_area.width), 1);
            let value_area = Rect::new(
                list_area.x + label_area.width,
                y,
                list_area.width.saturating_sub(label_area.width),
                1,
            );

            let selected = i == self.selected;
            let label_style = if selected {
                Style::default().reversed()
            } else {
                Style::default()
            };
            f.render_widget(
                Paragraph::new(self.row_label(*row)).style(label_style),
                label_area,
            );

            match &self.input {
                Some((_, textarea)) if selected => f.render_widget(textarea, value_area),
                _ => f.render_widget(
                    Paragraph::new(self.row_value(*row)).style(Style::default().fg(Color::Gray)),
                    value_area,
                ),
            }
        }

        f.render_widget(
            Paragraph::new(self.hint()).style(Style::default().fg(Color::DarkGray)),
            hint_area,
        );
        Ok(())
    }
}
