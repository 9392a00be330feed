use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use desktui::action::Action;
use desktui::card::{CardConfig, Preset};
use desktui::components::{CardEditor, Component};
use desktui::hass::{EntityId, EntityState, States};

fn base_config() -> CardConfig {
    CardConfig {
        desk: EntityId::from("cover.desk"),
        height_sensor: EntityId::from("sensor.desk_height"),
        presets: vec![
            Preset {
                label: String::from("Sitting"),
                target: 70.0,
            },
            Preset {
                label: String::from("Standing"),
                target: 100.0,
            },
        ],
        ..CardConfig::default()
    }
}

fn open_editor(config: CardConfig) -> CardEditor {
    let mut editor = CardEditor::new();
    editor.update(Action::SetCardConfig(config)).unwrap();
    editor.update(Action::OpenEditor).unwrap();
    editor
}

fn press(editor: &mut CardEditor, code: KeyCode) -> Option<Action> {
    editor
        .handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
        .unwrap()
}

fn go_down(editor: &mut CardEditor, rows: usize) {
    for _ in 0..rows {
        press(editor, KeyCode::Down);
    }
}

fn type_text(editor: &mut CardEditor, content: &str) {
    for c in content.chars() {
        press(editor, KeyCode::Char(c));
    }
}

/// Edits start from the current value; wipe it before retyping.
fn clear_input(editor: &mut CardEditor) {
    for _ in 0..32 {
        press(editor, KeyCode::Backspace);
    }
}

fn rendered_rows(editor: &mut CardEditor, width: u16, height: u16) -> Vec<String> {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|f| {
            editor.draw(f, f.area()).unwrap();
        })
        .unwrap();

    let buffer = terminal.backend().buffer().clone();
    (0..buffer.area.height)
        .map(|y| {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect()
        })
        .collect()
}

fn on_screen(rows: &[String], needle: &str) -> bool {
    rows.iter().any(|row| row.contains(needle))
}

#[test]
fn test_open_editor_shows_the_current_document() {
    let mut editor = open_editor(base_config());

    let rows = rendered_rows(&mut editor, 80, 24);
    assert!(on_screen(&rows, "Card configuration"));
    assert!(on_screen(&rows, "Desk entity (required)"));
    assert!(on_screen(&rows, "cover.desk"));
    assert!(on_screen(&rows, "Sitting"));
    assert!(on_screen(&rows, "Add preset"));
    assert!(on_screen(&rows, "Up/Down select"));
}

#[test]
fn test_editing_one_preset_target_touches_nothing_else() {
    let before = base_config();
    let mut editor = open_editor(before.clone());

    // 8 scalar fields, then three rows per preset; the second preset's
    // target sits at row 12.
    go_down(&mut editor, 12);
    assert_eq!(press(&mut editor, KeyCode::Enter), None);
    clear_input(&mut editor);
    type_text(&mut editor, "105");
    let action = press(&mut editor, KeyCode::Enter);

    match action {
        Some(Action::ConfigChanged(config)) => {
            assert_eq!(config.presets[1].target, 105.0);
            assert_eq!(config.presets[1].label, "Standing");
            assert_eq!(config.presets[0], before.presets[0]);
            assert_eq!(config.desk, before.desk);
            assert_eq!(config.min_height, before.min_height);
        }
        other => panic!("expected ConfigChanged, got {other:?}"),
    }
}

#[test]
fn test_entity_fields_cycle_through_the_snapshot() {
    let mut editor = open_editor(base_config());
    let mut states = States::new();
    states.set("cover.blinds", EntityState::new("closed"));
    states.set("cover.desk", EntityState::new("open"));
    states.set("sensor.desk_height", EntityState::new("72.0"));
    editor.update(Action::StateChanged(states)).unwrap();

    // Down to the desk entity row, then step to the other cover.
    go_down(&mut editor, 1);
    let action = press(&mut editor, KeyCode::Right);
    match action {
        Some(Action::ConfigChanged(config)) => {
            assert_eq!(config.desk, EntityId::from("cover.blinds"));
        }
        other => panic!("expected ConfigChanged, got {other:?}"),
    }
}

#[test]
fn test_every_emission_is_a_whole_document() {
    let mut editor = open_editor(base_config());

    // Editing the name must carry the untouched presets along.
    assert_eq!(press(&mut editor, KeyCode::Enter), None);
    type_text(&mut editor, "Window desk");
    let action = press(&mut editor, KeyCode::Enter);

    match action {
        Some(Action::ConfigChanged(config)) => {
            assert_eq!(config.name.as_deref(), Some("Window desk"));
            assert_eq!(config.desk, EntityId::from("cover.desk"));
            assert_eq!(config.presets.len(), 2);
        }
        other => panic!("expected ConfigChanged, got {other:?}"),
    }
}

#[test]
fn test_add_preset_from_the_bottom_row() {
    let mut editor = open_editor(base_config());

    // The add row is the last one; two presets put it at row 14.
    go_down(&mut editor, 14);
    let action = press(&mut editor, KeyCode::Enter);
    match action {
        Some(Action::ConfigChanged(config)) => {
            assert_eq!(config.presets.len(), 3);
            assert_eq!(config.presets[2].label, "Preset 3");
        }
        other => panic!("expected ConfigChanged, got {other:?}"),
    }
}

#[test]
fn test_escape_closes_and_the_hidden_editor_renders_nothing() {
    let mut editor = open_editor(base_config());

    assert_eq!(press(&mut editor, KeyCode::Esc), Some(Action::CloseEditor));
    editor.update(Action::CloseEditor).unwrap();

    let rows = rendered_rows(&mut editor, 80, 24);
    assert!(rows.iter().all(|row| row.trim().is_empty()));
}

#[test]
fn test_echoed_documents_do_not_disturb_an_open_edit() {
    let config = base_config();
    let mut editor = open_editor(config.clone());

    // Start typing a name, then let the host echo the unchanged document
    // back, as it does after every configuration broadcast.
    assert_eq!(press(&mut editor, KeyCode::Enter), None);
    type_text(&mut editor, "Window desk");
    editor.update(Action::SetCardConfig(config)).unwrap();

    let action = press(&mut editor, KeyCode::Enter);
    match action {
        Some(Action::ConfigChanged(config)) => {
            assert_eq!(config.name.as_deref(), Some("Window desk"));
        }
        other => panic!("expected ConfigChanged, got {other:?}"),
    }
}
