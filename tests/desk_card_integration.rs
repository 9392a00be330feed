use color_eyre::eyre::Result;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::{advance, Duration};

use desktui::action::Action;
use desktui::card::{CardConfig, Preset};
use desktui::components::{Component, DeskCard};
use desktui::hass::{EntityId, EntityState, ServiceCall, States};

fn card_config() -> CardConfig {
    CardConfig {
        name: Some(String::from("Office desk")),
        desk: EntityId::from("cover.desk"),
        height_sensor: EntityId::from("sensor.desk_height"),
        connection_sensor: Some(EntityId::from("binary_sensor.desk_connection")),
        presets: vec![Preset {
            label: String::from("Standing"),
            target: 90.0,
        }],
        ..CardConfig::default()
    }
}

fn snapshot(height: &str, connection: &str) -> States {
    let mut states = States::new();
    states.set("cover.desk", EntityState::new("open"));
    states.set("sensor.desk_height", EntityState::new(height));
    states.set("binary_sensor.desk_connection", EntityState::new(connection));
    states
}

fn wired_card() -> (DeskCard, UnboundedReceiver<Action>) {
    let (tx, rx) = unbounded_channel();
    let mut card = DeskCard::new();
    card.register_action_handler(tx).unwrap();
    card.set_config(card_config());
    (card, rx)
}

fn sent_calls(rx: &mut UnboundedReceiver<Action>) -> Vec<ServiceCall> {
    let mut calls = Vec::new();
    while let Ok(action) = rx.try_recv() {
        if let Action::CallService(call) = action {
            calls.push(call);
        }
    }
    calls
}

/// Move virtual time and let the armed timer tasks observe it.
async fn step(ms: u64) {
    advance(Duration::from_millis(ms)).await;
    tokio::task::yield_now().await;
}

fn rendered_rows(card: &mut DeskCard, width: u16, height: u16) -> Vec<String> {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|f| {
            card.draw(f, f.area()).unwrap();
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

/// Column and row of the first cell where `needle` starts, if it is on
/// screen.
fn find_on_screen(rows: &[String], needle: &str) -> Option<(u16, u16)> {
    rows.iter().enumerate().find_map(|(y, row)| {
        row.find(needle)
            .map(|idx| (row[..idx].chars().count() as u16, y as u16))
    })
}

#[test]
fn test_dashboard_renders_height_knob_and_presets() -> Result<()> {
    let (mut card, _rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))?;

    let rows = rendered_rows(&mut card, 80, 24);
    assert!(find_on_screen(&rows, "Office desk").is_some());
    assert!(find_on_screen(&rows, "88.9 cm").is_some());
    assert!(find_on_screen(&rows, "[ ▲ u ]").is_some());
    assert!(find_on_screen(&rows, "Presets").is_some());
    assert!(find_on_screen(&rows, "Standing").is_some());
    assert!(find_on_screen(&rows, "90.0 cm").is_some());
    Ok(())
}

#[test]
fn test_unconfigured_card_asks_for_configuration() {
    let mut card = DeskCard::new();
    let rows = rendered_rows(&mut card, 80, 24);
    assert!(find_on_screen(&rows, "Card is not configured").is_some());
}

#[test]
fn test_configured_card_without_a_snapshot_shows_the_waiting_notice() {
    let (mut card, _rx) = wired_card();
    let rows = rendered_rows(&mut card, 80, 24);
    assert!(find_on_screen(&rows, "Waiting for the first state snapshot").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_quick_tap_sends_one_move_and_one_stop() {
    let (mut card, mut rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    card.update(Action::HoldUp).unwrap();
    tokio::task::yield_now().await;
    step(300).await;
    card.update(Action::ReleaseHold).unwrap();
    step(5_000).await;

    assert_eq!(
        sent_calls(&mut rx),
        vec![
            ServiceCall::open_cover(EntityId::from("cover.desk")),
            ServiceCall::stop_cover(EntityId::from("cover.desk")),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_sustained_hold_repeats_until_released() {
    let (mut card, mut rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    card.update(Action::HoldUp).unwrap();
    tokio::task::yield_now().await;
    // Repeats start after the 500ms delay and then land every 100ms.
    step(500).await;
    step(100).await;
    step(100).await;
    step(100).await;
    card.update(Action::ReleaseHold).unwrap();
    step(5_000).await;

    let calls = sent_calls(&mut rx);
    assert_eq!(calls.len(), 5);
    assert!(calls[..4]
        .iter()
        .all(|call| *call == ServiceCall::open_cover(EntityId::from("cover.desk"))));
    assert_eq!(
        calls[4],
        ServiceCall::stop_cover(EntityId::from("cover.desk"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_mid_hold_cuts_the_command_stream() {
    let (mut card, mut rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    card.update(Action::HoldUp).unwrap();
    tokio::task::yield_now().await;
    step(650).await;
    assert!(!sent_calls(&mut rx).is_empty());

    // The desk drops off the network while the button is still held. No
    // stop command can reach it, so none is sent either.
    card.update(Action::StateChanged(snapshot("88.9", "off")))
        .unwrap();
    step(10_000).await;
    assert_eq!(sent_calls(&mut rx), vec![]);

    // Releasing afterwards stays silent too.
    card.update(Action::ReleaseHold).unwrap();
    step(1_000).await;
    assert_eq!(sent_calls(&mut rx), vec![]);
}

#[test]
fn test_preset_activation_maps_the_target_onto_the_cover_position() {
    let (mut card, _rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    // 90cm inside the 58.42..119.38 default travel is 52% open.
    let action = card.update(Action::ActivatePreset(0)).unwrap();
    assert_eq!(
        action,
        Some(Action::CallService(ServiceCall::set_cover_position(
            EntityId::from("cover.desk"),
            52,
        )))
    );
}

#[tokio::test(start_paused = true)]
async fn test_release_key_event_translates_into_a_stop() {
    let (mut card, mut rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    card.update(Action::HoldUp).unwrap();
    tokio::task::yield_now().await;

    // Terminals with the enhanced keyboard protocol report the release of
    // the hold key; the card maps it back onto the release action.
    let release = KeyEvent {
        code: KeyCode::Char('u'),
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Release,
        state: KeyEventState::NONE,
    };
    let action = card.handle_key_events(release).unwrap();
    assert_eq!(action, Some(Action::ReleaseHold));
    card.update(Action::ReleaseHold).unwrap();

    let calls = sent_calls(&mut rx);
    assert_eq!(calls.last().unwrap().service, "stop_cover");
}

#[tokio::test(start_paused = true)]
async fn test_clicking_the_knob_holds_and_releases() {
    let (mut card, mut rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    // Drawing computes the hit areas; aim the click at the up knob as it
    // actually appeared on screen.
    let rows = rendered_rows(&mut card, 80, 24);
    let (column, row) = find_on_screen(&rows, "[ ▲ u ]").unwrap();

    let press = MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: column + 2,
        row,
        modifiers: KeyModifiers::NONE,
    };
    assert_eq!(card.handle_mouse_events(press).unwrap(), Some(Action::HoldUp));
    card.update(Action::HoldUp).unwrap();
    tokio::task::yield_now().await;

    let release = MouseEvent {
        kind: MouseEventKind::Up(MouseButton::Left),
        column: column + 2,
        row,
        modifiers: KeyModifiers::NONE,
    };
    assert_eq!(
        card.handle_mouse_events(release).unwrap(),
        Some(Action::ReleaseHold)
    );
    card.update(Action::ReleaseHold).unwrap();

    assert_eq!(
        sent_calls(&mut rx),
        vec![
            ServiceCall::open_cover(EntityId::from("cover.desk")),
            ServiceCall::stop_cover(EntityId::from("cover.desk")),
        ]
    );
}

#[test]
fn test_rejected_document_keeps_the_previous_view_and_shows_the_error() {
    let (mut card, _rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    // An inverted height range is invalid; the card keeps showing the
    // last good document alongside the error text.
    let mut broken = card_config();
    broken.min_height = 150.0;
    card.update(Action::SetCardConfig(broken)).unwrap();

    assert_eq!(card.card_config(), Some(&card_config()));
    let rows = rendered_rows(&mut card, 80, 24);
    assert!(find_on_screen(&rows, "min_height must be lower than max_height").is_some());
}

#[test]
fn test_editor_visibility_actions_toggle_the_card() {
    let (mut card, _rx) = wired_card();
    card.update(Action::StateChanged(snapshot("88.9", "on")))
        .unwrap();

    card.update(Action::OpenEditor).unwrap();
    let rows = rendered_rows(&mut card, 80, 24);
    assert!(rows.iter().all(|row| row.trim().is_empty()));

    card.update(Action::CloseEditor).unwrap();
    let rows = rendered_rows(&mut card, 80, 24);
    assert!(find_on_screen(&rows, "88.9 cm").is_some());
}
