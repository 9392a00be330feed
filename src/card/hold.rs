use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::action::Action;
use crate::card::{MOVEMENT_COMMAND_INTERVAL, MOVEMENT_INITIAL_DELAY};
use crate::hass::{EntityId, ServiceCall};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    fn call(self, desk: &EntityId) -> ServiceCall {
        match self {
            Self::Up => ServiceCall::open_cover(desk.clone()),
            Self::Down => ServiceCall::close_cover(desk.clone()),
        }
    }
}

/// One hold gesture worth of movement commands.
///
/// A valid press emits one immediate command and arms a timer task that,
/// after [`MOVEMENT_INITIAL_DELAY`], repeats the command every
/// [`MOVEMENT_COMMAND_INTERVAL`] until released. At most one gesture can be
/// active per session; the timer task is tied to a cancellation token whose
/// drop-guard lives in the session, so dropping the session can never leak
/// a running timer.
pub struct HoldSession {
    tx: Option<UnboundedSender<Action>>,
    active: Option<ActiveHold>,
    initial_delay: Duration,
    repeat_interval: Duration,
}

struct ActiveHold {
    desk: EntityId,
    _guard: DropGuard,
}

impl Default for HoldSession {
    fn default() -> Self {
        Self {
            tx: None,
            active: None,
            initial_delay: MOVEMENT_INITIAL_DELAY,
            repeat_interval: MOVEMENT_COMMAND_INTERVAL,
        }
    }
}

impl HoldSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands leave the session as [`Action::CallService`] on this channel.
    pub fn register(&mut self, tx: UnboundedSender<Action>) {
        self.tx = Some(tx);
    }

    /// The internal activity flag: true from a valid press until release.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a gesture. A press while another gesture is active is ignored;
    /// callers are expected to have already checked that the desk entity
    /// exists and is reachable.
    pub fn press(&mut self, direction: MoveDirection, desk: &EntityId) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(tx) = self.tx.clone() else {
            return false;
        };

        send_call(&tx, direction.call(desk));

        let token = CancellationToken::new();
        let task_token = token.clone();
        let task_desk = desk.clone();
        let initial_delay = self.initial_delay;
        let repeat_interval = self.repeat_interval;
        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => return,
                _ = tokio::time::sleep(initial_delay) => {}
            }
            let mut repeat =
                tokio::time::interval_at(tokio::time::Instant::now() + repeat_interval, repeat_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => return,
                    _ = repeat.tick() => {
                        if tx.send(Action::CallService(direction.call(&task_desk))).is_err() {
                            // Receiver is gone; nothing left to drive.
                            return;
                        }
                    }
                }
            }
        });

        self.active = Some(ActiveHold {
            desk: desk.clone(),
            _guard: token.drop_guard(),
        });
        true
    }

    /// End the gesture: cancel the pending delay and the repeat timer, then
    /// emit exactly one stop command if a gesture was active. Idempotent.
    pub fn stop(&mut self) -> bool {
        let Some(ActiveHold { desk, _guard: guard }) = self.active.take() else {
            return false;
        };
        // Timers must be dead before the stop command goes out.
        drop(guard);
        if let Some(tx) = &self.tx {
            send_call(tx, ServiceCall::stop_cover(desk));
        }
        true
    }

    /// Tear the gesture down without a stop command. Used when the desk has
    /// dropped off the network and no call can reach it anyway.
    pub fn abort(&mut self) -> bool {
        self.active.take().is_some()
    }
}

impl Drop for HoldSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn send_call(tx: &UnboundedSender<Action>, call: ServiceCall) {
    if let Err(e) = tx.send(Action::CallService(call)) {
        log::error!("failed to queue service call: {e}");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
    use tokio::time::{advance, Duration};

    use super::*;

    fn desk() -> EntityId {
        EntityId::from("cover.desk")
    }

    fn session(tx: UnboundedSender<Action>) -> HoldSession {
        let mut session = HoldSession::new();
        session.register(tx);
        session
    }

    fn drain(rx: &mut UnboundedReceiver<Action>) -> Vec<ServiceCall> {
        let mut calls = Vec::new();
        while let Ok(action) = rx.try_recv() {
            if let Action::CallService(call) = action {
                calls.push(call);
            }
        }
        calls
    }

    /// Move virtual time and let the armed timer task observe it.
    async fn hold_for(ms: u64) {
        advance(Duration::from_millis(ms)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_emits_one_immediate_command() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        assert!(session.press(MoveDirection::Up, &desk()));
        tokio::task::yield_now().await;

        let calls = drain(&mut rx);
        assert_eq!(calls, vec![ServiceCall::open_cover(desk())]);
        assert!(session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_before_initial_delay_skips_repeats() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        session.press(MoveDirection::Up, &desk());
        tokio::task::yield_now().await;
        hold_for(499).await;
        assert!(session.stop());
        hold_for(5_000).await;

        let calls = drain(&mut rx);
        assert_eq!(
            calls,
            vec![
                ServiceCall::open_cover(desk()),
                ServiceCall::stop_cover(desk()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_holding_past_the_delay_repeats_on_the_interval() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        session.press(MoveDirection::Up, &desk());
        tokio::task::yield_now().await;
        // 500ms delay, then repeats at 600/700/800.
        hold_for(500).await;
        hold_for(100).await;
        hold_for(100).await;
        hold_for(100).await;
        session.stop();
        hold_for(5_000).await;

        let calls = drain(&mut rx);
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0], ServiceCall::open_cover(desk()));
        assert!(calls[1..4]
            .iter()
            .all(|call| *call == ServiceCall::open_cover(desk())));
        assert_eq!(calls[4], ServiceCall::stop_cover(desk()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_down_direction_closes_the_cover() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        session.press(MoveDirection::Down, &desk());
        tokio::task::yield_now().await;

        assert_eq!(drain(&mut rx), vec![ServiceCall::close_cover(desk())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_press_during_active_gesture_is_ignored() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        assert!(session.press(MoveDirection::Up, &desk()));
        assert!(!session.press(MoveDirection::Down, &desk()));
        tokio::task::yield_now().await;

        assert_eq!(drain(&mut rx), vec![ServiceCall::open_cover(desk())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        session.press(MoveDirection::Up, &desk());
        tokio::task::yield_now().await;
        assert!(session.stop());
        assert!(!session.stop());
        assert!(!session.is_active());

        let stops = drain(&mut rx)
            .into_iter()
            .filter(|call| call.service == "stop_cover")
            .count();
        assert_eq!(stops, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_without_press_is_a_noop() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        assert!(!session.stop());
        assert_eq!(drain(&mut rx), vec![]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_silences_the_session_without_a_stop_command() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        session.press(MoveDirection::Up, &desk());
        tokio::task::yield_now().await;
        hold_for(600).await;
        drain(&mut rx);

        assert!(session.abort());
        assert!(!session.is_active());
        hold_for(10_000).await;
        assert_eq!(drain(&mut rx), vec![]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_session_kills_the_repeat_timer() {
        let (tx, mut rx) = unbounded_channel();
        let mut session = session(tx);

        session.press(MoveDirection::Up, &desk());
        tokio::task::yield_now().await;
        hold_for(700).await;
        drop(session);

        // The teardown stop is the last command ever issued.
        let calls = drain(&mut rx);
        assert_eq!(calls.last().unwrap().service, "stop_cover");

        hold_for(10_000).await;
        assert_eq!(drain(&mut rx), vec![]);
    }
}
