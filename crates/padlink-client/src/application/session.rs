//! RemoteSession: one touchpad session from start to stop.
//!
//! The session owns the gesture recognizer and the text differ, encodes
//! whatever they produce, and hands the frames to a [`FrameTransmitter`].
//! It never touches the network itself.

use std::sync::Arc;

use padlink_core::text::TextEdit;
use padlink_core::{
    encode_event, ConfigError, GestureParams, GestureRecognizer, KeyCode, SemanticInputEvent,
    SessionConfig, TextDiffer, TouchEvent, WireFrame,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Anything that accepts finished frames for delivery.
///
/// Implemented by the network layer's connection manager.
pub trait FrameTransmitter: Send + Sync {
    /// Queues `frame` for delivery in submission order.  Never blocks.
    fn transmit(&self, frame: WireFrame);
}

/// On-screen mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Error returned when a button name is not `left`, `right` or `middle`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mouse button: {0}")]
pub struct UnknownMouseButton(pub String);

impl std::str::FromStr for MouseButton {
    type Err = UnknownMouseButton;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(MouseButton::Left),
            "right" | "r" => Ok(MouseButton::Right),
            "middle" | "m" => Ok(MouseButton::Middle),
            _ => Err(UnknownMouseButton(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Largest per-frame displacement that survives the 12-bit mouse encoding.
const MAX_STEP: i32 = padlink_core::protocol::codec::MAX_MOUSE_MAGNITUDE;

pub struct RemoteSession {
    recognizer: GestureRecognizer,
    differ: TextDiffer,
    transmitter: Arc<dyn FrameTransmitter>,
    stopped: bool,
}

impl RemoteSession {
    /// Validates `config` and starts a session that writes to `transmitter`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in `config`.
    pub fn new(
        config: &SessionConfig,
        transmitter: Arc<dyn FrameTransmitter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            recognizer: GestureRecognizer::new(GestureParams::from(config)),
            differ: TextDiffer::new(),
            transmitter,
            stopped: false,
        })
    }

    // ── Touch surface ─────────────────────────────────────────────────────────

    pub fn on_touch(&mut self, event: &TouchEvent) {
        if self.ignore_if_stopped() {
            return;
        }
        let events = self.recognizer.handle(event);
        self.emit_all(events);
    }

    /// Fires gesture timers that are due at `now_ms`.
    pub fn poll_timers(&mut self, now_ms: u64) {
        if self.stopped {
            return;
        }
        let events = self.recognizer.poll(now_ms);
        self.emit_all(events);
    }

    /// When [`poll_timers`](Self::poll_timers) next needs to run.
    pub fn next_deadline(&self) -> Option<u64> {
        if self.stopped {
            None
        } else {
            self.recognizer.next_deadline()
        }
    }

    // ── Text field ────────────────────────────────────────────────────────────

    pub fn on_text_changed(&mut self, before: &str, after: &str, edit: TextEdit) {
        if self.ignore_if_stopped() {
            return;
        }
        let events = self.differ.on_text_changed(before, after, edit);
        self.emit_all(events);
    }

    /// Returns the contents the text field must be reset to, if any.
    ///
    /// Always `None` once the session is stopped.
    pub fn after_text_changed(&mut self, buffer: &str) -> Option<&'static str> {
        if self.ignore_if_stopped() {
            return None;
        }
        self.differ.after_text_changed(buffer)
    }

    // ── Direct controls ───────────────────────────────────────────────────────

    pub fn press_key(&mut self, key: KeyCode) {
        self.emit_one(SemanticInputEvent::from_key_code(key));
    }

    pub fn click(&mut self, button: MouseButton) {
        self.emit_one(match button {
            MouseButton::Left => SemanticInputEvent::LeftClick,
            MouseButton::Right => SemanticInputEvent::RightClick,
            MouseButton::Middle => SemanticInputEvent::MiddleClick,
        });
    }

    /// Moves the cursor by exactly `(dx, dy)`, split into as many frames as
    /// the 12-bit encoding needs.
    pub fn move_pointer(&mut self, dx: i32, dy: i32) {
        let (mut dx, mut dy) = (dx, dy);
        while dx != 0 || dy != 0 {
            let step_x = dx.clamp(-MAX_STEP, MAX_STEP);
            let step_y = dy.clamp(-MAX_STEP, MAX_STEP);
            self.emit_one(SemanticInputEvent::MouseMove {
                dx: step_x,
                dy: step_y,
            });
            dx -= step_x;
            dy -= step_y;
        }
    }

    pub fn scroll(&mut self, direction: ScrollDirection, notches: u32) {
        let event = match direction {
            ScrollDirection::Up => SemanticInputEvent::WheelUp,
            ScrollDirection::Down => SemanticInputEvent::WheelDown,
        };
        for _ in 0..notches {
            self.emit_one(event.clone());
        }
    }

    /// Sends `text` as-is, bypassing the differ.
    pub fn type_text(&mut self, text: &str) {
        self.emit_one(SemanticInputEvent::TextRun(text.to_string()));
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Balances a held button, disarms every gesture timer, and ignores all
    /// further input.  Call before shutting the connection down.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        let events = self.recognizer.cancel();
        self.emit_all(events);
        self.stopped = true;
        debug!("session stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn ignore_if_stopped(&self) -> bool {
        if self.stopped {
            debug!("session stopped; input ignored");
        }
        self.stopped
    }

    fn emit_one(&mut self, event: SemanticInputEvent) {
        if self.ignore_if_stopped() {
            return;
        }
        self.emit(&event);
    }

    fn emit_all(&self, events: Vec<SemanticInputEvent>) {
        for event in &events {
            self.emit(event);
        }
    }

    fn emit(&self, event: &SemanticInputEvent) {
        match encode_event(event) {
            Ok(Some(frame)) => self.transmitter.transmit(frame),
            Ok(None) => {}
            Err(e) => warn!("dropping {event:?}: {e}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use padlink_core::protocol::FrameDecoder;
    use padlink_core::{DecodedFrame, PointerSample, TouchAction};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransmitter {
        frames: Mutex<Vec<WireFrame>>,
    }

    impl RecordingTransmitter {
        fn decoded(&self) -> Vec<DecodedFrame> {
            let mut decoder = FrameDecoder::new();
            for frame in self.frames.lock().unwrap().iter() {
                decoder.push(frame.as_bytes());
            }
            decoder.drain_frames().unwrap()
        }

        fn frame_count(&self) -> usize {
            self.frames.lock().unwrap().len()
        }
    }

    impl FrameTransmitter for RecordingTransmitter {
        fn transmit(&self, frame: WireFrame) {
            self.frames.lock().unwrap().push(frame);
        }
    }

    fn config() -> SessionConfig {
        SessionConfig {
            host: "127.0.0.1".into(),
            port: 64296,
            tap_delay_ms: 200,
            tap_tolerance_px: 10.0,
            sensitivity: 1.0,
            acceleration_exponent: 1.0,
            scroll_threshold: 20.0,
        }
    }

    fn session() -> (RemoteSession, Arc<RecordingTransmitter>) {
        let tx = Arc::new(RecordingTransmitter::default());
        let session = RemoteSession::new(&config(), tx.clone()).unwrap();
        (session, tx)
    }

    fn touch(action: TouchAction, x: f32, t: u64) -> TouchEvent {
        TouchEvent::new(action, vec![PointerSample::new(0, x, 0.0, t)])
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let tx = Arc::new(RecordingTransmitter::default());
        let bad = SessionConfig { port: 0, ..config() };

        let result = RemoteSession::new(&bad, tx);

        assert!(matches!(result, Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn test_tap_sends_button_down_then_up_when_polled() {
        // Arrange
        let (mut s, tx) = session();

        // Act
        s.on_touch(&touch(TouchAction::Down(0), 0.0, 0));
        s.on_touch(&touch(TouchAction::Up(0), 0.0, 30));
        let deadline = s.next_deadline();
        s.poll_timers(deadline.unwrap());

        // Assert
        assert_eq!(
            tx.decoded(),
            vec![
                DecodedFrame::Key(KeyCode::LeftMouseDown),
                DecodedFrame::Key(KeyCode::LeftMouseUp),
            ]
        );
    }

    #[test]
    fn test_text_edits_are_replayed_minimally() {
        let (mut s, tx) = session();

        s.on_text_changed(" ", " cat", TextEdit::new(1, 0, 3));
        s.on_text_changed(" cat", " car", TextEdit::new(1, 3, 3));

        assert_eq!(
            tx.decoded(),
            vec![
                DecodedFrame::Text("cat".into()),
                DecodedFrame::Key(KeyCode::Backspace),
                DecodedFrame::Text("r".into()),
            ]
        );
    }

    #[test]
    fn test_placeholder_reset_is_not_transmitted() {
        let (mut s, tx) = session();

        s.on_text_changed(" ", " \n", TextEdit::new(1, 0, 1));
        let reset = s.after_text_changed(" \n");
        s.on_text_changed(" \n", " ", TextEdit::new(0, 2, 1));

        assert_eq!(reset, Some(" "));
        assert_eq!(tx.decoded(), vec![DecodedFrame::Text("\n".into())]);
    }

    #[test]
    fn test_direct_controls_map_to_codes() {
        let (mut s, tx) = session();

        s.press_key(KeyCode::Escape);
        s.click(MouseButton::Right);
        s.scroll(ScrollDirection::Up, 2);

        assert_eq!(
            tx.decoded(),
            vec![
                DecodedFrame::Key(KeyCode::Escape),
                DecodedFrame::Key(KeyCode::RightClick),
                DecodedFrame::Key(KeyCode::WheelUp),
                DecodedFrame::Key(KeyCode::WheelUp),
            ]
        );
    }

    #[test]
    fn test_large_move_is_split_instead_of_wrapping() {
        let (mut s, tx) = session();

        s.move_pointer(5000, -10);

        assert_eq!(
            tx.decoded(),
            vec![
                DecodedFrame::MouseMove { dx: 4095, dy: -10 },
                DecodedFrame::MouseMove { dx: 905, dy: 0 },
            ]
        );
    }

    #[test]
    fn test_text_with_nul_is_dropped_not_sent() {
        let (mut s, tx) = session();

        s.type_text("a\0b");
        s.type_text("ok");

        assert_eq!(tx.decoded(), vec![DecodedFrame::Text("ok".into())]);
    }

    #[test]
    fn test_stop_releases_held_button_and_silences_session() {
        // Arrange: tap, then touch and drag so the button stays held
        let (mut s, tx) = session();
        s.on_touch(&touch(TouchAction::Down(0), 0.0, 0));
        s.on_touch(&touch(TouchAction::Up(0), 0.0, 30));
        s.on_touch(&touch(TouchAction::Down(0), 0.0, 60));
        s.on_touch(&touch(TouchAction::Move, 50.0, 80));

        // Act
        s.stop();
        s.press_key(KeyCode::Tab);
        s.poll_timers(10_000);

        // Assert
        let frames = tx.decoded();
        assert_eq!(frames.last(), Some(&DecodedFrame::Key(KeyCode::LeftMouseUp)));
        assert_eq!(tx.frame_count(), 3, "down, move, up; nothing after stop");
        assert_eq!(s.next_deadline(), None);
        assert!(s.is_stopped());
    }

    #[test]
    fn test_mouse_button_names_parse() {
        assert_eq!("left".parse::<MouseButton>(), Ok(MouseButton::Left));
        assert_eq!("M".parse::<MouseButton>(), Ok(MouseButton::Middle));
        assert_eq!(
            "side".parse::<MouseButton>(),
            Err(UnknownMouseButton("side".into()))
        );
    }

    #[test]
    fn test_text_field_hooks_are_inert_after_stop() {
        // Arrange
        let (mut s, tx) = session();
        s.stop();

        // Act
        let reset = s.after_text_changed("\n");
        s.on_text_changed(" ", " x", TextEdit::new(1, 0, 1));

        // Assert
        assert_eq!(reset, None);
        assert_eq!(tx.frame_count(), 0);
    }
}
