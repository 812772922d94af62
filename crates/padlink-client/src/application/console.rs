//! Line commands for the terminal front end.
//!
//! A plain line is typed on the remote host followed by Enter.  Lines that
//! start with `:` are commands:
//!
//! ```text
//! :key <name>            press a special key (:key tab, :key pgdn)
//! :click [left|right|middle]
//! :move <dx> <dy>        move the cursor by whole pixels
//! :scroll <up|down> [n]  n wheel notches, default 1
//! :tap                   a one-finger tap through the gesture recognizer
//! :type <text>           type text without pressing Enter
//! :bs [n]                delete n characters through the text field
//! :quit
//! ```
//!
//! Start a line with `::` to type a literal leading colon.
//!
//! # The text field (for beginners)
//!
//! On a phone, typed text goes through an on-screen text box and the
//! client only sees "the buffer changed from A to B".  [`ConsoleTextField`]
//! plays that role here: every typed line and every `:bs` is applied to a
//! buffer and reported to the session as an edit, so the terminal exercises
//! exactly the path an on-screen keyboard does, placeholder and all.

use std::ops::ControlFlow;

use padlink_core::text::{TextEdit, PLACEHOLDER};
use padlink_core::{KeyCode, PointerSample, TouchAction, TouchEvent};
use thiserror::Error;

use super::session::{MouseButton, RemoteSession, ScrollDirection};

/// Printed by the front end on start-up.
pub const USAGE: &str = "type text and press Enter, or use :key <name>, :click [button], \
:move <dx> <dy>, :scroll <up|down> [n], :tap, :type <text>, :bs [n], :quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Typed text followed by Enter.
    Line(String),
    /// Typed text with no Enter.
    Type(String),
    Backspace(u32),
    Key(KeyCode),
    Click(MouseButton),
    Move { dx: i32, dy: i32 },
    Scroll { direction: ScrollDirection, notches: u32 },
    Tap,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command `:{0}`")]
    UnknownCommand(String),

    #[error("`:{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("`{value}` is not a valid {what}")]
    InvalidArgument { what: &'static str, value: String },
}

/// Parses one line read from the terminal.
///
/// # Errors
///
/// Returns a [`ConsoleError`] for unknown commands and bad arguments.
/// Plain text never fails.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(ConsoleCommand::Line(line.to_string()));
    };
    if rest.starts_with(':') {
        return Ok(ConsoleCommand::Line(rest.to_string()));
    }

    let (name, raw_args) = rest.split_once(' ').unwrap_or((rest, ""));
    let args = raw_args.trim();

    match name.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Ok(ConsoleCommand::Quit),
        "tap" => Ok(ConsoleCommand::Tap),
        "type" => Ok(ConsoleCommand::Type(raw_args.to_string())),
        "bs" | "backspace" => Ok(ConsoleCommand::Backspace(count_or_one(args)?)),
        "key" => {
            let name = required(args, "key", "a key name")?;
            name.parse::<KeyCode>()
                .map(ConsoleCommand::Key)
                .map_err(|e| ConsoleError::InvalidArgument {
                    what: "key name",
                    value: e.0,
                })
        }
        "click" => {
            if args.is_empty() {
                return Ok(ConsoleCommand::Click(MouseButton::Left));
            }
            args.parse::<MouseButton>()
                .map(ConsoleCommand::Click)
                .map_err(|_| ConsoleError::InvalidArgument {
                    what: "mouse button",
                    value: args.to_string(),
                })
        }
        "move" => {
            let mut parts = args.split_whitespace();
            let dx = parts.next().ok_or(ConsoleError::MissingArgument {
                command: "move",
                what: "dx and dy",
            })?;
            let dy = parts.next().ok_or(ConsoleError::MissingArgument {
                command: "move",
                what: "dy",
            })?;
            Ok(ConsoleCommand::Move {
                dx: parse_number(dx, "pixel offset")?,
                dy: parse_number(dy, "pixel offset")?,
            })
        }
        "scroll" => {
            let (dir, count) = args.split_once(' ').unwrap_or((args, ""));
            let direction = match required(dir, "scroll", "a direction")?
                .to_ascii_lowercase()
                .as_str()
            {
                "up" | "u" => ScrollDirection::Up,
                "down" | "d" => ScrollDirection::Down,
                _ => {
                    return Err(ConsoleError::InvalidArgument {
                        what: "scroll direction",
                        value: dir.to_string(),
                    })
                }
            };
            Ok(ConsoleCommand::Scroll {
                direction,
                notches: count_or_one(count.trim())?,
            })
        }
        other => Err(ConsoleError::UnknownCommand(other.to_string())),
    }
}

fn required<'a>(
    args: &'a str,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, ConsoleError> {
    if args.is_empty() {
        Err(ConsoleError::MissingArgument { command, what })
    } else {
        Ok(args)
    }
}

fn count_or_one(args: &str) -> Result<u32, ConsoleError> {
    if args.is_empty() {
        Ok(1)
    } else {
        parse_number(args, "count")
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &'static str) -> Result<T, ConsoleError> {
    value.parse().map_err(|_| ConsoleError::InvalidArgument {
        what,
        value: value.to_string(),
    })
}

// ── Text field ────────────────────────────────────────────────────────────────

/// A stand-in for the on-screen text box.
///
/// Holds the same buffer a platform text widget would and reports each
/// change to the session as a before/after pair with an edit hint.
#[derive(Debug)]
pub struct ConsoleTextField {
    buffer: String,
}

impl Default for ConsoleTextField {
    fn default() -> Self {
        Self {
            buffer: PLACEHOLDER.to_string(),
        }
    }
}

impl ConsoleTextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Appends `text` at the end of the buffer.
    pub fn insert(&mut self, session: &mut RemoteSession, text: &str) {
        if text.is_empty() {
            return;
        }
        let before = self.buffer.clone();
        let start = before.chars().count();
        self.buffer.push_str(text);
        session.on_text_changed(&before, &self.buffer, TextEdit::new(start, 0, text.chars().count()));
        self.settle(session);
    }

    /// Deletes the last character.
    pub fn backspace(&mut self, session: &mut RemoteSession) {
        let before = self.buffer.clone();
        if self.buffer.pop().is_none() {
            return;
        }
        let start = self.buffer.chars().count();
        session.on_text_changed(&before, &self.buffer, TextEdit::new(start, 1, 0));
        self.settle(session);
    }

    fn settle(&mut self, session: &mut RemoteSession) {
        if let Some(reset) = session.after_text_changed(&self.buffer) {
            let before = std::mem::replace(&mut self.buffer, reset.to_string());
            session.on_text_changed(
                &before,
                &self.buffer,
                TextEdit::new(0, before.chars().count(), reset.chars().count()),
            );
        }
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// Applies one command.  Returns `Break` when the front end should exit.
///
/// `now_ms` is the session clock; `:tap` is timestamped with it so the
/// release timer lands on the same clock the caller polls with.
pub fn execute(
    command: ConsoleCommand,
    session: &mut RemoteSession,
    field: &mut ConsoleTextField,
    now_ms: u64,
) -> ControlFlow<()> {
    match command {
        ConsoleCommand::Line(mut text) => {
            text.push('\n');
            field.insert(session, &text);
        }
        ConsoleCommand::Type(text) => field.insert(session, &text),
        ConsoleCommand::Backspace(n) => {
            for _ in 0..n {
                field.backspace(session);
            }
        }
        ConsoleCommand::Key(key) => session.press_key(key),
        ConsoleCommand::Click(button) => session.click(button),
        ConsoleCommand::Move { dx, dy } => session.move_pointer(dx, dy),
        ConsoleCommand::Scroll { direction, notches } => session.scroll(direction, notches),
        ConsoleCommand::Tap => {
            let finger = vec![PointerSample::new(0, 0.0, 0.0, now_ms)];
            session.on_touch(&TouchEvent::new(TouchAction::Down(0), finger.clone()));
            session.on_touch(&TouchEvent::new(TouchAction::Up(0), finger));
        }
        ConsoleCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::FrameTransmitter;
    use padlink_core::protocol::FrameDecoder;
    use padlink_core::{DecodedFrame, SessionConfig, WireFrame};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingTransmitter {
        frames: Mutex<Vec<WireFrame>>,
    }

    impl FrameTransmitter for RecordingTransmitter {
        fn transmit(&self, frame: WireFrame) {
            self.frames.lock().unwrap().push(frame);
        }
    }

    impl RecordingTransmitter {
        fn decoded(&self) -> Vec<DecodedFrame> {
            let mut decoder = FrameDecoder::new();
            for frame in self.frames.lock().unwrap().iter() {
                decoder.push(frame.as_bytes());
            }
            decoder.drain_frames().unwrap()
        }
    }

    fn setup() -> (RemoteSession, ConsoleTextField, Arc<RecordingTransmitter>) {
        let tx = Arc::new(RecordingTransmitter::default());
        let config = SessionConfig {
            host: "localhost".into(),
            port: 64296,
            tap_delay_ms: 200,
            tap_tolerance_px: 10.0,
            sensitivity: 1.0,
            acceleration_exponent: 1.0,
            scroll_threshold: 20.0,
        };
        let session = RemoteSession::new(&config, tx.clone()).unwrap();
        (session, ConsoleTextField::new(), tx)
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_plain_line_is_text() {
        assert_eq!(parse_line("hello"), Ok(ConsoleCommand::Line("hello".into())));
        assert_eq!(parse_line(""), Ok(ConsoleCommand::Line(String::new())));
    }

    #[test]
    fn test_double_colon_escapes_a_literal_colon() {
        assert_eq!(parse_line("::)"), Ok(ConsoleCommand::Line(":)".into())));
    }

    #[test]
    fn test_commands_parse_with_arguments() {
        assert_eq!(parse_line(":key esc"), Ok(ConsoleCommand::Key(KeyCode::Escape)));
        assert_eq!(parse_line(":click"), Ok(ConsoleCommand::Click(MouseButton::Left)));
        assert_eq!(parse_line(":click right"), Ok(ConsoleCommand::Click(MouseButton::Right)));
        assert_eq!(parse_line(":move 12 -3"), Ok(ConsoleCommand::Move { dx: 12, dy: -3 }));
        assert_eq!(
            parse_line(":scroll down 4"),
            Ok(ConsoleCommand::Scroll {
                direction: ScrollDirection::Down,
                notches: 4
            })
        );
        assert_eq!(
            parse_line(":scroll up"),
            Ok(ConsoleCommand::Scroll {
                direction: ScrollDirection::Up,
                notches: 1
            })
        );
        assert_eq!(parse_line(":bs 3"), Ok(ConsoleCommand::Backspace(3)));
        assert_eq!(parse_line(":type a b"), Ok(ConsoleCommand::Type("a b".into())));
        assert_eq!(parse_line(":tap"), Ok(ConsoleCommand::Tap));
        assert_eq!(parse_line(":q"), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn test_bad_commands_are_reported() {
        assert_eq!(
            parse_line(":jump"),
            Err(ConsoleError::UnknownCommand("jump".into()))
        );
        assert_eq!(
            parse_line(":key"),
            Err(ConsoleError::MissingArgument {
                command: "key",
                what: "a key name"
            })
        );
        assert!(matches!(
            parse_line(":key hyper"),
            Err(ConsoleError::InvalidArgument { what: "key name", .. })
        ));
        assert!(matches!(
            parse_line(":move 1"),
            Err(ConsoleError::MissingArgument { command: "move", .. })
        ));
        assert!(matches!(
            parse_line(":scroll sideways"),
            Err(ConsoleError::InvalidArgument { what: "scroll direction", .. })
        ));
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    #[test]
    fn test_line_is_typed_with_enter_and_field_resets() {
        // Arrange
        let (mut session, mut field, tx) = setup();

        // Act
        let flow = execute(ConsoleCommand::Line("ls".into()), &mut session, &mut field, 0);

        // Assert
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(tx.decoded(), vec![DecodedFrame::Text("ls\n".into())]);
        assert_eq!(field.contents(), PLACEHOLDER);
    }

    #[test]
    fn test_backspace_past_typed_text_still_reaches_host() {
        // Arrange
        let (mut session, mut field, tx) = setup();
        execute(ConsoleCommand::Type("ab".into()), &mut session, &mut field, 0);

        // Act: two characters typed, three deleted; the third eats the placeholder
        execute(ConsoleCommand::Backspace(3), &mut session, &mut field, 0);

        // Assert
        assert_eq!(
            tx.decoded(),
            vec![
                DecodedFrame::Text("ab".into()),
                DecodedFrame::Key(KeyCode::Backspace),
                DecodedFrame::Key(KeyCode::Backspace),
                DecodedFrame::Key(KeyCode::Backspace),
            ]
        );
        assert_eq!(field.contents(), PLACEHOLDER);
    }

    #[test]
    fn test_tap_goes_through_gesture_timers() {
        // Arrange
        let (mut session, mut field, tx) = setup();

        // Act
        execute(ConsoleCommand::Tap, &mut session, &mut field, 1_000);
        let before_timer = tx.decoded();
        session.poll_timers(1_200);

        // Assert
        assert_eq!(before_timer, vec![DecodedFrame::Key(KeyCode::LeftMouseDown)]);
        assert_eq!(
            tx.decoded().last(),
            Some(&DecodedFrame::Key(KeyCode::LeftMouseUp))
        );
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn test_quit_breaks() {
        let (mut session, mut field, _tx) = setup();
        assert_eq!(
            execute(ConsoleCommand::Quit, &mut session, &mut field, 0),
            ControlFlow::Break(())
        );
    }
}
