//! # padlink-core
//!
//! Shared library for Padlink containing the gesture recognizer, the text
//! differ, the byte-exact wire codec, and the session configuration snapshot.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, or network
//! sockets.  Everything here is a pure function or an explicit state machine
//! driven by the caller, which makes it deterministic under test.
//!
//! # Architecture overview (for beginners)
//!
//! Padlink turns a handheld touch screen into a remote touchpad and keyboard.
//! The handheld runs the *client*; a small daemon on the remote host injects
//! the mouse and keyboard events it receives.
//!
//! ```text
//! raw touches ──> gesture ──┐
//!                           ├──> SemanticInputEvent ──> protocol ──> bytes ──> socket
//! buffer edits ──> text ────┘
//! ```
//!
//! - **`gesture`** – Classifies raw multi-touch samples into semantic events
//!   (cursor motion, taps, drags, two-finger scrolling, hold-to-right-click).
//!   Timers are modelled as deadlines the caller polls, not as threads.
//!
//! - **`text`** – Converts edits of an on-screen text buffer (including
//!   autocorrect substitutions) into the minimal backspace/insert sequence.
//!
//! - **`protocol`** – How events travel over the wire.  Text is raw UTF-8;
//!   mouse motion and discrete keys use frames whose lead byte (0xF8 and up)
//!   can never occur in valid UTF-8, so one stream carries all three.
//!
//! - **`config`** – The immutable [`SessionConfig`] snapshot supplied at
//!   session start, with fail-fast validation.

pub mod config;
pub mod gesture;
pub mod protocol;
pub mod text;

// Re-export the most-used types at the crate root so callers can write
// `padlink_core::GestureRecognizer` instead of the full module path.
pub use config::{ConfigError, SessionConfig};
pub use gesture::{GestureParams, GestureRecognizer, PointerSample, TouchAction, TouchEvent};
pub use protocol::codec::{decode_frame, encode_event, DecodedFrame, ProtocolError, WireFrame};
pub use protocol::events::{KeyCode, SemanticInputEvent};
pub use text::{TextDiffer, TextEdit};
