//! Application layer use cases for the Padlink client.
//!
//! # What use cases does the client have?
//!
//! - **`session`** – A [`RemoteSession`] turns touch events, text-field
//!   edits, and button presses into wire frames and hands them to a
//!   [`FrameTransmitter`].  The transmitter is injected at construction time;
//!   in production it is the network layer's connection manager.
//!
//! - **`console`** – Parses the line commands typed into the terminal front
//!   end (`:key tab`, `:move 10 -4`, plain text) and applies them to a
//!   session through a [`ConsoleTextField`] that behaves like the on-screen
//!   text box.

pub mod console;
pub mod session;

pub use console::{execute, parse_line, ConsoleCommand, ConsoleError, ConsoleTextField};
pub use session::{
    FrameTransmitter, MouseButton, RemoteSession, ScrollDirection, UnknownMouseButton,
};
