//! padlink-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does padlink-client do? (for beginners)
//!
//! Padlink turns one device into a touchpad and keyboard for another
//! computer.  A small daemon on the controlled computer listens on TCP and
//! injects whatever input it is told to; this crate is the sending side.
//!
//! The client:
//!
//! 1. Loads settings (target host, tap timing, pointer sensitivity) from a
//!    TOML file, with command-line overrides.
//! 2. Opens a TCP connection to the daemon and keeps it alive with one-byte
//!    heartbeats, reconnecting whenever a write fails.
//! 3. Turns touch gestures and text-field edits into semantic input events
//!    using `padlink_core`.
//! 4. Encodes each event into its wire frame and writes the frames in order.
//!
//! The daemon never answers, so nothing is ever read from the socket.

/// Application layer: the remote session and the console front end.
pub mod application;

/// Infrastructure layer: network connection and settings file.
pub mod infrastructure;
