//! Infrastructure layer for the Padlink client.
//!
//! Contains the adapters that touch the outside world: the TCP connection
//! to the receiving host and the settings file on disk.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `padlink_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – The connection manager: one background task that owns
//!   the socket, writes frames in order, sends heartbeats, and reconnects
//!   when a write fails.
//!
//! - **`config`** – TOML settings persistence in the platform config
//!   directory, plus conversion to the core's `SessionConfig` and the
//!   network layer's `ConnectionConfig`.

pub mod config;
pub mod network;
