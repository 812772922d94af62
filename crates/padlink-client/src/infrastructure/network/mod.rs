//! Network infrastructure: the only part of Padlink that touches a socket.
//!
//! Architecture:
//! - [`ConnectionManager`] owns a background task that owns the transport.
//!   Callers hand it frames through a channel and never block.
//! - [`Connector`] / [`FrameSink`] abstract "open a stream" and "write bytes
//!   to it" so the manager can be tested without a network.
//!   [`TcpConnector`] is the real implementation.
//! - [`ConnectionObserver`] is the capability the UI layer implements to hear
//!   about the connection becoming usable or unusable.
//!
//! # Liveness (for beginners)
//!
//! The receiving daemon never replies, so the only way to notice a dead peer
//! is to write to it and see the write fail.  While connected, the manager
//! writes a one-byte heartbeat (`0x00`) every `heartbeat_interval`.  When any
//! write fails it reports the connection lost and immediately reconnects; a
//! failed connect is retried one heartbeat interval later, forever, until
//! [`ConnectionManager::disconnect`] is called.

pub mod manager;
pub mod tcp;

pub use manager::ConnectionManager;
pub use tcp::TcpConnector;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Heartbeat cadence when none is configured.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(3000);

/// Connect timeout when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while establishing or using a connection.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The host name did not resolve to any address.
    #[error("could not resolve host {host}: {reason}")]
    Resolve { host: String, reason: String },

    /// Every resolved address refused or failed the TCP handshake.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The connect attempt did not finish within the configured timeout.
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// An I/O error occurred on an established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`ConnectionConfig`] the connection task cannot run with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionConfigError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("port must be non-zero")]
    InvalidPort,

    /// A zero period would make the heartbeat timer spin.
    #[error("heartbeat interval must be non-zero")]
    ZeroHeartbeatInterval,

    #[error("connect timeout must be non-zero")]
    ZeroConnectTimeout,
}

/// Where to connect and how to keep the connection alive.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Period of the heartbeat while connected, and the delay before retrying
    /// a failed connect.
    pub heartbeat_interval: Duration,
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    /// Creates a config with the default heartbeat and timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Checks every field, failing on the first unusable one.
    ///
    /// # Errors
    ///
    /// Returns the [`ConnectionConfigError`] for the first bad field.
    pub fn validate(&self) -> Result<(), ConnectionConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConnectionConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConnectionConfigError::InvalidPort);
        }
        if self.heartbeat_interval.is_zero() {
            return Err(ConnectionConfigError::ZeroHeartbeatInterval);
        }
        if self.connect_timeout.is_zero() {
            return Err(ConnectionConfigError::ZeroConnectTimeout);
        }
        Ok(())
    }
}

/// Connection lifecycle as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Lifecycle callbacks for the UI layer.
///
/// Called from the connection task; implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionObserver: Send + Sync {
    /// The connection is usable: frames will now reach the host.
    fn on_connection_established(&self);

    /// The connection is not usable: a connect failed or a write failed.
    fn on_connection_lost(&self);
}

/// Opens a byte stream to the receiving host.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn FrameSink>, NetworkError>;
}

/// The write side of an open connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Writes one whole frame.  An error means the connection is dead.
    async fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()>;

    /// Closes the connection.  Errors are not interesting at this point.
    async fn close(&mut self);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connection_config_is_valid() {
        assert_eq!(ConnectionConfig::new("10.0.0.2", 64296).validate(), Ok(()));
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        // Arrange
        let mut no_heartbeat = ConnectionConfig::new("10.0.0.2", 64296);
        no_heartbeat.heartbeat_interval = Duration::ZERO;
        let mut no_timeout = ConnectionConfig::new("10.0.0.2", 64296);
        no_timeout.connect_timeout = Duration::ZERO;

        // Act / Assert
        assert_eq!(
            no_heartbeat.validate(),
            Err(ConnectionConfigError::ZeroHeartbeatInterval)
        );
        assert_eq!(
            no_timeout.validate(),
            Err(ConnectionConfigError::ZeroConnectTimeout)
        );
    }

    #[test]
    fn test_missing_host_or_port_is_rejected() {
        assert_eq!(
            ConnectionConfig::new(" ", 64296).validate(),
            Err(ConnectionConfigError::EmptyHost)
        );
        assert_eq!(
            ConnectionConfig::new("10.0.0.2", 0).validate(),
            Err(ConnectionConfigError::InvalidPort)
        );
    }
}
