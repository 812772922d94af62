//! Padlink client entry point.
//!
//! Loads settings, starts the connection manager, and drives a
//! [`RemoteSession`] from the terminal.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_settings_from()        -- TOML file + CLI overrides
//!  └─ ConnectionManager::start()  -- connection task (heartbeat, reconnect)
//!  └─ RemoteSession::new()        -- gestures + text -> frames
//!  └─ input loop
//!       ├─ stdin line   -> parse_line / execute
//!       ├─ timer due    -> session.poll_timers
//!       └─ Ctrl-C / EOF -> stop
//! ```
//!
//! # Timers (for beginners)
//!
//! A tap's button release and a long press's right click are decided by
//! timers inside the gesture recognizer.  The recognizer does not sleep; it
//! reports its next deadline and the loop below wakes up at that moment and
//! calls `poll_timers`.  All timestamps are milliseconds since start-up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use padlink_client::application::console::USAGE;
use padlink_client::application::{execute, parse_line, ConsoleTextField, RemoteSession};
use padlink_client::infrastructure::config::{
    config_file_path, load_settings_from, save_settings_to, Settings, SettingsError,
};
use padlink_client::infrastructure::network::{
    ConnectionConfig, ConnectionManager, ConnectionObserver, TcpConnector,
};
use padlink_core::SessionConfig;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote touchpad and keyboard for a Padlink receiving daemon.
///
/// Every option overrides the matching value from the settings file.
#[derive(Debug, Parser)]
#[command(
    name = "padlink",
    about = "Drive a remote computer's pointer and keyboard over TCP",
    version
)]
struct Cli {
    /// Settings file to read instead of the platform default.
    #[arg(long, env = "PADLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Host name or IP address of the receiving daemon.
    #[arg(long, env = "PADLINK_HOST")]
    host: Option<String>,

    /// TCP port of the receiving daemon.
    #[arg(long, env = "PADLINK_PORT")]
    port: Option<u16>,

    /// Pointer sensitivity multiplier.
    #[arg(long)]
    sensitivity: Option<f32>,

    /// Pointer acceleration exponent; 1.0 disables acceleration.
    #[arg(long)]
    acceleration: Option<f32>,

    /// Tap window in milliseconds.  Long press is twice this.
    #[arg(long)]
    tap_delay_ms: Option<u64>,

    /// Heartbeat period (and reconnect delay) in milliseconds.
    #[arg(long)]
    heartbeat_ms: Option<u64>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "PADLINK_LOG")]
    log_level: Option<String>,

    /// Write the effective settings back to the settings file and continue.
    #[arg(long)]
    save: bool,
}

impl Cli {
    fn settings_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("cannot locate the settings file"),
        }
    }

    /// Overlays the command-line values onto `settings`.
    fn apply_to(&self, settings: &mut Settings) {
        let session = &mut settings.session;
        if let Some(host) = &self.host {
            session.host = host.clone();
        }
        if let Some(port) = self.port {
            session.port = port;
        }
        if let Some(sensitivity) = self.sensitivity {
            session.sensitivity = sensitivity;
        }
        if let Some(exponent) = self.acceleration {
            session.acceleration_exponent = exponent;
        }
        if let Some(tap) = self.tap_delay_ms {
            session.tap_delay_ms = tap;
        }
        if let Some(heartbeat) = self.heartbeat_ms {
            settings.connection.heartbeat_interval_ms = heartbeat;
        }
        if let Some(level) = &self.log_level {
            settings.log.level = level.clone();
        }
    }
}

/// Both halves of the settings, each validated before anything starts.
fn validated_configs(
    settings: &Settings,
) -> Result<(SessionConfig, ConnectionConfig), SettingsError> {
    Ok((settings.session_config()?, settings.connection_config()?))
}

// ── Connection status ─────────────────────────────────────────────────────────

/// Reports connection changes in the log; the terminal has no status bar.
struct LoggingObserver;

impl ConnectionObserver for LoggingObserver {
    fn on_connection_established(&self) {
        info!("connected; input is live");
    }

    fn on_connection_lost(&self) {
        warn!("connection lost; retrying");
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli.settings_path()?;
    let mut settings = load_settings_from(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    cli.apply_to(&mut settings);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.level)),
        )
        .init();

    let (session_config, connection_config) = match validated_configs(&settings) {
        Ok(configs) => configs,
        Err(e) => {
            error!("refusing to start: {e}");
            return Err(e).context("settings describe an unusable session");
        }
    };

    if cli.save {
        save_settings_to(&path, &settings)
            .with_context(|| format!("failed to save settings to {}", path.display()))?;
        info!("settings saved to {}", path.display());
    }

    info!(
        "Padlink starting; target {}:{}",
        session_config.host, session_config.port
    );

    let manager = Arc::new(
        ConnectionManager::start(
            connection_config,
            Arc::new(TcpConnector::new()),
            Arc::new(LoggingObserver),
        )
        .context("failed to start the connection task")?,
    );
    let mut session = RemoteSession::new(&session_config, manager.clone())
        .context("failed to start session")?;
    manager.connect();

    run_console(&mut session).await;

    session.stop();
    manager.shutdown().await;
    info!("Padlink stopped");
    Ok(())
}

/// Reads commands from stdin until `:quit`, end of input, or Ctrl-C.
async fn run_console(session: &mut RemoteSession) {
    eprintln!("{USAGE}");

    let origin = Instant::now();
    let now_ms = || u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut field = ConsoleTextField::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let deadline = session.next_deadline();
        let wake_at = origin + Duration::from_millis(deadline.unwrap_or(0));

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("shutdown signal received");
                break;
            }
            _ = time::sleep_until(wake_at), if deadline.is_some() => {
                session.poll_timers(now_ms());
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(command) => {
                        if execute(command, session, &mut field, now_ms()).is_break() {
                            break;
                        }
                    }
                    Err(e) => warn!("{e}"),
                },
                Ok(None) => break,
                Err(e) => {
                    error!("failed to read stdin: {e}");
                    break;
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_options_overrides_nothing() {
        // Arrange
        let cli = Cli::parse_from(["padlink"]);
        let mut settings = Settings::default();

        // Act
        cli.apply_to(&mut settings);

        // Assert
        assert_eq!(settings, Settings::default());
        assert!(!cli.save);
    }

    #[test]
    fn test_cli_overrides_session_and_connection_values() {
        // Arrange
        let cli = Cli::parse_from([
            "padlink",
            "--host",
            "192.168.1.9",
            "--port",
            "7000",
            "--sensitivity",
            "2.0",
            "--acceleration",
            "1.4",
            "--tap-delay-ms",
            "150",
            "--heartbeat-ms",
            "1000",
        ]);
        let mut settings = Settings::default();

        // Act
        cli.apply_to(&mut settings);

        // Assert
        assert_eq!(settings.session.host, "192.168.1.9");
        assert_eq!(settings.session.port, 7000);
        assert_eq!(settings.session.sensitivity, 2.0);
        assert_eq!(settings.session.acceleration_exponent, 1.4);
        assert_eq!(settings.session.tap_delay_ms, 150);
        assert_eq!(settings.connection.heartbeat_interval_ms, 1000);
    }

    #[test]
    fn test_cli_config_path_takes_precedence() {
        let cli = Cli::parse_from(["padlink", "--config", "/tmp/padlink-alt.toml"]);
        assert_eq!(
            cli.settings_path().unwrap(),
            PathBuf::from("/tmp/padlink-alt.toml")
        );
    }

    #[test]
    fn test_cli_rejects_out_of_range_port() {
        let result = Cli::try_parse_from(["padlink", "--port", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_heartbeat_from_cli_stops_startup() {
        // Arrange
        let cli = Cli::parse_from(["padlink", "--heartbeat-ms", "0"]);
        let mut settings = Settings::default();
        cli.apply_to(&mut settings);

        // Act
        let result = validated_configs(&settings);

        // Assert
        assert!(matches!(result, Err(SettingsError::InvalidConnection(_))));
    }

    #[test]
    fn test_default_settings_yield_both_configs() {
        let (session, connection) = validated_configs(&Settings::default()).unwrap();
        assert_eq!(session.port, connection.port);
        assert_eq!(connection.heartbeat_interval, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_logging_observer_survives_a_dropped_peer() {
        // Arrange
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut config = ConnectionConfig::new("127.0.0.1", port);
        config.heartbeat_interval = Duration::from_secs(60);
        let manager = ConnectionManager::start(
            config,
            Arc::new(TcpConnector::new()),
            Arc::new(LoggingObserver),
        )
        .unwrap();
        let mut state = manager.subscribe();

        // Act: hang up, then keep writing until the manager notices
        manager.connect();
        let (first, _) = listener.accept().await.unwrap();
        drop(first);
        let frame = padlink_core::encode_event(&padlink_core::SemanticInputEvent::LeftClick)
            .unwrap()
            .unwrap();
        let writer = async {
            loop {
                manager.send(frame.clone());
                time::sleep(Duration::from_millis(10)).await;
            }
        };
        let second = tokio::select! {
            accepted = time::timeout(Duration::from_secs(5), listener.accept()) => {
                accepted.expect("manager dialled again")
            }
            _ = writer => unreachable!(),
        };

        // Assert
        assert!(second.is_ok());
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| {
                *s == padlink_client::infrastructure::network::ConnectionState::Connected
            }),
        )
        .await
        .expect("reconnected")
        .unwrap();
        manager.shutdown().await;
    }
}
