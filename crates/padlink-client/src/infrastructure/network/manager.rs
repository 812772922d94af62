//! The connection task: connect, heartbeat, write, reconnect.
//!
//! # Why one task owns the socket
//!
//! Frames must reach the wire whole and in the order they were produced.  If
//! two tasks could write, a heartbeat could land in the middle of a mouse
//! frame.  Instead, exactly one spawned task owns the [`FrameSink`]; callers
//! send it [`Command`]s over an unbounded channel, which preserves order and
//! never blocks the UI thread.
//!
//! A connect attempt is awaited inside that task, so frames submitted while
//! it is in flight simply wait in the channel and are written afterwards.

use std::sync::{Arc, Mutex};

use padlink_core::WireFrame;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{
    ConnectionConfig, ConnectionConfigError, ConnectionObserver, ConnectionState, Connector,
    FrameSink, NetworkError,
};
use crate::application::FrameTransmitter;

/// Requests from the public handle to the connection task.
#[derive(Debug)]
enum Command {
    Connect,
    Send(WireFrame),
    Disconnect,
    Shutdown,
}

/// Handle to the connection task.
///
/// Every method returns immediately; the work happens on the task.
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Spawns the connection task in the `Disconnected` state.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionConfigError`] without spawning anything if
    /// `config` fails validation.
    pub fn start(
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        observer: Arc<dyn ConnectionObserver>,
    ) -> Result<Self, ConnectionConfigError> {
        config.validate()?;

        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);

        let worker = Worker {
            config,
            connector,
            observer,
            state: state_tx,
            sink: None,
            heartbeat: None,
            retry_at: None,
            retry_enabled: false,
        };
        let handle = tokio::spawn(worker.run(rx));

        Ok(Self {
            commands,
            state,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Opens (or reopens) the connection and enables automatic retry.
    pub fn connect(&self) {
        self.command(Command::Connect);
    }

    /// Closes the connection and disables automatic retry until the next
    /// [`connect`](Self::connect).
    pub fn disconnect(&self) {
        self.command(Command::Disconnect);
    }

    /// Queues a frame.  Frames queued while disconnected are dropped.
    pub fn send(&self, frame: WireFrame) {
        self.command(Command::Send(frame));
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Disconnects, stops the connection task, and waits for it to finish.
    ///
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self) {
        self.command(Command::Shutdown);

        let handle = self.worker.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("connection task ended abnormally: {e}");
            }
        }
    }

    fn command(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            debug!("connection task has stopped; ignoring {:?}", e.0);
        }
    }
}

impl FrameTransmitter for ConnectionManager {
    fn transmit(&self, frame: WireFrame) {
        self.send(frame);
    }
}

// ── Connection task ───────────────────────────────────────────────────────────

struct Worker {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    observer: Arc<dyn ConnectionObserver>,
    state: watch::Sender<ConnectionState>,
    sink: Option<Box<dyn FrameSink>>,
    /// Armed only while connected.
    heartbeat: Option<Interval>,
    /// When to retry after a failed connect.
    retry_at: Option<Instant>,
    retry_enabled: bool,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            let retry_at = self.retry_at;
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Connect) => {
                        self.retry_enabled = true;
                        self.retry_at = None;
                        self.attempt_connect().await;
                    }
                    Some(Command::Send(frame)) => self.write(frame.as_bytes()).await,
                    Some(Command::Disconnect) => self.stop_connection().await,
                    Some(Command::Shutdown) | None => {
                        self.stop_connection().await;
                        break;
                    }
                },
                _ = next_tick(&mut self.heartbeat), if self.heartbeat.is_some() => {
                    self.write(WireFrame::heartbeat().as_bytes()).await;
                }
                _ = time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    self.retry_at = None;
                    self.attempt_connect().await;
                }
            }
        }
        debug!("connection task stopped");
    }

    async fn attempt_connect(&mut self) {
        self.close_sink().await;
        self.set_state(ConnectionState::Connecting);

        let (host, port) = (self.config.host.as_str(), self.config.port);
        info!("connecting to {host}:{port}");

        let result = match time::timeout(
            self.config.connect_timeout,
            self.connector.connect(host, port),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(NetworkError::Timeout(self.config.connect_timeout)),
        };

        match result {
            Ok(sink) => {
                self.sink = Some(sink);
                let period = self.config.heartbeat_interval;
                let mut heartbeat = time::interval_at(Instant::now() + period, period);
                heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.heartbeat = Some(heartbeat);
                self.set_state(ConnectionState::Connected);
                info!("connection to {host}:{port} established");
                self.observer.on_connection_established();
            }
            Err(e) => {
                warn!("could not connect to {host}:{port}: {e}");
                self.set_state(ConnectionState::Disconnected);
                self.observer.on_connection_lost();
                if self.retry_enabled {
                    let delay = self.config.heartbeat_interval;
                    debug!("retrying in {delay:?}");
                    self.retry_at = Some(Instant::now() + delay);
                }
            }
        }
    }

    async fn write(&mut self, bytes: &[u8]) {
        let Some(sink) = self.sink.as_mut() else {
            debug!("not connected; dropping {}-byte frame", bytes.len());
            return;
        };

        if let Err(e) = sink.write_frame(bytes).await {
            warn!("write failed, connection lost: {e}");
            self.close_sink().await;
            self.set_state(ConnectionState::Disconnected);
            self.observer.on_connection_lost();
            if self.retry_enabled {
                self.attempt_connect().await;
            }
        }
    }

    async fn stop_connection(&mut self) {
        self.retry_enabled = false;
        self.retry_at = None;
        self.close_sink().await;
        self.set_state(ConnectionState::Disconnected);
    }

    async fn close_sink(&mut self) {
        self.heartbeat = None;
        if let Some(mut sink) = self.sink.take() {
            sink.close().await;
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

/// Waits for the next heartbeat tick.  Only polled when `heartbeat` is set.
async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
