//! TCP transport with Nagle's algorithm disabled.
//!
//! Frames are a handful of bytes each and latency matters more than
//! throughput, so every stream is opened with `TCP_NODELAY`.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info};

use super::{Connector, FrameSink, NetworkError};

/// Opens real TCP connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn FrameSink>, NetworkError> {
        let addrs: Vec<_> = lookup_host((host, port))
            .await
            .map_err(|e| NetworkError::Resolve {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(NetworkError::Resolve {
                host: host.to_string(),
                reason: "no addresses returned".to_string(),
            });
        }

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    info!("connected to {addr}");
                    return Ok(Box::new(TcpSink { stream }));
                }
                Err(e) => {
                    debug!("connect to {addr} failed: {e}");
                    last_error = Some(NetworkError::Connect {
                        addr: addr.to_string(),
                        source: e,
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| NetworkError::Resolve {
            host: host.to_string(),
            reason: "no addresses returned".to_string(),
        }))
    }
}

/// Write half of an open TCP connection.
struct TcpSink {
    stream: TcpStream,
}

#[async_trait]
impl FrameSink for TcpSink {
    async fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        // `write_all` loops until the kernel has accepted every byte, so a
        // frame is never split by another frame.
        self.stream.write_all(frame).await
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("error while closing connection: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
