//! Datagram Transport
//!
//! Serves requests that arrive as UDP packets. One packet carries one
//! request; the response goes back to the packet's source address as one
//! packet.
//!
//! ## Worker Pool
//!
//! ```text
//!               ┌───────────────────────┐
//!  packets ───> │ receive loop          │
//!               │ 1. acquire permit     │──── pool full? wait here,
//!               │ 2. recv_from          │     packets queue in the socket
//!               │ 3. spawn worker       │
//!               └──────────┬────────────┘
//!                          ▼
//!        ┌──────────┐ ┌──────────┐      ┌──────────┐
//!        │ worker 1 │ │ worker 2 │ .... │ worker N │   (N = datagram_workers)
//!        └────┬─────┘ └────┬─────┘      └────┬─────┘
//!             └────────────┼─────────────────┘
//!                          ▼
//!                 StoreRegistry -> SharedStore
//! ```
//!
//! The permit is taken *before* the next receive, so a saturated pool stops
//! reading instead of dropping packets.
//!
//! There is no per-client command log on this transport, so STATISTICS is
//! not available here and is ignored like an unknown verb.
//!
//! A reply longer than [`MAX_DATAGRAM_REPLY_LEN`] cannot go out as one UDP
//! packet; the client gets [`OVERSIZED_REPLY_MESSAGE`] instead.

use crate::commands::{CommandHandler, OVERSIZED_REPLY_MESSAGE};
use crate::config::StoreScope;
use crate::connection::registry::StoreRegistry;
use crate::connection::stats::ConnectionStats;
use crate::connection::sweeper::IdleSweeper;
use crate::protocol::Command;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM_REPLY_LEN: usize = 65_507;

/// Errors on the datagram transport.
#[derive(Debug, Error)]
pub enum DatagramError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid UTF-8 in datagram: {0}")]
    InvalidUtf8(String),
}

/// Serves the datagram transport with a bounded worker pool.
pub struct DatagramServer {
    socket: Arc<UdpSocket>,
    registry: Arc<StoreRegistry>,
    workers: Arc<Semaphore>,
    pool_size: usize,
    max_datagram_size: usize,
    idle_timeout: Option<Duration>,
    stats: Arc<ConnectionStats>,
}

impl DatagramServer {
    /// Creates a server over a bound socket.
    ///
    /// # Arguments
    ///
    /// * `socket` - The bound UDP socket
    /// * `registry` - Decides which store each client address uses
    /// * `workers` - Maximum number of datagrams processed at once
    /// * `max_datagram_size` - Receive buffer per packet; longer packets are truncated
    /// * `stats` - Shared connection statistics
    pub fn new(
        socket: UdpSocket,
        registry: StoreRegistry,
        workers: usize,
        max_datagram_size: usize,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            socket: Arc::new(socket),
            registry: Arc::new(registry),
            workers: Arc::new(Semaphore::new(workers)),
            pool_size: workers,
            max_datagram_size,
            idle_timeout: None,
            stats,
        }
    }

    /// Drops a per-client store once its client has sent nothing for
    /// `timeout`. `None` keeps stores until QUIT.
    ///
    /// Has no effect under [`StoreScope::Shared`].
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// The registry mapping client addresses to stores.
    pub fn registry(&self) -> &Arc<StoreRegistry> {
        &self.registry
    }

    /// Receives packets forever, handing each to a pooled worker.
    ///
    /// Receive failures are logged and skipped; they do not stop the loop.
    /// The idle sweeper, if any, runs for as long as this future does.
    pub async fn run(self) -> Result<(), DatagramError> {
        info!(
            addr = %self.socket.local_addr()?,
            workers = self.pool_size,
            store = %self.registry.scope(),
            "Datagram transport listening"
        );

        let _sweeper = match (self.registry.scope(), self.idle_timeout) {
            (StoreScope::PerClient, Some(timeout)) => {
                Some(IdleSweeper::start(Arc::clone(&self.registry), timeout))
            }
            _ => None,
        };

        loop {
            // The semaphore is owned here and never closed
            let Ok(permit) = Arc::clone(&self.workers).acquire_owned().await else {
                return Ok(());
            };

            let mut buf = vec![0u8; self.max_datagram_size];
            let (len, client) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "Failed to receive datagram");
                    continue;
                }
            };
            buf.truncate(len);
            self.stats.datagram_received(len);

            let socket = Arc::clone(&self.socket);
            let registry = Arc::clone(&self.registry);
            let stats = Arc::clone(&self.stats);

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = handle_datagram(&socket, &registry, &stats, client, &buf).await {
                    warn!(client = %client, error = %e, "Datagram request failed");
                }
            });
        }
    }
}

/// Executes one datagram request and sends its response, if any.
async fn handle_datagram(
    socket: &UdpSocket,
    registry: &StoreRegistry,
    stats: &ConnectionStats,
    client: SocketAddr,
    payload: &[u8],
) -> Result<(), DatagramError> {
    let request =
        std::str::from_utf8(payload).map_err(|e| DatagramError::InvalidUtf8(e.to_string()))?;

    let command = Command::parse(request);
    if let Command::Unknown { verb } = &command {
        debug!(client = %client, verb = %verb, "Ignoring unknown command");
    }

    let handler = CommandHandler::new(registry.acquire(client));
    let response = handler.execute(command, None);
    stats.command_processed();

    // Released before the acknowledgment goes out
    if response.ends_session() {
        registry.release(&client);
        info!(client = %client, "Client disconnected from the server");
    }

    if let Some(text) = response.text() {
        let reply = if text.len() > MAX_DATAGRAM_REPLY_LEN {
            warn!(client = %client, size = text.len(), "Reply too large for one datagram");
            OVERSIZED_REPLY_MESSAGE
        } else {
            text
        };
        let n = socket.send_to(reply.as_bytes(), client).await?;
        stats.datagram_sent(n);
    }

    Ok(())
}
