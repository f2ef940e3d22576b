//! Stream Connection Handler
//!
//! This module drives one TCP client. Each client gets its own handler task
//! that runs in a loop, reading framed requests and sending framed responses.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. Session created, bound to the client's store
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read bytes from socket  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Decode length-prefixed  │ │
//!    │  │ frame                   │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Execute in session      │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Send response (if any)  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │   [QUIT? stop : loop back]   │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. QUIT acknowledged / client disconnects / transport error
//!        │
//!        ▼
//! 5. Handler task ends, session and its log are dropped
//! ```
//!
//! ## Buffer Management
//!
//! We use a BytesMut buffer to accumulate incoming data. TCP is a stream
//! protocol, so a read may deliver part of a frame or several frames at once.
//! Every complete frame is drained before the next read, so the buffer never
//! holds more than one partial frame.
//!
//! ## Oversized Replies
//!
//! A reply longer than a frame can carry (a KEYS listing on a very large
//! store) is replaced by [`OVERSIZED_REPLY_MESSAGE`] and the session keeps
//! serving.

use crate::commands::{CommandHandler, OVERSIZED_REPLY_MESSAGE};
use crate::connection::session::{Session, SessionState};
use crate::connection::stats::ConnectionStats;
use crate::protocol::frame::{encode_frame, parse_frame, FrameError, MAX_FRAME_LEN};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Handles a single client connection.
///
/// Generic over the byte stream so sessions can be driven by a `TcpStream`
/// or by an in-memory mock.
pub struct ConnectionHandler<S> {
    /// The byte stream for this connection
    stream: BufWriter<S>,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The client's session state
    session: Session,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The byte stream for this connection
    /// * `addr` - The client's socket address
    /// * `command_handler` - Executes commands against this client's store
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            session: Session::new(addr, command_handler),
            stats,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Reads requests, executes them, and sends back responses until the
    /// client sends QUIT, disconnects, or an error occurs. Returns the
    /// session's final state.
    pub async fn run(mut self) -> SessionState {
        let client = self.session.client();
        info!(client = %client, "Client connected");

        match self.main_loop().await {
            Ok(()) => info!(client = %client, "Client disconnected from the server"),
            Err(ConnectionError::ClientDisconnected) => {
                self.session.close(SessionState::ClosedByPeer);
                info!(client = %client, "Client closed the connection");
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                self.session.close(SessionState::ClosedByPeer);
                debug!(client = %client, "Connection reset by client");
            }
            Err(e) => {
                self.session.close(SessionState::ClosedOnError);
                warn!(client = %client, error = %e, "Connection error");
            }
        }

        self.stats.connection_closed();
        self.session.state()
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            // Drain every complete frame before reading again
            while let Some(request) = self.try_parse_frame()? {
                let response = self.session.handle(&request);
                self.stats.command_processed();

                if let Some(text) = response.text() {
                    self.send_response(text).await?;
                }

                if response.ends_session() {
                    return Ok(());
                }
            }

            // Need more data - read from the socket
            self.read_more_data().await?;
        }
    }

    /// Attempts to decode a request frame from the buffer.
    fn try_parse_frame(&mut self) -> Result<Option<String>, ConnectionError> {
        match parse_frame(&self.buffer) {
            Ok(Some((request, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.session.client(),
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed request"
                );
                Ok(Some(request))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(client = %self.session.client(), error = %e, "Malformed frame");
                Err(ConnectionError::FrameError(e))
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            // Connection closed by client
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                // Partial frame in buffer
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.session.client(), bytes = n, "Read data");

        Ok(())
    }

    /// Sends one framed response to the client.
    async fn send_response(&mut self, text: &str) -> Result<(), ConnectionError> {
        let text = if text.len() > MAX_FRAME_LEN {
            warn!(
                client = %self.session.client(),
                size = text.len(),
                "Reply too large for one frame"
            );
            OVERSIZED_REPLY_MESSAGE
        } else {
            text
        };

        let bytes = encode_frame(text)?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.session.client(),
            bytes = bytes.len(),
            "Sent response"
        );
        Ok(())
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed frame
    #[error("Frame error: {0}")]
    FrameError(#[from] FrameError),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial frame)
    #[error("Unexpected end of stream")]
    UnexpectedEof,
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) -> SessionState
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    ConnectionHandler::new(stream, addr, command_handler, stats)
        .run()
        .await
}
