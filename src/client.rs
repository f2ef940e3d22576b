//! Client Helpers
//!
//! Minimal async clients for both transports. Requests are checked before
//! they are sent: the verb must be known, PUT takes exactly two arguments,
//! GET and DELETE exactly one. A request that fails these checks is never
//! sent.
//!
//! [`StreamClient::send`] and [`DatagramClient::send`] skip the checks and
//! write the message as-is.

use crate::protocol::{encode_frame, parse_frame, tokenize, FrameError, Verb};
use bytes::BytesMut;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs, UdpSocket};

/// Receive buffer for one datagram response.
const DATAGRAM_RECV_SIZE: usize = 64 * 1024;

/// Errors a client can hit.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("invalid input. Format: {0}")]
    InvalidArguments(&'static str),

    #[error("server closed the connection")]
    ConnectionClosed,

    #[error("invalid UTF-8 in response: {0}")]
    InvalidUtf8(String),
}

/// Checks a request before it is sent.
///
/// `allow_statistics` is false for the datagram transport, which has no
/// STATISTICS support.
///
/// # Example
///
/// ```
/// use duokv::client::validate_request;
/// use duokv::protocol::Verb;
///
/// assert_eq!(validate_request("GET key", true).unwrap(), Verb::Get);
/// assert!(validate_request("GET", true).is_err());
/// assert!(validate_request("STATISTICS", false).is_err());
/// ```
pub fn validate_request(request: &str, allow_statistics: bool) -> Result<Verb, ClientError> {
    let (verb_text, args) = tokenize(request);

    let verb = match Verb::from_wire(verb_text) {
        Some(Verb::Statistics) if !allow_statistics => None,
        other => other,
    }
    .ok_or_else(|| ClientError::InvalidAction(verb_text.to_string()))?;

    let usage = match verb {
        Verb::Put => "PUT <key> <value>",
        Verb::Get => "GET <key>",
        Verb::Delete => "DELETE <key>",
        Verb::Keys | Verb::Statistics | Verb::Quit => return Ok(verb),
    };

    if args.len() != verb.arity() {
        return Err(ClientError::InvalidArguments(usage));
    }
    Ok(verb)
}

/// A client for the stream transport.
pub struct StreamClient {
    stream: TcpStream,
    buffer: BytesMut,
}

impl StreamClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
        })
    }

    /// Validates `request`, sends it, and waits for the response.
    pub async fn request(&mut self, request: &str) -> Result<String, ClientError> {
        validate_request(request, true)?;
        self.send(request).await?;
        self.recv().await
    }

    /// Sends one framed message without validation.
    pub async fn send(&mut self, message: &str) -> Result<(), ClientError> {
        let frame = encode_frame(message)?;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Waits for one framed response.
    pub async fn recv(&mut self) -> Result<String, ClientError> {
        loop {
            if let Some((text, consumed)) = parse_frame(&self.buffer)? {
                let _ = self.buffer.split_to(consumed);
                return Ok(text);
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                return Err(ClientError::ConnectionClosed);
            }
        }
    }
}

/// A client for the datagram transport.
pub struct DatagramClient {
    socket: UdpSocket,
}

impl DatagramClient {
    /// Binds an ephemeral local port and targets `server`.
    pub async fn connect(server: SocketAddr) -> Result<Self, ClientError> {
        let local: SocketAddr = if server.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    /// Validates `request`, sends it, and waits for the response.
    pub async fn request(&self, request: &str) -> Result<String, ClientError> {
        validate_request(request, false)?;
        self.send(request).await?;
        self.recv().await
    }

    /// Sends one message without validation.
    pub async fn send(&self, message: &str) -> Result<(), ClientError> {
        self.send_bytes(message.as_bytes()).await
    }

    /// Sends a raw payload.
    pub async fn send_bytes(&self, payload: &[u8]) -> Result<(), ClientError> {
        self.socket.send(payload).await?;
        Ok(())
    }

    /// Waits for one response packet.
    pub async fn recv(&self) -> Result<String, ClientError> {
        let mut buf = vec![0u8; DATAGRAM_RECV_SIZE];
        let len = self.socket.recv(&mut buf).await?;
        buf.truncate(len);
        String::from_utf8(buf).map_err(|e| ClientError::InvalidUtf8(e.to_string()))
    }
}
