//! Operator counters shared by both transports.
//!
//! One `ConnectionStats` is created per [`Server`](crate::server::Server) and
//! handed to the stream listener and the datagram pool alike. Connection
//! counters only move on the stream side; datagram counters only on the
//! datagram side; requests and bytes are summed over both.
//!
//! This is not the per-session STATISTICS report. Nothing here is sent to
//! clients; the binary logs a [`StatsSnapshot`] at shutdown.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// TCP connections accepted since start
    pub connections_accepted: AtomicU64,
    /// TCP sessions still open
    pub active_connections: AtomicU64,
    /// UDP packets received, malformed ones included
    pub datagrams_received: AtomicU64,
    /// UDP reply packets sent
    pub datagrams_sent: AtomicU64,
    /// Requests handed to the command executor, both transports
    pub commands_processed: AtomicU64,
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,
}

/// A point-in-time copy of [`ConnectionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub connections_accepted: u64,
    pub active_connections: u64,
    pub datagrams_received: u64,
    pub datagrams_sent: u64,
    pub commands_processed: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tcp {}/{} open, udp {} in/{} out, {} commands, {}B in/{}B out",
            self.active_connections,
            self.connections_accepted,
            self.datagrams_received,
            self.datagrams_sent,
            self.commands_processed,
            self.bytes_read,
            self.bytes_written,
        )
    }
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A TCP session started.
    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// A TCP session ended, for whatever reason.
    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// A UDP packet of `bytes` arrived.
    pub fn datagram_received(&self, bytes: usize) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_read(bytes);
    }

    /// A UDP reply of `bytes` went out.
    pub fn datagram_sent(&self, bytes: usize) {
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_written(bytes);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Reads every counter. Counters are read one by one, so a snapshot
    /// taken under load may mix slightly different instants.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}
