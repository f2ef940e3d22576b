//! Client Session
//!
//! A `Session` is the state scoped to one stream client: its command
//! handler (bound to the client's store) and its command log. It is created
//! when the connection is accepted and dropped when the connection ends,
//! taking the log with it.
//!
//! ## States
//!
//! ```text
//! Connected ──first request──> Serving ──QUIT──> Disconnected
//!     │                           │
//!     └──────── read fails ───────┴──> ClosedByPeer | ClosedOnError
//! ```
//!
//! Once a session reaches a terminal state it accepts no further requests.

use crate::commands::{CommandHandler, CommandLog, Response};
use crate::protocol::Command;
use std::net::SocketAddr;
use tracing::debug;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, no request processed yet
    Connected,
    /// Processing requests
    Serving,
    /// Ended by a QUIT that was acknowledged
    Disconnected,
    /// The peer closed the connection
    ClosedByPeer,
    /// A transport error ended the session
    ClosedOnError,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Disconnected | SessionState::ClosedByPeer | SessionState::ClosedOnError
        )
    }
}

/// State owned by one connected client.
#[derive(Debug)]
pub struct Session {
    /// Client's address (for logging)
    client: SocketAddr,
    /// Executes this session's commands against its store
    handler: CommandHandler,
    /// Verbs processed in this session
    log: CommandLog,
    state: SessionState,
}

impl Session {
    pub fn new(client: SocketAddr, handler: CommandHandler) -> Self {
        Self {
            client,
            handler,
            log: CommandLog::new(),
            state: SessionState::Connected,
        }
    }

    pub fn client(&self) -> SocketAddr {
        self.client
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    /// Decodes and executes one request.
    ///
    /// A session in a terminal state ignores the request and returns
    /// [`Response::Silent`].
    pub fn handle(&mut self, request: &str) -> Response {
        if self.state.is_terminal() {
            debug!(client = %self.client, state = ?self.state, "Request after session end ignored");
            return Response::Silent;
        }
        self.state = SessionState::Serving;

        let command = Command::parse(request);
        if let Command::Unknown { verb } = &command {
            debug!(client = %self.client, verb = %verb, "Ignoring unknown command");
        }

        let response = self.handler.execute(command, Some(&mut self.log));
        if response.ends_session() {
            self.state = SessionState::Disconnected;
        }
        response
    }

    /// Moves the session to a terminal state, unless it already is in one.
    pub fn close(&mut self, state: SessionState) {
        if !self.state.is_terminal() {
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::DISCONNECT_MESSAGE;
    use crate::storage::SharedStore;

    fn create_session() -> Session {
        let client = SocketAddr::from(([127, 0, 0, 1], 40000));
        Session::new(client, CommandHandler::new(SharedStore::new()))
    }

    #[test]
    fn test_lifecycle() {
        let mut session = create_session();
        assert_eq!(session.state(), SessionState::Connected);

        session.handle("PUT a 1");
        assert_eq!(session.state(), SessionState::Serving);

        let response = session.handle("QUIT");
        assert_eq!(response, Response::Disconnect(DISCONNECT_MESSAGE.to_string()));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_no_requests_after_quit() {
        let mut session = create_session();

        session.handle("QUIT");
        assert_eq!(session.handle("PUT a 1"), Response::Silent);
        assert!(session.handler().store().is_empty());
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn test_close_keeps_first_terminal_state() {
        let mut session = create_session();

        session.close(SessionState::ClosedByPeer);
        session.close(SessionState::ClosedOnError);
        assert_eq!(session.state(), SessionState::ClosedByPeer);
        assert_eq!(session.handle("KEYS"), Response::Silent);
    }

    #[test]
    fn test_statistics_scoped_to_session() {
        let store = SharedStore::new();
        let client = SocketAddr::from(([127, 0, 0, 1], 40001));
        let mut first = Session::new(client, CommandHandler::new(store.clone()));
        let mut second = Session::new(client, CommandHandler::new(store));

        first.handle("PUT a 1");
        first.handle("GET a");

        let report = second.handle("STATISTICS");
        assert_eq!(
            report.text(),
            Some("Command statistics:\nPUT: 0\nGET: 0\nDELETE: 0\nKEYS: 0\nQUIT: 0\n")
        );
    }
}
