//! Command Executor
//!
//! Applies a parsed [`Command`] to a store and produces the [`Response`] the
//! transport sends back.
//!
//! ## Outcome Handling
//!
//! Store operations never fail with an error. Every outcome, success or not,
//! maps to a fixed response text:
//!
//! | Command    | Outcome           | Response                                   |
//! |------------|-------------------|--------------------------------------------|
//! | PUT        | Success           | `Success: Key-Value Pair saved ...`        |
//! | PUT        | InvalidKeyChars   | `Error: Key contains invalid characters...`|
//! | PUT        | DuplicateKey      | `PUT request failed. Key: k already exists.`|
//! | PUT        | LengthExceeded    | `Error. Key and Value can not be long ...` |
//! | GET        | Found / NotFound  | `Success: Key found ...` / `Key not found` |
//! | DELETE     | Removed / NotFound| `Success: Key k removed ...` / `Key not found in the store.` |
//! | KEYS       | NonEmpty / Empty  | `Success! Keys: a:b` / `There are no keys in the store.` |
//! | STATISTICS | -                 | the session's report                       |
//! | QUIT       | -                 | `You have disconnected from the server!`   |
//! | unknown    | -                 | nothing is sent                            |
//!
//! ## Command Log
//!
//! Recognized commands are appended to the caller's [`CommandLog`], whatever
//! their outcome. STATISTICS is appended only under
//! [`StatisticsPolicy::IncludeSelf`], and then before the report is computed.
//! Unknown commands are never logged.
//!
//! A caller without a command log (the datagram transport) has no STATISTICS
//! support: the request is treated like an unknown command.

use crate::commands::stats::CommandLog;
use crate::config::StatisticsPolicy;
use crate::protocol::{Command, Verb};
use crate::storage::{InsertOutcome, KeysOutcome, LookupOutcome, RemoveOutcome, SharedStore};
use tracing::debug;

/// Acknowledgment sent in reply to QUIT.
pub const DISCONNECT_MESSAGE: &str = "You have disconnected from the server!";

/// Sent in place of a reply that does not fit in one transport message.
pub const OVERSIZED_REPLY_MESSAGE: &str = "Error. Response is too large to send.";

/// What the transport should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Send this text and keep serving.
    Reply(String),
    /// Send this text, then end the session.
    Disconnect(String),
    /// Send nothing and keep serving.
    Silent,
}

impl Response {
    /// The text to send, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Response::Reply(text) | Response::Disconnect(text) => Some(text),
            Response::Silent => None,
        }
    }

    /// Returns true if the session ends after this response.
    pub fn ends_session(&self) -> bool {
        matches!(self, Response::Disconnect(_))
    }
}

/// Executes commands against one store.
///
/// The handler is cheap to clone; clones operate on the same store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// The store this handler reads and mutates
    store: SharedStore,
    /// Whether STATISTICS counts itself
    policy: StatisticsPolicy,
}

impl CommandHandler {
    /// Creates a handler for `store` with the default statistics policy.
    pub fn new(store: SharedStore) -> Self {
        Self::with_policy(store, StatisticsPolicy::default())
    }

    /// Creates a handler for `store` with an explicit statistics policy.
    pub fn with_policy(store: SharedStore, policy: StatisticsPolicy) -> Self {
        Self { store, policy }
    }

    /// The store this handler operates on.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Executes a command and returns the response.
    ///
    /// # Arguments
    ///
    /// * `command` - The parsed command
    /// * `log` - The session's command log, or `None` when the transport has
    ///   no per-session state
    pub fn execute(&self, command: Command, log: Option<&mut CommandLog>) -> Response {
        match (command.verb(), log) {
            (None, _) => Response::Silent,
            (Some(Verb::Statistics), None) => Response::Silent,
            (Some(Verb::Statistics), Some(log)) => {
                if self.policy == StatisticsPolicy::IncludeSelf {
                    log.record(Verb::Statistics);
                }
                Response::Reply(log.report(self.policy))
            }
            (Some(verb), log) => {
                if let Some(log) = log {
                    log.record(verb);
                }
                self.dispatch(command)
            }
        }
    }

    /// Dispatches a store command to its handler.
    fn dispatch(&self, command: Command) -> Response {
        match command {
            Command::Put { key, value } => self.cmd_put(&key, &value),
            Command::Get { key } => self.cmd_get(&key),
            Command::Delete { key } => self.cmd_delete(&key),
            Command::Keys => self.cmd_keys(),
            Command::Quit => Response::Disconnect(DISCONNECT_MESSAGE.to_string()),
            Command::Stat | Command::Unknown { .. } => Response::Silent,
        }
    }

    /// PUT key value
    fn cmd_put(&self, key: &str, value: &str) -> Response {
        let outcome = self.store.insert(key, value);
        debug!(key = key, outcome = ?outcome, "PUT");

        let text = match outcome {
            InsertOutcome::Success => format!(
                "Success: Key-Value Pair saved on the server. Key: {}, Value: {}",
                key, value
            ),
            InsertOutcome::InvalidKeyChars => {
                "Error: Key contains invalid characters. Only letters and digits are allowed."
                    .to_string()
            }
            InsertOutcome::DuplicateKey => {
                format!("PUT request failed. Key: {} already exists.", key)
            }
            InsertOutcome::LengthExceeded => {
                "Error. Key and Value can not be long (max. 10 characters)".to_string()
            }
        };
        Response::Reply(text)
    }

    /// GET key
    fn cmd_get(&self, key: &str) -> Response {
        let text = match self.store.lookup(key) {
            LookupOutcome::Found(value) => {
                format!("Success: Key found in the store. Key: {}, Value: {}", key, value)
            }
            LookupOutcome::NotFound => {
                debug!(key = key, "GET on missing key");
                "Key not found".to_string()
            }
        };
        Response::Reply(text)
    }

    /// DELETE key
    fn cmd_delete(&self, key: &str) -> Response {
        let text = match self.store.remove(key) {
            RemoveOutcome::Removed => format!("Success: Key {} removed from the store", key),
            RemoveOutcome::NotFound => {
                debug!(key = key, "DELETE on missing key");
                "Key not found in the store.".to_string()
            }
        };
        Response::Reply(text)
    }

    /// KEYS
    fn cmd_keys(&self) -> Response {
        let text = match self.store.list_keys() {
            outcome @ KeysOutcome::NonEmpty(_) => format!("Success! Keys: {}", outcome.joined()),
            KeysOutcome::Empty => "There are no keys in the store.".to_string(),
        };
        Response::Reply(text)
    }
}
