//! Command Parser
//!
//! Turns one request message into a typed [`Command`].
//!
//! ## Request Format
//!
//! A request is a verb followed by whitespace-separated arguments:
//!
//! ```text
//! PUT <key> <value>
//! GET <key>
//! DELETE <key>
//! KEYS
//! STATISTICS        (STAT is accepted too)
//! QUIT
//! ```
//!
//! Verbs are matched exactly, upper case. Parsing never fails:
//!
//! - a missing argument decodes to an empty string, which the store then
//!   rejects through its normal validation;
//! - extra arguments are ignored;
//! - anything that is not a known verb becomes [`Command::Unknown`].

use std::fmt;

/// The verbs a client can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Put,
    Get,
    Delete,
    Keys,
    Statistics,
    Quit,
}

impl Verb {
    /// Every verb, in statistics report order (STATISTICS last).
    pub const ALL: [Verb; 6] = [
        Verb::Put,
        Verb::Get,
        Verb::Delete,
        Verb::Keys,
        Verb::Quit,
        Verb::Statistics,
    ];

    /// Resolves a wire verb. Returns `None` for anything unrecognized.
    pub fn from_wire(verb: &str) -> Option<Verb> {
        match verb {
            "PUT" => Some(Verb::Put),
            "GET" => Some(Verb::Get),
            "DELETE" => Some(Verb::Delete),
            "KEYS" => Some(Verb::Keys),
            "STATISTICS" | "STAT" => Some(Verb::Statistics),
            "QUIT" => Some(Verb::Quit),
            _ => None,
        }
    }

    /// The canonical name, as shown in statistics reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Put => "PUT",
            Verb::Get => "GET",
            Verb::Delete => "DELETE",
            Verb::Keys => "KEYS",
            Verb::Statistics => "STATISTICS",
            Verb::Quit => "QUIT",
        }
    }

    /// Number of arguments the verb takes.
    pub fn arity(&self) -> usize {
        match self {
            Verb::Put => 2,
            Verb::Get | Verb::Delete => 1,
            Verb::Keys | Verb::Statistics | Verb::Quit => 0,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Keys,
    Stat,
    Quit,
    /// An unrecognized verb. The executor sends no response for it.
    Unknown { verb: String },
}

impl Command {
    /// Parses one request message.
    ///
    /// # Example
    ///
    /// ```
    /// use duokv::protocol::Command;
    ///
    /// let cmd = Command::parse("PUT name Ariz");
    /// assert_eq!(cmd, Command::Put { key: "name".into(), value: "Ariz".into() });
    ///
    /// assert_eq!(Command::parse("GET"), Command::Get { key: String::new() });
    /// ```
    pub fn parse(request: &str) -> Command {
        let (verb, args) = tokenize(request);
        let arg = |i: usize| args.get(i).map(|s| s.to_string()).unwrap_or_default();

        match Verb::from_wire(verb) {
            Some(Verb::Put) => Command::Put {
                key: arg(0),
                value: arg(1),
            },
            Some(Verb::Get) => Command::Get { key: arg(0) },
            Some(Verb::Delete) => Command::Delete { key: arg(0) },
            Some(Verb::Keys) => Command::Keys,
            Some(Verb::Statistics) => Command::Stat,
            Some(Verb::Quit) => Command::Quit,
            None => Command::Unknown {
                verb: verb.to_string(),
            },
        }
    }

    /// The verb of a recognized command, `None` for [`Command::Unknown`].
    pub fn verb(&self) -> Option<Verb> {
        match self {
            Command::Put { .. } => Some(Verb::Put),
            Command::Get { .. } => Some(Verb::Get),
            Command::Delete { .. } => Some(Verb::Delete),
            Command::Keys => Some(Verb::Keys),
            Command::Stat => Some(Verb::Statistics),
            Command::Quit => Some(Verb::Quit),
            Command::Unknown { .. } => None,
        }
    }
}

/// Splits a request into its verb and argument tokens.
///
/// The verb is everything up to the first run of whitespace; the rest is split
/// on whitespace. An empty or blank request yields an empty verb.
pub fn tokenize(request: &str) -> (&str, Vec<&str>) {
    let mut tokens = request.split_whitespace();
    let verb = tokens.next().unwrap_or("");
    (verb, tokens.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_put() {
        assert_eq!(
            Command::parse("PUT key value"),
            Command::Put {
                key: "key".to_string(),
                value: "value".to_string()
            }
        );
    }

    #[test]
    fn test_parse_single_key_commands() {
        assert_eq!(Command::parse("GET key"), Command::Get { key: "key".to_string() });
        assert_eq!(Command::parse("DELETE key"), Command::Delete { key: "key".to_string() });
    }

    #[test]
    fn test_parse_no_arg_commands() {
        assert_eq!(Command::parse("KEYS"), Command::Keys);
        assert_eq!(Command::parse("QUIT"), Command::Quit);
        assert_eq!(Command::parse("STATISTICS"), Command::Stat);
        assert_eq!(Command::parse("STAT"), Command::Stat);
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(
            Command::parse("  PUT \t key   value\r\n"),
            Command::Put {
                key: "key".to_string(),
                value: "value".to_string()
            }
        );
    }

    #[test]
    fn test_missing_arguments_decode_empty() {
        assert_eq!(
            Command::parse("PUT key"),
            Command::Put {
                key: "key".to_string(),
                value: String::new()
            }
        );
        assert_eq!(
            Command::parse("PUT"),
            Command::Put {
                key: String::new(),
                value: String::new()
            }
        );
        assert_eq!(Command::parse("DELETE"), Command::Delete { key: String::new() });
    }

    #[test]
    fn test_extra_arguments_ignored() {
        assert_eq!(Command::parse("GET a b c"), Command::Get { key: "a".to_string() });
        assert_eq!(Command::parse("KEYS everything"), Command::Keys);
    }

    #[test]
    fn test_unknown_verbs() {
        assert_eq!(
            Command::parse("get key"),
            Command::Unknown {
                verb: "get".to_string()
            }
        );
        assert_eq!(
            Command::parse("FLUSH"),
            Command::Unknown {
                verb: "FLUSH".to_string()
            }
        );
        assert_eq!(Command::parse(""), Command::Unknown { verb: String::new() });
        assert_eq!(Command::parse("   "), Command::Unknown { verb: String::new() });
        assert_eq!(Command::parse("FLUSH").verb(), None);
    }

    #[test]
    fn test_verb_round_trip() {
        for verb in Verb::ALL {
            assert_eq!(Verb::from_wire(verb.as_str()), Some(verb));
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("PUT a b"), ("PUT", vec!["a", "b"]));
        assert_eq!(tokenize("KEYS"), ("KEYS", vec![]));
        assert_eq!(tokenize(""), ("", vec![]));
    }
}
