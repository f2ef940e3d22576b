//! Per-Session Command Log
//!
//! Records the verbs a session has processed, in order, and derives the
//! STATISTICS report from them. A log belongs to exactly one session and is
//! dropped with it; nothing here is process-wide.

use crate::config::StatisticsPolicy;
use crate::protocol::Verb;
use std::fmt::Write;

/// Verbs listed in every report, in report order.
pub const REPORTED_VERBS: [Verb; 5] = [Verb::Put, Verb::Get, Verb::Delete, Verb::Keys, Verb::Quit];

/// First line of a statistics report.
pub const REPORT_HEADER: &str = "Command statistics:";

/// Ordered record of processed verbs.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Vec<Verb>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a processed verb.
    pub fn record(&mut self, verb: Verb) {
        self.entries.push(verb);
    }

    /// Number of times `verb` was recorded.
    pub fn count(&self, verb: Verb) -> usize {
        self.entries.iter().filter(|v| **v == verb).count()
    }

    /// Total number of recorded verbs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the report: a header line, then one `VERB: n` line per verb.
    ///
    /// The STATISTICS line only appears under [`StatisticsPolicy::IncludeSelf`].
    ///
    /// # Example
    ///
    /// ```
    /// use duokv::commands::CommandLog;
    /// use duokv::config::StatisticsPolicy;
    /// use duokv::protocol::Verb;
    ///
    /// let mut log = CommandLog::new();
    /// log.record(Verb::Put);
    /// let report = log.report(StatisticsPolicy::ExcludeSelf);
    /// assert!(report.contains("PUT: 1\n"));
    /// ```
    pub fn report(&self, policy: StatisticsPolicy) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(REPORT_HEADER);
        out.push('\n');

        for verb in REPORTED_VERBS {
            let _ = writeln!(out, "{}: {}", verb, self.count(verb));
        }

        if policy == StatisticsPolicy::IncludeSelf {
            let _ = writeln!(out, "{}: {}", Verb::Statistics, self.count(Verb::Statistics));
        }

        out
    }
}
