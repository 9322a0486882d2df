//! In-memory commit log of pending mutations

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::sql::types::Row;

/// Number of most recent entries the log intends to keep after a commit
const RETENTION_LIMIT: usize = 10;

/// Kind of mutation recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    Insert,
    Update,
    Delete,
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CommandKind::Insert => "INSERT",
            CommandKind::Update => "UPDATE",
            CommandKind::Delete => "DELETE",
        })
    }
}

/// Command specific part of a log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogPayload {
    /// The row appended by an INSERT
    Inserted(Row),
    /// Rows touched by an UPDATE or DELETE
    Affected(usize),
}

/// One recorded mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub database: String,
    pub table: String,
    pub kind: CommandKind,
    pub payload: LogPayload,
}

/// Append-only buffer of entries awaiting COMMIT
#[derive(Debug, Default)]
pub struct CommitLog {
    entries: Vec<LogEntry>,
}

impl CommitLog {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn log(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Number of uncommitted entries
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Copy of the uncommitted entries in append order
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    /// Drains every pending entry, returning them in append order.
    pub fn commit(&mut self) -> Vec<LogEntry> {
        let flushed = std::mem::take(&mut self.entries);
        // TODO: compaction runs on the drained buffer and never trims anything;
        // decide whether the window should bound the log on `log` instead.
        self.compact();
        flushed
    }

    /// Keeps only the most recent `RETENTION_LIMIT` entries.
    fn compact(&mut self) {
        if self.entries.len() > RETENTION_LIMIT {
            self.entries.drain(..self.entries.len() - RETENTION_LIMIT);
        }
    }
}
