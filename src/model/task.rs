use std::fmt;

use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::time::{timestamp, timestamp_opt};

/// Lifecycle state of a task, derived from its data rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Todo,
    Doing,
    Halted,
    Concluded,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Todo => "TODO",
            TaskState::Doing => "DOING",
            TaskState::Halted => "HALTED",
            TaskState::Concluded => "CONCLUDED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One clock interval. An open interval (no `out` yet) means the task is
/// being worked on right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "in", with = "timestamp")]
    pub clock_in: NaiveDateTime,
    #[serde(rename = "out", with = "timestamp_opt", default)]
    pub clock_out: Option<NaiveDateTime>,
}

impl LogEntry {
    pub fn open(at: NaiveDateTime) -> Self {
        LogEntry {
            clock_in: at,
            clock_out: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// Length of a closed interval; `None` while the interval is open.
    pub fn span(&self) -> Option<Duration> {
        self.clock_out.map(|out| out - self.clock_in)
    }
}

/// The persisted record for one task. Unknown fields found in a task
/// file are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub logbook: Vec<LogEntry>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default, with = "timestamp_opt")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub concluded_at: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskData {
    pub fn new() -> Self {
        TaskData::default()
    }

    /// Derive the lifecycle state. Total: every record shape maps to
    /// exactly one state.
    pub fn state(&self) -> TaskState {
        if self.concluded_at.is_some() {
            return TaskState::Concluded;
        }
        match self.logbook.last() {
            Some(last) if last.is_open() => TaskState::Doing,
            Some(_) => TaskState::Halted,
            None => TaskState::Todo,
        }
    }

    /// Total time recorded in closed log entries.
    pub fn time_spent(&self) -> Duration {
        self.logbook
            .iter()
            .filter_map(LogEntry::span)
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    /// Merge a fetched record into this one. The logbook is never
    /// merged; properties merge key-wise, notes append, everything else
    /// present in the fetched record overwrites.
    pub fn merge(&mut self, fetched: TaskData) {
        if fetched.title.is_some() {
            self.title = fetched.title;
        }
        for (name, value) in fetched.properties {
            self.properties.insert(name, value);
        }
        self.notes.extend(fetched.notes);
        if fetched.created_at.is_some() {
            self.created_at = fetched.created_at;
        }
        if fetched.concluded_at.is_some() {
            self.concluded_at = fetched.concluded_at;
        }
        for (key, value) in fetched.extra {
            self.extra.insert(key, value);
        }
    }
}
