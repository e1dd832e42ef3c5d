use chrono::NaiveDateTime;

use crate::model::task::{LogEntry, TaskData};
use crate::util::time;

/// Outcome of a clock edit. A logbook in the wrong shape for the edit
/// is not an error: callers report the outcome and carry on without
/// touching the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOutcome {
    Applied,
    AlreadyClockedIn,
    AlreadyClockedOut,
    NeverClocked,
    NotClockedIn,
    AlreadyConcluded,
}

impl ClockOutcome {
    pub fn applied(self) -> bool {
        matches!(self, ClockOutcome::Applied)
    }

    /// User-facing line for a skipped edit.
    pub fn message(self) -> Option<&'static str> {
        match self {
            ClockOutcome::Applied => None,
            ClockOutcome::AlreadyClockedIn => Some("Already clocked in."),
            ClockOutcome::AlreadyClockedOut => Some("Already clocked out."),
            ClockOutcome::NeverClocked => Some("Task has not been clocked yet."),
            ClockOutcome::NotClockedIn => Some("Was not clocked in."),
            ClockOutcome::AlreadyConcluded => Some("Already concluded."),
        }
    }
}

/// Open a new logbook entry. Clocking in on a concluded task reopens it
/// by dropping the conclusion timestamp.
pub fn clock_in(data: &mut TaskData, at: Option<NaiveDateTime>) -> ClockOutcome {
    if let Some(last) = data.logbook.last() {
        if last.is_open() {
            return ClockOutcome::AlreadyClockedIn;
        }
    }
    data.concluded_at = None;
    data.logbook.push(LogEntry::open(at.unwrap_or_else(time::now)));
    ClockOutcome::Applied
}

/// Close the open logbook entry.
pub fn clock_out(data: &mut TaskData, at: Option<NaiveDateTime>) -> ClockOutcome {
    let Some(last) = data.logbook.last_mut() else {
        return ClockOutcome::NeverClocked;
    };
    if !last.is_open() {
        return ClockOutcome::AlreadyClockedOut;
    }
    last.clock_out = Some(at.unwrap_or_else(time::now));
    ClockOutcome::Applied
}

/// Reopen the last logbook entry by discarding its clock-out time, so
/// new work is recorded as a continuation of the previous stretch.
pub fn clock_append(data: &mut TaskData) -> ClockOutcome {
    let Some(last) = data.logbook.last_mut() else {
        return ClockOutcome::NeverClocked;
    };
    if last.is_open() {
        return ClockOutcome::AlreadyClockedIn;
    }
    last.clock_out = None;
    ClockOutcome::Applied
}

/// Drop the open logbook entry as if it never happened.
pub fn clock_cancel(data: &mut TaskData) -> ClockOutcome {
    let Some(last) = data.logbook.last() else {
        return ClockOutcome::NeverClocked;
    };
    if !last.is_open() {
        return ClockOutcome::NotClockedIn;
    }
    data.logbook.pop();
    ClockOutcome::Applied
}

/// Mark the task concluded.
pub fn conclude(data: &mut TaskData, at: Option<NaiveDateTime>) -> ClockOutcome {
    if data.concluded_at.is_some() {
        return ClockOutcome::AlreadyConcluded;
    }
    data.concluded_at = Some(at.unwrap_or_else(time::now));
    ClockOutcome::Applied
}
