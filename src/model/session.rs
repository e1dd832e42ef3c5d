use serde::{Deserialize, Serialize};

use super::index::Index;
use super::path::TaskPath;

/// Pointer to the task being worked on. `halted` means the pointed-at
/// task is not actively clocked; the task name is kept so it can be
/// resumed. A fresh base directory starts with everything unset and
/// `halted` true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Current {
    pub group: Option<String>,
    pub subgroup: Option<String>,
    pub task: Option<String>,
    pub halted: bool,
}

impl Default for Current {
    fn default() -> Self {
        Current {
            group: None,
            subgroup: None,
            task: None,
            halted: true,
        }
    }
}

/// Stack of tasks that were displaced by switching to another task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousStack {
    entries: Vec<TaskPath>,
}

impl PreviousStack {
    pub fn new() -> Self {
        PreviousStack::default()
    }

    pub fn from_entries(entries: Vec<TaskPath>) -> Self {
        PreviousStack { entries }
    }

    pub fn entries(&self) -> &[TaskPath] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, path: TaskPath) {
        self.entries.push(path);
    }

    /// Remove every entry equal to `path`.
    pub fn remove(&mut self, path: &TaskPath) {
        self.entries.retain(|e| e != path);
    }

    pub fn pop(&mut self) -> Option<TaskPath> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&TaskPath> {
        self.entries.last()
    }

    /// Rewrite every entry equal to `from` (used when a task moves).
    pub fn replace(&mut self, from: &TaskPath, to: &TaskPath) {
        for entry in &mut self.entries {
            if entry == from {
                *entry = to.clone();
            }
        }
    }
}

/// Everything a command invocation needs besides the task files
/// themselves: the index and both task pointers, loaded once at
/// command start and rewritten whole at command end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub index: Index,
    pub current: Current,
    pub previous: PreviousStack,
}

impl Session {
    pub fn new(index: Index, current: Current, previous: PreviousStack) -> Self {
        Session {
            index,
            current,
            previous,
        }
    }

    /// The current triple with the task masked out while halted. This is
    /// the base the backward selector grammars default from.
    pub fn current_view(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        let task = if self.current.halted {
            None
        } else {
            self.current.task.as_deref()
        };
        (
            self.current.group.as_deref(),
            self.current.subgroup.as_deref(),
            task,
        )
    }

    /// The raw current task pointer, halted or not. This is what the
    /// `CURRENT` selector literal resolves to.
    pub fn current_task(&self) -> Option<&str> {
        self.current.task.as_deref()
    }

    /// The full current path when all three components are set.
    pub fn current_path(&self) -> Option<TaskPath> {
        match (&self.current.group, &self.current.subgroup, &self.current.task) {
            (Some(g), Some(s), Some(t)) => Some(TaskPath::new(g.clone(), s.clone(), t.clone())),
            _ => None,
        }
    }

    pub fn is_current(&self, path: &TaskPath) -> bool {
        self.current.group.as_deref() == Some(path.group.as_str())
            && self.current.subgroup.as_deref() == Some(path.subgroup.as_str())
            && self.current.task.as_deref() == Some(path.task.as_str())
    }

    pub fn set_current(&mut self, path: &TaskPath, halted: bool) {
        self.current = Current {
            group: Some(path.group.clone()),
            subgroup: Some(path.subgroup.clone()),
            task: Some(path.task.clone()),
            halted,
        };
    }

    /// Drop the task pointer, keeping the group and subgroup as context
    /// for later selector defaulting.
    pub fn clear_current_task(&mut self) {
        self.current.task = None;
        self.current.halted = true;
    }

    pub fn set_halted(&mut self, halted: bool) {
        self.current.halted = halted;
    }

    /// Index positions of the current group and subgroup, used to fill
    /// missing leading segments of a backward id selector. Unset or
    /// stale names yield null positions.
    pub fn current_positions(&self) -> (Option<usize>, Option<usize>) {
        let gi = self
            .current
            .group
            .as_deref()
            .and_then(|g| self.index.group_position(g));
        let si = match (gi, self.current.subgroup.as_deref()) {
            (Some(gi), Some(s)) => self.index.subgroup_position(gi, s),
            _ => None,
        };
        (gi, si)
    }
}
