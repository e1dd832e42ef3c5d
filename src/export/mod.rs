//! Export drivers and output formats.
//!
//! An [`Exporter`] receives begin/group/subgroup/task/end events while the
//! driver walks the index in positional order. Built-in formats are listed
//! in [`Format`]; unknown format names fall back to external executables
//! under `.exporters/` in the base directory.

pub mod daily;
pub mod external;
pub mod json;
pub mod org;
pub mod text;

use std::io;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::io::store::{Store, StoreError};
use crate::model::{Scope, Session, TaskData, TaskPath};

pub use daily::DailyExporter;
pub use external::ExternalExporter;
pub use json::JsonExporter;
pub use org::OrgExporter;
pub use text::TextExporter;

// ---------------------------------------------------------------------------
// Errors

/// Error type for export operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no such export format: {0}")]
    UnknownFormat(String),

    #[error("task not found in index")]
    TaskNotFound,

    #[error("`{0}` returned with non-zero code, aborting")]
    ExporterFailed(PathBuf),

    #[error("could not execute `{path}`: {source}")]
    Spawn {
        path: PathBuf,
        source: io::Error,
    },

    #[error("could not write export output: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Options and filters

/// Presentation switches shared by the built-in exporters. Each format
/// consults the subset that applies to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Include fields that are normally elided.
    pub verbose: bool,
    /// Include concluded tasks in listings.
    pub concluded: bool,
    /// One-line task headers.
    pub compact: bool,
    /// Status listing: trimmed output focused on the clock.
    pub status: bool,
    /// Accumulate a grand total of time spent.
    pub sum: bool,
    /// Emit ANSI colors.
    pub color: bool,
}

/// Data filters applied by the driver before a task reaches an exporter.
#[derive(Debug, Default)]
pub struct ExportFilters {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub where_prop: Option<(String, Regex)>,
}

impl ExportFilters {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.where_prop.is_none()
    }

    /// Applies the filters to task data in place. Returns false when the
    /// task should be dropped entirely: a property filter that does not
    /// match, or a time window that leaves the logbook empty.
    pub fn apply(&self, data: &mut TaskData) -> bool {
        if let Some((name, pattern)) = &self.where_prop {
            match data.properties.get(name) {
                Some(value) if pattern.is_match(value) => {}
                _ => return false,
            }
        }
        if self.from.is_some() || self.to.is_some() {
            data.logbook.retain(|entry| {
                let starts_in_window = self.to.map_or(true, |to| entry.clock_in <= to);
                let ends_in_window = self.from.map_or(true, |from| {
                    entry.clock_out.map_or(true, |out| out >= from)
                });
                starts_in_window && ends_in_window
            });
            if data.logbook.is_empty() {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Exporter interface

/// A task positioned in the index, handed to [`Exporter::task`].
#[derive(Debug)]
pub struct TaskEntry<'a> {
    pub group: &'a str,
    pub group_id: usize,
    pub subgroup: &'a str,
    pub subgroup_id: usize,
    pub task: &'a str,
    pub task_id: usize,
    pub data: &'a TaskData,
}

impl TaskEntry<'_> {
    /// Selector string for this task, with `.` standing in for the root
    /// group and subgroup.
    pub fn selector(&self) -> String {
        crate::model::path::display_triple(
            Some(self.group),
            Some(self.subgroup),
            Some(self.task),
        )
    }
}

/// Receives the index walk. Every format implements the same five events;
/// formats that do not care about a level leave its handler empty.
pub trait Exporter {
    fn begin(&mut self) -> Result<(), ExportError>;
    fn group(&mut self, name: &str, id: usize) -> Result<(), ExportError>;
    fn subgroup(&mut self, group: &str, group_id: usize, name: &str, id: usize)
    -> Result<(), ExportError>;
    fn task(&mut self, entry: &TaskEntry<'_>) -> Result<(), ExportError>;
    fn end(&mut self) -> Result<(), ExportError>;
}

// ---------------------------------------------------------------------------
// Format registry

/// The built-in export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Colored terminal listing, also used by the status command.
    Text,
    /// Emacs org-mode outline.
    Org,
    /// Time report grouped by day.
    Daily,
    /// Machine-readable task records.
    Json,
}

impl Format {
    /// Looks up a built-in format by name. Unknown names are candidates
    /// for external exporters.
    pub fn from_name(name: &str) -> Option<Format> {
        match name {
            "text" | "txt" => Some(Format::Text),
            "org" => Some(Format::Org),
            "daily" => Some(Format::Daily),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    pub fn exporter(
        self,
        out: Box<dyn io::Write>,
        options: ExportOptions,
    ) -> Box<dyn Exporter> {
        match self {
            Format::Text => Box::new(TextExporter::new(out, options)),
            Format::Org => Box::new(OrgExporter::new(out, options)),
            Format::Daily => Box::new(DailyExporter::new(out, options)),
            Format::Json => Box::new(JsonExporter::new(out, options)),
        }
    }
}

// ---------------------------------------------------------------------------
// Driver

/// Walks some portion of the index and feeds it to an exporter.
pub struct Driver<'a> {
    store: &'a Store,
    session: &'a Session,
    filters: &'a ExportFilters,
}

impl<'a> Driver<'a> {
    pub fn new(store: &'a Store, session: &'a Session, filters: &'a ExportFilters) -> Self {
        Driver {
            store,
            session,
            filters,
        }
    }

    /// Exports the scope a forward selector resolved to. An explicit task
    /// must exist in the index; group and subgroup scopes may be empty.
    pub fn export_scope(
        &self,
        exporter: &mut dyn Exporter,
        scope: &Scope,
        all: bool,
    ) -> Result<(), ExportError> {
        exporter.begin()?;
        if all {
            self.export_all(exporter)?;
        } else {
            match (&scope.group, &scope.subgroup, &scope.task) {
                (Some(group), Some(subgroup), Some(task)) => {
                    let path = TaskPath::new(group.as_str(), subgroup.as_str(), task.as_str());
                    if !self.export_task(exporter, &path)? {
                        return Err(ExportError::TaskNotFound);
                    }
                }
                (Some(group), Some(subgroup), None) => {
                    self.export_subgroup(exporter, group, subgroup)?;
                }
                (Some(group), None, None) => {
                    self.export_group(exporter, group)?;
                }
                _ => self.export_all(exporter)?,
            }
        }
        exporter.end()
    }

    /// Status listing: the current task first, then the previous stack
    /// from the top down. A limit of zero means no limit; otherwise it
    /// counts the listed tasks, current one included.
    pub fn export_status(
        &self,
        exporter: &mut dyn Exporter,
        limit: usize,
    ) -> Result<(), ExportError> {
        exporter.begin()?;
        if let Some(path) = self.session.current_path() {
            self.export_task(exporter, &path)?;
        }
        for (listed, path) in self.session.previous.entries().iter().rev().enumerate() {
            if limit > 0 && listed == limit - 1 {
                break;
            }
            self.export_task(exporter, path)?;
        }
        exporter.end()
    }

    pub fn export_all(&self, exporter: &mut dyn Exporter) -> Result<(), ExportError> {
        for group_id in 0..self.session.index.groups.len() {
            self.emit_group(exporter, group_id)?;
        }
        Ok(())
    }

    pub fn export_group(
        &self,
        exporter: &mut dyn Exporter,
        group: &str,
    ) -> Result<(), ExportError> {
        for (group_id, node) in self.session.index.groups.iter().enumerate() {
            if node.name == group {
                self.emit_group(exporter, group_id)?;
            }
        }
        Ok(())
    }

    pub fn export_subgroup(
        &self,
        exporter: &mut dyn Exporter,
        group: &str,
        subgroup: &str,
    ) -> Result<(), ExportError> {
        for (group_id, group_node) in self.session.index.groups.iter().enumerate() {
            if group_node.name != group {
                continue;
            }
            for (subgroup_id, subgroup_node) in group_node.subgroups.iter().enumerate() {
                if subgroup_node.name == subgroup {
                    self.emit_subgroup(exporter, group_id, subgroup_id, true)?;
                }
            }
        }
        Ok(())
    }

    /// Exports a single task, with headers for whatever non-root levels
    /// contain it. Returns false when the task is not in the index.
    pub fn export_task(
        &self,
        exporter: &mut dyn Exporter,
        path: &TaskPath,
    ) -> Result<bool, ExportError> {
        for (group_id, group_node) in self.session.index.groups.iter().enumerate() {
            if group_node.name != path.group {
                continue;
            }
            for (subgroup_id, subgroup_node) in group_node.subgroups.iter().enumerate() {
                if subgroup_node.name != path.subgroup {
                    continue;
                }
                for (task_id, slot) in subgroup_node.tasks.iter().enumerate() {
                    if slot.as_deref() == Some(path.task.as_str()) {
                        self.emit_task(exporter, group_id, subgroup_id, task_id, true)?;
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    fn emit_group(&self, exporter: &mut dyn Exporter, group_id: usize) -> Result<(), ExportError> {
        let group_node = &self.session.index.groups[group_id];
        if group_id > 0 {
            exporter.group(&group_node.name, group_id)?;
        }
        for subgroup_id in 0..group_node.subgroups.len() {
            self.emit_subgroup(exporter, group_id, subgroup_id, false)?;
        }
        Ok(())
    }

    fn emit_subgroup(
        &self,
        exporter: &mut dyn Exporter,
        group_id: usize,
        subgroup_id: usize,
        headers: bool,
    ) -> Result<(), ExportError> {
        let group_node = &self.session.index.groups[group_id];
        let subgroup_node = &group_node.subgroups[subgroup_id];
        if headers && group_id > 0 {
            exporter.group(&group_node.name, group_id)?;
        }
        if subgroup_id > 0 {
            exporter.subgroup(&group_node.name, group_id, &subgroup_node.name, subgroup_id)?;
        }
        for task_id in 0..subgroup_node.tasks.len() {
            self.emit_task(exporter, group_id, subgroup_id, task_id, false)?;
        }
        Ok(())
    }

    fn emit_task(
        &self,
        exporter: &mut dyn Exporter,
        group_id: usize,
        subgroup_id: usize,
        task_id: usize,
        headers: bool,
    ) -> Result<(), ExportError> {
        let group_node = &self.session.index.groups[group_id];
        let subgroup_node = &group_node.subgroups[subgroup_id];
        // Removed tasks leave a null slot behind so ids stay stable.
        let Some(task) = &subgroup_node.tasks[task_id] else {
            return Ok(());
        };
        if headers {
            if group_id > 0 {
                exporter.group(&group_node.name, group_id)?;
            }
            if subgroup_id > 0 {
                exporter.subgroup(
                    &group_node.name,
                    group_id,
                    &subgroup_node.name,
                    subgroup_id,
                )?;
            }
        }
        let path = TaskPath::new(
            group_node.name.as_str(),
            subgroup_node.name.as_str(),
            task.as_str(),
        );
        let mut data = self.store.load(&path)?;
        if !self.filters.apply(&mut data) {
            return Ok(());
        }
        exporter.task(&TaskEntry {
            group: &group_node.name,
            group_id,
            subgroup: &subgroup_node.name,
            subgroup_id,
            task,
            task_id,
            data: &data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::model::LogEntry;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn data_with_entry(clock_in: &str, clock_out: Option<&str>) -> TaskData {
        let mut data = TaskData::new();
        data.logbook.push(LogEntry {
            clock_in: dt(clock_in),
            clock_out: clock_out.map(dt),
        });
        data
    }

    #[test]
    fn format_lookup_by_name() {
        assert_eq!(Format::from_name("text"), Some(Format::Text));
        assert_eq!(Format::from_name("txt"), Some(Format::Text));
        assert_eq!(Format::from_name("org"), Some(Format::Org));
        assert_eq!(Format::from_name("daily"), Some(Format::Daily));
        assert_eq!(Format::from_name("json"), Some(Format::Json));
        assert_eq!(Format::from_name("dot"), None);
    }

    #[test]
    fn where_filter_matches_property_value() {
        let filters = ExportFilters {
            where_prop: Some(("kind".into(), Regex::new("^bug").unwrap())),
            ..ExportFilters::default()
        };
        let mut data = TaskData::new();
        data.properties.insert("kind".into(), "bugfix".into());
        assert!(filters.apply(&mut data.clone()));

        data.properties.insert("kind".into(), "feature".into());
        assert!(!filters.apply(&mut data));

        let mut bare = TaskData::new();
        assert!(!filters.apply(&mut bare));
    }

    #[test]
    fn time_window_drops_entries_outside_it() {
        let filters = ExportFilters {
            from: Some(dt("2024-03-10 00:00:00")),
            to: Some(dt("2024-03-11 00:00:00")),
            ..ExportFilters::default()
        };
        let mut data = data_with_entry("2024-03-10 09:00:00", Some("2024-03-10 10:00:00"));
        data.logbook.push(LogEntry {
            clock_in: dt("2024-03-01 09:00:00"),
            clock_out: Some(dt("2024-03-01 10:00:00")),
        });
        assert!(filters.apply(&mut data));
        assert_eq!(data.logbook.len(), 1);
        assert_eq!(
            data.logbook[0].clock_in.date(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn time_window_keeps_open_and_overlapping_entries() {
        let filters = ExportFilters {
            from: Some(dt("2024-03-10 00:00:00")),
            ..ExportFilters::default()
        };
        // Open entry started before the window but still running.
        let mut open = data_with_entry("2024-03-01 09:00:00", None);
        assert!(filters.apply(&mut open));
        // Closed entry that ends inside the window.
        let mut overlap = data_with_entry("2024-03-09 23:00:00", Some("2024-03-10 01:00:00"));
        assert!(filters.apply(&mut overlap));
        // Closed entry entirely before the window.
        let mut old = data_with_entry("2024-03-01 09:00:00", Some("2024-03-01 10:00:00"));
        assert!(!filters.apply(&mut old));
    }

    #[test]
    fn empty_filters_change_nothing() {
        let filters = ExportFilters::default();
        assert!(filters.is_empty());
        let mut data = data_with_entry("2024-03-10 09:00:00", None);
        assert!(filters.apply(&mut data));
        assert_eq!(data.logbook.len(), 1);
    }

    #[test]
    fn task_entry_selector_uses_root_dots() {
        let data = TaskData::new();
        let entry = TaskEntry {
            group: "",
            group_id: 0,
            subgroup: "",
            subgroup_id: 0,
            task: "alpha",
            task_id: 0,
            data: &data,
        };
        assert_eq!(entry.selector(), "././alpha");
    }
}
