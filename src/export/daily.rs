//! Time report grouped by day, most recent first. Collects clock
//! intervals while the index is walked and renders them all at the end.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use colored::Colorize;

use crate::util::time::{self, format_hms, format_timestamp};

use super::{ExportError, ExportOptions, Exporter, TaskEntry};

fn day_style(s: &str, color: bool) -> String {
    if color { s.blue().dimmed().to_string() } else { s.to_string() }
}

fn selector_style(s: &str, color: bool) -> String {
    if color { s.red().dimmed().to_string() } else { s.to_string() }
}

fn title_style(s: &str, color: bool) -> String {
    if color { s.green().dimmed().to_string() } else { s.to_string() }
}

fn span_style(s: &str, color: bool) -> String {
    if color { s.cyan().to_string() } else { s.to_string() }
}

struct DayEntry {
    clock_in: NaiveDateTime,
    clock_out: Option<NaiveDateTime>,
    selector: String,
    title: String,
}

impl DayEntry {
    /// Span of the interval; open intervals run until `now`.
    fn span(&self, now: NaiveDateTime) -> Duration {
        match self.clock_out {
            Some(out) => out - self.clock_in,
            None => now - self.clock_in,
        }
    }
}

pub struct DailyExporter<W: Write> {
    out: W,
    options: ExportOptions,
    days: BTreeMap<NaiveDate, Vec<DayEntry>>,
}

impl<W: Write> DailyExporter<W> {
    pub fn new(out: W, options: ExportOptions) -> Self {
        DailyExporter {
            out,
            options,
            days: BTreeMap::new(),
        }
    }
}

impl<W: Write> Exporter for DailyExporter<W> {
    fn begin(&mut self) -> Result<(), ExportError> {
        Ok(())
    }

    fn group(&mut self, _name: &str, _id: usize) -> Result<(), ExportError> {
        Ok(())
    }

    fn subgroup(
        &mut self,
        _group: &str,
        _group_id: usize,
        _name: &str,
        _id: usize,
    ) -> Result<(), ExportError> {
        Ok(())
    }

    // Concluded tasks stay in: this is a report of time spent, not a
    // listing of open work.
    fn task(&mut self, entry: &TaskEntry<'_>) -> Result<(), ExportError> {
        if entry.data.logbook.is_empty() {
            return Ok(());
        }
        let selector = entry.selector();
        let title = entry.data.title.clone().unwrap_or_default();
        for log in &entry.data.logbook {
            self.days
                .entry(log.clock_in.date())
                .or_default()
                .push(DayEntry {
                    clock_in: log.clock_in,
                    clock_out: log.clock_out,
                    selector: selector.clone(),
                    title: title.clone(),
                });
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), ExportError> {
        let now = time::now();
        let color = self.options.color;
        let days = std::mem::take(&mut self.days);
        for (day, mut entries) in days.into_iter().rev() {
            entries.sort_by(|a, b| {
                (b.clock_in, b.clock_out, &b.selector, &b.title)
                    .cmp(&(a.clock_in, a.clock_out, &a.selector, &a.title))
            });
            let total = entries
                .iter()
                .fold(Duration::zero(), |acc, e| acc + e.span(now));

            let header = day_style(&day.format("%A %x").to_string(), color);
            let total = span_style(&format_hms(total), color);
            writeln!(self.out, "{} ({})", header, total)?;

            for entry in entries {
                let clock_out = match entry.clock_out {
                    Some(out) => format_timestamp(&out),
                    None => "ongoing".to_string(),
                };
                let span = span_style(&format_hms(entry.span(now)), color);
                let selector = selector_style(&entry.selector, color);
                let title = title_style(&entry.title, color);
                writeln!(
                    self.out,
                    "  - {} ~ {} ({}) : [{}] {}",
                    format_timestamp(&entry.clock_in),
                    clock_out,
                    span,
                    selector,
                    title
                )?;
            }
        }
        Ok(())
    }
}
