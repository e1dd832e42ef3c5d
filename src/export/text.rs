//! Plain text listing. This is the default export format and the one
//! the status command prints.

use std::io::Write;

use chrono::Duration;
use colored::Colorize;

use crate::util::time::{format_duration, format_timestamp};

use super::{ExportError, ExportOptions, Exporter, TaskEntry};

fn group_style(s: &str, color: bool) -> String {
    if color { s.blue().dimmed().to_string() } else { s.to_string() }
}

fn subgroup_style(s: &str, color: bool) -> String {
    if color { s.magenta().dimmed().to_string() } else { s.to_string() }
}

fn task_style(s: &str, color: bool) -> String {
    if color { s.red().dimmed().to_string() } else { s.to_string() }
}

fn title_style(s: &str, color: bool) -> String {
    if color { s.green().dimmed().to_string() } else { s.to_string() }
}

fn label_style(s: &str, color: bool) -> String {
    if color { s.cyan().to_string() } else { s.to_string() }
}

pub struct TextExporter<W: Write> {
    out: W,
    options: ExportOptions,
    total: Duration,
}

impl<W: Write> TextExporter<W> {
    pub fn new(out: W, options: ExportOptions) -> Self {
        TextExporter {
            out,
            options,
            total: Duration::zero(),
        }
    }

    /// A `  Label: value` line; the value part is left out when empty.
    fn field(&mut self, name: &str, value: &str) -> Result<(), ExportError> {
        let label = label_style(&format!("{}:", name), self.options.color);
        if value.is_empty() {
            writeln!(self.out, "  {}", label)?;
        } else {
            writeln!(self.out, "  {} {}", label, value)?;
        }
        Ok(())
    }
}

impl<W: Write> Exporter for TextExporter<W> {
    fn begin(&mut self) -> Result<(), ExportError> {
        Ok(())
    }

    fn group(&mut self, name: &str, id: usize) -> Result<(), ExportError> {
        // Compact task headers already carry the full selector.
        if self.options.compact {
            return Ok(());
        }
        let header = group_style(&format!("[{}] {}", id, name), self.options.color);
        writeln!(self.out, "{}", header)?;
        Ok(())
    }

    fn subgroup(
        &mut self,
        _group: &str,
        group_id: usize,
        name: &str,
        id: usize,
    ) -> Result<(), ExportError> {
        if self.options.compact {
            return Ok(());
        }
        let header = subgroup_style(
            &format!("[{}/{}] {}", group_id, id, name),
            self.options.color,
        );
        writeln!(self.out, "{}", header)?;
        Ok(())
    }

    fn task(&mut self, entry: &TaskEntry<'_>) -> Result<(), ExportError> {
        let data = entry.data;
        let o = self.options;

        if data.concluded_at.is_some() && !o.concluded {
            return Ok(());
        }

        if o.compact {
            let ids = group_style(
                &format!("[{}/{}/{}]", entry.group_id, entry.subgroup_id, entry.task_id),
                o.color,
            );
            let selector = task_style(&entry.selector(), o.color);
            writeln!(self.out, "{} {}", ids, selector)?;
        } else {
            let header = task_style(
                &format!(
                    "[{}/{}/{}] {}",
                    entry.group_id, entry.subgroup_id, entry.task_id, entry.task
                ),
                o.color,
            );
            writeln!(self.out, "{}", header)?;
        }

        if let Some(title) = data.title.as_deref().filter(|t| !t.is_empty()) {
            let title = title_style(title, o.color);
            writeln!(self.out, "  {}", title)?;
        }

        // The status listing elides the descriptive fields unless asked.
        let detailed = o.verbose || !o.status;

        if !data.properties.is_empty() && detailed {
            self.field("Properties", "")?;
            let mut properties: Vec<(&String, &String)> = data.properties.iter().collect();
            properties.sort_by_key(|(name, _)| *name);
            for (name, value) in properties {
                writeln!(self.out, "  - {}: {}", name, value)?;
            }
        }

        if !data.notes.is_empty() && detailed {
            self.field("Notes", "")?;
            for note in &data.notes {
                writeln!(self.out, "  - {}", note)?;
            }
        }

        if o.verbose && !o.status {
            if let Some(at) = &data.created_at {
                self.field("Created at", &format_timestamp(at))?;
            }
            if let Some(at) = &data.updated_at {
                self.field("Updated at", &format_timestamp(at))?;
            }
        }
        if o.verbose {
            if let Some(at) = &data.concluded_at {
                self.field("Concluded at", &format_timestamp(at))?;
            }
        }

        if o.sum {
            self.total = self.total + data.time_spent();
        }

        if data.logbook.is_empty() {
            return Ok(());
        }

        if o.status && !o.verbose {
            if let Some(last) = data.logbook.last() {
                let clock = match last.clock_out {
                    Some(out) => format!("clocked out at {}", format_timestamp(&out)),
                    None => format!("clocked in at {}", format_timestamp(&last.clock_in)),
                };
                writeln!(
                    self.out,
                    "  Spent {}; {}.",
                    format_duration(data.time_spent()),
                    clock
                )?;
            }
            return Ok(());
        }

        self.field("Total time spent", &format_duration(data.time_spent()))?;
        let (label, shown) = if o.status {
            ("  Last logbook entry:", 1)
        } else if o.verbose {
            ("  Logbook:", data.logbook.len())
        } else {
            ("  Last logbook entries:", 3)
        };
        let label = label_style(label, o.color);
        writeln!(self.out, "{}", label)?;
        let start = data.logbook.len().saturating_sub(shown);
        for log in &data.logbook[start..] {
            match log.clock_out {
                Some(out) => writeln!(
                    self.out,
                    "  - {} ~ {}",
                    format_timestamp(&log.clock_in),
                    format_timestamp(&out)
                )?,
                None => writeln!(self.out, "  - {}", format_timestamp(&log.clock_in))?,
            }
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), ExportError> {
        if self.options.sum {
            writeln!(self.out, "Total: {}", format_duration(self.total))?;
        }
        Ok(())
    }
}
