//! Emacs org-mode outline export. Groups and subgroups become headline
//! levels; clock intervals map to org `CLOCK:` drawer lines.

use std::io::Write;

use chrono::NaiveDateTime;

use crate::model::{TaskData, TaskState};

use super::{ExportError, ExportOptions, Exporter, TaskEntry};

const ORG_DATE_FORMAT: &str = "%Y-%m-%d %a %H:%M";

fn org_date(t: &NaiveDateTime) -> String {
    t.format(ORG_DATE_FORMAT).to_string()
}

fn keyword(data: &TaskData) -> &'static str {
    match data.state() {
        TaskState::Todo => "TODO ",
        TaskState::Concluded => "DONE ",
        TaskState::Doing | TaskState::Halted => "",
    }
}

pub struct OrgExporter<W: Write> {
    out: W,
    options: ExportOptions,
}

impl<W: Write> OrgExporter<W> {
    pub fn new(out: W, options: ExportOptions) -> Self {
        OrgExporter { out, options }
    }
}

impl<W: Write> Exporter for OrgExporter<W> {
    fn begin(&mut self) -> Result<(), ExportError> {
        Ok(())
    }

    fn group(&mut self, name: &str, _id: usize) -> Result<(), ExportError> {
        writeln!(self.out, "* {}", name)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn subgroup(
        &mut self,
        _group: &str,
        _group_id: usize,
        name: &str,
        _id: usize,
    ) -> Result<(), ExportError> {
        writeln!(self.out, "** {}", name)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn task(&mut self, entry: &TaskEntry<'_>) -> Result<(), ExportError> {
        let data = entry.data;
        if data.concluded_at.is_some() && !self.options.concluded {
            return Ok(());
        }

        let title = data.title.as_deref().unwrap_or("");
        writeln!(self.out, "*** {}{}", keyword(data), title)?;

        if !data.properties.is_empty() {
            writeln!(self.out, ":PROPERTIES:")?;
            let mut properties: Vec<(&String, &String)> = data.properties.iter().collect();
            properties.sort_by_key(|(name, _)| *name);
            for (name, value) in properties {
                writeln!(self.out, ":{}: {}", name, value)?;
            }
            writeln!(self.out, ":END:")?;
        }

        if let Some(at) = &data.concluded_at {
            writeln!(self.out, "CLOSED: [{}]", org_date(at))?;
        }

        if !data.logbook.is_empty() {
            writeln!(self.out, ":LOGBOOK:")?;
            for log in &data.logbook {
                match log.clock_out {
                    Some(out) => writeln!(
                        self.out,
                        "CLOCK: [{}]--[{}]",
                        org_date(&log.clock_in),
                        org_date(&out)
                    )?,
                    None => writeln!(self.out, "CLOCK: [{}]", org_date(&log.clock_in))?,
                }
            }
            writeln!(self.out, ":END:")?;
        }

        for note in &data.notes {
            writeln!(self.out, "- {}", note)?;
        }

        writeln!(self.out)?;
        Ok(())
    }

    fn end(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}
