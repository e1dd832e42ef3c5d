//! Machine-readable export: a JSON array of flat task records. The same
//! record shape is fed line by line to external exporter scripts.

use std::io::{self, Write};

use serde::Serialize;

use crate::model::TaskData;

use super::{ExportError, ExportOptions, Exporter, TaskEntry};

/// One task with its position in the index. The task data fields are
/// flattened into the record.
#[derive(Serialize)]
struct TaskRecord<'a> {
    group: &'a str,
    subgroup: &'a str,
    task: &'a str,
    group_id: usize,
    subgroup_id: usize,
    task_id: usize,
    #[serde(flatten)]
    data: &'a TaskData,
}

impl<'a> TaskRecord<'a> {
    fn from_entry(entry: &TaskEntry<'a>) -> Self {
        TaskRecord {
            group: entry.group,
            subgroup: entry.subgroup,
            task: entry.task,
            group_id: entry.group_id,
            subgroup_id: entry.subgroup_id,
            task_id: entry.task_id,
            data: entry.data,
        }
    }
}

/// Serializes one task record on a single line, for the external
/// exporter stdin contract.
pub(crate) fn record_line(entry: &TaskEntry<'_>) -> Result<String, ExportError> {
    let line = serde_json::to_string(&TaskRecord::from_entry(entry)).map_err(io::Error::other)?;
    Ok(line)
}

pub struct JsonExporter<W: Write> {
    out: W,
    options: ExportOptions,
    records: Vec<serde_json::Value>,
}

impl<W: Write> JsonExporter<W> {
    pub fn new(out: W, options: ExportOptions) -> Self {
        JsonExporter {
            out,
            options,
            records: Vec::new(),
        }
    }
}

impl<W: Write> Exporter for JsonExporter<W> {
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

    fn task(&mut self, entry: &TaskEntry<'_>) -> Result<(), ExportError> {
        if entry.data.concluded_at.is_some() && !self.options.concluded {
            return Ok(());
        }
        let record =
            serde_json::to_value(TaskRecord::from_entry(entry)).map_err(io::Error::other)?;
        self.records.push(record);
        Ok(())
    }

    fn end(&mut self) -> Result<(), ExportError> {
        let text = serde_json::to_string_pretty(&self.records).map_err(io::Error::other)?;
        writeln!(self.out, "{}", text)?;
        Ok(())
    }
}
