//! Export through an external script. Unknown format names are looked
//! up as executables under `.exporters/` in the base directory.
//!
//! The script is called with the base directory as its only argument,
//! receives one JSON task record per line on stdin, and writes the
//! formatted result to its stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use super::json::record_line;
use super::{ExportError, Exporter, TaskEntry};

pub struct ExternalExporter {
    path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ExternalExporter {
    /// Spawns the exporter script; `stdout` decides where the formatted
    /// result goes.
    pub fn spawn(script: &Path, base: &Path, stdout: Stdio) -> Result<Self, ExportError> {
        let mut child = Command::new(script)
            .arg(base)
            .stdin(Stdio::piped())
            .stdout(stdout)
            .spawn()
            .map_err(|source| ExportError::Spawn {
                path: script.to_path_buf(),
                source,
            })?;
        let stdin = child.stdin.take();
        Ok(ExternalExporter {
            path: script.to_path_buf(),
            child,
            stdin,
        })
    }
}

impl Exporter for ExternalExporter {
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
        let line = record_line(entry)?;
        if let Some(stdin) = self.stdin.as_mut() {
            writeln!(stdin, "{}", line)?;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), ExportError> {
        // Closing stdin tells the script the record stream is over.
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if !status.success() {
            return Err(ExportError::ExporterFailed(self.path.clone()));
        }
        Ok(())
    }
}
