use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::io::store::Store;
use crate::message;
use crate::model::path::{self, TaskPath};
use crate::model::task::TaskData;

/// Error type for hook and fetcher subprocesses.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("`{0}` returned with non-zero code, aborting")]
    Failed(PathBuf),
    #[error("could not execute `{path}`: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("data fetcher script `.fetcher` not found")]
    NoFetcher,
    #[error("`{0}` not found: it seems no data was fetched")]
    NothingFetched(PathBuf),
    #[error("fetched data is invalid: {0}")]
    InvalidFetch(PathBuf),
}

/// Points in the command lifecycle at which hook executables run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    BeforeRead,
    BeforeWrite,
    AfterRead,
    AfterWrite,
    After,
}

impl HookPhase {
    fn file_name(self) -> &'static str {
        match self {
            HookPhase::Before => "before",
            HookPhase::BeforeRead => "before_read",
            HookPhase::BeforeWrite => "before_write",
            HookPhase::AfterRead => "after_read",
            HookPhase::AfterWrite => "after_write",
            HookPhase::After => "after",
        }
    }
}

/// Hook execution settings, resolved from the config file and flags.
#[derive(Debug, Clone, Copy)]
pub struct HookSettings {
    /// Run hook executables at all.
    pub enabled: bool,
    /// Abort the command when a hook exits with non-zero code.
    pub check: bool,
}

/// Run the hook for `phase` if its executable exists.
/// Exit codes are ignored unless `check` is set.
pub fn run_hook(
    store: &Store,
    settings: HookSettings,
    phase: HookPhase,
    cmd_name: &str,
) -> Result<(), HookError> {
    if !settings.enabled {
        return Ok(());
    }
    let hook_fp = store.hook_path(phase.file_name());
    if !hook_fp.is_file() {
        return Ok(());
    }
    message::verbose(&format!("Executing hook: {}", phase.file_name()));
    let status = Command::new(&hook_fp)
        .arg(store.base())
        .arg(cmd_name)
        .status()
        .map_err(|e| HookError::Spawn {
            path: hook_fp.clone(),
            source: e,
        })?;
    if settings.check && !status.success() {
        return Err(HookError::Failed(hook_fp));
    }
    Ok(())
}

/// Run the fetcher script for a task and read back the data it wrote.
///
/// The script receives the base directory and the task selector as
/// separate arguments and is expected to leave `<task file>.json`
/// next to the task file. That file is removed after reading.
pub fn fetch_data(store: &Store, task: &TaskPath) -> Result<TaskData, HookError> {
    let fetcher_fp = store
        .fetcher_path(&task.group, &task.subgroup)
        .ok_or(HookError::NoFetcher)?;
    message::verbose(&format!("Fetching data with `{}`.", fetcher_fp.display()));

    let mut fetch_fp = store.task_file(task).into_os_string();
    fetch_fp.push(".json");
    let fetch_fp = PathBuf::from(fetch_fp);

    let status = Command::new(&fetcher_fp)
        .arg(store.base())
        .arg(path::display_name(Some(task.group.as_str())))
        .arg(path::display_name(Some(task.subgroup.as_str())))
        .arg(path::display_name(Some(task.task.as_str())))
        .status()
        .map_err(|e| HookError::Spawn {
            path: fetcher_fp.clone(),
            source: e,
        })?;
    if !status.success() {
        return Err(HookError::Failed(fetcher_fp));
    }

    if !fetch_fp.is_file() {
        return Err(HookError::NothingFetched(fetch_fp));
    }
    let text =
        fs::read_to_string(&fetch_fp).map_err(|_| HookError::InvalidFetch(fetch_fp.clone()))?;
    let data: TaskData =
        serde_json::from_str(&text).map_err(|_| HookError::InvalidFetch(fetch_fp.clone()))?;
    let _ = fs::remove_file(&fetch_fp);
    Ok(data)
}
