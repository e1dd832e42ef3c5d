use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::message;
use crate::model::path::{
    self, TaskPath, EXPORTERS_DIR, FETCHER_FILE, HOOKS_DIR, ROOT_NAME,
};
use crate::model::task::TaskData;
use crate::util::time;

/// Name of the base directory searched for upward from the working
/// directory.
pub const BASE_DIR_NAME: &str = ".stint";

/// Error type for task store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no such task file: {0}")]
    NotFound(PathBuf),
    #[error("task already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("task file contains invalid data: {0}")]
    InvalidData(PathBuf),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Filesystem layout of one base directory: task records under
/// `group/subgroup/task` with root-name components skipped, plus the
/// state files and plugin directories at the top.
pub struct Store {
    base: PathBuf,
}

impl Store {
    /// Resolve the base directory: an explicit `--directory`, else the
    /// nearest base directory walking up from the working directory,
    /// else one under the home directory. Created on first use.
    pub fn discover(directory: Option<&Path>) -> Result<Store, StoreError> {
        let base = match directory {
            Some(dir) => dir.to_path_buf(),
            None => walk_up_search().unwrap_or_else(default_base),
        };
        if !base.is_dir() {
            fs::create_dir_all(&base).map_err(|e| StoreError::Write {
                path: base.clone(),
                source: e,
            })?;
            message::verbose(&format!("Created: {}", base.display()));
        }
        let store = Store { base };
        message::verbose(&format!("Using directory: {}", store.display_base()));
        Ok(store)
    }

    /// Open an existing directory without searching.
    pub fn open(base: impl Into<PathBuf>) -> Store {
        Store { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The base directory as shown to the user, with the default under
    /// the home directory abbreviated.
    pub fn display_base(&self) -> String {
        if let Some(home) = home_dir() {
            if self.base == home.join(BASE_DIR_NAME) {
                return format!("~/{}", BASE_DIR_NAME);
            }
        }
        self.base.display().to_string()
    }

    /// Filesystem path for a task record. Root-name components do not
    /// add directory levels.
    pub fn task_file(&self, path: &TaskPath) -> PathBuf {
        let mut fp = self.base.clone();
        for comp in [
            path.group.as_str(),
            path.subgroup.as_str(),
            path.task.as_str(),
        ] {
            if !comp.is_empty() {
                fp.push(comp);
            }
        }
        fp
    }

    pub fn exists(&self, path: &TaskPath) -> bool {
        self.task_file(path).exists()
    }

    /// Refuse to overwrite an existing task file.
    pub fn ensure_absent(&self, path: &TaskPath) -> Result<(), StoreError> {
        let fp = self.task_file(path);
        if fp.exists() {
            return Err(StoreError::AlreadyExists(fp));
        }
        Ok(())
    }

    pub fn load(&self, path: &TaskPath) -> Result<TaskData, StoreError> {
        let fp = self.task_file(path);
        if !fp.is_file() {
            return Err(StoreError::NotFound(fp));
        }
        let text = fs::read_to_string(&fp).map_err(|e| StoreError::Read {
            path: fp.clone(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|_| StoreError::InvalidData(fp))
    }

    /// Save a task record, stamping its update time.
    pub fn save(&self, path: &TaskPath, data: &mut TaskData) -> Result<(), StoreError> {
        data.updated_at = Some(time::now());
        self.write(path, data)?;
        message::verbose(&format!("Task saved: {}", path));
        Ok(())
    }

    /// Write a task record without touching its timestamps.
    pub fn write(&self, path: &TaskPath, data: &TaskData) -> Result<(), StoreError> {
        let fp = self.task_file(path);
        if let Some(parent) = fp.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: fp.clone(),
                source: e,
            })?;
        }
        let content = serde_json::to_string(data).map_err(|_| StoreError::InvalidData(fp.clone()))?;
        atomic_write(&fp, content.as_bytes()).map_err(|e| StoreError::Write {
            path: fp,
            source: e,
        })?;
        Ok(())
    }

    pub fn remove(&self, path: &TaskPath) -> Result<(), StoreError> {
        let fp = self.task_file(path);
        fs::remove_file(&fp).map_err(|e| StoreError::Write { path: fp, source: e })
    }

    /// Walk the base directory for task files in the `task`,
    /// `group/task` and `group/subgroup/task` layouts, siblings in
    /// sorted order. Entries with invalid names, like the state files
    /// and plugin directories, are skipped; so is anything deeper.
    pub fn scan(&self) -> Result<Vec<TaskPath>, StoreError> {
        let mut found = Vec::new();

        let base = self.base.clone();
        for name in task_files_in(&base)? {
            found.push(TaskPath::new(ROOT_NAME, ROOT_NAME, name));
        }
        for group in subdirs_in(&base)? {
            let group_dir = base.join(&group);
            for name in task_files_in(&group_dir)? {
                found.push(TaskPath::new(group.clone(), ROOT_NAME, name));
            }
            for subgroup in subdirs_in(&group_dir)? {
                for name in task_files_in(&group_dir.join(&subgroup))? {
                    found.push(TaskPath::new(group.clone(), subgroup.clone(), name));
                }
            }
        }
        Ok(found)
    }

    // -----------------------------------------------------------------------
    // Plugin locations
    // -----------------------------------------------------------------------

    /// Locate the nearest fetcher script for a scope: the subgroup
    /// directory, then the group directory, then the base directory.
    pub fn fetcher_path(&self, group: &str, subgroup: &str) -> Option<PathBuf> {
        let mut dirs = Vec::new();
        if !group.is_empty() {
            if !subgroup.is_empty() {
                dirs.push(self.base.join(group).join(subgroup));
            }
            dirs.push(self.base.join(group));
        }
        dirs.push(self.base.clone());
        dirs.into_iter()
            .map(|d| d.join(FETCHER_FILE))
            .find(|p| p.is_file())
    }

    pub fn hook_path(&self, name: &str) -> PathBuf {
        self.base.join(HOOKS_DIR).join(name)
    }

    pub fn exporter_path(&self, name: &str) -> PathBuf {
        self.base.join(EXPORTERS_DIR).join(name)
    }
}

fn walk_up_search() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(BASE_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn default_base() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(BASE_DIR_NAME),
        None => PathBuf::from(BASE_DIR_NAME),
    }
}

fn sorted_names(dir: &Path, want_dir: bool) -> Result<Vec<String>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|e| StoreError::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if entry.path().is_dir() != want_dir {
            continue;
        }
        if path::is_valid_task_name(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn task_files_in(dir: &Path) -> Result<Vec<String>, StoreError> {
    sorted_names(dir, false)
}

fn subdirs_in(dir: &Path) -> Result<Vec<String>, StoreError> {
    sorted_names(dir, true)
}
