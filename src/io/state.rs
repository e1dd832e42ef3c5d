use std::fs;
use std::path::PathBuf;

use crate::io::store::{atomic_write, Store};
use crate::message;
use crate::model::index::Index;
use crate::model::path::{self, TaskPath, CURRENT_FILE, INDEX_FILE, PREVIOUS_FILE};
use crate::model::session::{Current, PreviousStack, Session};

/// Error type for the state files at the top of the base directory.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("{0} file contains invalid data")]
    Malformed(&'static str),
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

fn read_state_file(store: &Store, file: &'static str) -> Result<Option<String>, StateError> {
    let fp = store.base().join(file);
    if !fp.is_file() {
        return Ok(None);
    }
    fs::read_to_string(&fp)
        .map(Some)
        .map_err(|e| StateError::Read { path: fp, source: e })
}

fn write_state_file(store: &Store, file: &'static str, content: &str) -> Result<(), StateError> {
    let fp = store.base().join(file);
    atomic_write(&fp, content.as_bytes()).map_err(|e| StateError::Write { path: fp, source: e })
}

// ---------------------------------------------------------------------------
// Individual state files
// ---------------------------------------------------------------------------

/// Load the current-task pointer; a missing file means no current task.
pub fn load_current(store: &Store) -> Result<Current, StateError> {
    match read_state_file(store, CURRENT_FILE)? {
        None => Ok(Current::default()),
        Some(text) => serde_json::from_str(&text).map_err(|_| StateError::Malformed(CURRENT_FILE)),
    }
}

pub fn save_current(store: &Store, current: &Current) -> Result<(), StateError> {
    let content = serde_json::to_string(current).map_err(|e| StateError::Write {
        path: store.base().join(CURRENT_FILE),
        source: e.into(),
    })?;
    write_state_file(store, CURRENT_FILE, &content)?;
    message::verbose(&format!(
        "{} saved: {}{}",
        CURRENT_FILE,
        path::display_triple(
            current.group.as_deref(),
            current.subgroup.as_deref(),
            current.task.as_deref()
        ),
        if current.halted { " (halted)" } else { "" }
    ));
    Ok(())
}

/// Load the previous-task stack, stored as one selector string per
/// entry, oldest first.
pub fn load_previous(store: &Store) -> Result<PreviousStack, StateError> {
    let Some(text) = read_state_file(store, PREVIOUS_FILE)? else {
        return Ok(PreviousStack::new());
    };
    let selectors: Vec<String> =
        serde_json::from_str(&text).map_err(|_| StateError::Malformed(PREVIOUS_FILE))?;
    let entries = selectors
        .iter()
        .map(|s| TaskPath::from_selector(s))
        .collect::<Option<Vec<_>>>()
        .ok_or(StateError::Malformed(PREVIOUS_FILE))?;
    Ok(PreviousStack::from_entries(entries))
}

pub fn save_previous(store: &Store, previous: &PreviousStack) -> Result<(), StateError> {
    let selectors: Vec<String> = previous.entries().iter().map(|p| p.selector()).collect();
    let content = serde_json::to_string(&selectors).map_err(|e| StateError::Write {
        path: store.base().join(PREVIOUS_FILE),
        source: e.into(),
    })?;
    write_state_file(store, PREVIOUS_FILE, &content)?;
    let n = previous.len();
    message::verbose(&format!(
        "{} saved. It has {} task{} now.",
        PREVIOUS_FILE,
        n,
        if n == 1 { "" } else { "s" }
    ));
    Ok(())
}

/// Load the persisted index; a missing file means the empty root tree.
pub fn load_index(store: &Store) -> Result<Index, StateError> {
    match read_state_file(store, INDEX_FILE)? {
        None => Ok(Index::new()),
        Some(text) => serde_json::from_str(&text).map_err(|_| StateError::Malformed(INDEX_FILE)),
    }
}

pub fn save_index(store: &Store, index: &Index) -> Result<(), StateError> {
    let content = serde_json::to_string(index).map_err(|e| StateError::Write {
        path: store.base().join(INDEX_FILE),
        source: e.into(),
    })?;
    write_state_file(store, INDEX_FILE, &content)?;
    message::verbose(&format!("{} saved.", INDEX_FILE));
    Ok(())
}

// ---------------------------------------------------------------------------
// Whole session
// ---------------------------------------------------------------------------

/// Read all three state files into an in-memory session.
pub fn load_session(store: &Store) -> Result<Session, StateError> {
    Ok(Session::new(
        load_index(store)?,
        load_current(store)?,
        load_previous(store)?,
    ))
}

/// Write all three state files back. Commands that mutate state flush the
/// whole session once, after the command body has run.
pub fn save_session(store: &Store, session: &Session) -> Result<(), StateError> {
    save_index(store, &session.index)?;
    save_current(store, &session.current)?;
    save_previous(store, &session.previous)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture_store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let store = Store::discover(Some(&tmp.path().join("base"))).unwrap();
        (tmp, store)
    }

    #[test]
    fn test_missing_state_files_mean_fresh_state() {
        let (_tmp, store) = fixture_store();
        let session = load_session(&store).unwrap();
        assert_eq!(session.current, Current::default());
        assert!(session.previous.is_empty());
        assert_eq!(session.index, Index::new());
    }

    #[test]
    fn test_session_round_trip() {
        let (_tmp, store) = fixture_store();
        let mut session = load_session(&store).unwrap();
        let path = TaskPath::new("proj", "sub", "gamma");
        session.index.add(&path);
        session.set_current(&path, false);
        session.previous.push(TaskPath::new("", "", "alpha"));
        save_session(&store, &session).unwrap();

        let loaded = load_session(&store).unwrap();
        assert_eq!(loaded.current, session.current);
        assert_eq!(loaded.previous.entries(), session.previous.entries());
        assert_eq!(loaded.index, session.index);
    }

    #[test]
    fn test_previous_stored_as_selector_strings() {
        let (_tmp, store) = fixture_store();
        let mut previous = PreviousStack::new();
        previous.push(TaskPath::new("", "", "alpha"));
        previous.push(TaskPath::new("proj", "sub", "gamma"));
        save_previous(&store, &previous).unwrap();

        let raw = fs::read_to_string(store.base().join("PREVIOUS")).unwrap();
        assert_eq!(raw, r#"["././alpha","proj/sub/gamma"]"#);
    }

    #[test]
    fn test_malformed_current_is_an_error() {
        let (_tmp, store) = fixture_store();
        fs::write(store.base().join("CURRENT"), "not json").unwrap();
        assert!(matches!(
            load_current(&store),
            Err(StateError::Malformed("CURRENT"))
        ));
    }

    #[test]
    fn test_malformed_previous_selector_is_an_error() {
        let (_tmp, store) = fixture_store();
        fs::write(store.base().join("PREVIOUS"), r#"["only/two"]"#).unwrap();
        assert!(matches!(
            load_previous(&store),
            Err(StateError::Malformed("PREVIOUS"))
        ));
    }

    #[test]
    fn test_current_file_format() {
        let (_tmp, store) = fixture_store();
        let current = Current {
            group: Some("proj".to_string()),
            subgroup: Some("".to_string()),
            task: Some("beta".to_string()),
            halted: false,
        };
        save_current(&store, &current).unwrap();
        let raw = fs::read_to_string(store.base().join("CURRENT")).unwrap();
        assert_eq!(
            raw,
            r#"{"group":"proj","subgroup":"","task":"beta","halted":false}"#
        );
    }
}
