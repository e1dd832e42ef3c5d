use crate::io::hooks::{self, HookError};
use crate::io::prompt::{self, PromptError};
use crate::io::store::{Store, StoreError};
use crate::message;
use crate::model::path::TaskPath;
use crate::model::session::Session;
use crate::model::task::TaskData;
use crate::ops::select::{self, SelectorError};
use crate::util::time;

/// Error type for task file operations
#[derive(Debug, thiserror::Error)]
pub enum TaskOpsError {
    #[error("no task specified")]
    NoTaskSpecified,
    #[error("invalid JSON")]
    InvalidJson,
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Hook(#[from] HookError),
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Create a task file and register it in the index. Returns `None` when
/// the user backs out by leaving the title empty.
pub fn create(
    store: &Store,
    session: &mut Session,
    editor: Option<&str>,
    selection: &str,
    title: Option<&str>,
    fetch: bool,
) -> Result<Option<TaskPath>, TaskOpsError> {
    let path = select::resolve_name(session, selection)?;
    message::verbose(&format!("Selected: {}", path));
    store.ensure_absent(&path)?;

    let mut data = TaskData::new();
    if fetch {
        data.merge(hooks::fetch_data(store, &path)?);
    }
    if data.title.as_deref().unwrap_or("").is_empty() {
        data.title = Some(match title {
            Some(title) => title.to_string(),
            None => prompt::prompt(editor, "Task title", None, "txt")?,
        });
    }
    if data.title.as_deref().unwrap_or("").is_empty() {
        message::info("Operation cancelled.");
        return Ok(None);
    }

    data.created_at = Some(time::now());
    store.write(&path, &data)?;
    session.index.add(&path);
    message::info(&format!("Created: {}", path));
    Ok(Some(path))
}

/// Move a task file to a new name, carrying the current task pointer,
/// the previous stack and the index along.
pub fn move_task(
    store: &Store,
    session: &mut Session,
    from: &str,
    to: &str,
    fetch: bool,
) -> Result<(), TaskOpsError> {
    let from = select::resolve_name(session, from)?;
    let to = select::resolve_name(session, to)?;
    store.ensure_absent(&to)?;

    let data = store.load(&from)?;
    store.write(&to, &data)?;
    session.index.add(&to);
    store.remove(&from)?;
    message::info(&format!("Task {} moved to {}", from, to));

    if session.is_current(&from) {
        let halted = session.current.halted;
        session.set_current(&to, halted);
    }
    session.previous.replace(&from, &to);
    session.index.remove(&from);

    if fetch {
        fetch_into(store, &to)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

/// Append a note to a task.
pub fn note(
    store: &Store,
    session: &Session,
    editor: Option<&str>,
    selection: Option<&str>,
    text: Option<&str>,
) -> Result<(), TaskOpsError> {
    let path =
        select::resolve_backward(session, selection)?.ok_or(TaskOpsError::NoTaskSpecified)?;

    let text = match text {
        Some(text) => text.to_string(),
        None => prompt::prompt(editor, "New note", None, "txt")?,
    };
    if text.is_empty() {
        message::info("Operation cancelled.");
        return Ok(());
    }

    let mut data = store.load(&path)?;
    data.notes.push(text);
    message::info(&format!("Note added to: {}", path));
    store.save(&path, &mut data)?;
    Ok(())
}

/// Set a property on a task, prompting for a missing name or value
/// and asking before overwriting an existing value.
pub fn set_property(
    store: &Store,
    session: &Session,
    editor: Option<&str>,
    selection: Option<&str>,
    name: Option<&str>,
    value: Option<&str>,
) -> Result<(), TaskOpsError> {
    let path =
        select::resolve_backward(session, selection)?.ok_or(TaskOpsError::NoTaskSpecified)?;

    let (name, value) = match name {
        Some(name) => {
            let value = match value {
                Some(value) => value.to_string(),
                None => {
                    prompt::prompt(editor, &format!("Value for property: {}", name), None, "txt")?
                }
            };
            (name.to_string(), value)
        }
        None => {
            // One prompt for both parts: first line is the name, the
            // rest is the value.
            let text = prompt::prompt(editor, "Name and Value for property", None, "txt")?;
            let (name, value) = text.split_once('\n').unwrap_or((text.as_str(), ""));
            (name.trim().to_string(), value.trim().to_string())
        }
    };

    if name.is_empty() {
        message::info("Operation cancelled.");
        return Ok(());
    }

    let mut data = store.load(&path)?;
    if let Some(existing) = data.properties.get(&name) {
        let question = format!(
            "Property `{}` already exists with value: {}\nDo you want to overwrite?",
            name, existing
        );
        if !message::confirm(&question) {
            message::info("Operation cancelled.");
            return Ok(());
        }
    }
    data.properties.insert(name, value);
    message::info(&format!("Set property of: {}", path));
    store.save(&path, &mut data)?;
    Ok(())
}

/// Edit the raw task record in the text editor.
pub fn edit(
    store: &Store,
    session: &Session,
    editor: Option<&str>,
    selection: Option<&str>,
) -> Result<(), TaskOpsError> {
    let path =
        select::resolve_backward(session, selection)?.ok_or(TaskOpsError::NoTaskSpecified)?;

    let data = store.load(&path)?;
    let pretty = serde_json::to_string_pretty(&data).map_err(|_| TaskOpsError::InvalidJson)?;
    let raw = prompt::prompt(editor, &format!("Editing: {}", path), Some(&pretty), "json")?;

    if raw.is_empty() {
        message::info("Operation cancelled.");
        return Ok(());
    }
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|_| TaskOpsError::InvalidJson)?;
    match serde_json::from_value::<TaskData>(value) {
        Ok(mut new_data) => {
            message::info(&format!("Manually edited: {}", path));
            store.save(&path, &mut new_data)?;
        }
        Err(_) => message::error("Invalid data."),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Run the fetcher script for a task and merge what it produced.
pub fn fetch(
    store: &Store,
    session: &Session,
    selection: Option<&str>,
) -> Result<(), TaskOpsError> {
    let path =
        select::resolve_backward(session, selection)?.ok_or(TaskOpsError::NoTaskSpecified)?;
    fetch_into(store, &path)
}

fn fetch_into(store: &Store, path: &TaskPath) -> Result<(), TaskOpsError> {
    let fetched = hooks::fetch_data(store, path)?;
    if fetched == TaskData::new() {
        message::verbose("Nothing to do: fetched data is empty.");
        return Ok(());
    }
    let mut data = store.load(path)?;
    data.merge(fetched);
    message::info(&format!("Fetched data for: {}", path));
    store.save(path, &mut data)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Index maintenance
// ---------------------------------------------------------------------------

/// Rebuild the index from the task files on disk.
pub fn rebuild(store: &Store, session: &mut Session) -> Result<(), TaskOpsError> {
    session.index.rebuild(store.scan()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Store, Session) {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path());
        (tmp, store, Session::default())
    }

    #[test]
    fn test_create_writes_file_and_index() {
        let (_tmp, store, mut session) = fixture();
        let path = create(&store, &mut session, None, "alpha", Some("first task"), false)
            .unwrap()
            .unwrap();
        assert_eq!(path, TaskPath::new("", "", "alpha"));
        let data = store.load(&path).unwrap();
        assert_eq!(data.title.as_deref(), Some("first task"));
        assert!(data.created_at.is_some());
        assert!(data.updated_at.is_none());
        assert_eq!(session.index.position_of(&path), Some((0, 0, 0)));
    }

    #[test]
    fn test_create_existing_task_fails() {
        let (_tmp, store, mut session) = fixture();
        create(&store, &mut session, None, "alpha", Some("t"), false).unwrap();
        assert!(matches!(
            create(&store, &mut session, None, "alpha", Some("t"), false),
            Err(TaskOpsError::Store(StoreError::AlreadyExists(_)))
        ));
    }

    #[test]
    fn test_create_without_title_needs_a_terminal() {
        let (_tmp, store, mut session) = fixture();
        assert!(matches!(
            create(&store, &mut session, None, "alpha", None, false),
            Err(TaskOpsError::Prompt(PromptError::NotInteractive))
        ));
    }

    #[test]
    fn test_move_updates_session_and_files() {
        let (_tmp, store, mut session) = fixture();
        let from = create(&store, &mut session, None, "alpha", Some("t"), false)
            .unwrap()
            .unwrap();
        session.set_current(&from, false);
        session.previous.push(from.clone());

        move_task(&store, &mut session, "././alpha", "proj/./beta", false).unwrap();

        let to = TaskPath::new("proj", "", "beta");
        assert!(store.exists(&to));
        assert!(!store.exists(&from));
        assert!(session.is_current(&to));
        assert_eq!(session.previous.entries(), &[to.clone()]);
        assert_eq!(session.index.position_of(&from), None);
        assert!(session.index.position_of(&to).is_some());
    }

    #[test]
    fn test_move_keeps_creation_time() {
        let (_tmp, store, mut session) = fixture();
        let from = create(&store, &mut session, None, "alpha", Some("t"), false)
            .unwrap()
            .unwrap();
        let created = store.load(&from).unwrap().created_at;
        move_task(&store, &mut session, "././alpha", "././beta", false).unwrap();
        let to = TaskPath::new("", "", "beta");
        assert_eq!(store.load(&to).unwrap().created_at, created);
    }

    #[test]
    fn test_note_appends() {
        let (_tmp, store, mut session) = fixture();
        let path = create(&store, &mut session, None, "alpha", Some("t"), false)
            .unwrap()
            .unwrap();
        note(&store, &session, None, Some("././alpha"), Some("remember this")).unwrap();
        let data = store.load(&path).unwrap();
        assert_eq!(data.notes, ["remember this"]);
        assert!(data.updated_at.is_some());
    }

    #[test]
    fn test_note_without_selection_uses_current() {
        let (_tmp, store, mut session) = fixture();
        let path = create(&store, &mut session, None, "alpha", Some("t"), false)
            .unwrap()
            .unwrap();
        session.set_current(&path, false);
        note(&store, &session, None, None, Some("n")).unwrap();
        assert_eq!(store.load(&path).unwrap().notes, ["n"]);
    }

    #[test]
    fn test_note_with_nothing_selected_fails() {
        let (_tmp, store, session) = fixture();
        assert!(matches!(
            note(&store, &session, None, None, Some("n")),
            Err(TaskOpsError::NoTaskSpecified)
        ));
    }

    #[test]
    fn test_set_property() {
        let (_tmp, store, mut session) = fixture();
        let path = create(&store, &mut session, None, "alpha", Some("t"), false)
            .unwrap()
            .unwrap();
        set_property(
            &store,
            &session,
            None,
            Some("././alpha"),
            Some("effort"),
            Some("low"),
        )
        .unwrap();
        let data = store.load(&path).unwrap();
        assert_eq!(data.properties.get("effort"), Some(&"low".to_string()));
    }

    #[test]
    fn test_overwriting_property_needs_confirmation() {
        let (_tmp, store, mut session) = fixture();
        let path = create(&store, &mut session, None, "alpha", Some("t"), false)
            .unwrap()
            .unwrap();
        set_property(
            &store,
            &session,
            None,
            Some("././alpha"),
            Some("effort"),
            Some("low"),
        )
        .unwrap();
        // declined without a terminal, so the value stays
        set_property(
            &store,
            &session,
            None,
            Some("././alpha"),
            Some("effort"),
            Some("high"),
        )
        .unwrap();
        let data = store.load(&path).unwrap();
        assert_eq!(data.properties.get("effort"), Some(&"low".to_string()));
    }

    #[test]
    fn test_set_without_name_needs_a_terminal() {
        let (_tmp, store, mut session) = fixture();
        create(&store, &mut session, None, "alpha", Some("t"), false).unwrap();
        // The bare invocation reaches the name-and-value prompt.
        assert!(matches!(
            set_property(&store, &session, None, Some("././alpha"), None, None),
            Err(TaskOpsError::Prompt(PromptError::NotInteractive))
        ));
    }

    #[test]
    fn test_rebuild_scans_the_tree() {
        let (_tmp, store, mut session) = fixture();
        let a = TaskPath::new("", "", "alpha");
        let b = TaskPath::new("proj", "sub", "beta");
        store.write(&a, &TaskData::new()).unwrap();
        store.write(&b, &TaskData::new()).unwrap();
        rebuild(&store, &mut session).unwrap();
        assert_eq!(session.index.position_of(&a), Some((0, 0, 0)));
        assert_eq!(session.index.position_of(&b), Some((1, 1, 0)));
    }
}
