use chrono::NaiveDateTime;

use crate::io::store::{Store, StoreError};
use crate::message;
use crate::model::path::{CURRENT_LITERAL, PREVIOUS_LITERAL};
use crate::model::session::Session;
use crate::model::task::TaskState;
use crate::ops::clock;
use crate::ops::select::{self, SelectorError};
use crate::ops::task_ops::{self, TaskOpsError};

/// Error type for the clock workflow commands.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("no task specified")]
    NoTaskSpecified,
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    TaskOps(#[from] TaskOpsError),
}

/// Options for `workon` and `switchto`.
#[derive(Debug, Default)]
pub struct WorkonOptions<'a> {
    /// Clock-in time instead of now.
    pub at: Option<NaiveDateTime>,
    /// Create the task first, treating the selection as a new name.
    pub new_task: bool,
    /// Title for the created task.
    pub title: Option<&'a str>,
    /// Run the fetcher into the created task.
    pub fetch: bool,
}

/// Options for `halt` and the commands that route through it.
#[derive(Debug, Default)]
pub struct HaltOptions<'a> {
    pub selection: Option<&'a str>,
    pub at: Option<NaiveDateTime>,
    pub conclude: bool,
    pub cancel: bool,
}

// ---------------------------------------------------------------------------
// Primary commands
// ---------------------------------------------------------------------------

/// Start working on a task: clock in and make it current. Refuses while
/// another task is being worked on.
pub fn workon(
    store: &Store,
    session: &mut Session,
    editor: Option<&str>,
    selection: &str,
    opts: &WorkonOptions,
) -> Result<(), WorkflowError> {
    if !session.current.halted {
        message::info("Nothing to do: already working on a task.");
        return Ok(());
    }

    let path = if opts.new_task {
        match task_ops::create(store, session, editor, selection, opts.title, opts.fetch)? {
            Some(path) => path,
            None => return Ok(()),
        }
    } else {
        select::resolve_backward(session, Some(selection))?
            .ok_or(WorkflowError::NoTaskSpecified)?
    };

    let mut data = store.load(&path)?;

    if !session.is_current(&path) {
        if let Some(displaced) = session.current_path() {
            session.previous.push(displaced);
        }
        // A halted task being picked up again is no longer "previous".
        if data.state() == TaskState::Halted {
            session.previous.remove(&path);
        }
    }

    if let Some(line) = clock::clock_in(&mut data, opts.at).message() {
        message::info(line);
    }
    message::info(&format!("Working on: {}", path));
    store.save(&path, &mut data)?;

    session.set_current(&path, false);
    Ok(())
}

/// Stop working on a task. With the conclude flag the task is also
/// marked done; with the cancel flag the open clock entry is dropped
/// instead of closed.
pub fn halt(store: &Store, session: &mut Session, opts: &HaltOptions) -> Result<(), WorkflowError> {
    let selection = opts.selection.unwrap_or(CURRENT_LITERAL);
    let Some(path) = select::resolve_backward(session, Some(selection))? else {
        if opts.conclude {
            message::info("Nothing to do: no task selected.");
        } else {
            message::info("Nothing to do: no current task.");
        }
        return Ok(());
    };

    let mut data = store.load(&path)?;
    let state = data.state();

    if state != TaskState::Doing {
        if !opts.conclude {
            message::info("Nothing to do: not working on the task.");
            return Ok(());
        }
        if state == TaskState::Concluded {
            message::info("Nothing to do: task is already concluded.");
            return Ok(());
        }
    }

    if opts.cancel {
        if let Some(line) = clock::clock_cancel(&mut data).message() {
            message::info(line);
        }
        message::info(&format!("Canceled: {}", path));
    } else if state == TaskState::Doing {
        if let Some(line) = clock::clock_out(&mut data, opts.at).message() {
            message::info(line);
        }
        message::info(&format!("Halted: {}", path));
    }
    if opts.conclude {
        if let Some(line) = clock::conclude(&mut data, opts.at).message() {
            message::info(line);
        }
        message::info(&format!("Concluded: {}", path));
    }
    store.save(&path, &mut data)?;

    if session.is_current(&path) {
        if opts.conclude {
            match session.previous.pop() {
                Some(previous) => session.set_current(&previous, true),
                None => session.clear_current_task(),
            }
        } else {
            session.set_halted(true);
        }
    } else {
        session.previous.remove(&path);
    }
    Ok(())
}

/// Pick up a halted task again without opening a new clock entry, by
/// reopening the last one.
pub fn append(
    store: &Store,
    session: &mut Session,
    selection: Option<&str>,
) -> Result<(), WorkflowError> {
    let selection = selection.unwrap_or(CURRENT_LITERAL);
    let Some(path) = select::resolve_backward(session, Some(selection))? else {
        message::info("Nothing to do: no current task.");
        return Ok(());
    };

    let mut data = store.load(&path)?;
    if data.state() != TaskState::Halted {
        message::info("Nothing to do: task is not halted.");
        return Ok(());
    }

    if let Some(line) = clock::clock_append(&mut data).message() {
        message::info(line);
    }
    message::info(&format!("Appending to: {}", path));
    store.save(&path, &mut data)?;

    if session.is_current(&path) {
        session.set_halted(false);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shorthands
// ---------------------------------------------------------------------------

/// Drop the open clock entry as if the current stretch never happened.
pub fn cancel(
    store: &Store,
    session: &mut Session,
    selection: Option<&str>,
) -> Result<(), WorkflowError> {
    let opts = HaltOptions {
        selection,
        cancel: true,
        ..Default::default()
    };
    halt(store, session, &opts)
}

/// Start working on the current task again.
pub fn resume(store: &Store, session: &mut Session) -> Result<(), WorkflowError> {
    workon(store, session, None, CURRENT_LITERAL, &WorkonOptions::default())
}

/// Halt the current task and start working on another.
pub fn switchto(
    store: &Store,
    session: &mut Session,
    editor: Option<&str>,
    selection: &str,
    opts: &WorkonOptions,
) -> Result<(), WorkflowError> {
    halt(store, session, &HaltOptions::default())?;
    workon(store, session, editor, selection, opts)
}

/// Halt the current task and go back to the most recent previous one.
pub fn switchback(
    store: &Store,
    session: &mut Session,
    at: Option<NaiveDateTime>,
) -> Result<(), WorkflowError> {
    if session.previous.is_empty() {
        message::info("Nothing to do: no previous task.");
        return Ok(());
    }
    halt(store, session, &HaltOptions::default())?;
    let opts = WorkonOptions {
        at,
        ..Default::default()
    };
    workon(store, session, None, PREVIOUS_LITERAL, &opts)
}

/// Mark a task done, clocking out first if it is being worked on.
pub fn conclude(
    store: &Store,
    session: &mut Session,
    selection: Option<&str>,
    at: Option<NaiveDateTime>,
) -> Result<(), WorkflowError> {
    let opts = HaltOptions {
        selection,
        at,
        conclude: true,
        ..Default::default()
    };
    halt(store, session, &opts)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    use super::*;
    use crate::model::path::TaskPath;
    use crate::util::time::TIMESTAMP_FORMAT;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn fixture() -> (TempDir, Store, Session) {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path());
        let mut session = Session::default();
        for name in ["alpha", "beta"] {
            task_ops::create(&store, &mut session, None, name, Some(name), false).unwrap();
        }
        (tmp, store, session)
    }

    fn workon_plain(store: &Store, session: &mut Session, selection: &str) {
        workon(store, session, None, selection, &WorkonOptions::default()).unwrap();
    }

    #[test]
    fn test_workon_clocks_in_and_sets_current() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");

        let alpha = TaskPath::new("", "", "alpha");
        assert!(session.is_current(&alpha));
        assert!(!session.current.halted);
        assert!(session.previous.is_empty());
        assert_eq!(store.load(&alpha).unwrap().state(), TaskState::Doing);
    }

    #[test]
    fn test_workon_refuses_while_working() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        workon_plain(&store, &mut session, "beta");

        assert!(session.is_current(&TaskPath::new("", "", "alpha")));
        let beta = store.load(&TaskPath::new("", "", "beta")).unwrap();
        assert_eq!(beta.state(), TaskState::Todo);
    }

    #[test]
    fn test_workon_missing_selection_is_an_error() {
        let (_tmp, store, mut session) = fixture();
        assert!(matches!(
            workon(&store, &mut session, None, "CURRENT", &WorkonOptions::default()),
            Err(WorkflowError::NoTaskSpecified)
        ));
    }

    #[test]
    fn test_workon_new_creates_and_clocks_in() {
        let (_tmp, store, mut session) = fixture();
        let opts = WorkonOptions {
            new_task: true,
            title: Some("brand new"),
            ..Default::default()
        };
        workon(&store, &mut session, None, "gamma", &opts).unwrap();

        let gamma = TaskPath::new("", "", "gamma");
        assert!(session.is_current(&gamma));
        assert_eq!(store.load(&gamma).unwrap().state(), TaskState::Doing);
        assert!(session.index.position_of(&gamma).is_some());
    }

    #[test]
    fn test_halt_keeps_the_task_pointer() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        halt(&store, &mut session, &HaltOptions::default()).unwrap();

        let alpha = TaskPath::new("", "", "alpha");
        assert!(session.is_current(&alpha));
        assert!(session.current.halted);
        assert_eq!(store.load(&alpha).unwrap().state(), TaskState::Halted);
    }

    #[test]
    fn test_halt_without_current_does_nothing() {
        let (_tmp, store, mut session) = fixture();
        halt(&store, &mut session, &HaltOptions::default()).unwrap();
        assert_eq!(session.current, Default::default());
    }

    #[test]
    fn test_halt_records_the_given_times() {
        let (_tmp, store, mut session) = fixture();
        let opts = WorkonOptions {
            at: Some(dt("2024-03-01 09:00:00")),
            ..Default::default()
        };
        workon(&store, &mut session, None, "alpha", &opts).unwrap();
        let halt_opts = HaltOptions {
            at: Some(dt("2024-03-01 10:30:00")),
            ..Default::default()
        };
        halt(&store, &mut session, &halt_opts).unwrap();

        let data = store.load(&TaskPath::new("", "", "alpha")).unwrap();
        assert_eq!(data.time_spent(), chrono::Duration::minutes(90));
    }

    #[test]
    fn test_switchto_pushes_displaced_task() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        switchto(&store, &mut session, None, "beta", &WorkonOptions::default()).unwrap();

        let alpha = TaskPath::new("", "", "alpha");
        let beta = TaskPath::new("", "", "beta");
        assert!(session.is_current(&beta));
        assert_eq!(session.previous.entries(), &[alpha.clone()]);
        assert_eq!(store.load(&alpha).unwrap().state(), TaskState::Halted);
        assert_eq!(store.load(&beta).unwrap().state(), TaskState::Doing);
    }

    #[test]
    fn test_switchback_returns_and_swaps_previous() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        switchto(&store, &mut session, None, "beta", &WorkonOptions::default()).unwrap();
        switchback(&store, &mut session, None).unwrap();

        let alpha = TaskPath::new("", "", "alpha");
        let beta = TaskPath::new("", "", "beta");
        assert!(session.is_current(&alpha));
        assert!(!session.current.halted);
        // beta took alpha's place on the stack
        assert_eq!(session.previous.entries(), &[beta.clone()]);
        assert_eq!(store.load(&alpha).unwrap().state(), TaskState::Doing);
        assert_eq!(store.load(&beta).unwrap().state(), TaskState::Halted);
    }

    #[test]
    fn test_switchback_with_empty_stack_does_nothing() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        switchback(&store, &mut session, None).unwrap();

        assert!(session.is_current(&TaskPath::new("", "", "alpha")));
        assert!(!session.current.halted);
    }

    #[test]
    fn test_resume_reopens_a_new_entry() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        halt(&store, &mut session, &HaltOptions::default()).unwrap();
        resume(&store, &mut session).unwrap();

        let alpha = TaskPath::new("", "", "alpha");
        assert!(session.is_current(&alpha));
        assert!(!session.current.halted);
        let data = store.load(&alpha).unwrap();
        assert_eq!(data.state(), TaskState::Doing);
        assert_eq!(data.logbook.len(), 2);
        assert!(session.previous.is_empty());
    }

    #[test]
    fn test_append_reopens_the_last_entry() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        halt(&store, &mut session, &HaltOptions::default()).unwrap();
        append(&store, &mut session, None).unwrap();

        let alpha = TaskPath::new("", "", "alpha");
        assert!(!session.current.halted);
        let data = store.load(&alpha).unwrap();
        assert_eq!(data.state(), TaskState::Doing);
        assert_eq!(data.logbook.len(), 1);
        assert!(data.logbook[0].is_open());
    }

    #[test]
    fn test_append_while_working_does_nothing() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        append(&store, &mut session, None).unwrap();

        let data = store.load(&TaskPath::new("", "", "alpha")).unwrap();
        assert_eq!(data.logbook.len(), 1);
        assert!(data.logbook[0].is_open());
    }

    #[test]
    fn test_cancel_drops_the_open_entry() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        cancel(&store, &mut session, None).unwrap();

        let data = store.load(&TaskPath::new("", "", "alpha")).unwrap();
        assert_eq!(data.state(), TaskState::Todo);
        assert!(data.logbook.is_empty());
        assert!(session.current.halted);
    }

    #[test]
    fn test_conclude_pops_previous_into_current() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        switchto(&store, &mut session, None, "beta", &WorkonOptions::default()).unwrap();
        conclude(&store, &mut session, None, None).unwrap();

        let alpha = TaskPath::new("", "", "alpha");
        let beta = TaskPath::new("", "", "beta");
        let data = store.load(&beta).unwrap();
        assert_eq!(data.state(), TaskState::Concluded);
        assert!(!data.logbook[0].is_open());
        assert!(session.is_current(&alpha));
        assert!(session.current.halted);
        assert!(session.previous.is_empty());
    }

    #[test]
    fn test_conclude_with_empty_stack_drops_the_task_pointer() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        conclude(&store, &mut session, None, None).unwrap();

        // The group and subgroup stay behind as selector context.
        assert_eq!(session.current.group.as_deref(), Some(""));
        assert_eq!(session.current.subgroup.as_deref(), Some(""));
        assert_eq!(session.current.task, None);
        assert!(session.current.halted);
        let data = store.load(&TaskPath::new("", "", "alpha")).unwrap();
        assert_eq!(data.state(), TaskState::Concluded);
    }

    #[test]
    fn test_conclude_todo_task_skips_the_clock() {
        let (_tmp, store, mut session) = fixture();
        conclude(&store, &mut session, Some("beta"), None).unwrap();

        let data = store.load(&TaskPath::new("", "", "beta")).unwrap();
        assert_eq!(data.state(), TaskState::Concluded);
        assert!(data.logbook.is_empty());
    }

    #[test]
    fn test_conclude_twice_reports_already_concluded() {
        let (_tmp, store, mut session) = fixture();
        conclude(&store, &mut session, Some("beta"), None).unwrap();
        conclude(&store, &mut session, Some("beta"), None).unwrap();

        let data = store.load(&TaskPath::new("", "", "beta")).unwrap();
        assert_eq!(data.state(), TaskState::Concluded);
    }

    #[test]
    fn test_workon_reopens_a_concluded_task() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        conclude(&store, &mut session, None, None).unwrap();
        workon_plain(&store, &mut session, "alpha");

        let alpha = TaskPath::new("", "", "alpha");
        let data = store.load(&alpha).unwrap();
        assert_eq!(data.state(), TaskState::Doing);
        assert!(data.concluded_at.is_none());
        assert_eq!(data.logbook.len(), 2);
        assert!(session.is_current(&alpha));
    }

    #[test]
    fn test_conclude_non_current_removes_it_from_previous() {
        let (_tmp, store, mut session) = fixture();
        workon_plain(&store, &mut session, "alpha");
        switchto(&store, &mut session, None, "beta", &WorkonOptions::default()).unwrap();
        conclude(&store, &mut session, Some("alpha"), None).unwrap();

        assert!(session.is_current(&TaskPath::new("", "", "beta")));
        assert!(session.previous.is_empty());
        let data = store.load(&TaskPath::new("", "", "alpha")).unwrap();
        assert_eq!(data.state(), TaskState::Concluded);
    }
}
