use crate::message;
use crate::model::index::{Index, IndexError};
use crate::model::path::{
    self, Scope, TaskPath, CURRENT_LITERAL, PREVIOUS_LITERAL, ROOT_NAME,
};
use crate::model::session::Session;

/// Error type for selector resolution.
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("invalid <{0}> selector format")]
    InvalidFormat(&'static str),
    #[error("invalid group name: {0}")]
    InvalidGroupName(String),
    #[error("invalid task name: {0}")]
    InvalidTaskName(String),
    #[error(transparent)]
    Index(#[from] IndexError),
}

// ---------------------------------------------------------------------------
// Segment alignment
// ---------------------------------------------------------------------------

fn split_segments(selector: &str, kind: &'static str) -> Result<Vec<String>, SelectorError> {
    let segments = path::split_selector(selector);
    if segments.len() > 3 {
        return Err(SelectorError::InvalidFormat(kind));
    }
    Ok(segments)
}

/// Right-align segments into `[group, subgroup, task]`, so a single
/// segment names a task.
fn align_right(segments: Vec<String>) -> [Option<String>; 3] {
    let mut out: [Option<String>; 3] = [None, None, None];
    let offset = 3 - segments.len();
    for (i, seg) in segments.into_iter().enumerate() {
        out[offset + i] = Some(seg);
    }
    out
}

/// Left-align segments into `[group, subgroup, task]`, so a single
/// segment names a group.
fn align_left(segments: Vec<String>) -> [Option<String>; 3] {
    let mut out: [Option<String>; 3] = [None, None, None];
    for (i, seg) in segments.into_iter().enumerate() {
        out[i] = Some(seg);
    }
    out
}

fn parse_positions(
    selector: &str,
    kind: &'static str,
    right_align: bool,
) -> Result<[Option<usize>; 3], SelectorError> {
    let segments = split_segments(selector, kind)?;
    let aligned = if right_align {
        align_right(segments)
    } else {
        align_left(segments)
    };
    let mut out: [Option<usize>; 3] = [None, None, None];
    for (slot, seg) in out.iter_mut().zip(aligned) {
        if let Some(seg) = seg {
            *slot = Some(Index::parse_position(&seg)?);
        }
    }
    Ok(out)
}

fn starts_with_digit(selector: &str) -> bool {
    selector.chars().next().is_some_and(|c| c.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Name grammars
// ---------------------------------------------------------------------------

/// Resolve a task-last name selector into a full task path. Missing
/// leading segments default to the current scope, falling back to the
/// root group and subgroup. A two-segment selector like `proj/buy`
/// names a task in the group's root subgroup.
pub fn resolve_name(session: &Session, selector: &str) -> Result<TaskPath, SelectorError> {
    let [group, subgroup, task] = align_right(split_segments(selector, "name")?);

    let group = group
        .or_else(|| session.current.group.clone())
        .unwrap_or_else(|| ROOT_NAME.to_string());
    let subgroup = subgroup
        .or_else(|| session.current.subgroup.clone())
        .unwrap_or_else(|| ROOT_NAME.to_string());
    let task = task.unwrap_or_default();

    for name in [&group, &subgroup] {
        if !path::is_valid_group_name(name) {
            return Err(SelectorError::InvalidGroupName(name.clone()));
        }
    }
    if !path::is_valid_task_name(&task) {
        return Err(SelectorError::InvalidTaskName(task));
    }

    // The root group has only the root subgroup, so a named middle
    // segment under the root belongs one level up.
    if group == ROOT_NAME && !subgroup.is_empty() {
        return Ok(TaskPath::new(subgroup, group, task));
    }
    Ok(TaskPath::new(group, subgroup, task))
}

/// Resolve a group-first name selector into a scope: one segment names
/// a group, two a subgroup, three a single task.
fn resolve_gname(selector: &str) -> Result<Scope, SelectorError> {
    let [mut group, mut subgroup, task] = align_left(split_segments(selector, "gname")?);

    for name in [&group, &subgroup] {
        if let Some(name) = name {
            if !path::is_valid_group_name(name) {
                return Err(SelectorError::InvalidGroupName(name.clone()));
            }
        }
    }
    if let Some(task_name) = &task {
        if !task_name.is_empty() && !path::is_valid_task_name(task_name) {
            return Err(SelectorError::InvalidTaskName(task_name.clone()));
        }
    }

    let task = task.filter(|t| !t.is_empty());

    // Same root-shift as the task-last grammar.
    if group.as_deref() == Some(ROOT_NAME) && subgroup.as_deref().is_some_and(|s| !s.is_empty()) {
        group = subgroup.take();
        if task.is_some() {
            subgroup = Some(ROOT_NAME.to_string());
        }
    }

    Ok(Scope {
        group,
        subgroup,
        task,
    })
}

// ---------------------------------------------------------------------------
// Id grammars
// ---------------------------------------------------------------------------

fn resolve_id(session: &Session, selector: &str) -> Result<[Option<String>; 3], SelectorError> {
    let mut idxs = parse_positions(selector, "id", true)?;

    // Missing group or subgroup positions come from the current task.
    let (group_idx, subgroup_idx) = session.current_positions();
    if idxs[0].is_none() {
        idxs[0] = group_idx;
    }
    if idxs[1].is_none() {
        idxs[1] = subgroup_idx;
    }

    Ok(session.index.idxs_to_names(idxs)?)
}

fn resolve_gid(session: &Session, selector: &str) -> Result<[Option<String>; 3], SelectorError> {
    let idxs = parse_positions(selector, "gid", false)?;
    Ok(session.index.idxs_to_names(idxs)?)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Resolve a backward selection: no selector means the current task
/// (masked while halted), `CURRENT` names the current task even while
/// halted, `PREVIOUS` the top of the previous stack. Id selectors are
/// right-aligned and fill missing positions from the current task.
/// Returns `None` when nothing ends up selected.
pub fn resolve_backward(
    session: &Session,
    selection: Option<&str>,
) -> Result<Option<TaskPath>, SelectorError> {
    let (g, s, t) = session.current_view();
    let mut group = g.map(str::to_string);
    let mut subgroup = s.map(str::to_string);
    let mut task = t.map(str::to_string);

    if let Some(selection) = selection {
        if selection == CURRENT_LITERAL {
            task = session.current_task().map(str::to_string);
        } else if selection == PREVIOUS_LITERAL {
            let peeked = session.previous.peek();
            group = peeked.map(|p| p.group.clone());
            subgroup = peeked.map(|p| p.subgroup.clone());
            task = peeked.map(|p| p.task.clone());
        } else if starts_with_digit(selection) {
            [group, subgroup, task] = resolve_id(session, selection)?;
        } else {
            let path = resolve_name(session, selection)?;
            group = Some(path.group);
            subgroup = Some(path.subgroup);
            task = Some(path.task);
        }
    }

    message::verbose(&format!(
        "Selected: {}",
        path::display_triple(group.as_deref(), subgroup.as_deref(), task.as_deref())
    ));

    Ok(match (group, subgroup, task) {
        (Some(group), Some(subgroup), Some(task)) => Some(TaskPath::new(group, subgroup, task)),
        _ => None,
    })
}

/// Resolve a forward selection into a scope: no selector means the
/// current task's group and subgroup, `CURRENT` and `PREVIOUS` their
/// usual targets, and id or name selectors bind left to right.
pub fn resolve_forward(
    session: &Session,
    selection: Option<&str>,
) -> Result<Scope, SelectorError> {
    let Some(selection) = selection else {
        return Ok(Scope {
            group: session.current.group.clone(),
            subgroup: session.current.subgroup.clone(),
            task: None,
        });
    };

    let scope = if selection == CURRENT_LITERAL {
        let (g, s, t) = session.current_view();
        Scope {
            group: g.map(str::to_string),
            subgroup: s.map(str::to_string),
            task: t.map(str::to_string),
        }
    } else if selection == PREVIOUS_LITERAL {
        match session.previous.peek() {
            Some(p) => Scope {
                group: Some(p.group.clone()),
                subgroup: Some(p.subgroup.clone()),
                task: Some(p.task.clone()),
            },
            None => Scope::default(),
        }
    } else if starts_with_digit(selection) {
        let [group, subgroup, task] = resolve_gid(session, selection)?;
        Scope {
            group,
            subgroup,
            task,
        }
    } else {
        resolve_gname(selection)?
    };

    message::verbose(&format!(
        "Selected: {}",
        path::display_triple(
            scope.group.as_deref(),
            scope.subgroup.as_deref(),
            scope.task.as_deref()
        )
    ));

    Ok(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::session::{Current, PreviousStack};

    fn fixture_session() -> Session {
        let mut index = Index::new();
        index.add(&TaskPath::new("", "", "alpha"));
        index.add(&TaskPath::new("proj", "", "beta"));
        index.add(&TaskPath::new("proj", "sub", "gamma"));
        index.add(&TaskPath::new("proj", "sub", "delta"));
        Session::new(index, Current::default(), PreviousStack::new())
    }

    fn session_working_on(path: &TaskPath) -> Session {
        let mut session = fixture_session();
        session.set_current(path, false);
        session
    }

    // -- name grammar --

    #[test]
    fn test_name_single_segment_defaults_to_root() {
        let session = fixture_session();
        let path = resolve_name(&session, "alpha").unwrap();
        assert_eq!(path, TaskPath::new("", "", "alpha"));
    }

    #[test]
    fn test_name_single_segment_defaults_to_current_scope() {
        let session = session_working_on(&TaskPath::new("proj", "sub", "gamma"));
        let path = resolve_name(&session, "epsilon").unwrap();
        assert_eq!(path, TaskPath::new("proj", "sub", "epsilon"));
    }

    #[test]
    fn test_name_two_segments_name_a_group_task() {
        // With no current scope, `proj/beta` places the task in the
        // group's root subgroup rather than in a root-group subgroup.
        let session = fixture_session();
        let path = resolve_name(&session, "proj/beta").unwrap();
        assert_eq!(path, TaskPath::new("proj", "", "beta"));
    }

    #[test]
    fn test_name_full_selector() {
        let session = fixture_session();
        let path = resolve_name(&session, "proj/sub/gamma").unwrap();
        assert_eq!(path, TaskPath::new("proj", "sub", "gamma"));
    }

    #[test]
    fn test_name_explicit_root_segments() {
        let session = session_working_on(&TaskPath::new("proj", "sub", "gamma"));
        let path = resolve_name(&session, "././alpha").unwrap();
        assert_eq!(path, TaskPath::new("", "", "alpha"));
    }

    #[test]
    fn test_name_rejects_invalid_task_name() {
        let session = fixture_session();
        assert!(matches!(
            resolve_name(&session, "proj/sub/"),
            Err(SelectorError::InvalidTaskName(_))
        ));
    }

    #[test]
    fn test_name_rejects_reserved_name() {
        let session = fixture_session();
        assert!(matches!(
            resolve_name(&session, "INDEX"),
            Err(SelectorError::InvalidTaskName(_))
        ));
    }

    #[test]
    fn test_name_rejects_too_many_segments() {
        let session = fixture_session();
        assert!(matches!(
            resolve_name(&session, "a/b/c/d"),
            Err(SelectorError::InvalidFormat("name"))
        ));
    }

    // -- backward dispatch --

    #[test]
    fn test_backward_defaults_to_current() {
        let session = session_working_on(&TaskPath::new("proj", "sub", "gamma"));
        let selected = resolve_backward(&session, None).unwrap();
        assert_eq!(selected, Some(TaskPath::new("proj", "sub", "gamma")));
    }

    #[test]
    fn test_backward_masks_halted_current() {
        let mut session = fixture_session();
        session.set_current(&TaskPath::new("proj", "sub", "gamma"), true);
        assert_eq!(resolve_backward(&session, None).unwrap(), None);
    }

    #[test]
    fn test_backward_current_literal_sees_halted_task() {
        let mut session = fixture_session();
        session.set_current(&TaskPath::new("proj", "sub", "gamma"), true);
        let selected = resolve_backward(&session, Some("CURRENT")).unwrap();
        assert_eq!(selected, Some(TaskPath::new("proj", "sub", "gamma")));
    }

    #[test]
    fn test_backward_previous_literal() {
        let mut session = fixture_session();
        session.previous.push(TaskPath::new("", "", "alpha"));
        let selected = resolve_backward(&session, Some("PREVIOUS")).unwrap();
        assert_eq!(selected, Some(TaskPath::new("", "", "alpha")));
    }

    #[test]
    fn test_backward_previous_literal_on_empty_stack() {
        let session = session_working_on(&TaskPath::new("proj", "sub", "gamma"));
        assert_eq!(resolve_backward(&session, Some("PREVIOUS")).unwrap(), None);
    }

    #[test]
    fn test_backward_full_id_selector() {
        let session = fixture_session();
        let selected = resolve_backward(&session, Some("1/1/0")).unwrap();
        assert_eq!(selected, Some(TaskPath::new("proj", "sub", "gamma")));
    }

    #[test]
    fn test_backward_partial_id_fills_from_current() {
        let session = session_working_on(&TaskPath::new("proj", "sub", "gamma"));
        let selected = resolve_backward(&session, Some("1")).unwrap();
        assert_eq!(selected, Some(TaskPath::new("proj", "sub", "delta")));
    }

    #[test]
    fn test_backward_partial_id_without_current() {
        let session = fixture_session();
        assert_eq!(resolve_backward(&session, Some("0")).unwrap(), None);
    }

    #[test]
    fn test_backward_id_out_of_range() {
        let session = fixture_session();
        assert!(matches!(
            resolve_backward(&session, Some("9/0/0")),
            Err(SelectorError::Index(IndexError::OutOfRange(_)))
        ));
    }

    #[test]
    fn test_backward_id_not_an_integer() {
        let session = fixture_session();
        assert!(matches!(
            resolve_backward(&session, Some("1/x/0")),
            Err(SelectorError::Index(IndexError::NotAnInteger(_)))
        ));
    }

    #[test]
    fn test_backward_nulled_slot_selects_nothing() {
        let mut session = fixture_session();
        session.index.remove(&TaskPath::new("proj", "sub", "gamma"));
        assert_eq!(resolve_backward(&session, Some("1/1/0")).unwrap(), None);
    }

    // -- forward dispatch --

    #[test]
    fn test_forward_no_selector_is_current_scope() {
        let session = session_working_on(&TaskPath::new("proj", "sub", "gamma"));
        let scope = resolve_forward(&session, None).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.subgroup.as_deref(), Some("sub"));
        assert_eq!(scope.task, None);
    }

    #[test]
    fn test_forward_no_selector_without_current() {
        let session = fixture_session();
        assert!(resolve_forward(&session, None).unwrap().is_empty());
    }

    #[test]
    fn test_forward_single_segment_names_a_group() {
        let session = fixture_session();
        let scope = resolve_forward(&session, Some("proj")).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.subgroup, None);
        assert_eq!(scope.task, None);
    }

    #[test]
    fn test_forward_two_segments_name_a_subgroup() {
        let session = fixture_session();
        let scope = resolve_forward(&session, Some("proj/sub")).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.subgroup.as_deref(), Some("sub"));
        assert_eq!(scope.task, None);
    }

    #[test]
    fn test_forward_three_segments_name_a_task() {
        let session = fixture_session();
        let scope = resolve_forward(&session, Some("proj/sub/gamma")).unwrap();
        assert_eq!(scope.task.as_deref(), Some("gamma"));
    }

    #[test]
    fn test_forward_root_selector() {
        let session = fixture_session();
        let scope = resolve_forward(&session, Some(".")).unwrap();
        assert_eq!(scope.group.as_deref(), Some(""));
        assert_eq!(scope.subgroup, None);
    }

    #[test]
    fn test_forward_root_prefix_shifts_left() {
        let session = fixture_session();
        let scope = resolve_forward(&session, Some("./proj")).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.subgroup, None);

        let scope = resolve_forward(&session, Some("./proj/beta")).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.subgroup.as_deref(), Some(""));
        assert_eq!(scope.task.as_deref(), Some("beta"));
    }

    #[test]
    fn test_forward_gid_binds_left() {
        let session = fixture_session();
        let scope = resolve_forward(&session, Some("1")).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.subgroup, None);

        let scope = resolve_forward(&session, Some("1/1")).unwrap();
        assert_eq!(scope.subgroup.as_deref(), Some("sub"));
        assert_eq!(scope.task, None);

        let scope = resolve_forward(&session, Some("1/1/1")).unwrap();
        assert_eq!(scope.task.as_deref(), Some("delta"));
    }

    #[test]
    fn test_forward_current_literal_masks_halted() {
        let mut session = fixture_session();
        session.set_current(&TaskPath::new("proj", "sub", "gamma"), true);
        let scope = resolve_forward(&session, Some("CURRENT")).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.task, None);
    }

    #[test]
    fn test_forward_previous_literal() {
        let mut session = fixture_session();
        session.previous.push(TaskPath::new("proj", "", "beta"));
        let scope = resolve_forward(&session, Some("PREVIOUS")).unwrap();
        assert_eq!(scope.group.as_deref(), Some("proj"));
        assert_eq!(scope.subgroup.as_deref(), Some(""));
        assert_eq!(scope.task.as_deref(), Some("beta"));
    }
}
