use std::fmt;

use serde::{Deserialize, Serialize};

/// The root group/subgroup name. Tasks directly under the base directory
/// live in the root group and root subgroup.
pub const ROOT_NAME: &str = "";

/// How the root name is written in selectors.
pub const ROOT_NAME_CHAR: &str = ".";

/// How a missing component is displayed.
pub const NONE_CHAR: &str = "_";

/// Selector segment separator.
pub const SEPARATOR: char = '/';

/// Selector literal naming the current task.
pub const CURRENT_LITERAL: &str = "CURRENT";

/// Selector literal naming the top of the previous stack.
pub const PREVIOUS_LITERAL: &str = "PREVIOUS";

/// File holding the current-task pointer.
pub const CURRENT_FILE: &str = "CURRENT";

/// File holding the previous-task stack.
pub const PREVIOUS_FILE: &str = "PREVIOUS";

/// File holding the persisted index tree.
pub const INDEX_FILE: &str = "INDEX";

/// Optional configuration file at the base directory root.
pub const CONFIG_FILE: &str = "config.toml";

/// Directory holding hook executables.
pub const HOOKS_DIR: &str = ".hooks";

/// Directory holding external exporter executables.
pub const EXPORTERS_DIR: &str = ".exporters";

/// Per-scope fetcher executable name.
pub const FETCHER_FILE: &str = ".fetcher";

/// Names that can never be used for a group, subgroup or task.
pub const RESERVED_NAMES: &[&str] = &[
    CURRENT_FILE,
    PREVIOUS_FILE,
    INDEX_FILE,
    CONFIG_FILE,
    HOOKS_DIR,
    EXPORTERS_DIR,
    FETCHER_FILE,
];

/// A valid task name starts with a letter and is not reserved.
pub fn is_valid_task_name(name: &str) -> bool {
    if RESERVED_NAMES.contains(&name) {
        return false;
    }
    name.chars().next().is_some_and(|c| c.is_alphabetic())
}

/// A valid group or subgroup name is the root name or a valid task name.
pub fn is_valid_group_name(name: &str) -> bool {
    name == ROOT_NAME || is_valid_task_name(name)
}

/// Split a selector string on `/`, mapping the `.` segment to the root
/// name.
pub fn split_selector(selector: &str) -> Vec<String> {
    selector
        .split(SEPARATOR)
        .map(|seg| {
            if seg == ROOT_NAME_CHAR {
                ROOT_NAME.to_string()
            } else {
                seg.to_string()
            }
        })
        .collect()
}

/// Display form of a single component: `.` for the root name, `_` when
/// missing.
pub fn display_name(name: Option<&str>) -> String {
    match name {
        None => NONE_CHAR.to_string(),
        Some(ROOT_NAME) => ROOT_NAME_CHAR.to_string(),
        Some(name) => name.to_string(),
    }
}

/// Display form of a possibly partial `group/subgroup/task` triple.
pub fn display_triple(group: Option<&str>, subgroup: Option<&str>, task: Option<&str>) -> String {
    format!(
        "{}{}{}{}{}",
        display_name(group),
        SEPARATOR,
        display_name(subgroup),
        SEPARATOR,
        display_name(task)
    )
}

// ---------------------------------------------------------------------------
// TaskPath
// ---------------------------------------------------------------------------

/// Fully-resolved reference to one task: group, subgroup and task name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskPath {
    pub group: String,
    pub subgroup: String,
    pub task: String,
}

impl TaskPath {
    pub fn new(
        group: impl Into<String>,
        subgroup: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        TaskPath {
            group: group.into(),
            subgroup: subgroup.into(),
            task: task.into(),
        }
    }

    /// Selector syntax for this path, e.g. `././mytask` for a root task.
    pub fn selector(&self) -> String {
        display_triple(
            Some(&self.group),
            Some(&self.subgroup),
            Some(&self.task),
        )
    }

    /// Parse the selector syntax written by [`TaskPath::selector`].
    /// Returns `None` unless the string has exactly three segments.
    pub fn from_selector(s: &str) -> Option<Self> {
        let segs = split_selector(s);
        match segs.as_slice() {
            [group, subgroup, task] => {
                Some(TaskPath::new(group.clone(), subgroup.clone(), task.clone()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector())
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// A possibly partial reference produced by the forward selector
/// grammars: a whole group, one subgroup, or a single task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    pub group: Option<String>,
    pub subgroup: Option<String>,
    pub task: Option<String>,
}

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.group.is_none() && self.subgroup.is_none() && self.task.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_task_names() {
        assert!(is_valid_task_name("work"));
        assert!(is_valid_task_name("a1"));
        assert!(is_valid_task_name("état"));
        assert!(!is_valid_task_name(""));
        assert!(!is_valid_task_name("1task"));
        assert!(!is_valid_task_name("-flag"));
        assert!(!is_valid_task_name(".hidden"));
        assert!(!is_valid_task_name("CURRENT"));
        assert!(!is_valid_task_name("PREVIOUS"));
        assert!(!is_valid_task_name("INDEX"));
        assert!(!is_valid_task_name("config.toml"));
    }

    #[test]
    fn test_valid_group_names() {
        assert!(is_valid_group_name(""));
        assert!(is_valid_group_name("proj"));
        assert!(!is_valid_group_name("INDEX"));
        assert!(!is_valid_group_name("9lives"));
    }

    #[test]
    fn test_split_selector_maps_root() {
        assert_eq!(split_selector("a/b/c"), vec!["a", "b", "c"]);
        assert_eq!(split_selector("./x"), vec!["", "x"]);
        assert_eq!(split_selector("."), vec![""]);
        assert_eq!(split_selector("a//c"), vec!["a", "", "c"]);
    }

    #[test]
    fn test_display_triple() {
        assert_eq!(display_triple(Some(""), Some(""), Some("t")), "././t");
        assert_eq!(display_triple(Some("g"), Some("s"), None), "g/s/_");
        assert_eq!(display_triple(None, None, None), "_/_/_");
    }

    #[test]
    fn test_selector_round_trip() {
        let p = TaskPath::new("", "", "alpha");
        assert_eq!(p.selector(), "././alpha");
        assert_eq!(TaskPath::from_selector(&p.selector()), Some(p));

        let p = TaskPath::new("proj", "sub", "beta");
        assert_eq!(p.selector(), "proj/sub/beta");
        assert_eq!(TaskPath::from_selector(&p.selector()), Some(p));
    }

    #[test]
    fn test_from_selector_rejects_wrong_arity() {
        assert_eq!(TaskPath::from_selector("a/b"), None);
        assert_eq!(TaskPath::from_selector("a/b/c/d"), None);
    }
}
