use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::path::{ROOT_NAME, TaskPath};

/// Error type for positional lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("invalid index, must be an integer: {0}")]
    NotAnInteger(String),
    #[error("invalid index: {0}")]
    OutOfRange(usize),
}

/// One subgroup: a name and its task slots in creation order. A removed
/// task leaves a null slot behind so later positions stay stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgroupNode {
    pub name: String,
    pub tasks: Vec<Option<String>>,
}

impl SubgroupNode {
    fn root() -> Self {
        SubgroupNode {
            name: ROOT_NAME.to_string(),
            tasks: Vec::new(),
        }
    }
}

/// One group: a name and its subgroups in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub name: String,
    pub subgroups: Vec<SubgroupNode>,
}

impl GroupNode {
    fn new(name: &str) -> Self {
        GroupNode {
            name: name.to_string(),
            subgroups: vec![SubgroupNode::root()],
        }
    }
}

// Persisted as nested arrays: [[group, [[subgroup, [task|null, ...]], ...]], ...]

impl Serialize for SubgroupNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, &self.tasks).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SubgroupNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, tasks) = <(String, Vec<Option<String>>)>::deserialize(deserializer)?;
        Ok(SubgroupNode { name, tasks })
    }
}

impl Serialize for GroupNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, &self.subgroups).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GroupNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, subgroups) = <(String, Vec<SubgroupNode>)>::deserialize(deserializer)?;
        Ok(GroupNode { name, subgroups })
    }
}

/// Ordered tree of group / subgroup / task names. Positions in the tree
/// are the ids used by the id-selector grammars; appending never
/// reorders existing entries, so ids are stable until a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    pub groups: Vec<GroupNode>,
}

impl Default for Index {
    fn default() -> Self {
        Index {
            groups: vec![GroupNode::new(ROOT_NAME)],
        }
    }
}

impl Index {
    pub fn new() -> Self {
        Index::default()
    }

    /// Parse one id segment as a position.
    pub fn parse_position(segment: &str) -> Result<usize, IndexError> {
        segment
            .parse::<usize>()
            .map_err(|_| IndexError::NotAnInteger(segment.to_string()))
    }

    pub fn group_position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    pub fn subgroup_position(&self, group: usize, name: &str) -> Option<usize> {
        self.groups
            .get(group)?
            .subgroups
            .iter()
            .position(|s| s.name == name)
    }

    /// Positions of a task found by name, skipping removed slots.
    pub fn position_of(&self, path: &TaskPath) -> Option<(usize, usize, usize)> {
        let gi = self.group_position(&path.group)?;
        let si = self.subgroup_position(gi, &path.subgroup)?;
        let ti = self.groups[gi].subgroups[si]
            .tasks
            .iter()
            .position(|t| t.as_deref() == Some(path.task.as_str()))?;
        Some((gi, si, ti))
    }

    /// Register a task, creating its group and subgroup on first use. A
    /// newly created group always starts with a root subgroup so root
    /// tasks keep position semantics.
    pub fn add(&mut self, path: &TaskPath) {
        let gi = match self.group_position(&path.group) {
            Some(i) => i,
            None => {
                self.groups.push(GroupNode::new(&path.group));
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[gi];
        let si = match group.subgroups.iter().position(|s| s.name == path.subgroup) {
            Some(i) => i,
            None => {
                group.subgroups.push(SubgroupNode {
                    name: path.subgroup.clone(),
                    tasks: Vec::new(),
                });
                group.subgroups.len() - 1
            }
        };
        group.subgroups[si].tasks.push(Some(path.task.clone()));
    }

    /// Null out the task's slot, keeping the positions of all other
    /// slots unchanged. Missing tasks are ignored.
    pub fn remove(&mut self, path: &TaskPath) {
        if let Some((gi, si, ti)) = self.position_of(path) {
            self.groups[gi].subgroups[si].tasks[ti] = None;
        }
    }

    /// Resolve an id path to names. The walk stops at the first null
    /// position (remaining names stay null); a removed task slot yields
    /// a null task name.
    pub fn idxs_to_names(
        &self,
        idxs: [Option<usize>; 3],
    ) -> Result<[Option<String>; 3], IndexError> {
        let mut names: [Option<String>; 3] = [None, None, None];

        let gi = match idxs[0] {
            Some(i) => i,
            None => return Ok(names),
        };
        let group = self.groups.get(gi).ok_or(IndexError::OutOfRange(gi))?;
        names[0] = Some(group.name.clone());

        let si = match idxs[1] {
            Some(i) => i,
            None => return Ok(names),
        };
        let subgroup = group
            .subgroups
            .get(si)
            .ok_or(IndexError::OutOfRange(si))?;
        names[1] = Some(subgroup.name.clone());

        let ti = match idxs[2] {
            Some(i) => i,
            None => return Ok(names),
        };
        let slot = subgroup.tasks.get(ti).ok_or(IndexError::OutOfRange(ti))?;
        names[2] = slot.clone();

        Ok(names)
    }

    /// Start over from a list of task paths in directory-walk order.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = TaskPath>,
    {
        *self = Index::default();
        for entry in entries {
            self.add(&entry);
        }
    }
}
