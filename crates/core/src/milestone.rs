//! Milestone model - a named, ordered grouping of a goal's tasks.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use crate::id::{MilestoneId, TaskId};
use crate::task::Task;
use crate::Time;

/// A milestone references a subset of its goal's tasks by id.
///
/// It does not own the tasks; ids that no longer resolve are ignored by the
/// derived computations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique identifier
    pub id: MilestoneId,

    /// Milestone title
    pub title: String,

    /// Referenced tasks, in order
    pub task_ids: Vec<TaskId>,

    /// Optional deadline
    pub deadline: Option<Time>,

    /// Position among the goal's milestones
    pub order: i32,
}

impl Milestone {
    /// Create a milestone with no linked tasks.
    pub fn new(title: impl Into<String>, order: i32) -> Self {
        Self {
            id: MilestoneId::new(),
            title: title.into(),
            task_ids: Vec::new(),
            deadline: None,
            order,
        }
    }

    /// Replace the referenced task set.
    pub fn link_tasks(&mut self, task_ids: impl IntoIterator<Item = TaskId>) {
        self.task_ids = task_ids.into_iter().collect();
    }

    fn resolve<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let ids: HashSet<TaskId> = self.task_ids.iter().copied().collect();
        tasks.iter().filter(|t| ids.contains(&t.id)).collect()
    }

    /// True iff the reference set resolves to at least one task and every
    /// resolved task is completed.
    pub fn is_completed(&self, tasks: &[Task]) -> bool {
        if self.task_ids.is_empty() {
            return false;
        }
        let resolved = self.resolve(tasks);
        !resolved.is_empty() && resolved.iter().all(|t| t.is_completed())
    }

    /// Completed fraction of the resolved tasks, 0.0 if nothing resolves.
    pub fn progress(&self, tasks: &[Task]) -> f64 {
        let resolved = self.resolve(tasks);
        if resolved.is_empty() {
            return 0.0;
        }
        let completed = resolved.iter().filter(|t| t.is_completed()).count();
        completed as f64 / resolved.len() as f64
    }
}
