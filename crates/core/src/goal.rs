//! Goal model - top-level objective owning its tasks and milestones.

use serde::{Deserialize, Serialize};
use crate::id::{GoalId, MilestoneId, TaskId};
use crate::milestone::Milestone;
use crate::task::Task;
use crate::Time;

/// A user-defined objective with a deadline.
///
/// Tasks and milestones are owned: deleting the goal deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: GoalId,

    /// Goal title
    pub title: String,

    /// Target date. Advisory only; scheduling may run past it.
    pub deadline: Time,

    /// When created
    pub created_at: Time,

    /// Earliest instant tasks may be placed. Without it, scheduling starts now.
    #[serde(default)]
    pub start_date: Option<Time>,

    /// Whether the whole goal is marked done
    pub is_completed: bool,

    /// Ordered tasks
    pub tasks: Vec<Task>,

    /// Milestones
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

/// Progress rollup for a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// Completed fraction of tasks (0.0-1.0)
    pub fraction: f64,

    /// Completed tasks
    pub completed_tasks: usize,

    /// All tasks
    pub total_tasks: usize,

    /// Completed fraction of milestones, `None` without milestones
    pub milestone_fraction: Option<f64>,

    /// Milestones whose tasks are all completed
    pub completed_milestones: Vec<MilestoneId>,
}

impl Default for GoalProgress {
    fn default() -> Self {
        Self {
            fraction: 0.0,
            completed_tasks: 0,
            total_tasks: 0,
            milestone_fraction: None,
            completed_milestones: Vec::new(),
        }
    }
}

impl Goal {
    /// Create a goal from freshly generated tasks.
    pub fn new(title: impl Into<String>, deadline: Time, tasks: Vec<Task>) -> Self {
        Self {
            id: GoalId::new(),
            title: title.into(),
            deadline,
            created_at: chrono::Utc::now(),
            start_date: None,
            is_completed: false,
            tasks,
            milestones: Vec::new(),
        }
    }

    /// Set an explicit start date.
    pub fn with_start_date(mut self, start: Time) -> Self {
        self.start_date = Some(start);
        self
    }

    /// The instant scheduling starts from: the explicit start date, or `now`.
    pub fn effective_start(&self, now: Time) -> Time {
        self.start_date.unwrap_or(now)
    }

    /// Find a task by id.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find a task by id, mutably.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Find a milestone by id, mutably.
    pub fn milestone_mut(&mut self, id: MilestoneId) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id == id)
    }

    /// Replace the whole plan, as a chat revision does.
    ///
    /// Milestones are kept sorted by `order`.
    pub fn replace_plan(&mut self, tasks: Vec<Task>, mut milestones: Vec<Milestone>) {
        milestones.sort_by_key(|m| m.order);
        self.tasks = tasks;
        self.milestones = milestones;
    }

    /// (completed, total) task counts.
    pub fn task_counts(&self) -> (usize, usize) {
        let completed = self.tasks.iter().filter(|t| t.is_completed()).count();
        (completed, self.tasks.len())
    }

    /// Completed fraction of tasks, 0.0 without tasks.
    pub fn progress(&self) -> f64 {
        let (completed, total) = self.task_counts();
        if total == 0 {
            return 0.0;
        }
        completed as f64 / total as f64
    }

    /// Completed fraction of milestones, `None` without milestones.
    pub fn milestone_progress(&self) -> Option<f64> {
        if self.milestones.is_empty() {
            return None;
        }
        let completed = self
            .milestones
            .iter()
            .filter(|m| m.is_completed(&self.tasks))
            .count();
        Some(completed as f64 / self.milestones.len() as f64)
    }

    /// Full progress rollup.
    pub fn rollup(&self) -> GoalProgress {
        let (completed_tasks, total_tasks) = self.task_counts();
        GoalProgress {
            fraction: self.progress(),
            completed_tasks,
            total_tasks,
            milestone_fraction: self.milestone_progress(),
            completed_milestones: self
                .milestones
                .iter()
                .filter(|m| m.is_completed(&self.tasks))
                .map(|m| m.id)
                .collect(),
        }
    }

    /// Total estimated minutes across all tasks.
    pub fn total_minutes(&self) -> u64 {
        self.tasks.iter().map(|t| u64::from(t.estimated_minutes)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::{Duration, Utc};

    fn goal_with(statuses: &[TaskStatus]) -> Goal {
        let tasks = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut t = Task::new(format!("Task {i}"), 30);
                t.status = *s;
                t
            })
            .collect();
        Goal::new("Learn Rust", Utc::now() + Duration::days(7), tasks)
    }

    #[test]
    fn test_progress_without_tasks() {
        let goal = goal_with(&[]);
        assert_eq!(goal.progress(), 0.0);
        assert_eq!(goal.task_counts(), (0, 0));
        assert_eq!(goal.milestone_progress(), None);
    }

    #[test]
    fn test_progress_counts_completed_only() {
        let goal = goal_with(&[TaskStatus::Completed, TaskStatus::Skipped, TaskStatus::Pending, TaskStatus::Completed]);
        assert_eq!(goal.task_counts(), (2, 4));
        assert_eq!(goal.progress(), 0.5);
    }

    #[test]
    fn test_effective_start_defaults_to_now() {
        let goal = goal_with(&[]);
        let now = goal.created_at + Duration::hours(5);
        assert_eq!(goal.effective_start(now), now);

        let start = goal.created_at + Duration::days(2);
        let goal = goal.with_start_date(start);
        assert_eq!(goal.effective_start(now), start);
    }

    #[test]
    fn test_replace_plan_sorts_milestones() {
        let mut goal = goal_with(&[TaskStatus::Pending]);
        goal.replace_plan(
            vec![Task::new("New A", 20), Task::new("New B", 40)],
            vec![Milestone::new("Second", 1), Milestone::new("First", 0)],
        );

        assert_eq!(goal.tasks.len(), 2);
        assert_eq!(goal.total_minutes(), 60);
        assert_eq!(goal.milestones[0].title, "First");
        assert_eq!(goal.milestones[1].title, "Second");
    }

    #[test]
    fn test_rollup_with_milestones() {
        let mut goal = goal_with(&[TaskStatus::Completed, TaskStatus::Pending]);
        let mut done = Milestone::new("Done", 0);
        done.link_tasks([goal.tasks[0].id]);
        let mut open = Milestone::new("Open", 1);
        open.link_tasks([goal.tasks[1].id]);
        let done_id = done.id;
        goal.milestones = vec![done, open];

        let rollup = goal.rollup();
        assert_eq!(rollup.completed_tasks, 1);
        assert_eq!(rollup.total_tasks, 2);
        assert_eq!(rollup.milestone_fraction, Some(0.5));
        assert_eq!(rollup.completed_milestones, vec![done_id]);
    }
}
