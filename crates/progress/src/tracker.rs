//! Progress tracking service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goalplan_core::{Goal, GoalId, GoalProgress, MilestoneId};
use goalplan_storage::Storage;
use tracing::warn;

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Get goal progress.
    async fn get_goal_progress(&self, goal_id: GoalId) -> Option<GoalProgress>;

    /// Get progress of one milestone of a goal.
    async fn get_milestone_progress(
        &self,
        goal_id: GoalId,
        milestone_id: MilestoneId,
    ) -> Option<MilestoneProgress>;

    /// Take a progress snapshot across all goals.
    async fn snapshot(&self) -> ProgressSnapshot;
}

/// Progress of a single milestone.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneProgress {
    /// Milestone ID
    pub milestone_id: MilestoneId,
    /// Completed fraction of the resolved tasks
    pub fraction: f64,
    /// Whether every resolved task is completed
    pub completed: bool,
}

/// A snapshot of progress at a point in time.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Goal progress by goal ID, oldest goal first
    pub goal_progress: Vec<(GoalId, GoalProgress)>,

    /// Milestone progress by goal ID
    pub milestone_progress: Vec<(GoalId, MilestoneProgress)>,
}

/// Basic progress tracker implementation.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn load(&self, goal_id: GoalId) -> Option<Goal> {
        match self.storage.load_goal(goal_id).await {
            Ok(goal) => goal,
            Err(e) => {
                warn!(%goal_id, error = %e, "failed to load goal for progress");
                None
            }
        }
    }
}

fn milestone_progress(goal: &Goal) -> impl Iterator<Item = MilestoneProgress> + '_ {
    goal.milestones.iter().map(|m| MilestoneProgress {
        milestone_id: m.id,
        fraction: m.progress(&goal.tasks),
        completed: m.is_completed(&goal.tasks),
    })
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn get_goal_progress(&self, goal_id: GoalId) -> Option<GoalProgress> {
        let goal = self.load(goal_id).await?;
        Some(goal.rollup())
    }

    async fn get_milestone_progress(
        &self,
        goal_id: GoalId,
        milestone_id: MilestoneId,
    ) -> Option<MilestoneProgress> {
        let goal = self.load(goal_id).await?;
        let found = milestone_progress(&goal).find(|p| p.milestone_id == milestone_id);
        found
    }

    async fn snapshot(&self) -> ProgressSnapshot {
        let goals = match self.storage.list_goals().await {
            Ok(goals) => goals,
            Err(e) => {
                warn!(error = %e, "failed to list goals for snapshot");
                Vec::new()
            }
        };

        let mut goal_progress = Vec::new();
        let mut milestones = Vec::new();
        for goal in &goals {
            goal_progress.push((goal.id, goal.rollup()));
            milestones.extend(milestone_progress(goal).map(|p| (goal.id, p)));
        }

        ProgressSnapshot {
            timestamp: Utc::now(),
            goal_progress,
            milestone_progress: milestones,
        }
    }
}
