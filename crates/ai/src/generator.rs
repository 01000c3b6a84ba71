//! Task generator seam.

use std::collections::VecDeque;

use async_trait::async_trait;
use goalplan_core::{Goal, Milestone, Task, Time};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{AiError, Result};

/// A task proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTask {
    /// Task title
    pub title: String,
    /// Estimated duration in minutes, always positive
    pub minutes: u32,
}

impl GeneratedTask {
    /// Convenience constructor.
    pub fn new(title: impl Into<String>, minutes: u32) -> Self {
        Self {
            title: title.into(),
            minutes,
        }
    }

    /// Turn into a pending, unscheduled task.
    pub fn into_task(self) -> Task {
        Task::new(self.title, self.minutes)
    }
}

/// A milestone proposed by the model. Carries no task links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneStub {
    /// Milestone title
    pub title: String,
    /// Sort key
    pub order: i32,
}

impl MilestoneStub {
    /// Turn into a milestone with an empty task set.
    pub fn into_milestone(self) -> Milestone {
        Milestone::new(self.title, self.order)
    }
}

/// A replacement plan for an existing goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// New task list
    pub tasks: Vec<GeneratedTask>,
    /// New milestones
    pub milestones: Vec<MilestoneStub>,
}

/// Breaks goals down into tasks.
#[async_trait]
pub trait TaskGenerator: Send + Sync {
    /// Propose tasks for a new goal.
    async fn generate_tasks(&self, description: &str, deadline: Time) -> Result<Vec<GeneratedTask>>;

    /// Propose a replacement plan for `goal` following `instruction`.
    async fn revise_goal(&self, goal: &Goal, instruction: &str) -> Result<Revision>;
}

/// Generator that replays queued answers, for tests and offline use.
///
/// An empty queue yields a `Parse` error.
#[derive(Default)]
pub struct ScriptedGenerator {
    generations: Mutex<VecDeque<Result<Vec<GeneratedTask>>>>,
    revisions: Mutex<VecDeque<Result<Revision>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next `generate_tasks` call.
    pub fn with_tasks(mut self, tasks: Vec<GeneratedTask>) -> Self {
        self.generations.get_mut().push_back(Ok(tasks));
        self
    }

    /// Queue a failure for the next `generate_tasks` call.
    pub fn with_generation_error(mut self, error: AiError) -> Self {
        self.generations.get_mut().push_back(Err(error));
        self
    }

    /// Queue an answer for the next `revise_goal` call.
    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revisions.get_mut().push_back(Ok(revision));
        self
    }

    /// Queue a failure for the next `revise_goal` call.
    pub fn with_revision_error(mut self, error: AiError) -> Self {
        self.revisions.get_mut().push_back(Err(error));
        self
    }

    /// Descriptions and instructions received so far.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl TaskGenerator for ScriptedGenerator {
    async fn generate_tasks(&self, description: &str, _deadline: Time) -> Result<Vec<GeneratedTask>> {
        self.prompts.lock().await.push(description.to_string());
        self.generations
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Parse("no scripted generation left".into())))
    }

    async fn revise_goal(&self, _goal: &Goal, instruction: &str) -> Result<Revision> {
        self.prompts.lock().await.push(instruction.to_string());
        self.revisions
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Parse("no scripted revision left".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_scripted_generator_replays_in_order() {
        let generator = ScriptedGenerator::new()
            .with_tasks(vec![GeneratedTask::new("A", 10)])
            .with_generation_error(AiError::Unauthorized(401));

        let first = generator.generate_tasks("goal", Utc::now()).await.unwrap();
        assert_eq!(first, vec![GeneratedTask::new("A", 10)]);
        assert!(matches!(
            generator.generate_tasks("goal", Utc::now()).await,
            Err(AiError::Unauthorized(401))
        ));
        assert!(matches!(
            generator.generate_tasks("goal", Utc::now()).await,
            Err(AiError::Parse(_))
        ));
        assert_eq!(generator.prompts().await.len(), 3);
    }

    #[test]
    fn test_conversions() {
        let task = GeneratedTask::new("Read", 45).into_task();
        assert_eq!(task.title, "Read");
        assert_eq!(task.estimated_minutes, 45);
        assert!(task.scheduled_date.is_none());

        let milestone = MilestoneStub { title: "Phase".into(), order: 2 }.into_milestone();
        assert_eq!(milestone.order, 2);
        assert!(milestone.task_ids.is_empty());
    }
}
