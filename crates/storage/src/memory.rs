//! In-memory storage, used by tests and dry runs.

use std::collections::HashMap;

use goalplan_core::{Goal, GoalId};

use super::{Result, Storage};

/// Storage backend that keeps everything in process memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    goals: HashMap<GoalId, Goal>,
    settings: HashMap<String, i64>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        self.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        Ok(self.goals.get(&id).cloned())
    }

    async fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut goals: Vec<Goal> = self.goals.values().cloned().collect();
        goals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(goals)
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<()> {
        self.goals.remove(&id);
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.settings.get(key).copied())
    }

    async fn set_setting(&mut self, key: &str, value: i64) -> Result<()> {
        self.settings.insert(key.to_string(), value);
        Ok(())
    }
}
