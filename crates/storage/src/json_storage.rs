//! JSON file storage implementation.
//!
//! Stores each goal as a JSON file under `goals/`, keeps small per-goal meta
//! markers (version + updated_at) under `meta/goals/`, and keeps settings in
//! a single `settings.json` object.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use goalplan_core::{Goal, GoalId};
use tokio::fs;
use tracing::debug;

use super::{Result, Storage};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage, creating the directories it needs under `root`.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("goals")).await?;
        fs::create_dir_all(root.join("meta").join("goals")).await?;

        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn goal_path(&self, id: GoalId) -> PathBuf {
        self.root.join("goals").join(format!("{}.json", id))
    }

    fn meta_path(&self, id: GoalId) -> PathBuf {
        self.root.join("meta").join("goals").join(format!("{}.meta.json", id))
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Read and increment the goal's version marker, return the new version.
    async fn bump_version(&self, id: GoalId) -> Result<u64> {
        let path = self.meta_path(id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    async fn read_settings(&self) -> Result<BTreeMap<String, i64>> {
        Ok(read_json(&self.settings_path()).await?.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        let json = serde_json::to_string_pretty(goal)?;
        fs::write(self.goal_path(goal.id), json.as_bytes()).await?;

        let version = self.bump_version(goal.id).await?;
        debug!(goal_id = %goal.id, version, "saved goal");
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        read_json(&self.goal_path(id)).await
    }

    async fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut goals: Vec<Goal> = list_dir(&self.root.join("goals")).await?;
        goals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(goals)
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<()> {
        for path in [self.goal_path(id), self.meta_path(id)] {
            fs::remove_file(path).await.or_else(|e| {
                if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
            })?;
        }
        debug!(goal_id = %id, "deleted goal");
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.read_settings().await?.get(key).copied())
    }

    async fn set_setting(&mut self, key: &str, value: i64) -> Result<()> {
        let mut settings = self.read_settings().await?;
        settings.insert(key.to_string(), value);
        let json = serde_json::to_string_pretty(&settings)?;
        fs::write(self.settings_path(), json.as_bytes()).await?;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Ok(Some(item)) = read_json(&entry.path()).await {
            items.push(item);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{work_end_key, StorageError};
    use chrono::{Duration, Utc};
    use goalplan_core::{Milestone, Task, WorkWindow};

    fn sample_goal(title: &str) -> Goal {
        let mut goal = Goal::new(
            title,
            Utc::now() + Duration::days(7),
            vec![Task::new("Research", 60), Task::new("Draft", 30)],
        );
        goal.milestones.push(Milestone::new("Phase 1", 0));
        goal
    }

    #[tokio::test]
    async fn test_goal_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let goal = sample_goal("Run a marathon");
        storage.save_goal(&goal).await.unwrap();

        let loaded = storage.load_goal(goal.id).await.unwrap().unwrap();
        assert_eq!(loaded, goal);
    }

    #[tokio::test]
    async fn test_list_goals_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let mut newer = sample_goal("Newer");
        let mut older = sample_goal("Older");
        older.created_at = Utc::now() - Duration::days(3);
        newer.created_at = Utc::now();
        storage.save_goal(&newer).await.unwrap();
        storage.save_goal(&older).await.unwrap();

        let goals = storage.list_goals().await.unwrap();
        let titles: Vec<_> = goals.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Older", "Newer"]);
    }

    #[tokio::test]
    async fn test_delete_goal_cascades() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let goal = sample_goal("Temporary");
        storage.save_goal(&goal).await.unwrap();
        storage.delete_goal(goal.id).await.unwrap();

        assert!(storage.load_goal(goal.id).await.unwrap().is_none());
        assert!(storage.list_goals().await.unwrap().is_empty());
        // Deleting twice is fine.
        storage.delete_goal(goal.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_version_marker_increments() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let goal = sample_goal("Versioned");
        storage.save_goal(&goal).await.unwrap();
        storage.save_goal(&goal).await.unwrap();

        let meta = std::fs::read_to_string(storage.meta_path(goal.id)).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&meta).unwrap();
        assert_eq!(meta["version"], 2);
    }

    #[tokio::test]
    async fn test_working_hours_persist_as_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        storage.save_work_window(2, WorkWindow::new(8, 16).unwrap()).await.unwrap();
        assert_eq!(storage.get_setting("work_start_hour_2").await.unwrap(), Some(8));

        let reopened = JsonStorage::new(dir.path()).await.unwrap();
        let hours = reopened.load_working_hours().await.unwrap();
        assert_eq!(hours.lookup(2), WorkWindow { start_hour: 8, end_hour: 16 });
        assert_eq!(hours.lookup(3), WorkWindow::default());
    }

    #[tokio::test]
    async fn test_out_of_range_setting_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        storage.set_setting(&work_end_key(4), 30).await.unwrap();
        let err = storage.load_working_hours().await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidSetting(_)));
    }
}
