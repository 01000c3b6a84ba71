//! Goal management service.
//!
//! Ties storage, task generation, the calendar and reminders together. Each
//! collaborator is injected, so the same manager runs against files and the
//! Gemini API in the CLI and against in-memory doubles in tests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use chrono_tz::Tz;
use goalplan_ai::{GeneratedTask, MilestoneStub, TaskGenerator};
use goalplan_calendar::{
    remove_existing, sync, CalendarGate, CalendarStore, RemovalReport, Scheduler, SyncReport,
};
use goalplan_core::{
    Goal, GoalId, Milestone, MilestoneId, Task, TaskId, Time, Weekday, WorkWindow, WorkingHours,
};
use goalplan_storage::Storage;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, WorkError};
use crate::notify::Notifier;

/// Title of the day-before deadline reminder.
pub const DEADLINE_REMINDER_TITLE: &str = "Goal deadline approaching";

/// Title of a per-task start reminder.
pub const TASK_REMINDER_TITLE: &str = "Task starting";

/// What a scheduling run did.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
    /// The goal as saved after the run
    pub goal: Goal,
    /// Tasks given a slot
    pub placed: usize,
    /// Tasks left without a slot
    pub unscheduled: usize,
    /// False when the scheduling horizon ran out
    pub fully_scheduled: bool,
    /// Previous events taken out of the calendar
    pub removed: RemovalReport,
    /// New events written to the calendar
    pub synced: SyncReport,
}

/// Goal management service.
///
/// Calendar runs (schedule, unschedule, revise, delete) hold `calendar_runs`
/// from loading the goal until its new links are saved, so two runs never
/// work from the same stale set of event ids.
pub struct GoalManager<S: Storage, C: CalendarStore> {
    storage: Arc<Mutex<S>>,
    generator: Arc<dyn TaskGenerator>,
    notifier: Arc<dyn Notifier>,
    calendar: CalendarGate<C>,
    calendar_runs: Mutex<()>,
    tz: Tz,
}

impl<S: Storage, C: CalendarStore> GoalManager<S, C> {
    /// Create a manager. Days are computed in `tz`.
    pub fn new(
        storage: S,
        generator: Arc<dyn TaskGenerator>,
        notifier: Arc<dyn Notifier>,
        calendar: CalendarGate<C>,
        tz: Tz,
    ) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            generator,
            notifier,
            calendar,
            calendar_runs: Mutex::new(()),
            tz,
        }
    }

    /// Time zone in use.
    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    async fn load(&self, id: GoalId) -> Result<Goal> {
        self.storage
            .lock()
            .await
            .load_goal(id)
            .await?
            .ok_or(WorkError::GoalNotFound(id))
    }

    async fn save(&self, goal: &Goal) -> Result<()> {
        self.storage.lock().await.save_goal(goal).await?;
        Ok(())
    }

    async fn notify_scheduled(&self, tasks: &[Task]) {
        for task in tasks {
            if let Some(at) = task.scheduled_date {
                self.notifier
                    .schedule_notification(TASK_REMINDER_TITLE, &task.title, at)
                    .await;
            }
        }
    }

    /// Create a goal, asking the generator for its tasks.
    ///
    /// Nothing is saved if generation fails. A reminder is scheduled for the
    /// day before the deadline when that is still in the future.
    pub async fn create_goal(
        &self,
        title: &str,
        deadline: Time,
        start_date: Option<Time>,
    ) -> Result<Goal> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WorkError::InvalidInput("goal title must not be empty".into()));
        }

        let generated = self.generator.generate_tasks(title, deadline).await?;
        let tasks = generated.into_iter().map(GeneratedTask::into_task).collect();
        let mut goal = Goal::new(title, deadline, tasks);
        if let Some(start) = start_date {
            goal = goal.with_start_date(start);
        }

        self.save(&goal).await?;
        info!(goal_id = %goal.id, tasks = goal.tasks.len(), "goal created");

        self.notify_scheduled(&goal.tasks).await;
        let reminder = deadline - Duration::days(1);
        if reminder > Utc::now() {
            self.notifier
                .schedule_notification(
                    DEADLINE_REMINDER_TITLE,
                    &format!("\"{title}\" is due tomorrow."),
                    reminder,
                )
                .await;
        }

        Ok(goal)
    }

    /// All goals, oldest first.
    pub async fn list_goals(&self) -> Result<Vec<Goal>> {
        Ok(self.storage.lock().await.list_goals().await?)
    }

    /// One goal.
    pub async fn get_goal(&self, id: GoalId) -> Result<Goal> {
        self.load(id).await
    }

    /// Replace a goal's tasks and milestones with a generated revision.
    ///
    /// Calendar events of the replaced tasks are removed when calendar
    /// access is available. New milestones start with no linked tasks.
    pub async fn revise_goal(&self, id: GoalId, instruction: &str) -> Result<Goal> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(WorkError::InvalidInput("instruction must not be empty".into()));
        }

        let current = self.load(id).await?;
        let revision = self.generator.revise_goal(&current, instruction).await?;

        let _run = self.calendar_runs.lock().await;
        let mut goal = self.load(id).await?;
        let access = self.calendar.authorize().await;
        let removed = remove_existing(&access, &mut goal.tasks, &goal.title, Utc::now()).await?;
        if removed.failed > 0 {
            warn!(failed = removed.failed, "some events of the replaced plan were left in the calendar");
        }

        let tasks = revision.tasks.into_iter().map(GeneratedTask::into_task).collect();
        let milestones = revision
            .milestones
            .into_iter()
            .map(MilestoneStub::into_milestone)
            .collect();
        goal.replace_plan(tasks, milestones);
        self.save(&goal).await?;
        info!(
            goal_id = %goal.id,
            tasks = goal.tasks.len(),
            milestones = goal.milestones.len(),
            "goal revised"
        );

        self.notify_scheduled(&goal.tasks).await;
        Ok(goal)
    }

    /// Flip a task between completed and pending.
    pub async fn toggle_task(&self, goal_id: GoalId, task_id: TaskId) -> Result<Task> {
        let mut goal = self.load(goal_id).await?;
        let task = goal.task_mut(task_id).ok_or(WorkError::TaskNotFound(task_id))?;
        task.toggle();
        let task = task.clone();
        self.save(&goal).await?;
        info!(%goal_id, %task_id, status = %task.status, "task toggled");
        Ok(task)
    }

    /// Point a milestone at a set of the goal's tasks.
    pub async fn link_milestone(
        &self,
        goal_id: GoalId,
        milestone_id: MilestoneId,
        task_ids: Vec<TaskId>,
    ) -> Result<Milestone> {
        let mut goal = self.load(goal_id).await?;
        if let Some(missing) = task_ids.iter().find(|id| goal.task(**id).is_none()) {
            return Err(WorkError::TaskNotFound(*missing));
        }
        let milestone = goal
            .milestone_mut(milestone_id)
            .ok_or(WorkError::MilestoneNotFound(milestone_id))?;
        milestone.link_tasks(task_ids);
        let milestone = milestone.clone();
        self.save(&goal).await?;
        Ok(milestone)
    }

    /// Delete a goal with its tasks and milestones.
    ///
    /// Calendar events are removed first when access is available.
    pub async fn delete_goal(&self, id: GoalId) -> Result<()> {
        let _run = self.calendar_runs.lock().await;
        let mut goal = self.load(id).await?;
        let access = self.calendar.authorize().await;
        remove_existing(&access, &mut goal.tasks, &goal.title, Utc::now()).await?;
        self.storage.lock().await.delete_goal(id).await?;
        info!(goal_id = %id, "goal deleted");
        Ok(())
    }

    /// Place a goal's tasks on the calendar.
    ///
    /// Events from an earlier run are removed first, so running this again
    /// replaces rather than duplicates. Fails with a permission error,
    /// before touching anything, when calendar access is denied. A goal
    /// without tasks returns at once without touching the calendar.
    pub async fn schedule_goal(&self, id: GoalId) -> Result<ScheduleOutcome> {
        let _run = self.calendar_runs.lock().await;
        let mut goal = self.load(id).await?;
        if goal.tasks.is_empty() {
            debug!(goal_id = %goal.id, "no tasks to schedule");
            return Ok(ScheduleOutcome {
                goal,
                placed: 0,
                unscheduled: 0,
                fully_scheduled: true,
                removed: RemovalReport::default(),
                synced: SyncReport::default(),
            });
        }
        let access = self.calendar.authorize().await;
        access.ensure_granted()?;

        let hours = self.storage.lock().await.load_working_hours().await?;
        let now = Utc::now();

        let removed = remove_existing(&access, &mut goal.tasks, &goal.title, now).await?;

        let scheduler = Scheduler::new(hours, self.tz);
        let schedule = scheduler.schedule(&access, &goal.tasks, goal.effective_start(now), goal.deadline)?;
        let placed = schedule.placed().count();
        let unscheduled = schedule.unscheduled_count();
        let fully_scheduled = schedule.fully_scheduled;
        goal.tasks = schedule.tasks;

        let synced = sync(&access, &mut goal.tasks, &goal.title).await?;
        self.save(&goal).await?;

        if !fully_scheduled {
            warn!(goal_id = %goal.id, unscheduled, "goal only partly scheduled");
        }
        info!(goal_id = %goal.id, placed, created = synced.created, "goal scheduled");

        self.notify_scheduled(&goal.tasks).await;

        Ok(ScheduleOutcome {
            goal,
            placed,
            unscheduled,
            fully_scheduled,
            removed,
            synced,
        })
    }

    /// Take a goal's tasks off the calendar. A no-op without calendar access.
    pub async fn unschedule_goal(&self, id: GoalId) -> Result<RemovalReport> {
        let _run = self.calendar_runs.lock().await;
        let mut goal = self.load(id).await?;
        let access = self.calendar.authorize().await;
        let removed = remove_existing(&access, &mut goal.tasks, &goal.title, Utc::now()).await?;
        self.save(&goal).await?;
        Ok(removed)
    }

    /// Current working-hours snapshot.
    pub async fn working_hours(&self) -> Result<WorkingHours> {
        Ok(self.storage.lock().await.load_working_hours().await?)
    }

    /// Change one weekday's working window.
    pub async fn set_work_window(&self, weekday: Weekday, start_hour: u8, end_hour: u8) -> Result<()> {
        let window = WorkWindow::new(start_hour, end_hour).map_err(goalplan_storage::StorageError::from)?;
        self.storage.lock().await.save_work_window(weekday, window).await?;
        info!(weekday, start_hour, end_hour, "working hours updated");
        Ok(())
    }
}
