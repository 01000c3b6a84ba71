//! Completion time estimation.

use chrono::{DateTime, Utc};
use goalplan_core::{Goal, TaskStatus};

/// Estimate of when a goal's remaining work finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEstimate {
    /// Estimated minutes of pending work
    pub remaining_minutes: u64,

    /// Pending tasks without a scheduled slot
    pub unscheduled_pending: usize,

    /// End of the last scheduled pending task
    pub projected_finish: Option<DateTime<Utc>>,

    /// Whether the projected finish falls after the deadline.
    /// The deadline is advisory, so this is informational only.
    pub past_deadline: bool,
}

/// Completion time estimator.
#[derive(Debug, Default)]
pub struct CompletionEstimator;

impl CompletionEstimator {
    /// Estimate goal completion from the tasks' scheduled slots.
    pub fn estimate_goal(&self, goal: &Goal) -> CompletionEstimate {
        let pending: Vec<_> = goal
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect();

        let remaining_minutes = pending.iter().map(|t| u64::from(t.estimated_minutes)).sum();
        let unscheduled_pending = pending.iter().filter(|t| t.scheduled_date.is_none()).count();
        let projected_finish = pending.iter().filter_map(|t| t.scheduled_end()).max();

        CompletionEstimate {
            remaining_minutes,
            unscheduled_pending,
            projected_finish,
            past_deadline: projected_finish.is_some_and(|end| end > goal.deadline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use goalplan_core::Task;

    #[test]
    fn test_estimate_ignores_finished_tasks() {
        let deadline = Utc.with_ymd_and_hms(2026, 3, 6, 18, 0, 0).unwrap();
        let mut done = Task::new("Done", 90);
        done.status = TaskStatus::Completed;
        let mut skipped = Task::new("Skipped", 30);
        skipped.status = TaskStatus::Skipped;
        let mut scheduled = Task::new("Scheduled", 60);
        scheduled.scheduled_date = Some(Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap());
        let floating = Task::new("Floating", 15);

        let goal = Goal::new("Write paper", deadline, vec![done, skipped, scheduled, floating]);
        let estimate = CompletionEstimator.estimate_goal(&goal);

        assert_eq!(estimate.remaining_minutes, 75);
        assert_eq!(estimate.unscheduled_pending, 1);
        assert_eq!(
            estimate.projected_finish,
            Some(Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap())
        );
        assert!(!estimate.past_deadline);
    }

    #[test]
    fn test_flags_finish_after_deadline() {
        let deadline = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let mut late = Task::new("Late", 120);
        late.scheduled_date = Some(deadline - Duration::minutes(30));

        let goal = Goal::new("Tight", deadline, vec![late]);
        assert!(CompletionEstimator.estimate_goal(&goal).past_deadline);
    }
}
