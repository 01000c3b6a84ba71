//! goalplan CLI - AI-assisted goal planning on a calendar.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use goalplan_ai::GeminiClient;
use goalplan_calendar::{CalendarGate, FileCalendarStore};
use goalplan_core::{weekday_name, Goal, GoalId, MilestoneId, TaskId, TaskStatus, Time};
use goalplan_progress::{BasicProgressTracker, CompletionEstimator, ProgressTracker};
use goalplan_storage::JsonStorage;
use goalplan_work::{GoalManager, LogNotifier, WorkError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{init_config, load_config, Config};

#[derive(Parser)]
#[command(name = "goalplan")]
#[command(about = "Break goals into tasks and put them on the calendar", long_about = None)]
struct Cli {
    /// Where goals, settings and the calendar file live
    #[arg(long, env = "GOALPLAN_DATA_DIR", default_value = ".goalplan", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Calendar placement
    #[command(subcommand)]
    Calendar(CalendarCommand),
    /// Working hours per weekday
    #[command(subcommand)]
    Hours(HoursCommand),
    /// Configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Create a goal and generate its tasks
    Create {
        /// What you want to achieve
        title: String,
        /// Deadline: YYYY-MM-DD, "YYYY-MM-DD HH:MM" or RFC 3339
        #[arg(long)]
        deadline: String,
        /// Earliest instant to schedule from (defaults to now)
        #[arg(long)]
        start: Option<String>,
    },
    /// List goals
    List,
    /// Show goal details
    Show {
        /// Goal ID
        id: String,
    },
    /// Regenerate tasks and milestones from an instruction
    Revise {
        /// Goal ID
        id: String,
        /// What to change
        instruction: String,
    },
    /// Delete a goal and its calendar events
    Delete {
        /// Goal ID
        id: String,
    },
    /// Attach tasks to a milestone
    LinkMilestone {
        /// Goal ID
        goal: String,
        /// Milestone ID
        milestone: String,
        /// Task IDs
        #[arg(required = true)]
        tasks: Vec<String>,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Flip a task between completed and pending
    Toggle {
        /// Goal ID
        goal: String,
        /// Task ID
        task: String,
    },
}

#[derive(Subcommand)]
enum CalendarCommand {
    /// Place the goal's tasks on the calendar, replacing earlier events
    Schedule {
        /// Goal ID
        goal: String,
    },
    /// Remove the goal's events from the calendar
    Unschedule {
        /// Goal ID
        goal: String,
    },
}

#[derive(Subcommand)]
enum HoursCommand {
    /// Show the working window of every weekday
    Show,
    /// Set one weekday's window
    Set {
        /// Weekday, 1 = Sunday .. 7 = Saturday
        weekday: u8,
        /// First working hour (0-23)
        start: u8,
        /// Hour work ends (0-23)
        end: u8,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a default config.toml
    Init,
}

type Manager = GoalManager<JsonStorage, FileCalendarStore>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.data_dir)?;
    let tz = config.time_zone()?;
    let manager = open_manager(&cli.data_dir, &config, tz).await?;

    match run(cli.command, &manager, &cli.data_dir, tz).await {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<WorkError>() {
            Some(work) => {
                debug!(error = %work, "command failed");
                bail!("{}", work.user_message())
            }
            None => Err(e),
        },
    }
}

async fn open_manager(data_dir: &Path, config: &Config, tz: Tz) -> Result<Manager> {
    let storage = JsonStorage::new(data_dir)
        .await
        .with_context(|| format!("open storage at {}", data_dir.display()))?;
    let generator = GeminiClient::new(config.gemini())?;
    let calendar = FileCalendarStore::new(data_dir.join("calendar.json"), config.calendar.name.clone());

    Ok(GoalManager::new(
        storage,
        Arc::new(generator),
        Arc::new(LogNotifier),
        CalendarGate::new(calendar),
        tz,
    ))
}

async fn run(command: Commands, manager: &Manager, data_dir: &Path, tz: Tz) -> Result<()> {
    match command {
        Commands::Goal(GoalCommand::Create { title, deadline, start }) => {
            let deadline = parse_instant(&deadline, tz, NaiveTime::from_hms_opt(23, 59, 0))?;
            let start = start
                .map(|s| parse_instant(&s, tz, Some(NaiveTime::MIN)))
                .transpose()?;
            let goal = manager.create_goal(&title, deadline, start).await?;
            println!("Created goal: {} - {}", goal.id, goal.title);
            print_tasks(&goal, tz);
        }
        Commands::Goal(GoalCommand::List) => {
            let tracker = BasicProgressTracker::new(Arc::new(JsonStorage::new(data_dir).await?));
            let snapshot = tracker.snapshot().await;
            let goals = manager.list_goals().await?;

            println!("Goals ({})", goals.len());
            for goal in goals {
                let fraction = snapshot
                    .goal_progress
                    .iter()
                    .find(|(id, _)| *id == goal.id)
                    .map(|(_, p)| p.fraction)
                    .unwrap_or_else(|| goal.progress());
                println!(
                    "  {} | {:>3.0}% | due {} | {}",
                    goal.id,
                    fraction * 100.0,
                    local(goal.deadline, tz),
                    goal.title
                );
            }
        }
        Commands::Goal(GoalCommand::Show { id }) => {
            let goal = manager.get_goal(parse_id::<GoalId>(&id, "goal")?).await?;
            let tracker = BasicProgressTracker::new(Arc::new(JsonStorage::new(data_dir).await?));
            let progress = goal.rollup();
            let estimate = CompletionEstimator.estimate_goal(&goal);

            println!("Goal: {}", goal.id);
            println!("  Title: {}", goal.title);
            println!("  Deadline: {}", local(goal.deadline, tz));
            if let Some(start) = goal.start_date {
                println!("  Start: {}", local(start, tz));
            }
            println!(
                "  Progress: {}/{} tasks ({:.0}%)",
                progress.completed_tasks,
                progress.total_tasks,
                progress.fraction * 100.0
            );
            println!("  Remaining: {} min", estimate.remaining_minutes);
            if let Some(finish) = estimate.projected_finish {
                let note = if estimate.past_deadline { " (after deadline)" } else { "" };
                println!("  Projected finish: {}{}", local(finish, tz), note);
            }
            if estimate.unscheduled_pending > 0 {
                println!("  Unscheduled pending tasks: {}", estimate.unscheduled_pending);
            }

            print_tasks(&goal, tz);

            if !goal.milestones.is_empty() {
                println!("  Milestones:");
                for m in &goal.milestones {
                    let mp = tracker.get_milestone_progress(goal.id, m.id).await;
                    let (fraction, done) = mp.map(|p| (p.fraction, p.completed)).unwrap_or((0.0, false));
                    println!(
                        "    {} | {} | {:>3.0}% | {} tasks | {}",
                        m.id,
                        if done { "done" } else { "open" },
                        fraction * 100.0,
                        m.task_ids.len(),
                        m.title
                    );
                }
            }
        }
        Commands::Goal(GoalCommand::Revise { id, instruction }) => {
            let goal = manager
                .revise_goal(parse_id::<GoalId>(&id, "goal")?, &instruction)
                .await?;
            println!(
                "Revised goal: {} tasks, {} milestones",
                goal.tasks.len(),
                goal.milestones.len()
            );
            print_tasks(&goal, tz);
        }
        Commands::Goal(GoalCommand::Delete { id }) => {
            let id = parse_id::<GoalId>(&id, "goal")?;
            manager.delete_goal(id).await?;
            println!("Deleted goal: {id}");
        }
        Commands::Goal(GoalCommand::LinkMilestone { goal, milestone, tasks }) => {
            let task_ids = tasks
                .iter()
                .map(|t| parse_id::<TaskId>(t, "task"))
                .collect::<Result<Vec<_>>>()?;
            let milestone = manager
                .link_milestone(
                    parse_id::<GoalId>(&goal, "goal")?,
                    parse_id::<MilestoneId>(&milestone, "milestone")?,
                    task_ids,
                )
                .await?;
            println!("Linked {} tasks to {}", milestone.task_ids.len(), milestone.title);
        }
        Commands::Task(TaskCommand::Toggle { goal, task }) => {
            let task = manager
                .toggle_task(parse_id::<GoalId>(&goal, "goal")?, parse_id::<TaskId>(&task, "task")?)
                .await?;
            println!("{} -> {}", task.title, task.status);
        }
        Commands::Calendar(CalendarCommand::Schedule { goal }) => {
            let outcome = manager.schedule_goal(parse_id::<GoalId>(&goal, "goal")?).await?;
            println!(
                "Scheduled {} tasks ({} previous events removed, {} events created)",
                outcome.placed, outcome.removed.removed, outcome.synced.created
            );
            if outcome.synced.failed > 0 {
                println!("  {} events could not be saved", outcome.synced.failed);
            }
            if !outcome.fully_scheduled {
                println!("  {} tasks did not fit before the scheduling horizon", outcome.unscheduled);
            }
            print_tasks(&outcome.goal, tz);
        }
        Commands::Calendar(CalendarCommand::Unschedule { goal }) => {
            let removed = manager.unschedule_goal(parse_id::<GoalId>(&goal, "goal")?).await?;
            println!("Removed {} events", removed.removed);
            if removed.failed > 0 {
                println!("  {} events could not be removed", removed.failed);
            }
        }
        Commands::Hours(HoursCommand::Show) => {
            let hours = manager.working_hours().await?;
            println!("Working hours ({tz})");
            for weekday in 1..=7u8 {
                let w = hours.lookup(weekday);
                println!("  {:<9} {:02}:00-{:02}:00", weekday_name(weekday), w.start_hour, w.end_hour);
            }
        }
        Commands::Hours(HoursCommand::Set { weekday, start, end }) => {
            manager.set_work_window(weekday, start, end).await?;
            println!("{}: {:02}:00-{:02}:00", weekday_name(weekday), start, end);
        }
        Commands::Config(ConfigCommand::Init) => {
            let path = config::config_path(data_dir);
            if init_config(data_dir)? {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_tasks(goal: &Goal, tz: Tz) {
    println!("  Tasks ({})", goal.tasks.len());
    for task in &goal.tasks {
        let when = task
            .scheduled_date
            .map(|d| local(d, tz))
            .unwrap_or_else(|| "unscheduled".to_string());
        println!(
            "    {} | {} | {:>4} min | {} | {}",
            task.id,
            format_status(task.status),
            task.estimated_minutes,
            when,
            task.title
        );
    }
}

fn format_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::Completed => "[x]",
        TaskStatus::Skipped => "[-]",
    }
}

fn local(t: Time, tz: Tz) -> String {
    t.with_timezone(&tz).format("%Y-%m-%d %a %H:%M").to_string()
}

fn parse_id<T: std::str::FromStr>(s: &str, what: &str) -> Result<T> {
    s.parse().map_err(|_| anyhow!("invalid {what} ID: {s}"))
}

/// Accepts RFC 3339, "YYYY-MM-DD HH:MM" in `tz`, or a bare date at
/// `date_time` in `tz`.
fn parse_instant(s: &str, tz: Tz, date_time: Option<NaiveTime>) -> Result<Time> {
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").or_else(|_| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|d| d.and_time(date_time.unwrap_or(NaiveTime::MIN)))
    });
    let naive = naive.map_err(|_| anyhow!("cannot read {s:?} as a date"))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("{s} does not exist in {tz}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant_forms() {
        let utc = chrono_tz::UTC;
        let expected = Utc.with_ymd_and_hms(2026, 4, 1, 23, 59, 0).unwrap();
        assert_eq!(parse_instant("2026-04-01", utc, NaiveTime::from_hms_opt(23, 59, 0)).unwrap(), expected);
        assert_eq!(parse_instant("2026-04-01 23:59", utc, None).unwrap(), expected);
        assert_eq!(parse_instant("2026-04-02T08:59:00+09:00", utc, None).unwrap(), expected);
        assert!(parse_instant("next tuesday", utc, None).is_err());
    }

    #[test]
    fn test_parse_instant_uses_zone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        let t = parse_instant("2026-04-01 09:00", tokyo, None).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_id() {
        let id = GoalId::new();
        assert_eq!(parse_id::<GoalId>(&id.to_string(), "goal").unwrap(), id);
        assert!(parse_id::<GoalId>("nope", "goal").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "goalplan", "--data-dir", "/tmp/x", "goal", "create", "Learn Rust", "--deadline", "2026-04-01",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/x"));
        assert!(matches!(cli.command, Commands::Goal(GoalCommand::Create { .. })));

        let cli = Cli::try_parse_from(["goalplan", "hours", "set", "2", "9", "17"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Hours(HoursCommand::Set { weekday: 2, start: 9, end: 17 })
        ));

        assert!(Cli::try_parse_from(["goalplan", "goal", "link-milestone", "g", "m"]).is_err());
    }
}
