//! Schema checks for model output.
//!
//! The model is asked for raw JSON but often wraps it in Markdown fences.
//! Everything that gets past these functions is a well-formed task list.

use serde::Deserialize;

use crate::error::{AiError, Result};
use crate::generator::{GeneratedTask, MilestoneStub, Revision};

#[derive(Debug, Deserialize)]
struct RawTask {
    title: String,
    minutes: i64,
}

#[derive(Debug, Deserialize)]
struct RawMilestone {
    title: String,
    order: i64,
}

#[derive(Debug, Deserialize)]
struct RawRevision {
    tasks: Vec<RawTask>,
    milestones: Vec<RawMilestone>,
}

/// Drop Markdown code fences and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn check_title(kind: &str, index: usize, title: String) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AiError::Parse(format!("{kind} {index} has an empty title")));
    }
    Ok(title.to_string())
}

fn check_task(index: usize, raw: RawTask) -> Result<GeneratedTask> {
    let title = check_title("task", index, raw.title)?;
    if raw.minutes <= 0 {
        return Err(AiError::Parse(format!(
            "task {index} ({title}) has non-positive minutes: {}",
            raw.minutes
        )));
    }
    let minutes = u32::try_from(raw.minutes)
        .map_err(|_| AiError::Parse(format!("task {index} ({title}) minutes out of range")))?;
    Ok(GeneratedTask { title, minutes })
}

fn check_milestone(index: usize, raw: RawMilestone) -> Result<MilestoneStub> {
    let title = check_title("milestone", index, raw.title)?;
    let order = i32::try_from(raw.order)
        .map_err(|_| AiError::Parse(format!("milestone {index} ({title}) order out of range")))?;
    Ok(MilestoneStub { title, order })
}

/// Parse a `[{"title", "minutes"}]` array.
pub fn parse_tasks(text: &str) -> Result<Vec<GeneratedTask>> {
    let raw: Vec<RawTask> = serde_json::from_str(&strip_code_fences(text))?;
    raw.into_iter()
        .enumerate()
        .map(|(i, t)| check_task(i, t))
        .collect()
}

/// Parse a `{"tasks": [...], "milestones": [...]}` object.
pub fn parse_revision(text: &str) -> Result<Revision> {
    let raw: RawRevision = serde_json::from_str(&strip_code_fences(text))?;
    let tasks = raw
        .tasks
        .into_iter()
        .enumerate()
        .map(|(i, t)| check_task(i, t))
        .collect::<Result<Vec<_>>>()?;
    let milestones = raw
        .milestones
        .into_iter()
        .enumerate()
        .map(|(i, m)| check_milestone(i, m))
        .collect::<Result<Vec<_>>>()?;
    Ok(Revision { tasks, milestones })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let text = "```json\n[{\"title\": \"A\", \"minutes\": 5}]\n```\n";
        assert_eq!(strip_code_fences(text), "[{\"title\": \"A\", \"minutes\": 5}]");
    }

    #[test]
    fn test_parse_tasks() {
        let tasks = parse_tasks(r#"[{"title": " Research ", "minutes": 60}, {"title": "Draft", "minutes": 30}]"#).unwrap();
        assert_eq!(
            tasks,
            vec![
                GeneratedTask { title: "Research".into(), minutes: 60 },
                GeneratedTask { title: "Draft".into(), minutes: 30 },
            ]
        );
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(parse_tasks("[]").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_positive_minutes() {
        for text in [r#"[{"title": "A", "minutes": 0}]"#, r#"[{"title": "A", "minutes": -15}]"#] {
            assert!(matches!(parse_tasks(text), Err(AiError::Parse(_))), "{text}");
        }
    }

    #[test]
    fn test_rejects_empty_title() {
        let err = parse_tasks(r#"[{"title": "   ", "minutes": 10}]"#).unwrap_err();
        assert!(matches!(err, AiError::Parse(msg) if msg.contains("empty title")));
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(matches!(parse_tasks("Sure! Here are your tasks:"), Err(AiError::Parse(_))));
        assert!(matches!(parse_tasks(r#"[{"title": "A"}]"#), Err(AiError::Parse(_))));
        assert!(matches!(parse_tasks(r#"[{"title": "A", "minutes": 1.5}]"#), Err(AiError::Parse(_))));
    }

    #[test]
    fn test_parse_revision() {
        let text = r#"```json
        {
          "tasks": [{"title": "Task 1", "minutes": 30}],
          "milestones": [{"title": "Phase 2", "order": 1}, {"title": "Phase 1", "order": 0}]
        }
        ```"#;
        let revision = parse_revision(text).unwrap();
        assert_eq!(revision.tasks.len(), 1);
        assert_eq!(
            revision.milestones,
            vec![
                MilestoneStub { title: "Phase 2".into(), order: 1 },
                MilestoneStub { title: "Phase 1".into(), order: 0 },
            ]
        );
    }

    #[test]
    fn test_revision_requires_both_keys() {
        assert!(matches!(parse_revision(r#"{"tasks": []}"#), Err(AiError::Parse(_))));
        assert!(matches!(
            parse_revision(r#"{"tasks": [], "milestones": [{"title": "", "order": 0}]}"#),
            Err(AiError::Parse(_))
        ));
    }
}
