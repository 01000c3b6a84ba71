//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use goalplan_core::{Goal, Time};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AiError, Result};
use crate::generator::{GeneratedTask, Revision, TaskGenerator};
use crate::validation::{parse_revision, parse_tasks, strip_code_fences};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; `None` makes every call fail with `MissingApiKey`
    pub api_key: Option<String>,
    /// Where the key was expected, for error messages
    pub api_key_env: String,
    /// Model name
    pub model: String,
    /// Scheme and host, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    /// Read the key from the environment variable `api_key_env`.
    pub fn with_key_from_env(mut self, api_key_env: impl Into<String>) -> Self {
        self.api_key_env = api_key_env.into();
        self.api_key = std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty());
        self
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the first candidate's text out of a response body.
pub fn extract_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| AiError::Parse("response has no candidate text".into()))?;
    Ok(strip_code_fences(&text))
}

fn task_prompt(description: &str, deadline: Time) -> String {
    format!(
        r#"You are an expert project manager.
The user has a goal: "{description}".
The deadline is: {deadline}.

Break this goal down into a list of concrete, actionable tasks.
For each task, provide:
1. A concise title.
2. Estimated time in minutes (positive integer).

Return ONLY a JSON array of objects with keys "title" and "minutes".
Example: [{{"title": "Research topic", "minutes": 60}}, {{"title": "Draft outline", "minutes": 30}}]
Do not include Markdown formatting. Just the raw JSON."#,
        deadline = deadline.format("%Y-%m-%d %H:%M UTC"),
    )
}

fn revision_prompt(goal: &Goal, instruction: &str) -> String {
    let current: Vec<&str> = goal.tasks.iter().map(|t| t.title.as_str()).collect();
    format!(
        r#"You are an expert project manager.
The user has a goal: "{title}".
Current tasks: {current}

User instruction: "{instruction}"

Based on the instruction, generate a NEW list of tasks and milestones.

Return ONLY a JSON object with two keys: "tasks" and "milestones".
"tasks": array of objects with "title" and "minutes" (positive integer).
"milestones": array of objects with "title" and "order" (integer).

Example:
{{
  "tasks": [{{"title": "Task 1", "minutes": 30}}],
  "milestones": [{{"title": "Phase 1", "order": 0}}]
}}"#,
        title = goal.title,
        current = current.join(", "),
    )
}

/// Task generator backed by the Gemini API.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Build a client. Fails only if the HTTP client cannot be constructed.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Settings in use.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate_content(&self, prompt: &str) -> Result<String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::MissingApiKey(self.config.api_key_env.clone()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!(model = %self.config.model, "sending generateContent request");
        let resp = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), "Gemini rejected the API key");
            return Err(AiError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "Gemini request failed");
            return Err(AiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_text(&text)
    }
}

#[async_trait]
impl TaskGenerator for GeminiClient {
    async fn generate_tasks(&self, description: &str, deadline: Time) -> Result<Vec<GeneratedTask>> {
        let text = self.generate_content(&task_prompt(description, deadline)).await?;
        let tasks = parse_tasks(&text)?;
        debug!(count = tasks.len(), "generated tasks");
        Ok(tasks)
    }

    async fn revise_goal(&self, goal: &Goal, instruction: &str) -> Result<Revision> {
        let text = self.generate_content(&revision_prompt(goal, instruction)).await?;
        let revision = parse_revision(&text)?;
        debug!(
            tasks = revision.tasks.len(),
            milestones = revision.milestones.len(),
            "generated revision"
        );
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use goalplan_core::Task;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn envelope(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: Some("test-key".into()),
            base_url: server.uri(),
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    fn deadline() -> Time {
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_generate_tasks_request_and_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
                "```json\n[{\"title\": \"Research\", \"minutes\": 60}]\n```",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let tasks = client(&server).generate_tasks("Learn Rust", deadline()).await.unwrap();
        assert_eq!(tasks, vec![GeneratedTask::new("Research", 60)]);
    }

    #[tokio::test]
    async fn test_revise_goal() {
        let server = MockServer::start().await;
        let payload = r#"{"tasks": [{"title": "Task 1", "minutes": 30}], "milestones": [{"title": "Phase 1", "order": 0}]}"#;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(payload)))
            .mount(&server)
            .await;

        let goal = Goal::new("Learn Rust", deadline(), vec![Task::new("Old", 10)]);
        let revision = client(&server).revise_goal(&goal, "split it up").await.unwrap();
        assert_eq!(revision.tasks, vec![GeneratedTask::new("Task 1", 30)]);
        assert_eq!(revision.milestones.len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client(&server).generate_tasks("x", deadline()).await.unwrap_err();
        assert!(matches!(err, AiError::Unauthorized(403)));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client(&server).generate_tasks("x", deadline()).await.unwrap_err();
        assert!(matches!(err, AiError::Status { status: 503, ref body } if body == "overloaded"));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope("I cannot help with that.")))
            .mount(&server)
            .await;

        let err = client(&server).generate_tasks("x", deadline()).await.unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = GeminiClient::new(GeminiConfig {
            base_url: server.uri(),
            ..GeminiConfig::default()
        })
        .unwrap();
        let err = client.generate_tasks("x", deadline()).await.unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey(ref var) if var == DEFAULT_API_KEY_ENV));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: Some("k".into()),
            base_url: "http://127.0.0.1:1".into(),
            timeout: Duration::from_secs(2),
            ..GeminiConfig::default()
        })
        .unwrap();
        let err = client.generate_tasks("x", deadline()).await.unwrap_err();
        assert!(matches!(err, AiError::Transport(_)));
    }

    #[test]
    fn test_request_wire_format() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn test_extract_text_without_candidates() {
        assert!(matches!(extract_text(r#"{"candidates": []}"#), Err(AiError::Parse(_))));
        assert!(matches!(extract_text("not json"), Err(AiError::Parse(_))));
        assert!(matches!(extract_text(r#"{"promptFeedback": {}}"#), Err(AiError::Parse(_))));
    }

    #[test]
    fn test_prompts_mention_inputs() {
        let prompt = task_prompt("Run a marathon", deadline());
        assert!(prompt.contains("\"Run a marathon\""));
        assert!(prompt.contains("2026-04-01 00:00 UTC"));

        let goal = Goal::new("Marathon", deadline(), vec![Task::new("Jog", 30), Task::new("Rest", 10)]);
        let prompt = revision_prompt(&goal, "add strength work");
        assert!(prompt.contains("Current tasks: Jog, Rest"));
        assert!(prompt.contains("add strength work"));
    }
}
