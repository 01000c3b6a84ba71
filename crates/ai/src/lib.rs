//! AI task generation
//!
//! Turns a goal description into a task list, or revises an existing plan,
//! through a [`TaskGenerator`]. [`GeminiClient`] talks to the Gemini API;
//! [`ScriptedGenerator`] replays canned answers.

#![warn(missing_docs)]

pub mod error;
pub mod gemini;
pub mod generator;
pub mod validation;

pub use error::{AiError, Result};
pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use generator::{GeneratedTask, MilestoneStub, Revision, ScriptedGenerator, TaskGenerator};
pub use validation::{parse_revision, parse_tasks, strip_code_fences};
