//! Progress Tracking
//!
//! Goal and milestone progress rollups, and completion estimates.

#![warn(missing_docs)]

pub mod tracker;
pub mod estimator;

pub use tracker::{ProgressTracker, ProgressSnapshot, MilestoneProgress, BasicProgressTracker};
pub use estimator::{CompletionEstimator, CompletionEstimate};
