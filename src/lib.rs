//! Weekly workout plan synthesis
//!
//! Turns free-form model output into a validated, balanced and time-bounded
//! `WeekSchedule`. See `pipeline::PlanPipeline` for the entry point.

pub mod classify;
pub mod compression;
pub mod config;
pub mod coverage;
pub mod db;
pub mod extract;
pub mod llm;
pub mod logging;
pub mod model_cache;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod recovery;
pub mod validate;
pub mod volume;

#[cfg(test)]
mod test_utils;

pub use compression::{compress_day, CompressionResult, SetDurationEstimator, TempoEstimator};
pub use config::{ConfigError, PlannerConfig};
pub use coverage::CoverageAnalysisResult;
pub use db::{initialize_db, StoreError, TrainingStore};
pub use extract::{extract_structure, ExtractError};
pub use llm::{ClaudeClient, LlmError, PlanGenerator};
pub use model_cache::ModelCache;
pub use models::*;
pub use pipeline::{PlanError, PlanOutcome, PlanPipeline, PlanRequest};
pub use recovery::RecoveryReport;
pub use validate::{normalize_week, ValidationError, ValidationWarning};
