//! # rebound-core
//!
//! Failure recovery engine for multi-phase workflows:
//! - Per-phase recovery strategies (retry policy, rollback, fallback, partial success)
//! - Substring-based failure classification and backoff calculation
//! - In-memory checkpoints and execution history
//! - Recovery reports and manual intervention requests
//! - YAML strategy configuration with embedded presets

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod intervention;
pub mod registry;
pub mod report;
pub mod retry;
pub mod rollback;
pub mod types;

pub use checkpoint::Checkpoint;
pub use config::{ConfigLoader, RecoveryConfig};
pub use engine::{RecoveryManager, RecoveryManagerBuilder};
pub use error::{Error, Result};
pub use intervention::format_intervention_request;
pub use report::{OverallStatus, RecoveryReport};
pub use retry::PhaseFailure;
