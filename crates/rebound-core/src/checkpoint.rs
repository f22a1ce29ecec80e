//! In-memory checkpoint store
//!
//! One snapshot per phase name, last write wins. The engine writes a
//! checkpoint when a phase succeeds; callers may also save their own and
//! read them back to decide where to resume. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A phase snapshot and when it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Whether the engine recorded this checkpoint for a successful run
    pub fn is_completed(&self) -> bool {
        matches!(self.data.get("completed"), Some(Value::Bool(true)))
    }

    /// Snapshot data with the timestamp merged in under `"timestamp"`
    pub fn to_value(&self) -> Value {
        let mut merged = self.data.clone();
        merged.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.to_rfc3339()),
        );
        Value::Object(merged)
    }
}

#[derive(Debug, Default)]
pub struct CheckpointStore {
    checkpoints: HashMap<String, Checkpoint>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` for `phase_name`, replacing any earlier checkpoint
    pub fn save(&mut self, phase_name: &str, data: Map<String, Value>) {
        self.checkpoints
            .insert(phase_name.to_string(), Checkpoint::new(data));
        tracing::debug!(phase = %phase_name, "checkpoint saved");
    }

    pub fn load(&self, phase_name: &str) -> Option<&Checkpoint> {
        self.checkpoints.get(phase_name)
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn clear(&mut self) {
        self.checkpoints.clear();
    }
}
