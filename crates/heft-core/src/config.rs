//! Queue and task parameters.
//!
//! Defaults:
//! - queue: `weight_limit = 100`, gate stopped (`autostart = false`)
//! - task: `weight = 1`, `priority = 1`

use serde::{Deserialize, Serialize};

use crate::error::QueueError;

pub const DEFAULT_WEIGHT_LIMIT: u32 = 100;
pub const DEFAULT_TASK_WEIGHT: u32 = 1;
pub const DEFAULT_TASK_PRIORITY: i32 = 1;

/// Construction-time configuration of a [`Queue`](crate::Queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum sum of in-flight weights admission will allow.
    pub weight_limit: u32,

    /// Open the start/stop gate at construction. When false, nothing is
    /// admitted until `start()` is called.
    pub autostart: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            weight_limit: DEFAULT_WEIGHT_LIMIT,
            autostart: false,
        }
    }
}

impl QueueConfig {
    /// Parse a config from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, QueueError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Runtime-mutable queue parameters, applied with `Queue::set_params`.
///
/// `None` leaves the current value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_limit: Option<u32>,
}

impl QueueParams {
    pub fn weight_limit(limit: u32) -> Self {
        Self {
            weight_limit: Some(limit),
        }
    }
}

/// Per-task parameters supplied at enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskParams {
    /// Cost held while the task is in flight.
    pub weight: u32,

    /// Higher runs earlier.
    pub priority: i32,
}

impl Default for TaskParams {
    fn default() -> Self {
        Self {
            weight: DEFAULT_TASK_WEIGHT,
            priority: DEFAULT_TASK_PRIORITY,
        }
    }
}

impl TaskParams {
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Check these params against the limit in force right now.
    pub(crate) fn validate(&self, weight_limit: u32) -> Result<(), QueueError> {
        if self.weight == 0 {
            return Err(QueueError::ZeroWeight);
        }
        if self.weight > weight_limit {
            return Err(QueueError::WeightExceedsLimit {
                weight: self.weight,
                limit: weight_limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_documented_values() {
        let config = QueueConfig::default();
        assert_eq!(config.weight_limit, 100);
        assert!(!config.autostart);

        let params = TaskParams::default();
        assert_eq!(params.weight, 1);
        assert_eq!(params.priority, 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = QueueConfig::from_json(r#"{ "weight_limit": 5 }"#).unwrap();
        assert_eq!(config.weight_limit, 5);
        assert!(!config.autostart);

        let params: TaskParams = serde_json::from_str(r#"{ "priority": 3 }"#).unwrap();
        assert_eq!(params, TaskParams::default().with_priority(3));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = QueueConfig::from_json("{ weight_limit: }").unwrap_err();
        assert!(matches!(err, QueueError::Config(_)));
    }

    #[rstest]
    #[case(1, 5, true)]
    #[case(5, 5, true)]
    #[case(6, 5, false)]
    #[case(1, 0, false)]
    fn validate_against_limit(#[case] weight: u32, #[case] limit: u32, #[case] ok: bool) {
        let params = TaskParams::default().with_weight(weight);
        assert_eq!(params.validate(limit).is_ok(), ok);
    }

    #[test]
    fn zero_weight_is_rejected() {
        let params = TaskParams::default().with_weight(0);
        assert!(matches!(params.validate(100), Err(QueueError::ZeroWeight)));
    }
}
