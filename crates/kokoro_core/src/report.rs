//! Status records reported by external subsystems.
//!
//! The release monitor polls three collaborators (meta-learner, goal
//! system, identity monitor) that live outside this workspace. Their
//! reports arrive as loosely-populated mappings, so every record here
//! carries explicit per-field defaults: a field the collaborator did not
//! fill in deserializes to the same value the monitor would have assumed.

use serde::{Deserialize, Serialize};

/// Snapshot of the meta-learner's health.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaLearnerState {
    /// Number of recorded prediction errors. Defaults to 0 (no learning
    /// history demonstrated yet).
    pub error_history_len: usize,
    /// Current learning rate. Defaults to 0.1, inside the healthy band.
    pub learning_rate: f64,
}

impl Default for MetaLearnerState {
    fn default() -> Self {
        Self {
            error_history_len: 0,
            learning_rate: 0.1,
        }
    }
}

/// Snapshot of the goal system. Only the emptiness of `active_goals`
/// matters to the release monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalSystemState {
    pub active_goals: Vec<String>,
}

/// Snapshot of the identity monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityMonitorState {
    /// Whether a personality bifurcation was detected. `None` means the
    /// monitor did not report the flag, which is treated as detected:
    /// stability that was never measured has not been demonstrated.
    pub bifurcation_detected: Option<bool>,
}

/// One self-model prediction with its observed error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prediction {
    /// Absolute prediction error in [0, 1]. A prediction that never got
    /// scored counts as fully inaccurate.
    pub error: Option<f64>,
}

impl Prediction {
    pub fn new(error: f64) -> Self {
        Self { error: Some(error) }
    }

    /// Observed error, with the missing-field default of 1.0.
    pub fn error_or_inaccurate(&self) -> f64 {
        self.error.unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_learner_defaults() {
        let state = MetaLearnerState::default();
        assert_eq!(state.error_history_len, 0);
        assert!((state.learning_rate - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_partial_meta_learner_report_fills_defaults() {
        let state: MetaLearnerState = serde_json::from_str(r#"{"error_history_len": 42}"#).unwrap();
        assert_eq!(state.error_history_len, 42);
        assert!((state.learning_rate - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_identity_report_without_flag() {
        let state: IdentityMonitorState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.bifurcation_detected, None);
    }

    #[test]
    fn test_unscored_prediction_is_inaccurate() {
        assert_eq!(Prediction::default().error_or_inaccurate(), 1.0);
        assert_eq!(Prediction::new(0.05).error_or_inaccurate(), 0.05);
    }
}
