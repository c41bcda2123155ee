//! Conserved quantities: slow macro-metrics of the agent's core.
//!
//! Three scalars are meant to stay roughly constant while the agent
//! grows: the capacity to find meaning, the density of accurate
//! self-reference, and the diversity of its world description. Each turn
//! contributes a snapshot; sudden movement between snapshots signals
//! instability, sustained drift signals a change of core.

use crate::meaning::MeaningEvaluation;
use chrono::Utc;
use kokoro_core::{Prediction, QuantityConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Evaluations above this overall meaning count toward meaning capacity.
const MEANINGFUL_THRESHOLD: f64 = 0.5;

/// Predictions below this error count as accurate self-reference.
const ACCURATE_PREDICTION_ERROR: f64 = 0.3;

/// Snapshots averaged on each side when checking for a core change.
const CORE_CHANGE_WINDOW: usize = 5;

/// One record of the three conserved quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantitySnapshot {
    pub meaning_capacity: f64,
    pub self_reference_density: f64,
    pub world_description_diversity: f64,
    pub timestamp: i64,
}

/// Per-quantity stability between the two most recent snapshots.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuantityStability {
    pub meaning: bool,
    pub self_reference: bool,
    pub diversity: bool,
}

/// Result of a stability check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StabilityReport {
    /// Logical AND of the per-quantity flags; trivially stable with
    /// fewer than two snapshots.
    pub stable: bool,
    /// `None` when there is not enough history to compare.
    pub details: Option<QuantityStability>,
}

#[derive(Debug)]
struct QuantityState {
    meaning_capacity: f64,
    self_reference_density: f64,
    world_description_diversity: f64,
    history: VecDeque<QuantitySnapshot>,
}

impl Default for QuantityState {
    fn default() -> Self {
        // A fresh organism is credited with full capacity; diversity has
        // to be earned from vocabulary.
        Self {
            meaning_capacity: 1.0,
            self_reference_density: 1.0,
            world_description_diversity: 0.5,
            history: VecDeque::new(),
        }
    }
}

impl QuantityState {
    fn stability(&self, tolerance: f64) -> StabilityReport {
        if self.history.len() < 2 {
            return StabilityReport {
                stable: true,
                details: None,
            };
        }
        let latest = &self.history[self.history.len() - 1];
        let previous = &self.history[self.history.len() - 2];
        let details = QuantityStability {
            meaning: (latest.meaning_capacity - previous.meaning_capacity).abs() < tolerance,
            self_reference: (latest.self_reference_density - previous.self_reference_density)
                .abs()
                < tolerance,
            diversity: (latest.world_description_diversity
                - previous.world_description_diversity)
                .abs()
                < tolerance,
        };
        StabilityReport {
            stable: details.meaning && details.self_reference && details.diversity,
            details: Some(details),
        }
    }
}

/// Read-only snapshot of the tracker, for telemetry. Values are rounded
/// to three decimals for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct QuantityReport {
    pub meaning_capacity: f64,
    pub self_reference_density: f64,
    pub world_description_diversity: f64,
    pub stable: bool,
}

/// The conserved-quantity tracker.
pub struct ConservedQuantities {
    inner: Mutex<QuantityState>,
    config: QuantityConfig,
}

impl ConservedQuantities {
    pub fn new() -> Self {
        Self::with_config(QuantityConfig::default())
    }

    pub fn with_config(config: QuantityConfig) -> Self {
        tracing::debug!(
            tolerance = config.tolerance,
            max_history = config.max_history,
            "conserved-quantity tracker initialized"
        );
        Self {
            inner: Mutex::new(QuantityState::default()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QuantityState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Update the quantities from this turn's samples and snapshot them.
    ///
    /// Partial-update semantics: each quantity is recomputed only when its
    /// input is non-empty, otherwise the previous value carries over. A
    /// snapshot is appended on every call either way, so history can
    /// repeat values on quiet turns.
    pub fn update(
        &self,
        evaluations: &[MeaningEvaluation],
        predictions: &[Prediction],
        vocabulary: &HashSet<String>,
    ) {
        let mut guard = self.lock();

        if !evaluations.is_empty() {
            let meaningful = evaluations
                .iter()
                .filter(|e| e.overall_meaning > MEANINGFUL_THRESHOLD)
                .count();
            guard.meaning_capacity = meaningful as f64 / evaluations.len() as f64;
        }

        if !predictions.is_empty() {
            let accurate = predictions
                .iter()
                .filter(|p| p.error_or_inaccurate() < ACCURATE_PREDICTION_ERROR)
                .count();
            guard.self_reference_density = accurate as f64 / predictions.len() as f64;
        }

        if !vocabulary.is_empty() {
            guard.world_description_diversity =
                (vocabulary.len() as f64 / self.config.diversity_saturation as f64).min(1.0);
        }

        let snapshot = QuantitySnapshot {
            meaning_capacity: guard.meaning_capacity,
            self_reference_density: guard.self_reference_density,
            world_description_diversity: guard.world_description_diversity,
            timestamp: Utc::now().timestamp(),
        };
        guard.history.push_back(snapshot);
        while guard.history.len() > self.config.max_history {
            guard.history.pop_front();
        }
    }

    /// Compare the two latest snapshots against the tolerance.
    pub fn check_stability(&self) -> StabilityReport {
        self.lock().stability(self.config.tolerance)
    }

    /// Detect a sustained change of core: the mean meaning capacity over
    /// the most recent window versus the window before it, drifting by
    /// more than twice the tolerance. Needs two full windows of history.
    pub fn detect_core_change(&self) -> bool {
        let guard = self.lock();
        if guard.history.len() < 2 * CORE_CHANGE_WINDOW {
            return false;
        }
        let len = guard.history.len();
        let mean = |range: std::ops::Range<usize>| -> f64 {
            range
                .clone()
                .map(|i| guard.history[i].meaning_capacity)
                .sum::<f64>()
                / range.len() as f64
        };
        let recent = mean(len - CORE_CHANGE_WINDOW..len);
        let earlier = mean(len - 2 * CORE_CHANGE_WINDOW..len - CORE_CHANGE_WINDOW);
        let changed = (recent - earlier).abs() > self.config.tolerance * 2.0;
        if changed {
            tracing::info!(
                recent_mean = recent,
                earlier_mean = earlier,
                "core change detected in meaning capacity"
            );
        }
        changed
    }

    /// Telemetry snapshot. Pure read.
    pub fn get_state(&self) -> QuantityReport {
        let guard = self.lock();
        let round3 = |v: f64| (v * 1000.0).round() / 1000.0;
        QuantityReport {
            meaning_capacity: round3(guard.meaning_capacity),
            self_reference_density: round3(guard.self_reference_density),
            world_description_diversity: round3(guard.world_description_diversity),
            stable: guard.stability(self.config.tolerance).stable,
        }
    }
}

impl Default for ConservedQuantities {
    fn default() -> Self {
        Self::new()
    }
}
