//! Release readiness: should the operators keep intervening?
//!
//! Three external subsystems are polled each turn: the meta-learner, the
//! goal system, and the identity monitor. Their health collapses into a
//! single readiness score with a hysteresis counter on top — release is
//! only recommended after sustained stability, never on one good reading.

use chrono::Utc;
use kokoro_core::{GoalSystemState, IdentityMonitorState, MetaLearnerState, ReleaseConfig};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Readiness weights. Identity carries 0.34 so the three flags sum to
/// exactly 1.0; the recommendation bands were tuned against these exact
/// values, so they are not an even 1/3 split.
const META_WEIGHT: f64 = 0.33;
const GOAL_WEIGHT: f64 = 0.33;
const IDENTITY_WEIGHT: f64 = 0.34;

/// Error history length above which the meta-learner counts as active.
const META_MIN_HISTORY: usize = 10;
/// Healthy learning-rate band, both bounds strict.
const META_LEARNING_RATE_BAND: (f64, f64) = (0.01, 0.5);

/// One readiness reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessRecord {
    pub readiness: f64,
    pub timestamp: i64,
}

/// Recommended operator action, in strictly decreasing autonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    /// The system is functioning autonomously; intervention is unnecessary.
    Release,
    /// Broadly stable; keep watching.
    Observe,
    /// Some subsystems are unstable; consider light intervention.
    Support,
    /// Multiple subsystems are unstable; active intervention is needed.
    Intervene,
}

impl Recommendation {
    /// Human-readable message for the operator console.
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Release => {
                "RELEASE: the system is functioning autonomously; intervention is unnecessary"
            }
            Recommendation::Observe => "OBSERVE: broadly stable; continued observation recommended",
            Recommendation::Support => {
                "SUPPORT: some subsystems are unstable; consider light intervention"
            }
            Recommendation::Intervene => {
                "INTERVENE: multiple subsystems are unstable; active intervention is needed"
            }
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The three derived health flags, exposed in snapshots.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComponentFlags {
    pub meta_learning: bool,
    pub goal_revision: bool,
    pub identity_stable: bool,
}

#[derive(Debug, Default)]
struct ReleaseState {
    meta_learning_active: bool,
    goal_revision_active: bool,
    identity_stable: bool,
    /// Hysteresis counter: up on sustained readiness, down (floored at
    /// zero) otherwise.
    stable_count: u32,
    history: VecDeque<ReadinessRecord>,
}

impl ReleaseState {
    fn readiness(&self) -> f64 {
        let mut score = 0.0;
        if self.meta_learning_active {
            score += META_WEIGHT;
        }
        if self.goal_revision_active {
            score += GOAL_WEIGHT;
        }
        if self.identity_stable {
            score += IDENTITY_WEIGHT;
        }
        score
    }

    fn can_release(&self, threshold: u32) -> bool {
        self.stable_count >= threshold
    }

    /// Strict priority order: RELEASE, then OBSERVE, SUPPORT, INTERVENE.
    fn recommendation(&self, config: &ReleaseConfig) -> Recommendation {
        let readiness = self.readiness();
        if readiness >= config.release_band && self.can_release(config.release_threshold) {
            Recommendation::Release
        } else if readiness >= config.observe_band {
            Recommendation::Observe
        } else if readiness >= config.support_band {
            Recommendation::Support
        } else {
            Recommendation::Intervene
        }
    }
}

/// Read-only snapshot of the monitor, for telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseSnapshot {
    pub readiness: f64,
    pub can_release: bool,
    pub stable_count: u32,
    pub recommendation: Recommendation,
    pub components: ComponentFlags,
}

/// The release monitor.
pub struct ReleaseMonitor {
    inner: Mutex<ReleaseState>,
    config: ReleaseConfig,
}

impl ReleaseMonitor {
    pub fn new() -> Self {
        Self::with_config(ReleaseConfig::default())
    }

    pub fn with_config(config: ReleaseConfig) -> Self {
        tracing::debug!(
            release_threshold = config.release_threshold,
            "release monitor initialized"
        );
        Self {
            inner: Mutex::new(ReleaseState::default()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReleaseState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Poll collaborator reports and update the readiness hysteresis.
    ///
    /// The meta-learner and goal-system flags are only recomputed from a
    /// present report; an absent collaborator leaves the last observation
    /// in place. Identity is held to a stricter standard: with no report
    /// at all, stability has not been demonstrated, so the flag drops.
    pub fn update_status(
        &self,
        meta_learner: Option<&MetaLearnerState>,
        goal_system: Option<&GoalSystemState>,
        identity_monitor: Option<&IdentityMonitorState>,
    ) {
        let mut guard = self.lock();

        if let Some(meta) = meta_learner {
            guard.meta_learning_active = meta.error_history_len > META_MIN_HISTORY
                && meta.learning_rate > META_LEARNING_RATE_BAND.0
                && meta.learning_rate < META_LEARNING_RATE_BAND.1;
        }

        if let Some(goals) = goal_system {
            guard.goal_revision_active = !goals.active_goals.is_empty();
        }

        guard.identity_stable = match identity_monitor {
            // A report without the flag counts as a detected bifurcation.
            Some(identity) => !identity.bifurcation_detected.unwrap_or(true),
            None => false,
        };

        let readiness = guard.readiness();
        guard.history.push_back(ReadinessRecord {
            readiness,
            timestamp: Utc::now().timestamp(),
        });
        while guard.history.len() > self.config.max_history {
            guard.history.pop_front();
        }

        if readiness > self.config.stable_readiness {
            guard.stable_count += 1;
            if guard.stable_count == self.config.release_threshold {
                tracing::info!(
                    stable_count = guard.stable_count,
                    "sustained readiness reached the release threshold"
                );
            }
        } else {
            guard.stable_count = guard.stable_count.saturating_sub(1);
        }
    }

    /// Current readiness score in [0, 1].
    pub fn calculate_readiness(&self) -> f64 {
        self.lock().readiness()
    }

    /// True once readiness has held above the hysteresis threshold for
    /// `release_threshold` consecutive updates.
    pub fn can_release(&self) -> bool {
        self.lock().can_release(self.config.release_threshold)
    }

    /// Recommended operator action for the current readiness.
    pub fn get_recommendation(&self) -> Recommendation {
        self.lock().recommendation(&self.config)
    }

    /// Telemetry snapshot. Pure read.
    pub fn get_state(&self) -> ReleaseSnapshot {
        let guard = self.lock();
        ReleaseSnapshot {
            readiness: guard.readiness(),
            can_release: guard.can_release(self.config.release_threshold),
            stable_count: guard.stable_count,
            recommendation: guard.recommendation(&self.config),
            components: ComponentFlags {
                meta_learning: guard.meta_learning_active,
                goal_revision: guard.goal_revision_active,
                identity_stable: guard.identity_stable,
            },
        }
    }
}

impl Default for ReleaseMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_meta() -> MetaLearnerState {
        MetaLearnerState {
            error_history_len: 50,
            learning_rate: 0.1,
        }
    }

    fn active_goals() -> GoalSystemState {
        GoalSystemState {
            active_goals: vec!["learn rust".to_string()],
        }
    }

    fn stable_identity() -> IdentityMonitorState {
        IdentityMonitorState {
            bifurcation_detected: Some(false),
        }
    }

    fn all_healthy(monitor: &ReleaseMonitor) {
        monitor.update_status(
            Some(&healthy_meta()),
            Some(&active_goals()),
            Some(&stable_identity()),
        );
    }

    #[test]
    fn test_initial_state_recommends_intervention() {
        let monitor = ReleaseMonitor::new();
        assert_eq!(monitor.calculate_readiness(), 0.0);
        assert!(!monitor.can_release());
        assert_eq!(monitor.get_recommendation(), Recommendation::Intervene);
    }

    #[test]
    fn test_full_health_gives_unit_readiness() {
        let monitor = ReleaseMonitor::new();
        all_healthy(&monitor);
        assert!((monitor.calculate_readiness() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_alone_weighs_slightly_more() {
        let monitor = ReleaseMonitor::new();
        monitor.update_status(None, None, Some(&stable_identity()));
        assert!((monitor.calculate_readiness() - 0.34).abs() < 1e-9);
    }

    #[test]
    fn test_meta_learner_band_is_strict() {
        let monitor = ReleaseMonitor::new();
        let boundary = MetaLearnerState {
            error_history_len: 50,
            learning_rate: 0.5, // not inside the open interval
        };
        monitor.update_status(Some(&boundary), None, Some(&stable_identity()));
        assert!(!monitor.get_state().components.meta_learning);

        let short_history = MetaLearnerState {
            error_history_len: 10, // needs strictly more than 10
            learning_rate: 0.1,
        };
        monitor.update_status(Some(&short_history), None, Some(&stable_identity()));
        assert!(!monitor.get_state().components.meta_learning);

        monitor.update_status(Some(&healthy_meta()), None, Some(&stable_identity()));
        assert!(monitor.get_state().components.meta_learning);
    }

    #[test]
    fn test_absent_identity_monitor_is_conservative() {
        let monitor = ReleaseMonitor::new();
        all_healthy(&monitor);
        assert!(monitor.get_state().components.identity_stable);
        // No identity report this turn: stability is no longer demonstrated.
        monitor.update_status(Some(&healthy_meta()), Some(&active_goals()), None);
        assert!(!monitor.get_state().components.identity_stable);
        assert!((monitor.calculate_readiness() - 0.66).abs() < 1e-9);
    }

    #[test]
    fn test_unreported_bifurcation_flag_counts_as_detected() {
        let monitor = ReleaseMonitor::new();
        monitor.update_status(None, None, Some(&IdentityMonitorState::default()));
        assert!(!monitor.get_state().components.identity_stable);
    }

    #[test]
    fn test_absent_meta_and_goal_retain_previous_flags() {
        let monitor = ReleaseMonitor::new();
        all_healthy(&monitor);
        monitor.update_status(None, None, Some(&stable_identity()));
        let components = monitor.get_state().components;
        assert!(components.meta_learning);
        assert!(components.goal_revision);
    }

    #[test]
    fn test_release_requires_ten_consecutive_stable_updates() {
        let monitor = ReleaseMonitor::new();
        for i in 1..=10 {
            assert!(!monitor.can_release(), "released too early at update {i}");
            all_healthy(&monitor);
        }
        assert!(monitor.can_release());
        assert_eq!(monitor.get_recommendation(), Recommendation::Release);
    }

    #[test]
    fn test_one_bad_update_decrements_by_one() {
        let monitor = ReleaseMonitor::new();
        for _ in 0..10 {
            all_healthy(&monitor);
        }
        monitor.update_status(
            Some(&MetaLearnerState {
                error_history_len: 0,
                learning_rate: 0.9,
            }),
            Some(&GoalSystemState::default()),
            Some(&IdentityMonitorState {
                bifurcation_detected: Some(true),
            }),
        );
        assert_eq!(monitor.get_state().stable_count, 9);
        assert!(!monitor.can_release());
    }

    #[test]
    fn test_stable_count_floors_at_zero() {
        let monitor = ReleaseMonitor::new();
        for _ in 0..5 {
            monitor.update_status(None, None, None);
        }
        assert_eq!(monitor.get_state().stable_count, 0);
    }

    #[test]
    fn test_partial_health_below_hysteresis() {
        // meta + identity = 0.67: below the 0.8 hysteresis threshold, so
        // the counter never grows, and the band reads SUPPORT.
        let monitor = ReleaseMonitor::new();
        monitor.update_status(Some(&healthy_meta()), None, Some(&stable_identity()));
        assert!((monitor.calculate_readiness() - 0.67).abs() < 1e-9);
        assert_eq!(monitor.get_state().stable_count, 0);
        assert_eq!(monitor.get_recommendation(), Recommendation::Support);
    }

    #[test]
    fn test_recommendation_bands() {
        // 0.34 (identity only) sits below the 0.4 SUPPORT band.
        let monitor = ReleaseMonitor::new();
        monitor.update_status(None, None, Some(&stable_identity()));
        assert_eq!(monitor.get_recommendation(), Recommendation::Intervene);

        // 0.66 (meta + goals) clears SUPPORT but not OBSERVE.
        monitor.update_status(
            Some(&healthy_meta()),
            Some(&active_goals()),
            Some(&IdentityMonitorState {
                bifurcation_detected: Some(true),
            }),
        );
        assert_eq!(monitor.get_recommendation(), Recommendation::Support);
    }

    #[test]
    fn test_high_readiness_without_hysteresis_is_observe() {
        let monitor = ReleaseMonitor::new();
        all_healthy(&monitor);
        // Readiness 1.0 but only one stable update: not releasable yet.
        assert!(!monitor.can_release());
        assert_eq!(monitor.get_recommendation(), Recommendation::Observe);
    }

    #[test]
    fn test_snapshot_serializes_with_recommendation() {
        let monitor = ReleaseMonitor::new();
        all_healthy(&monitor);
        let json = serde_json::to_value(monitor.get_state()).unwrap();
        assert_eq!(json["recommendation"], "OBSERVE");
        assert_eq!(json["components"]["identity_stable"], true);
    }

    #[test]
    fn test_get_state_is_pure_read() {
        let monitor = ReleaseMonitor::new();
        all_healthy(&monitor);
        let a = monitor.get_state();
        let b = monitor.get_state();
        assert_eq!(a.stable_count, b.stable_count);
        assert_eq!(a.recommendation, b.recommendation);
    }

    #[test]
    fn test_readiness_history_capped() {
        let config = ReleaseConfig {
            max_history: 10,
            ..ReleaseConfig::default()
        };
        let monitor = ReleaseMonitor::with_config(config);
        for _ in 0..50 {
            all_healthy(&monitor);
        }
        assert_eq!(monitor.lock().history.len(), 10);
    }
}
