//! Meaning evaluation: "does this matter to me?"
//!
//! Content is scored on three axes (significance, relevance, emotional
//! resonance) blended into an overall meaning score. Content that clears
//! the significance threshold is promoted into a bounded table of
//! important themes, which in turn raises the significance of similar
//! content seen later. Meaning is learned online, not configured.

use chrono::Utc;
use kokoro_core::{MeaningConfig, StateVector, BASELINE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Weights blending the three axes into the overall meaning score.
const SIGNIFICANCE_WEIGHT: f64 = 0.4;
const RELEVANCE_WEIGHT: f64 = 0.3;
const RESONANCE_WEIGHT: f64 = 0.3;

/// Characters of content retained in the evaluation log.
const STORED_CONTENT_CHARS: usize = 100;

/// Result of evaluating one piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeaningEvaluation {
    /// The evaluated content, truncated for storage.
    pub content: String,
    /// Overlap with learned important themes, in [0, 1].
    pub significance: f64,
    /// Alignment with the current internal state, in [0, 1].
    pub relevance: f64,
    /// How much the content moves the emotions, in [0, 1].
    pub emotional_resonance: f64,
    /// Weighted blend of the three axes, in [0, 1].
    pub overall_meaning: f64,
    pub timestamp: i64,
}

#[derive(Debug, Default)]
struct EvaluatorState {
    /// Append-only evaluation log, oldest dropped first.
    evaluations: VecDeque<MeaningEvaluation>,
    /// theme key → importance in [0, 1], learned online.
    themes: HashMap<String, f64>,
}

impl EvaluatorState {
    fn top_themes(&self, top_k: usize) -> Vec<(String, f64)> {
        let mut sorted: Vec<(String, f64)> = self
            .themes
            .iter()
            .map(|(theme, importance)| (theme.clone(), *importance))
            .collect();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        sorted.truncate(top_k);
        sorted
    }
}

/// Read-only snapshot of the evaluator, for telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct MeaningSnapshot {
    pub evaluation_count: usize,
    pub theme_count: usize,
    pub top_themes: Vec<(String, f64)>,
}

/// The meaning evaluation system.
///
/// One mutex guards the evaluation log and the theme table together so
/// that significance is always computed against a consistent table.
pub struct MeaningEvaluator {
    inner: Mutex<EvaluatorState>,
    config: MeaningConfig,
}

impl MeaningEvaluator {
    pub fn new() -> Self {
        Self::with_config(MeaningConfig::default())
    }

    pub fn with_config(config: MeaningConfig) -> Self {
        tracing::debug!(
            significance_threshold = config.significance_threshold,
            max_themes = config.max_themes,
            "meaning evaluator initialized"
        );
        Self {
            inner: Mutex::new(EvaluatorState::default()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EvaluatorState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate content against learned themes and the current state.
    ///
    /// Records the evaluation in the log and, when the overall meaning
    /// clears the significance threshold, promotes the content into the
    /// theme table — evaluation is deliberately not a read-only call.
    /// `_memories` is an unused dependency-injection slot kept for future
    /// memory-weighted scoring.
    pub fn evaluate(
        &self,
        content: &str,
        state: &StateVector,
        emotion: f64,
        _memories: &[String],
    ) -> MeaningEvaluation {
        let mut guard = self.lock();

        let significance = self.significance(&guard.themes, content);
        let relevance = self.relevance(state);
        let emotional_resonance = emotion.clamp(-1.0, 1.0).abs();
        let overall = SIGNIFICANCE_WEIGHT * significance
            + RELEVANCE_WEIGHT * relevance
            + RESONANCE_WEIGHT * emotional_resonance;

        let evaluation = MeaningEvaluation {
            content: content.chars().take(STORED_CONTENT_CHARS).collect(),
            significance,
            relevance,
            emotional_resonance,
            overall_meaning: overall,
            timestamp: Utc::now().timestamp(),
        };

        guard.evaluations.push_back(evaluation.clone());
        while guard.evaluations.len() > self.config.max_evaluations {
            guard.evaluations.pop_front();
        }

        if overall > self.config.significance_threshold {
            self.learn_theme(&mut guard.themes, content, overall);
        }

        evaluation
    }

    /// True iff an evaluation of `content` clears the significance
    /// threshold. Shares `evaluate`'s side effects: the evaluation is
    /// logged and themes may be updated.
    pub fn is_meaningful(&self, content: &str, state: &StateVector, emotion: f64) -> bool {
        self.evaluate(content, state, emotion, &[]).overall_meaning
            > self.config.significance_threshold
    }

    /// Learned themes sorted by importance, best first.
    pub fn get_important_themes(&self, top_k: usize) -> Vec<(String, f64)> {
        self.lock().top_themes(top_k)
    }

    /// Telemetry snapshot. Pure read.
    pub fn get_state(&self) -> MeaningSnapshot {
        let guard = self.lock();
        MeaningSnapshot {
            evaluation_count: guard.evaluations.len(),
            theme_count: guard.themes.len(),
            top_themes: guard.top_themes(3),
        }
    }

    /// Significance: best word-overlap match against learned themes.
    ///
    /// With no themes learned yet, everything is a neutral 0.5. Otherwise
    /// each theme contributes `overlap / max(|words|, |theme words|)`
    /// scaled by its importance, and the baseline floor is added to the
    /// best match.
    fn significance(&self, themes: &HashMap<String, f64>, content: &str) -> f64 {
        if themes.is_empty() {
            return 0.5;
        }

        let lower = content.to_lowercase();
        let words: HashSet<&str> = lower.split_whitespace().collect();

        let mut best = 0.0f64;
        for (theme, importance) in themes {
            let theme_lower = theme.to_lowercase();
            let theme_words: HashSet<&str> = theme_lower.split_whitespace().collect();
            let overlap = words.intersection(&theme_words).count();
            if overlap > 0 {
                let denom = words.len().max(theme_words.len()) as f64;
                best = best.max(overlap as f64 / denom * importance);
            }
        }

        (best + self.config.significance_baseline).min(1.0)
    }

    /// Relevance: the more activated the organism, the more relevant new
    /// information feels. An empty state assumes baseline activation.
    fn relevance(&self, state: &StateVector) -> f64 {
        let avg = state.mean_activation().unwrap_or(BASELINE);
        (avg / 100.0 + self.config.significance_baseline).clamp(0.0, 1.0)
    }

    /// Promote content into the theme table, keyed by its first three
    /// whitespace tokens. Existing themes are blended, new ones seeded at
    /// half strength, and the table is trimmed to the highest-importance
    /// entries.
    fn learn_theme(&self, themes: &mut HashMap<String, f64>, content: &str, importance: f64) {
        let theme: String = content
            .split_whitespace()
            .take(3)
            .collect::<Vec<_>>()
            .join(" ");

        match themes.get_mut(&theme) {
            Some(existing) => {
                *existing = (*existing * 0.7 + importance * 0.3).min(1.0);
            }
            None => {
                tracing::debug!(theme = %theme, importance, "theme promoted");
                themes.insert(theme, importance * 0.5);
            }
        }

        if themes.len() > self.config.max_themes {
            let mut sorted: Vec<(String, f64)> = themes.drain().collect();
            sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            sorted.truncate(self.config.max_themes);
            themes.extend(sorted);
        }
    }
}

impl Default for MeaningEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
