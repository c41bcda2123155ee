//! Word ↔ state ↔ emotion ternary binding.
//!
//! Whenever the agent puts something into words, the word is bound to a
//! copy of the hormonal state and emotional valence it was uttered in.
//! When the same word recurs later, a weighted echo of the stored state
//! is reactivated and added back onto the current state. Over time this
//! is how verbal habits and mood-colored vocabulary emerge.

use chrono::Utc;
use kokoro_core::{BindingConfig, StateVector, BASELINE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One stored association between a word and a snapshot of internal state.
///
/// A word can own several bindings, captured at different times in
/// different states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordBinding {
    pub word: String,
    /// Owned copy of the hormonal state at utterance time.
    pub state: StateVector,
    /// Emotional valence in [-1, 1].
    pub emotion: f64,
    /// Memory fragments associated with the utterance.
    pub memory_fragments: Vec<String>,
    /// Times this binding was reactivated.
    pub usage_count: u32,
    pub created_at: i64,
    pub last_used: i64,
}

#[derive(Debug, Default)]
struct BinderState {
    /// word → bindings, capped per word by usage count.
    bindings: HashMap<String, Vec<WordBinding>>,
}

impl BinderState {
    fn total_bindings(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    fn habit_words(&self, min_usage: u32) -> Vec<(String, u32)> {
        let mut habits: Vec<(String, u32)> = self
            .bindings
            .iter()
            .map(|(word, list)| (word.clone(), list.iter().map(|b| b.usage_count).sum()))
            .filter(|(_, total)| *total >= min_usage)
            .collect();
        habits.sort_by(|a, b| b.1.cmp(&a.1));
        habits
    }
}

/// Read-only snapshot of the binder, for telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct BinderSnapshot {
    pub total_words: usize,
    pub total_bindings: usize,
    /// Top habit words as (word, total usage).
    pub habit_words: Vec<(String, u32)>,
}

/// The word-state binding system.
///
/// All mutable state sits behind one mutex; every public operation holds
/// it for its full read-modify-write sequence. Operations never block on
/// anything else and are safe to call from multiple threads, but are not
/// reentrant.
pub struct WordStateBinder {
    inner: Mutex<BinderState>,
    config: BindingConfig,
}

impl WordStateBinder {
    pub fn new() -> Self {
        Self::with_config(BindingConfig::default())
    }

    pub fn with_config(config: BindingConfig) -> Self {
        tracing::debug!(
            max_bindings_per_word = config.max_bindings_per_word,
            "word-state binder initialized"
        );
        Self {
            inner: Mutex::new(BinderState::default()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BinderState> {
        // State is consistent at every point the lock can be poisoned.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind a word to the current state and emotion.
    ///
    /// The state is copied, never aliased. A fresh binding starts at
    /// `usage_count = 0`, which makes it evictable immediately if the word
    /// already holds a full set of used bindings: novelty is not protected
    /// from eviction.
    pub fn bind(
        &self,
        word: &str,
        state: &StateVector,
        emotion: f64,
        memory_fragments: Vec<String>,
    ) -> WordBinding {
        let now = Utc::now().timestamp();
        let binding = WordBinding {
            word: word.to_string(),
            state: state.clone(),
            emotion: emotion.clamp(-1.0, 1.0),
            memory_fragments,
            usage_count: 0,
            created_at: now,
            last_used: now,
        };

        let mut guard = self.lock();
        let list = guard.bindings.entry(word.to_string()).or_default();
        list.push(binding.clone());

        if list.len() > self.config.max_bindings_per_word {
            // Stable sort: earlier-inserted bindings win usage ties.
            list.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
            list.truncate(self.config.max_bindings_per_word);
        }

        binding
    }

    /// Reactivate the echo of a previously bound word.
    ///
    /// Picks the most-used binding (first-inserted wins ties), bumps its
    /// usage, and returns a per-dimension delta of
    /// `(stored − baseline) × reactivation_strength`. The caller adds the
    /// delta onto its current state; the delta is not a replacement state.
    /// Returns `None` for words never bound.
    pub fn reactivate(&self, word: &str) -> Option<HashMap<String, f64>> {
        let mut guard = self.lock();
        let list = guard.bindings.get_mut(word)?;
        if list.is_empty() {
            return None;
        }

        let mut best_idx = 0;
        for i in 1..list.len() {
            if list[i].usage_count > list[best_idx].usage_count {
                best_idx = i;
            }
        }

        let best = &mut list[best_idx];
        best.usage_count += 1;
        best.last_used = Utc::now().timestamp();

        let delta = best
            .state
            .iter()
            .map(|(dim, value)| {
                (
                    dim.to_string(),
                    (value - BASELINE) * self.config.reactivation_strength,
                )
            })
            .collect();
        Some(delta)
    }

    /// Words whose stored states resemble `state`, best match first.
    ///
    /// Every binding is scored as
    /// `cosine_similarity × (1 + 0.1 × usage_count)`; a word appears once
    /// per binding it owns, so the result can contain repeats.
    pub fn get_associated_words(&self, state: &StateVector, top_k: usize) -> Vec<String> {
        let guard = self.lock();
        let mut scored: Vec<(&str, f64)> = Vec::with_capacity(guard.total_bindings());
        for (word, list) in &guard.bindings {
            for binding in list {
                let similarity = state.cosine_similarity(&binding.state);
                let score = similarity * (1.0 + 0.1 * binding.usage_count as f64);
                scored.push((word.as_str(), score));
            }
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(top_k)
            .map(|(word, _)| word.to_string())
            .collect()
    }

    /// Habitual words: total usage across a word's bindings is at least
    /// `min_usage`. Sorted descending by total.
    pub fn get_habit_words(&self, min_usage: u32) -> Vec<(String, u32)> {
        self.lock().habit_words(min_usage)
    }

    /// Telemetry snapshot. Pure read; habit words use the default
    /// min_usage of 3, top 5.
    pub fn get_state(&self) -> BinderSnapshot {
        let guard = self.lock();
        let mut habit_words = guard.habit_words(3);
        habit_words.truncate(5);
        BinderSnapshot {
            total_words: guard.bindings.len(),
            total_bindings: guard.total_bindings(),
            habit_words,
        }
    }
}

impl Default for WordStateBinder {
    fn default() -> Self {
        Self::new()
    }
}
