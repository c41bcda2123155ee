//! Hormonal state vector shared by every monitoring component.
//!
//! The agent's internal state is a sparse mapping from dimension name
//! (a hormone or drive, e.g. "dopamine") to an activation level. Levels
//! are centered on a neutral baseline of 50.0: a freshly rested organism
//! sits at the baseline on every dimension, and monitoring components
//! reason about *departures* from it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Neutral activation level for every dimension, by convention.
pub const BASELINE: f64 = 50.0;

/// Sparse dimension → activation mapping.
///
/// Components that store a `StateVector` always store an owned copy;
/// nothing in this crate aliases a caller's map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateVector(HashMap<String, f64>);

impl StateVector {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Set one dimension's activation level.
    pub fn set(&mut self, dimension: impl Into<String>, value: f64) {
        self.0.insert(dimension.into(), value);
    }

    pub fn get(&self, dimension: &str) -> Option<f64> {
        self.0.get(dimension).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Mean activation across all dimensions, `None` when empty.
    pub fn mean_activation(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.values().sum::<f64>() / self.0.len() as f64)
    }

    /// Cosine similarity restricted to the dimensions both vectors share.
    ///
    /// Returns 0.0 when there is no shared dimension, or when either
    /// vector has zero norm over the shared set.
    pub fn cosine_similarity(&self, other: &StateVector) -> f64 {
        let mut dot = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        let mut shared = false;
        for (dim, a) in &self.0 {
            if let Some(b) = other.0.get(dim) {
                shared = true;
                dot += a * b;
                norm_a += a * a;
                norm_b += b * b;
            }
        }
        if !shared || norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }

    /// Add a delta mapping onto this vector in place.
    ///
    /// Dimensions absent from `self` are created at `BASELINE` before the
    /// delta is applied, so a reactivation echo nudges a resting dimension
    /// the same way it nudges an active one.
    pub fn apply_delta(&mut self, delta: &HashMap<String, f64>) {
        for (dim, d) in delta {
            let entry = self.0.entry(dim.clone()).or_insert(BASELINE);
            *entry += d;
        }
    }
}

impl From<HashMap<String, f64>> for StateVector {
    fn from(map: HashMap<String, f64>) -> Self {
        Self(map)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for StateVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_activation() {
        let state: StateVector = [("dopamine", 80.0), ("cortisol", 20.0)].into_iter().collect();
        assert_eq!(state.mean_activation(), Some(50.0));
        assert_eq!(StateVector::new().mean_activation(), None);
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let state: StateVector = [("dopamine", 80.0), ("cortisol", 20.0)].into_iter().collect();
        let sim = state.cosine_similarity(&state);
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_disjoint_dimensions() {
        let a: StateVector = [("dopamine", 80.0)].into_iter().collect();
        let b: StateVector = [("cortisol", 80.0)].into_iter().collect();
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        let a: StateVector = [("dopamine", 0.0)].into_iter().collect();
        let b: StateVector = [("dopamine", 80.0)].into_iter().collect();
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_uses_shared_dimensions_only() {
        let a: StateVector = [("dopamine", 60.0), ("serotonin", 40.0)].into_iter().collect();
        let b: StateVector = [("dopamine", 60.0), ("cortisol", 90.0)].into_iter().collect();
        // Restricted to the shared "dopamine" axis both are the same direction.
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_delta_creates_missing_dimensions_at_baseline() {
        let mut state: StateVector = [("dopamine", 60.0)].into_iter().collect();
        let mut delta = HashMap::new();
        delta.insert("dopamine".to_string(), 9.0);
        delta.insert("cortisol".to_string(), -6.0);
        state.apply_delta(&delta);
        assert_eq!(state.get("dopamine"), Some(69.0));
        assert_eq!(state.get("cortisol"), Some(BASELINE - 6.0));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let state: StateVector = [("dopamine", 80.0)].into_iter().collect();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["dopamine"], 80.0);
    }
}
