use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KokoroConfig {
    pub binding: BindingConfig,
    pub meaning: MeaningConfig,
    pub quantities: QuantityConfig,
    pub release: ReleaseConfig,
}

impl KokoroConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: KokoroConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KOKORO_RELEASE_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.release.release_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("KOKORO_QUANTITY_TOLERANCE") {
            if let Ok(n) = v.parse() {
                self.quantities.tolerance = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

/// Word-state binding parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Fraction of a stored state's departure from baseline that a
    /// reactivation echoes back. Default: 0.3.
    pub reactivation_strength: f64,
    /// Bindings retained per word; lowest usage evicted first. Default: 10.
    pub max_bindings_per_word: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            reactivation_strength: 0.3,
            max_bindings_per_word: 10,
        }
    }
}

/// Meaning evaluation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeaningConfig {
    /// Overall meaning above this promotes content into the theme table
    /// and makes `is_meaningful` true. Default: 0.5.
    pub significance_threshold: f64,
    /// Floor added to every significance score. Default: 0.3.
    pub significance_baseline: f64,
    /// Themes retained; lowest importance evicted first. Default: 50.
    pub max_themes: usize,
    /// Evaluation log length, oldest dropped first. Default: 500.
    pub max_evaluations: usize,
}

impl Default for MeaningConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 0.5,
            significance_baseline: 0.3,
            max_themes: 50,
            max_evaluations: 500,
        }
    }
}

/// Conserved-quantity tracking parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuantityConfig {
    /// Per-quantity change below this between consecutive snapshots counts
    /// as stable; a core change needs a drift above twice this. Default: 0.2.
    pub tolerance: f64,
    /// Snapshot history length, oldest dropped first. Default: 100.
    pub max_history: usize,
    /// Vocabulary size at which description diversity saturates. Default: 100.
    pub diversity_saturation: usize,
}

impl Default for QuantityConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.2,
            max_history: 100,
            diversity_saturation: 100,
        }
    }
}

/// Release readiness parameters.
///
/// The recommendation bands (0.9 / 0.7 / 0.4) straddle the 0.8 hysteresis
/// threshold on purpose: a readiness of 0.8–0.89 grows `stable_count`
/// while still recommending OBSERVE. These values were tuned together
/// with the 0.33/0.33/0.34 readiness weights.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Consecutive stable updates required before release. Default: 10.
    pub release_threshold: u32,
    /// Readiness above this increments the stability counter. Default: 0.8.
    pub stable_readiness: f64,
    /// Readiness at or above this (with the counter full) recommends
    /// RELEASE. Default: 0.9.
    pub release_band: f64,
    /// Readiness at or above this recommends OBSERVE. Default: 0.7.
    pub observe_band: f64,
    /// Readiness at or above this recommends SUPPORT. Default: 0.4.
    pub support_band: f64,
    /// Readiness record history length, oldest dropped first. Default: 100.
    pub max_history: usize,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            release_threshold: 10,
            stable_readiness: 0.8,
            release_band: 0.9,
            observe_band: 0.7,
            support_band: 0.4,
            max_history: 100,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
