//! Pattern-update strategies
//!
//! A strategy governs how a neuron's bank of reference patterns evolves
//! when a new pattern is learned: whether the newcomer is appended,
//! blended into its nearest neighbor, merged into a prototype, or traded
//! against the least valuable slot. All strategies share one entry
//! point, [`PatternUpdateStrategy::update_patterns`], and are selected
//! by name through [`create_strategy`].

use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{NeuralError, Result};

mod append;
mod hybrid;
mod merge_similar;
mod replace_worst;

pub use append::AppendStrategy;
pub use hybrid::{HybridStatistics, HybridStrategy};
pub use merge_similar::MergeSimilarStrategy;
pub use replace_worst::ReplaceWorstStrategy;

/// Similarity metric over two equal-length patterns, returning `[0, 1]`
pub type SimilarityMetric = dyn Fn(&[f64], &[f64]) -> f64 + Sync;

/// Strategy configuration: name, capacity, threshold, and parameter maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy name resolved by the factory (case-insensitive)
    pub name: String,
    /// Maximum number of reference patterns the bank may hold
    pub max_patterns: usize,
    /// Similarity threshold in `[0, 1]`
    pub similarity_threshold: f64,
    /// Additional real-valued parameters
    #[serde(default)]
    pub double_params: HashMap<String, f64>,
    /// Additional integer parameters
    #[serde(default)]
    pub int_params: HashMap<String, i64>,
}

impl StrategyConfig {
    /// Create a configuration with empty parameter maps
    pub fn new(name: impl Into<String>, max_patterns: usize, similarity_threshold: f64) -> Self {
        Self {
            name: name.into(),
            max_patterns,
            similarity_threshold,
            double_params: HashMap::new(),
            int_params: HashMap::new(),
        }
    }

    /// Look up a real parameter, falling back to a default
    pub fn double_param(&self, key: &str, default: f64) -> f64 {
        self.double_params.get(key).copied().unwrap_or(default)
    }

    /// Look up an integer parameter, falling back to a default
    pub fn int_param(&self, key: &str, default: i64) -> i64 {
        self.int_params.get(key).copied().unwrap_or(default)
    }

    /// Set a real parameter (builder style)
    pub fn with_double_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.double_params.insert(key.into(), value);
        self
    }

    /// Set an integer parameter (builder style)
    pub fn with_int_param(mut self, key: impl Into<String>, value: i64) -> Self {
        self.int_params.insert(key.into(), value);
        self
    }
}

/// Policy governing how a reference pattern bank absorbs new patterns
pub trait PatternUpdateStrategy: fmt::Debug + Send + Sync {
    /// Update the bank with a new pattern
    ///
    /// Returns true when the bank was modified. The bank never grows past
    /// the configured capacity.
    fn update_patterns(
        &mut self,
        patterns: &mut Vec<Vec<f64>>,
        new_pattern: &[f64],
        metric: &SimilarityMetric,
    ) -> bool;

    /// Strategy name as resolved by the factory
    fn name(&self) -> &'static str;

    /// The configuration this strategy was built from
    fn config(&self) -> &StrategyConfig;

    /// Record an inference-time hit on a bank slot
    ///
    /// Strategies without usage tracking ignore this.
    fn record_use(&mut self, index: usize) {
        let _ = index;
    }
}

/// Names the factory recognizes, in canonical form
pub fn available_strategies() -> &'static [&'static str] {
    &["append", "replace_worst", "merge_similar", "hybrid"]
}

/// Build a strategy from its configuration
///
/// Resolution is case-insensitive and accepts underscore-less synonyms
/// (`replaceworst`, `mergesimilar`). An unrecognized name fails with
/// [`NeuralError::UnknownStrategy`].
pub fn create_strategy(config: &StrategyConfig) -> Result<Box<dyn PatternUpdateStrategy>> {
    let name = config.name.to_lowercase();
    match name.as_str() {
        "append" => {
            log::info!("Creating append strategy (baseline)");
            Ok(Box::new(AppendStrategy::new(config.clone())))
        }
        "replace_worst" | "replaceworst" => {
            log::info!("Creating replace-worst strategy (synaptic pruning)");
            Ok(Box::new(ReplaceWorstStrategy::new(config.clone())))
        }
        "merge_similar" | "mergesimilar" => {
            log::info!("Creating merge-similar strategy (synaptic consolidation)");
            Ok(Box::new(MergeSimilarStrategy::new(config.clone())))
        }
        "hybrid" => {
            log::info!("Creating hybrid strategy (pruning + consolidation)");
            Ok(Box::new(HybridStrategy::new(config.clone())))
        }
        _ => Err(NeuralError::unknown_strategy(&config.name)),
    }
}

/// Find the bank slot most similar to a pattern
///
/// Returns `(index, similarity)` of the best match, or `None` on an
/// empty bank. Only the metric decides; unequal lengths are the metric's
/// concern.
pub(crate) fn find_most_similar(
    patterns: &[Vec<f64>],
    new_pattern: &[f64],
    metric: &SimilarityMetric,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, pattern) in patterns.iter().enumerate() {
        let similarity = metric(pattern, new_pattern);
        match best {
            Some((_, best_sim)) if similarity <= best_sim => {}
            _ => best = Some((index, similarity)),
        }
    }
    best
}

/// Find the least representative slot: argmin of mean similarity to the rest
pub(crate) fn find_least_representative(
    patterns: &[Vec<f64>],
    metric: &SimilarityMetric,
) -> Option<usize> {
    match patterns.len() {
        0 => return None,
        1 => return Some(0),
        _ => {}
    }

    let mut worst_index = 0;
    let mut worst_avg = f64::INFINITY;
    for (i, candidate) in patterns.iter().enumerate() {
        let mut total = 0.0;
        for (j, other) in patterns.iter().enumerate() {
            if i != j {
                total += metric(candidate, other);
            }
        }
        let avg = total / (patterns.len() - 1) as f64;
        if avg < worst_avg {
            worst_avg = avg;
            worst_index = i;
        }
    }
    Some(worst_index)
}

/// Blend a new pattern into a stored one: `t ← (1−α)·t + α·s` element-wise
///
/// A length mismatch is logged and leaves the target untouched.
pub(crate) fn blend_into(target: &mut [f64], source: &[f64], alpha: f64) -> bool {
    if target.len() != source.len() {
        log::warn!(
            "Cannot blend patterns of different sizes ({} vs {})",
            target.len(),
            source.len()
        );
        return false;
    }
    for (t, &s) in target.iter_mut().zip(source.iter()) {
        *t = (1.0 - alpha) * *t + alpha * s;
    }
    true
}

/// Merge a new pattern into a prototype: `t ← (1−w)·t + w·s` element-wise
///
/// A length mismatch is logged and leaves the target untouched.
pub(crate) fn merge_into(target: &mut [f64], source: &[f64], weight: f64) -> bool {
    if target.len() != source.len() {
        log::warn!(
            "Cannot merge patterns of different sizes ({} vs {})",
            target.len(),
            source.len()
        );
        return false;
    }
    for (t, &s) in target.iter_mut().zip(source.iter()) {
        *t = (1.0 - weight) * *t + weight * s;
    }
    true
}
