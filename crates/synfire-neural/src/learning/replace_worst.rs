//! Replace-worst strategy (synaptic pruning)

use super::{blend_into, find_most_similar, PatternUpdateStrategy, SimilarityMetric, StrategyConfig};

/// Blend similar patterns into their match; displace the least-used slot
/// for novel ones
///
/// Each slot carries a use count, incremented when a new pattern blends
/// into it and by [`PatternUpdateStrategy::record_use`] on inference-time
/// hits. When a novel pattern arrives at capacity, the slot with the
/// minimum use count is replaced and its count reset.
#[derive(Debug)]
pub struct ReplaceWorstStrategy {
    config: StrategyConfig,
    blend_alpha: f64,
    usage_counts: Vec<u64>,
}

impl ReplaceWorstStrategy {
    /// Create the strategy from its configuration
    ///
    /// Recognized real parameter: `blend_alpha` (default 0.2).
    pub fn new(config: StrategyConfig) -> Self {
        let blend_alpha = config.double_param("blend_alpha", 0.2);
        log::debug!(
            "ReplaceWorstStrategy created: max_patterns={}, similarity_threshold={}, blend_alpha={}",
            config.max_patterns,
            config.similarity_threshold,
            blend_alpha
        );
        Self {
            config,
            blend_alpha,
            usage_counts: Vec::new(),
        }
    }

    /// Use count of a bank slot
    pub fn pattern_usage(&self, index: usize) -> u64 {
        self.usage_counts.get(index).copied().unwrap_or(0)
    }

    /// Reset every use count to zero
    pub fn reset_usage_counters(&mut self) {
        for count in &mut self.usage_counts {
            *count = 0;
        }
        log::debug!(
            "ReplaceWorstStrategy: reset all usage counters ({} patterns)",
            self.usage_counts.len()
        );
    }

    fn sync_counts(&mut self, len: usize) {
        if self.usage_counts.len() != len {
            self.usage_counts.resize(len, 0);
        }
    }

    fn least_used(&self) -> Option<usize> {
        self.usage_counts
            .iter()
            .enumerate()
            .min_by_key(|(_, &count)| count)
            .map(|(index, _)| index)
    }
}

impl PatternUpdateStrategy for ReplaceWorstStrategy {
    fn update_patterns(
        &mut self,
        patterns: &mut Vec<Vec<f64>>,
        new_pattern: &[f64],
        metric: &SimilarityMetric,
    ) -> bool {
        self.sync_counts(patterns.len());

        // Below capacity: simply add the new pattern
        if patterns.len() < self.config.max_patterns {
            patterns.push(new_pattern.to_vec());
            self.usage_counts.push(0);
            log::debug!(
                "ReplaceWorstStrategy: added new pattern (total: {})",
                patterns.len()
            );
            return true;
        }

        let Some((best_index, best_similarity)) =
            find_most_similar(patterns, new_pattern, metric)
        else {
            return false;
        };

        // Similar enough: blend and strengthen the match
        if best_similarity >= self.config.similarity_threshold {
            blend_into(&mut patterns[best_index], new_pattern, self.blend_alpha);
            self.usage_counts[best_index] += 1;
            log::debug!(
                "ReplaceWorstStrategy: blended into pattern {} (similarity={:.3}, usage={})",
                best_index,
                best_similarity,
                self.usage_counts[best_index]
            );
            return true;
        }

        // Novel pattern: displace the least-used slot
        if let Some(worst_index) = self.least_used() {
            let old_usage = self.usage_counts[worst_index];
            patterns[worst_index] = new_pattern.to_vec();
            self.usage_counts[worst_index] = 0;
            log::debug!(
                "ReplaceWorstStrategy: replaced pattern {} (old usage={}, similarity to new={:.3})",
                worst_index,
                old_usage,
                best_similarity
            );
            return true;
        }

        log::warn!("ReplaceWorstStrategy: failed to update patterns (unexpected state)");
        false
    }

    fn name(&self) -> &'static str {
        "replace_worst"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn record_use(&mut self, index: usize) {
        if let Some(count) = self.usage_counts.get_mut(index) {
            *count += 1;
            log::trace!(
                "ReplaceWorstStrategy: pattern {} usage incremented to {}",
                index,
                count
            );
        } else {
            log::warn!(
                "ReplaceWorstStrategy: invalid pattern index {} (max: {})",
                index,
                self.usage_counts.len()
            );
        }
    }
}
