//! Hybrid strategy (pruning + consolidation)

use super::{
    blend_into, find_most_similar, merge_into, PatternUpdateStrategy, SimilarityMetric,
    StrategyConfig,
};

/// Running totals of hybrid strategy decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HybridStatistics {
    /// Patterns consolidated into prototypes
    pub merges: u64,
    /// Slots pruned and replaced by novel patterns
    pub prunes: u64,
    /// Patterns blended into near matches
    pub blends: u64,
    /// Patterns appended below capacity
    pub adds: u64,
}

/// Two-threshold strategy combining consolidation, strengthening, and
/// pruning
///
/// Above `merge_threshold` the newcomer consolidates into a prototype;
/// between the two thresholds it blends into (and strengthens) its
/// match; below the similarity threshold it displaces the least-used
/// slot. `merge_threshold` is clamped to at least
/// `similarity_threshold + 0.1` so the consolidation band never
/// disappears.
#[derive(Debug)]
pub struct HybridStrategy {
    config: StrategyConfig,
    merge_threshold: f64,
    merge_weight: f64,
    blend_alpha: f64,
    prune_threshold: u64,
    usage_counts: Vec<u64>,
    merge_counts: Vec<u64>,
    stats: HybridStatistics,
}

impl HybridStrategy {
    /// Create the strategy from its configuration
    ///
    /// Recognized real parameters: `merge_threshold` (default 0.85,
    /// clamped as above), `merge_weight` (0.3), `blend_alpha` (0.2).
    /// Recognized integer parameter: `prune_threshold` (2, reserved for
    /// clients gating prunes on slot usage).
    pub fn new(config: StrategyConfig) -> Self {
        let mut merge_threshold = config.double_param("merge_threshold", 0.85);
        if merge_threshold < config.similarity_threshold {
            merge_threshold = config.similarity_threshold + 0.1;
        }
        let merge_weight = config.double_param("merge_weight", 0.3);
        let blend_alpha = config.double_param("blend_alpha", 0.2);
        let prune_threshold = config.int_param("prune_threshold", 2).max(0) as u64;

        log::debug!(
            "HybridStrategy created: max_patterns={}, similarity_threshold={}, merge_threshold={}",
            config.max_patterns,
            config.similarity_threshold,
            merge_threshold
        );

        Self {
            config,
            merge_threshold,
            merge_weight,
            blend_alpha,
            prune_threshold,
            usage_counts: Vec::new(),
            merge_counts: Vec::new(),
            stats: HybridStatistics::default(),
        }
    }

    /// Merge threshold after clamping
    pub fn merge_threshold(&self) -> f64 {
        self.merge_threshold
    }

    /// Usage-count prune gate from configuration
    pub fn prune_threshold(&self) -> u64 {
        self.prune_threshold
    }

    /// Use count of a bank slot
    pub fn pattern_usage(&self, index: usize) -> u64 {
        self.usage_counts.get(index).copied().unwrap_or(0)
    }

    /// Number of patterns merged into a bank slot
    pub fn merge_count(&self, index: usize) -> u64 {
        self.merge_counts.get(index).copied().unwrap_or(0)
    }

    /// Running decision totals
    pub fn statistics(&self) -> HybridStatistics {
        self.stats
    }

    /// Reset slot counters and decision totals
    pub fn reset_counters(&mut self) {
        for count in &mut self.usage_counts {
            *count = 0;
        }
        for count in &mut self.merge_counts {
            *count = 0;
        }
        self.stats = HybridStatistics::default();
    }

    fn sync_counts(&mut self, len: usize) {
        if self.usage_counts.len() != len {
            self.usage_counts.resize(len, 0);
        }
        if self.merge_counts.len() != len {
            self.merge_counts.resize(len, 0);
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

impl PatternUpdateStrategy for HybridStrategy {
    fn update_patterns(
        &mut self,
        patterns: &mut Vec<Vec<f64>>,
        new_pattern: &[f64],
        metric: &SimilarityMetric,
    ) -> bool {
        self.sync_counts(patterns.len());

        // Below capacity: just add
        if patterns.len() < self.config.max_patterns {
            patterns.push(new_pattern.to_vec());
            self.usage_counts.push(0);
            self.merge_counts.push(0);
            self.stats.adds += 1;
            return true;
        }

        let Some((best_index, best_similarity)) =
            find_most_similar(patterns, new_pattern, metric)
        else {
            // Capacity zero or empty bank at capacity; nothing to do
            log::warn!("HybridStrategy: no candidate slot for update");
            return false;
        };

        // Very high similarity: consolidate into a prototype
        if best_similarity >= self.merge_threshold {
            merge_into(&mut patterns[best_index], new_pattern, self.merge_weight);
            self.merge_counts[best_index] += 1;
            self.usage_counts[best_index] += 1;
            self.stats.merges += 1;
            log::debug!(
                "HybridStrategy: merged into pattern {} (similarity={:.3})",
                best_index,
                best_similarity
            );
            return true;
        }

        // Medium similarity: Hebbian strengthening
        if best_similarity >= self.config.similarity_threshold {
            blend_into(&mut patterns[best_index], new_pattern, self.blend_alpha);
            self.usage_counts[best_index] += 1;
            self.stats.blends += 1;
            log::debug!(
                "HybridStrategy: blended into pattern {} (similarity={:.3})",
                best_index,
                best_similarity
            );
            return true;
        }

        // Low similarity: prune the least-used slot and replace it
        if let Some(prune_index) = self.least_used() {
            patterns[prune_index] = new_pattern.to_vec();
            self.usage_counts[prune_index] = 0;
            self.merge_counts[prune_index] = 0;
            self.stats.prunes += 1;
            log::debug!(
                "HybridStrategy: pruned pattern {} (best similarity={:.3})",
                prune_index,
                best_similarity
            );
            return true;
        }

        false
    }

    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn record_use(&mut self, index: usize) {
        if let Some(count) = self.usage_counts.get_mut(index) {
            *count += 1;
        }
    }
}
