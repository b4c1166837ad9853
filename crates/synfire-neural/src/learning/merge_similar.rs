//! Merge-similar strategy (synaptic consolidation)

use super::{
    find_least_representative, find_most_similar, merge_into, PatternUpdateStrategy,
    SimilarityMetric, StrategyConfig,
};

/// Consolidate similar patterns into prototypes; replace outliers at
/// capacity
///
/// Repeatedly merged slots become prototype patterns representing the
/// common features of everything merged into them. Each slot carries a
/// merge count. When the bank is full and a pattern matches nothing, the
/// least representative slot (lowest mean similarity to the rest) is
/// treated as an outlier and replaced.
#[derive(Debug)]
pub struct MergeSimilarStrategy {
    config: StrategyConfig,
    merge_weight: f64,
    merge_counts: Vec<u64>,
}

impl MergeSimilarStrategy {
    /// Create the strategy from its configuration
    ///
    /// Recognized real parameter: `merge_weight` (default 0.3).
    pub fn new(config: StrategyConfig) -> Self {
        let merge_weight = config.double_param("merge_weight", 0.3);
        log::debug!(
            "MergeSimilarStrategy created: max_patterns={}, similarity_threshold={}, merge_weight={}",
            config.max_patterns,
            config.similarity_threshold,
            merge_weight
        );
        Self {
            config,
            merge_weight,
            merge_counts: Vec::new(),
        }
    }

    /// Number of patterns merged into a bank slot
    pub fn merge_count(&self, index: usize) -> u64 {
        self.merge_counts.get(index).copied().unwrap_or(0)
    }

    /// Reset every merge count to zero
    pub fn reset_merge_counters(&mut self) {
        for count in &mut self.merge_counts {
            *count = 0;
        }
        log::debug!(
            "MergeSimilarStrategy: reset all merge counters ({} patterns)",
            self.merge_counts.len()
        );
    }

    fn sync_counts(&mut self, len: usize) {
        if self.merge_counts.len() != len {
            self.merge_counts.resize(len, 0);
        }
    }
}

impl PatternUpdateStrategy for MergeSimilarStrategy {
    fn update_patterns(
        &mut self,
        patterns: &mut Vec<Vec<f64>>,
        new_pattern: &[f64],
        metric: &SimilarityMetric,
    ) -> bool {
        self.sync_counts(patterns.len());

        // Empty bank: the first pattern seeds it
        if patterns.is_empty() {
            patterns.push(new_pattern.to_vec());
            self.merge_counts.push(0);
            log::debug!("MergeSimilarStrategy: added first pattern");
            return true;
        }

        let Some((best_index, best_similarity)) =
            find_most_similar(patterns, new_pattern, metric)
        else {
            return false;
        };

        // Similar enough: consolidate into the existing prototype
        if best_similarity >= self.config.similarity_threshold {
            merge_into(&mut patterns[best_index], new_pattern, self.merge_weight);
            self.merge_counts[best_index] += 1;
            log::debug!(
                "MergeSimilarStrategy: merged into pattern {} (similarity={:.3}, merges={})",
                best_index,
                best_similarity,
                self.merge_counts[best_index]
            );
            return true;
        }

        // Novel pattern below capacity: add it
        if patterns.len() < self.config.max_patterns {
            patterns.push(new_pattern.to_vec());
            self.merge_counts.push(0);
            log::debug!(
                "MergeSimilarStrategy: added new pattern (total: {}, similarity to closest={:.3})",
                patterns.len(),
                best_similarity
            );
            return true;
        }

        // At capacity: replace the outlier
        if let Some(worst_index) = find_least_representative(patterns, metric) {
            let old_merges = self.merge_counts[worst_index];
            patterns[worst_index] = new_pattern.to_vec();
            self.merge_counts[worst_index] = 0;
            log::debug!(
                "MergeSimilarStrategy: replaced pattern {} (old merges={}, was outlier)",
                worst_index,
                old_merges
            );
            return true;
        }

        log::warn!("MergeSimilarStrategy: failed to update patterns (unexpected state)");
        false
    }

    fn name(&self) -> &'static str {
        "merge_similar"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }
}
