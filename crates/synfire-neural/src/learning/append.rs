//! Baseline append strategy

use rand::Rng;

use super::{blend_into, find_most_similar, PatternUpdateStrategy, SimilarityMetric, StrategyConfig};

/// Append new patterns while below capacity; at capacity, blend into the
/// closest match or displace a uniformly random slot
#[derive(Debug)]
pub struct AppendStrategy {
    config: StrategyConfig,
    blend_alpha: f64,
}

impl AppendStrategy {
    /// Create the strategy from its configuration
    ///
    /// Recognized real parameter: `blend_alpha` (default 0.2).
    pub fn new(config: StrategyConfig) -> Self {
        let blend_alpha = config.double_param("blend_alpha", 0.2);
        log::debug!(
            "AppendStrategy created: max_patterns={}, similarity_threshold={}, blend_alpha={}",
            config.max_patterns,
            config.similarity_threshold,
            blend_alpha
        );
        Self {
            config,
            blend_alpha,
        }
    }
}

impl PatternUpdateStrategy for AppendStrategy {
    fn update_patterns(
        &mut self,
        patterns: &mut Vec<Vec<f64>>,
        new_pattern: &[f64],
        metric: &SimilarityMetric,
    ) -> bool {
        // Below capacity: simply add the new pattern
        if patterns.len() < self.config.max_patterns {
            patterns.push(new_pattern.to_vec());
            log::debug!("AppendStrategy: added new pattern (total: {})", patterns.len());
            return true;
        }

        // At capacity: blend into the closest match if it is similar enough
        if let Some((best_index, best_similarity)) =
            find_most_similar(patterns, new_pattern, metric)
        {
            if best_similarity >= self.config.similarity_threshold {
                blend_into(&mut patterns[best_index], new_pattern, self.blend_alpha);
                log::debug!(
                    "AppendStrategy: blended into pattern {} (similarity={:.3})",
                    best_index,
                    best_similarity
                );
                return true;
            }

            // Not similar enough: displace a uniformly random slot
            let random_index = rand::thread_rng().gen_range(0..patterns.len());
            patterns[random_index] = new_pattern.to_vec();
            log::debug!(
                "AppendStrategy: replaced random pattern {} (best similarity={:.3})",
                random_index,
                best_similarity
            );
            return true;
        }

        false
    }

    fn name(&self) -> &'static str {
        "append"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::cosine_similarity;

    fn metric() -> &'static SimilarityMetric {
        &|a: &[f64], b: &[f64]| cosine_similarity(a, b)
    }

    fn strategy(capacity: usize, threshold: f64) -> AppendStrategy {
        AppendStrategy::new(StrategyConfig::new("append", capacity, threshold))
    }

    #[test]
    fn test_appends_below_capacity() {
        let mut s = strategy(3, 0.9);
        let mut bank = Vec::new();
        for i in 0..3 {
            assert!(s.update_patterns(&mut bank, &[i as f64 + 1.0, 2.0], metric()));
        }
        assert_eq!(bank.len(), 3);
    }

    #[test]
    fn test_blends_similar_at_capacity() {
        let mut s = strategy(1, 0.9);
        let mut bank = vec![vec![1.0, 2.0, 3.0]];
        assert!(s.update_patterns(&mut bank, &[1.0, 2.0, 3.0], metric()));
        assert_eq!(bank.len(), 1);
        // Blending an identical pattern leaves it unchanged
        assert!((bank[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_replaces_dissimilar_at_capacity() {
        let mut s = strategy(2, 0.99);
        let mut bank = vec![vec![1.0, 0.0], vec![0.9, 0.1]];
        assert!(s.update_patterns(&mut bank, &[-1.0, 5.0], metric()));
        assert_eq!(bank.len(), 2);
        assert!(bank.iter().any(|p| p == &vec![-1.0, 5.0]));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut s = strategy(4, 0.5);
        let mut bank = Vec::new();
        for i in 0..50 {
            s.update_patterns(&mut bank, &[i as f64, (i * i) as f64], metric());
            assert!(bank.len() <= 4);
        }
    }
}
