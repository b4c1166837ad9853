//! Pattern-matching neuron
//!
//! A neuron keeps a rolling window of recent spike times and a bank of
//! reference patterns. Each incoming spike is appended to the window,
//! stale spikes are dropped, and the window is compared against the bank
//! by cosine similarity to decide whether the neuron fires. Learning
//! hands the current window to the configured pattern-update strategy.

use serde::{Deserialize, Serialize};
use std::any::Any;

use synfire_storage::{encode_record, ObjectId, ObjectKind, Persistable};

use crate::error::{NeuralError, Result};
use crate::learning::{
    create_strategy, AppendStrategy, PatternUpdateStrategy, SimilarityMetric, StrategyConfig,
};
use crate::pattern::cosine_similarity;

/// Metric applied between the rolling window and each reference pattern
///
/// Candidates whose length differs from the window are skipped by the
/// caller; the metric itself assumes equal lengths.
fn window_metric(a: &[f64], b: &[f64]) -> f64 {
    cosine_similarity(a, b)
}

/// A neuron with a rolling spike window and a reference pattern bank
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Neuron {
    id: ObjectId,
    window_size: f64,
    threshold: f64,
    max_patterns: usize,
    axon_id: Option<ObjectId>,
    dendrite_ids: Vec<ObjectId>,
    spikes: Vec<f64>,
    reference_patterns: Vec<Vec<f64>>,
    #[serde(skip)]
    strategy: Option<Box<dyn PatternUpdateStrategy>>,
}

impl Neuron {
    /// Create a neuron with validated parameters
    ///
    /// `window_size_ms` bounds the rolling window, `similarity_threshold`
    /// is the firing threshold in `[0, 1]`, and `max_patterns` caps the
    /// reference bank. The default strategy is append; use
    /// [`Neuron::set_strategy`] or [`Neuron::configure_strategy`] to
    /// change it.
    pub fn new(
        id: ObjectId,
        window_size_ms: f64,
        similarity_threshold: f64,
        max_patterns: usize,
    ) -> Result<Self> {
        if !window_size_ms.is_finite() || window_size_ms <= 0.0 {
            return Err(NeuralError::invalid_parameter(
                "window_size_ms",
                window_size_ms.to_string(),
                "> 0.0",
            ));
        }
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(NeuralError::invalid_parameter(
                "similarity_threshold",
                similarity_threshold.to_string(),
                "in [0, 1]",
            ));
        }
        if max_patterns == 0 {
            return Err(NeuralError::invalid_parameter(
                "max_patterns",
                "0",
                "> 0",
            ));
        }

        Ok(Self {
            id,
            window_size: window_size_ms,
            threshold: similarity_threshold,
            max_patterns,
            axon_id: None,
            dendrite_ids: Vec::new(),
            spikes: Vec::new(),
            reference_patterns: Vec::new(),
            strategy: None,
        })
    }

    /// Neuron identifier
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Rolling window size in milliseconds
    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    /// Firing similarity threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Reference bank capacity
    pub fn max_patterns(&self) -> usize {
        self.max_patterns
    }

    /// Outgoing axon, if wired
    pub fn axon_id(&self) -> Option<ObjectId> {
        self.axon_id
    }

    /// Wire the outgoing axon
    pub fn set_axon(&mut self, axon_id: ObjectId) {
        self.axon_id = Some(axon_id);
    }

    /// Incoming dendrites
    pub fn dendrite_ids(&self) -> &[ObjectId] {
        &self.dendrite_ids
    }

    /// Spike times currently in the rolling window (ascending)
    pub fn spikes(&self) -> &[f64] {
        &self.spikes
    }

    /// Stored reference patterns
    pub fn reference_patterns(&self) -> &[Vec<f64>] {
        &self.reference_patterns
    }

    /// Replace the pattern-update strategy
    pub fn set_strategy(&mut self, strategy: Box<dyn PatternUpdateStrategy>) {
        self.strategy = Some(strategy);
    }

    /// Build and install a strategy from configuration
    pub fn configure_strategy(&mut self, config: &StrategyConfig) -> Result<()> {
        self.strategy = Some(create_strategy(config)?);
        Ok(())
    }

    /// Attach an incoming dendrite, deduplicating on insertion
    pub fn add_dendrite(&mut self, dendrite_id: ObjectId) {
        if self.dendrite_ids.contains(&dendrite_id) {
            log::warn!("Neuron {}: dendrite {} already connected", self.id, dendrite_id);
            return;
        }
        self.dendrite_ids.push(dendrite_id);
        log::debug!(
            "Neuron {}: added dendrite {} (total: {})",
            self.id,
            dendrite_id,
            self.dendrite_ids.len()
        );
    }

    /// Detach a dendrite, reporting whether it was present
    pub fn remove_dendrite(&mut self, dendrite_id: ObjectId) -> bool {
        if let Some(position) = self.dendrite_ids.iter().position(|&d| d == dendrite_id) {
            self.dendrite_ids.remove(position);
            log::debug!(
                "Neuron {}: removed dendrite {} (remaining: {})",
                self.id,
                dendrite_id,
                self.dendrite_ids.len()
            );
            return true;
        }
        log::warn!(
            "Neuron {}: dendrite {} not found for removal",
            self.id,
            dendrite_id
        );
        false
    }

    /// Insert a spike at `spike_time_ms` and report whether the neuron fires
    ///
    /// Spike times are assumed non-decreasing. After insertion every
    /// stored spike `s` satisfies `spike_time_ms − s ≤ window_size`. The
    /// returned firing signal is the driver's cue to propagate; the
    /// neuron itself schedules nothing.
    pub fn insert_spike(&mut self, spike_time_ms: f64) -> bool {
        self.spikes.push(spike_time_ms);
        self.drop_old_spikes(spike_time_ms);

        let fired = self.should_fire();
        if fired {
            log::info!("Neuron {} fires a new spike at time: {}", self.id, spike_time_ms);
        }
        fired
    }

    /// Whether the current window matches any reference pattern
    ///
    /// True iff some pattern of the same length as the window has cosine
    /// similarity at or above the threshold. An empty window never fires.
    pub fn should_fire(&self) -> bool {
        if self.spikes.is_empty() {
            return false;
        }
        self.reference_patterns
            .iter()
            .filter(|pattern| pattern.len() == self.spikes.len())
            .any(|pattern| window_metric(&self.spikes, pattern) >= self.threshold)
    }

    /// Index and similarity of the best matching equal-length pattern
    pub fn best_match(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, pattern) in self.reference_patterns.iter().enumerate() {
            if pattern.len() != self.spikes.len() || self.spikes.is_empty() {
                continue;
            }
            let similarity = window_metric(&self.spikes, pattern);
            match best {
                Some((_, s)) if similarity <= s => {}
                _ => best = Some((index, similarity)),
            }
        }
        best
    }

    /// Hand the current window to the configured strategy
    ///
    /// A lazily created append strategy (with this neuron's capacity and
    /// threshold) is used when none was configured. An empty window is an
    /// error.
    pub fn learn_current_pattern(&mut self) -> Result<bool> {
        if self.spikes.is_empty() {
            log::warn!("Neuron {}: cannot learn pattern - no spikes in window", self.id);
            return Err(NeuralError::EmptyWindow {
                neuron_id: self.id.raw(),
            });
        }

        let (max_patterns, threshold) = (self.max_patterns, self.threshold);
        let strategy = self.strategy.get_or_insert_with(|| {
            Box::new(AppendStrategy::new(StrategyConfig::new(
                "append",
                max_patterns,
                threshold,
            ))) as Box<dyn PatternUpdateStrategy>
        });

        let metric: &SimilarityMetric = &|a: &[f64], b: &[f64]| {
            if a.len() == b.len() {
                window_metric(a, b)
            } else {
                0.0
            }
        };
        let modified = strategy.update_patterns(&mut self.reference_patterns, &self.spikes, metric);
        synfire_storage::check_invariant!(
            self.reference_patterns.len() <= self.max_patterns,
            "neuron {} bank overflowed its capacity {}",
            self.id,
            self.max_patterns
        );
        if modified {
            log::debug!(
                "Neuron {}: learned pattern of size {} (bank: {})",
                self.id,
                self.spikes.len(),
                self.reference_patterns.len()
            );
        }
        Ok(modified)
    }

    /// Record an inference-time hit on a bank slot with the strategy
    pub fn record_pattern_use(&mut self, index: usize) {
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.record_use(index);
        }
    }

    /// Drop every spike older than `current_time − window_size`
    fn drop_old_spikes(&mut self, current_time_ms: f64) {
        let cutoff = current_time_ms - self.window_size;
        let keep_from = self
            .spikes
            .iter()
            .position(|&s| s >= cutoff)
            .unwrap_or(self.spikes.len());
        if keep_from > 0 {
            self.spikes.drain(..keep_from);
        }
    }

    /// Rebuild from record text
    pub fn from_record(record: &str) -> synfire_storage::Result<Self> {
        synfire_storage::decode_record(record, ObjectKind::Neuron.type_tag())
    }
}

impl PartialEq for Neuron {
    fn eq(&self, other: &Self) -> bool {
        // The boxed strategy is runtime configuration, not state
        self.id == other.id
            && self.window_size == other.window_size
            && self.threshold == other.threshold
            && self.max_patterns == other.max_patterns
            && self.axon_id == other.axon_id
            && self.dendrite_ids == other.dendrite_ids
            && self.spikes == other.spikes
            && self.reference_patterns == other.reference_patterns
    }
}

impl Persistable for Neuron {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_tag(&self) -> &'static str {
        ObjectKind::Neuron.type_tag()
    }

    fn to_record(&self) -> synfire_storage::Result<String> {
        encode_record(self, self.type_tag())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neuron(window: f64, threshold: f64, capacity: usize) -> Neuron {
        Neuron::new(ObjectId::new(100_000_000_000_000), window, threshold, capacity).unwrap()
    }

    #[test]
    fn test_parameter_validation() {
        let id = ObjectId::new(100_000_000_000_000);
        assert!(Neuron::new(id, 0.0, 0.9, 10).is_err());
        assert!(Neuron::new(id, 50.0, 1.5, 10).is_err());
        assert!(Neuron::new(id, 50.0, 0.9, 0).is_err());
        assert!(Neuron::new(id, 50.0, 0.9, 10).is_ok());
    }

    #[test]
    fn test_rolling_window_eviction() {
        // window = 50ms, threshold 0.95, capacity 20; spikes at
        // 10, 20, 30, 85 leave only 85 in the window
        let mut n = neuron(50.0, 0.95, 20);
        n.insert_spike(10.0);
        n.insert_spike(20.0);
        n.insert_spike(30.0);
        assert_eq!(n.spikes(), &[10.0, 20.0, 30.0]);

        n.insert_spike(85.0);
        assert_eq!(n.spikes(), &[85.0]);
        assert!(!n.should_fire());
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let mut n = neuron(50.0, 0.95, 20);
        n.insert_spike(10.0);
        n.insert_spike(60.0);
        // 60 - 10 == 50: still inside the window
        assert_eq!(n.spikes(), &[10.0, 60.0]);
        n.insert_spike(60.1);
        assert_eq!(n.spikes(), &[60.0, 60.1]);
    }

    #[test]
    fn test_learned_pattern_fires_later_window() {
        let mut n = neuron(50.0, 0.94, 20);
        n.insert_spike(10.0);
        n.insert_spike(20.0);
        let fired_on_third = n.insert_spike(30.0);
        assert!(!fired_on_third);
        n.learn_current_pattern().unwrap();

        // Much later: the window clears, then refills with a similar shape
        assert!(!n.insert_spike(160.0));
        assert!(!n.insert_spike(170.0));
        assert!(n.insert_spike(180.0));

        let (index, similarity) = n.best_match().unwrap();
        assert_eq!(index, 0);
        assert!(similarity >= 0.94);
        n.record_pattern_use(index);
    }

    #[test]
    fn test_should_fire_skips_unequal_lengths() {
        let mut n = neuron(100.0, 0.5, 20);
        n.insert_spike(10.0);
        n.insert_spike(20.0);
        n.learn_current_pattern().unwrap();

        n.insert_spike(30.0);
        // Window length 3 vs pattern length 2: no candidate
        assert!(!n.should_fire());
    }

    #[test]
    fn test_empty_window_never_fires() {
        let n = neuron(50.0, 0.0, 20);
        assert!(!n.should_fire());
    }

    #[test]
    fn test_learn_empty_window_is_error() {
        let mut n = neuron(50.0, 0.9, 20);
        assert!(matches!(
            n.learn_current_pattern(),
            Err(NeuralError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_dendrite_dedup_and_removal() {
        let mut n = neuron(50.0, 0.9, 20);
        let d = ObjectId::new(300_000_000_000_000);
        n.add_dendrite(d);
        n.add_dendrite(d);
        assert_eq!(n.dendrite_ids().len(), 1);
        assert!(n.remove_dendrite(d));
        assert!(!n.remove_dendrite(d));
    }

    #[test]
    fn test_strategy_configuration() {
        let mut n = neuron(50.0, 0.9, 2);
        n.configure_strategy(&StrategyConfig::new("merge_similar", 2, 0.9))
            .unwrap();
        assert!(n
            .configure_strategy(&StrategyConfig::new("bogus", 2, 0.9))
            .is_err());
    }

    #[test]
    fn test_record_roundtrip() {
        let mut n = neuron(50.0, 0.94, 20);
        n.set_axon(ObjectId::new(200_000_000_000_001));
        n.add_dendrite(ObjectId::new(300_000_000_000_002));
        n.insert_spike(10.0);
        n.insert_spike(20.0);
        n.learn_current_pattern().unwrap();

        let record = n.to_record().unwrap();
        let back = Neuron::from_record(&record).unwrap();
        assert_eq!(back, n);
    }
}
