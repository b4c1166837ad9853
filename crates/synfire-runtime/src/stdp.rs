//! Spike-timing-dependent plasticity
//!
//! Classic exponential STDP: a synapse that delivered shortly before its
//! post-synaptic neuron fired is potentiated, one that delivered after is
//! depressed. Weight changes decay exponentially with the timing offset
//! and the resulting weight is clamped to the synapse bounds.

use serde::{Deserialize, Serialize};

use synfire_neural::{WEIGHT_MAX, WEIGHT_MIN};

use crate::error::{Result, RuntimeError};

/// STDP learning-rule parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StdpParams {
    /// Learning rate for potentiation
    pub a_plus: f64,
    /// Learning rate for depression
    pub a_minus: f64,
    /// Potentiation time constant (ms)
    pub tau_plus: f64,
    /// Depression time constant (ms)
    pub tau_minus: f64,
}

impl Default for StdpParams {
    fn default() -> Self {
        Self {
            a_plus: 0.01,    // 1% potentiation rate
            a_minus: 0.012,  // 1.2% depression rate (slightly stronger)
            tau_plus: 20.0,  // 20ms potentiation window
            tau_minus: 20.0, // 20ms depression window
        }
    }
}

impl StdpParams {
    /// Create new STDP parameters with validation
    pub fn new(a_plus: f64, a_minus: f64, tau_plus: f64, tau_minus: f64) -> Result<Self> {
        if a_plus <= 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "a_plus",
                a_plus.to_string(),
                "> 0.0",
            ));
        }
        if a_minus <= 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "a_minus",
                a_minus.to_string(),
                "> 0.0",
            ));
        }
        if tau_plus <= 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "tau_plus",
                tau_plus.to_string(),
                "> 0.0",
            ));
        }
        if tau_minus <= 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "tau_minus",
                tau_minus.to_string(),
                "> 0.0",
            ));
        }
        Ok(Self {
            a_plus,
            a_minus,
            tau_plus,
            tau_minus,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.a_plus, self.a_minus, self.tau_plus, self.tau_minus)?;
        Ok(())
    }

    /// Weight delta for a temporal offset (post-fire minus dispatch, ms)
    ///
    /// Strictly positive for `dt > 0` (LTP), strictly negative for
    /// `dt < 0` (LTD), and exactly zero for simultaneous spikes.
    pub fn weight_change(&self, dt_ms: f64) -> f64 {
        if dt_ms > 0.0 {
            self.a_plus * (-dt_ms / self.tau_plus).exp()
        } else if dt_ms < 0.0 {
            -self.a_minus * (dt_ms / self.tau_minus).exp()
        } else {
            0.0
        }
    }

    /// Apply a weight delta, clamping into the synapse weight bounds
    pub fn apply(&self, weight: f64, dt_ms: f64) -> f64 {
        (weight + self.weight_change(dt_ms)).clamp(WEIGHT_MIN, WEIGHT_MAX)
    }
}

/// Running totals of applied STDP updates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StdpStats {
    /// Updates that increased a weight
    pub potentiations: u64,
    /// Updates that decreased a weight
    pub depressions: u64,
    /// Sum of absolute weight deltas
    pub total_weight_change: f64,
    /// Number of non-zero deltas applied
    pub samples: u64,
}

impl StdpStats {
    /// Record one applied delta
    pub fn record(&mut self, delta: f64) {
        if delta > 0.0 {
            self.potentiations += 1;
        } else if delta < 0.0 {
            self.depressions += 1;
        } else {
            return;
        }
        self.total_weight_change += delta.abs();
        self.samples += 1;
    }

    /// Mean absolute weight change per update
    pub fn mean_abs_change(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_weight_change / self.samples as f64
        }
    }

    /// Reset all totals
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
