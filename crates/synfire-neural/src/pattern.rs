//! Binned spike pattern representation and similarity metrics
//!
//! A [`BinaryPattern`] stores a temporal spike pattern as 200 byte-sized
//! bin counters, one per millisecond. The fixed footprint (200 bytes per
//! pattern) keeps reference banks compact for populations of millions of
//! neurons, while 1 ms resolution matches the temporal precision of the
//! scheduler's time wheel.

use core::fmt;

/// Number of 1 ms bins in a pattern (200 ms window)
pub const PATTERN_BINS: usize = 200;

/// Maximum spike count per bin
pub const MAX_BIN_COUNT: u8 = u8::MAX;

/// Fixed-size binned spike pattern (spike counts per millisecond)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryPattern {
    data: [u8; PATTERN_BINS],
}

impl BinaryPattern {
    /// Create an empty pattern (all bins zero)
    pub const fn new() -> Self {
        Self {
            data: [0; PATTERN_BINS],
        }
    }

    /// Construct from absolute spike times
    ///
    /// Times are normalized to the earliest spike, rounded to the nearest
    /// millisecond, and counted into bins saturating at 255. Spikes
    /// falling outside `[0, window_ms)` after normalization are silently
    /// dropped.
    pub fn from_spike_times(spike_times: &[f64], window_ms: f64) -> Self {
        let mut pattern = Self::new();
        if spike_times.is_empty() {
            return pattern;
        }

        let min_time = spike_times.iter().copied().fold(f64::INFINITY, f64::min);
        for &spike_time in spike_times {
            let relative = spike_time - min_time;
            if relative < 0.0 || relative >= window_ms {
                continue;
            }
            let bin = relative.round() as usize;
            if bin < PATTERN_BINS {
                pattern.data[bin] = pattern.data[bin].saturating_add(1);
            }
        }
        pattern
    }

    /// Spike count in a bin
    pub fn bin(&self, index: usize) -> u8 {
        self.data[index]
    }

    /// Set the spike count in a bin
    pub fn set_bin(&mut self, index: usize, count: u8) {
        self.data[index] = count;
    }

    /// The underlying bin counters
    pub fn bins(&self) -> &[u8; PATTERN_BINS] {
        &self.data
    }

    /// Total number of spikes across all bins
    pub fn total_spikes(&self) -> usize {
        self.data.iter().map(|&c| c as usize).sum()
    }

    /// Whether the pattern contains no spikes
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&c| c == 0)
    }

    /// Set all bins to zero
    pub fn clear(&mut self) {
        self.data = [0; PATTERN_BINS];
    }

    /// Reconstruct spike times, one per counted spike
    ///
    /// Sub-millisecond precision is gone; each spike lands at the center
    /// of its bin (bin 5 yields 5.5 ms).
    pub fn to_spike_times(&self) -> Vec<f64> {
        let mut times = Vec::with_capacity(self.total_spikes());
        for (bin, &count) in self.data.iter().enumerate() {
            for _ in 0..count {
                times.push(bin as f64 + 0.5);
            }
        }
        times
    }

    /// Cosine similarity between two patterns, in `[0, 1]`
    ///
    /// Returns 0 when either pattern has zero norm.
    pub fn cosine_similarity(a: &BinaryPattern, b: &BinaryPattern) -> f64 {
        let mut dot = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for (&x, &y) in a.data.iter().zip(b.data.iter()) {
            let (x, y) = (x as f64, y as f64);
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }

    /// Histogram intersection similarity: `Σ min / Σ max`, in `[0, 1]`
    ///
    /// Returns 0 when both patterns are empty.
    pub fn histogram_intersection(a: &BinaryPattern, b: &BinaryPattern) -> f64 {
        let mut intersection = 0u64;
        let mut union = 0u64;
        for (&x, &y) in a.data.iter().zip(b.data.iter()) {
            intersection += x.min(y) as u64;
            union += x.max(y) as u64;
        }
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }

    /// Euclidean similarity: `1 / (1 + L2 distance)`, in `(0, 1]`
    pub fn euclidean_similarity(a: &BinaryPattern, b: &BinaryPattern) -> f64 {
        let mut sum_sq = 0.0;
        for (&x, &y) in a.data.iter().zip(b.data.iter()) {
            let d = x as f64 - y as f64;
            sum_sq += d * d;
        }
        1.0 / (1.0 + sum_sq.sqrt())
    }

    /// Pearson correlation shifted from `[-1, 1]` to `[0, 1]`
    ///
    /// When either pattern has zero variance the correlation is undefined;
    /// identical patterns map to 1, anything else to the neutral 0.5.
    pub fn correlation_similarity(a: &BinaryPattern, b: &BinaryPattern) -> f64 {
        let n = PATTERN_BINS as f64;
        let mean_a = a.data.iter().map(|&x| x as f64).sum::<f64>() / n;
        let mean_b = b.data.iter().map(|&x| x as f64).sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (&x, &y) in a.data.iter().zip(b.data.iter()) {
            let dx = x as f64 - mean_a;
            let dy = y as f64 - mean_b;
            cov += dx * dy;
            var_a += dx * dx;
            var_b += dy * dy;
        }

        let denom = (var_a * var_b).sqrt();
        if denom == 0.0 {
            return if a.data == b.data { 1.0 } else { 0.5 };
        }
        let correlation = cov / denom;
        (correlation + 1.0) / 2.0
    }

    /// Waveform similarity via Gaussian smoothing and lagged cross-correlation
    ///
    /// Both patterns are convolved with a Gaussian kernel of width
    /// `sigma_ms`, then the maximum normalized cross-correlation over lags
    /// in `[-max_lag_ms, +max_lag_ms]` is returned. Captures the temporal
    /// shape of the train and tolerates small jitter.
    pub fn waveform_similarity(
        a: &BinaryPattern,
        b: &BinaryPattern,
        sigma_ms: f64,
        max_lag_ms: i32,
    ) -> f64 {
        let smooth_a = a.smoothed(sigma_ms);
        let smooth_b = b.smoothed(sigma_ms);

        let norm_a = smooth_a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b = smooth_b.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let mut best = 0.0f64;
        for lag in -max_lag_ms..=max_lag_ms {
            let mut dot = 0.0;
            for i in 0..PATTERN_BINS as i32 {
                let j = i + lag;
                if (0..PATTERN_BINS as i32).contains(&j) {
                    dot += smooth_a[i as usize] * smooth_b[j as usize];
                }
            }
            best = best.max(dot / (norm_a * norm_b));
        }
        best.min(1.0)
    }

    /// Gaussian-smoothed waveform of this pattern
    fn smoothed(&self, sigma_ms: f64) -> Vec<f64> {
        let radius = (3.0 * sigma_ms).ceil() as i32;
        let two_sigma_sq = 2.0 * sigma_ms * sigma_ms;
        let mut out = vec![0.0; PATTERN_BINS];
        for (i, slot) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for offset in -radius..=radius {
                let j = i as i32 + offset;
                if (0..PATTERN_BINS as i32).contains(&j) {
                    let weight = (-(offset as f64).powi(2) / two_sigma_sq).exp();
                    acc += self.data[j as usize] as f64 * weight;
                }
            }
            *slot = acc;
        }
        out
    }

    /// Blend `source` into `target`: `t ← (1−α)·t + α·s` per bin
    pub fn blend(target: &mut BinaryPattern, source: &BinaryPattern, alpha: f64) {
        for (t, &s) in target.data.iter_mut().zip(source.data.iter()) {
            let mixed = (1.0 - alpha) * (*t as f64) + alpha * (s as f64);
            *t = mixed.round().clamp(0.0, MAX_BIN_COUNT as f64) as u8;
        }
    }

    /// Merge `source` into `target` as a prototype: `t ← (1−w)·t + w·s`
    pub fn merge(target: &mut BinaryPattern, source: &BinaryPattern, weight: f64) {
        Self::blend(target, source, weight);
    }
}

impl Default for BinaryPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BinaryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryPattern[{} spikes]: ", self.total_spikes())?;
        let mut first = true;
        for (bin, &count) in self.data.iter().enumerate() {
            if count > 0 {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}ms:{}", bin, count)?;
                first = false;
            }
        }
        if first {
            write!(f, "(empty)")?;
        }
        Ok(())
    }
}

/// Cosine similarity between raw spike-time vectors, in `[0, 1]`
///
/// This is the metric the neuron applies to its rolling window against
/// its reference bank. Returns 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
