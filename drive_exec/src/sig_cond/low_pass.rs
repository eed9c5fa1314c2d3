//! Low pass stage calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The low pass stage.
///
/// A fixed-length ring of the most recent raw commands with an associated
/// weight vector of the same length, most recent sample weighted highest.
/// The stage output is the weighted sum divided by the sum of the weights,
/// new samples evict the oldest.
#[derive(Debug, Clone)]
pub struct LowPass {
    /// Weight vector, most recent sample first
    weights: Vec<f64>,

    /// Sum of the weights, precomputed
    weight_sum: f64,

    /// History ring, most recent sample at the front
    history: VecDeque<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LowPass {
    /// Create a new stage from a weight vector.
    ///
    /// The weight vector must not be empty, the caller checks this during
    /// module initialisation. The history starts filled with zeros.
    pub fn new(weights: Vec<f64>) -> Self {
        let weight_sum = weights.iter().sum();
        let history = std::iter::repeat(0f64).take(weights.len()).collect();

        Self {
            weights,
            weight_sum,
            history,
        }
    }

    /// Push a raw sample into the ring and return the filtered value.
    pub fn apply(&mut self, raw: f64) -> f64 {
        self.history.push_front(raw);
        self.history.pop_back();

        self.history
            .iter()
            .zip(self.weights.iter())
            .map(|(sample, weight)| sample * weight)
            .sum::<f64>()
            / self.weight_sum
    }

    /// Clear the sample history back to zeros.
    pub fn reset(&mut self) {
        for sample in self.history.iter_mut() {
            *sample = 0f64;
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_converges_to_constant() {
        let mut low_pass = LowPass::new(vec![4.0, 2.0, 1.0]);

        // After length + 1 constant samples the output equals the input
        let mut out = 0f64;
        for _ in 0..4 {
            out = low_pass.apply(0.7);
        }

        assert!((out - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_recent_sample_weighted_highest() {
        let mut low_pass = LowPass::new(vec![4.0, 2.0, 1.0]);

        low_pass.apply(1.0);
        low_pass.apply(1.0);
        low_pass.apply(1.0);

        // A single zero sample pulls the output down by the first weight's
        // share only
        let out = low_pass.apply(0.0);
        assert!((out - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut low_pass = LowPass::new(vec![1.0, 1.0]);

        low_pass.apply(1.0);
        low_pass.reset();

        assert!((low_pass.apply(0.0)).abs() < 1e-12);
    }
}
