//! Weighted random index selection over a discrete histogram.

use crate::data::Seed;
use crate::error::{Result, SpecimenError};

/// A discrete weighted sampler.
///
/// Built once from a weight list, then sampled with a [`Seed`]. Weights
/// are normalized by their true sum, so a slightly-unnormalized list
/// like `[0.2, 0.1]` still selects proportionally (2:1 here).
#[derive(Debug, Clone)]
pub struct Sampler {
    cumulative: Vec<f64>,
}

impl Sampler {
    /// Build a sampler from explicit weights, one per candidate.
    ///
    /// Fails with [`SpecimenError::HistogramMismatch`] when the counts
    /// differ, before any sampling can occur.
    pub fn from_weights(weights: &[f64], candidates: usize) -> Result<Self> {
        if weights.len() != candidates {
            return Err(SpecimenError::HistogramMismatch {
                weights: weights.len(),
                candidates,
            });
        }
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut running = 0.0;
        for w in weights {
            running += w;
            cumulative.push(running);
        }
        Ok(Sampler { cumulative })
    }

    /// Build a uniform sampler over `candidates` equally-likely indices.
    pub fn uniform(candidates: usize) -> Self {
        let cumulative = (1..=candidates).map(|i| i as f64).collect();
        Sampler { cumulative }
    }

    /// Number of candidate indices.
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// True when there is nothing to sample.
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Draw one index, advancing the seed.
    ///
    /// Draws `r` uniform in `[0, total)` and returns the smallest index
    /// whose cumulative weight exceeds `r`.
    pub fn sample(&self, seed: Seed) -> Result<(usize, Seed)> {
        let total = match self.cumulative.last() {
            Some(&total) if total > 0.0 => total,
            _ => return Err(SpecimenError::EmptyChoice),
        };
        let (unit, next) = seed.next_f64();
        let r = unit * total;
        let index = self
            .cumulative
            .iter()
            .position(|&c| c > r)
            .unwrap_or(self.cumulative.len() - 1);
        Ok((index, next))
    }
}
