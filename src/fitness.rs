// Fitness: sum of squared per-channel differences between the target image
// and an organism's rendered phenotype. Lower is better, 0 is a perfect match.

use std::sync::Arc;

use crate::error::ConfigError;
use crate::organism::{Environment, Organism};
use crate::render::{PixelBuffer, Renderer};

/// number of channels compared per pixel (RGBA)
pub const FITNESS_CHANNELS: usize = 4;

/// sum over every pixel and channel of `(target - current)^2`, accumulated in f64
pub fn sum_squared_error(target: &[u8], current: &[u8]) -> f64 {
    profiling::scope!("sum_squared_error");
    debug_assert_eq!(target.len(), current.len());
    target
        .iter()
        .zip(current)
        .map(|(&t, &c)| {
            let d = t as f64 - c as f64;
            d * d
        })
        .sum()
}

/// scores organisms against a fixed target. holds no mutable state, so one
/// evaluator can be shared across threads.
pub struct FitnessEvaluator {
    target: PixelBuffer,
    renderer: Arc<dyn Renderer>,
}

impl FitnessEvaluator {
    pub fn new(target: PixelBuffer, renderer: Arc<dyn Renderer>) -> Self {
        Self { target, renderer }
    }

    /// canvas matching the target dimensions
    pub fn environment(&self) -> Result<Environment, ConfigError> {
        Environment::new(self.target.width(), self.target.height())
    }

    pub fn target(&self) -> &PixelBuffer {
        &self.target
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// render the organism and measure its distance to the target
    pub fn evaluate(&self, organism: &Organism) -> f64 {
        profiling::scope!("FitnessEvaluator::evaluate");
        let phenotype = self.renderer.render_organism(organism);
        sum_squared_error(self.target.data(), phenotype.data())
    }

    /// evaluate and attach the score
    pub fn score(&self, organism: Organism) -> Organism {
        let fitness = self.evaluate(&organism);
        organism.evaluated(fitness)
    }

    /// reporting metrics for a raw fitness value on this target
    pub fn metrics(&self, fitness: f64) -> MetricsSnapshot {
        MetricsSnapshot::from_sse(fitness, self.target.num_pixels())
    }
}

/// PSNR (peak signal-to-noise ratio) in decibels for 8-bit channels.
/// higher is better; identical images are capped rather than infinite.
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

/// resolution-invariant view of a fitness value, for display
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// mean squared error per channel
    pub mse: f64,
    pub psnr: f64,
}

impl MetricsSnapshot {
    pub fn from_sse(sse: f64, num_pixels: usize) -> Self {
        let samples = (num_pixels * FITNESS_CHANNELS).max(1) as f64;
        let mse = sse / samples;
        Self { mse, psnr: psnr_from_mse(mse, 255.0) }
    }
}
