//! Velocity field integration by scaling and squaring.

use burn::prelude::*;

use crate::error::Result;
use crate::warp::Warping;

/// Configuration for velocity field integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationConfig {
    /// Number of scaling and squaring steps. Higher values trade compute for
    /// a better approximation of the stationary flow.
    pub num_steps: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self { num_steps: 7 }
    }
}

impl IntegrationConfig {
    /// Create configuration with the given number of steps.
    pub fn with_steps(num_steps: usize) -> Self {
        Self { num_steps }
    }
}

/// Integrates a stationary velocity field into a displacement field.
///
/// Approximates the group exponential of the velocity field: the field is
/// scaled by `1 / 2^N` and self-composed `N` times through the resampler.
/// For a smooth velocity field the resulting displacement is diffeomorphic.
#[derive(Debug, Clone)]
pub struct VelocityFieldIntegrator {
    num_steps: usize,
}

impl VelocityFieldIntegrator {
    /// Create a new integrator.
    pub fn new(config: IntegrationConfig) -> Self {
        Self {
            num_steps: config.num_steps,
        }
    }

    /// Number of squaring steps.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Integrate a velocity field into a displacement field.
    ///
    /// The `warping` supplies the shared reference grid over the field's
    /// spatial shape; shape errors are raised by the resampler.
    ///
    /// # Arguments
    /// * `warping` - Resampler over the field's spatial shape
    /// * `velocity` - Velocity field `[B, d1, d2, d3, 3]`
    ///
    /// # Returns
    /// * Displacement field of the same shape
    pub fn integrate<B: Backend>(
        &self,
        warping: &Warping<B>,
        velocity: Tensor<B, 5>,
    ) -> Result<Tensor<B, 5>> {
        let scale = 0.5_f64.powi(self.num_steps as i32);
        let mut displacement = velocity * scale;

        for _ in 0..self.num_steps {
            let composed = warping.warp_channels(displacement.clone(), displacement.clone())?;
            displacement = displacement + composed;
        }

        Ok(displacement)
    }
}
