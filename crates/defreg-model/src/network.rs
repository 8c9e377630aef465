//! Forward pipeline for DDF/DVF registration.
//!
//! A single synchronous pass: expand the scalar volumes to channeled form,
//! resize the moving image onto the fixed grid when shapes differ, regress a
//! raw field through the backbone, integrate it in velocity mode, then warp
//! the moving image (and label, when present) by the displacement field.

use burn::prelude::*;
use serde::Deserialize;

use defreg_core::resize::resize_linear;
use defreg_core::{
    IntegrationConfig, RegistrationError, Result, VelocityFieldIntegrator, Warping,
};

use crate::backbone::{run_backbone, Backbone};

/// How the backbone's raw field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationMethod {
    /// The raw field is the displacement field.
    Ddf,
    /// The raw field is a stationary velocity field, integrated into a
    /// displacement field by scaling and squaring.
    Dvf,
}

impl RegistrationMethod {
    /// Parse a configured method name.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "ddf" => Ok(Self::Ddf),
            "dvf" => Ok(Self::Dvf),
            other => Err(RegistrationError::unsupported_method("registration", other)),
        }
    }
}

fn default_integration_steps() -> usize {
    IntegrationConfig::default().num_steps
}

/// Configuration for [`RegistrationNetwork`].
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationNetworkConfig {
    /// Method name: `ddf` or `dvf`.
    pub method: String,
    /// Spatial shape of moving images, `(m1, m2, m3)`.
    pub moving_image_size: [usize; 3],
    /// Spatial shape of fixed images, `(f1, f2, f3)`.
    pub fixed_image_size: [usize; 3],
    /// Scaling-and-squaring steps in `dvf` mode.
    #[serde(default = "default_integration_steps")]
    pub integration_steps: usize,
}

impl RegistrationNetworkConfig {
    /// Build the network around an externally supplied backbone.
    ///
    /// The reference grid over the fixed shape is built here, once, and
    /// shared by every consumer.
    pub fn init<B: Backend, M: Backbone<B>>(
        &self,
        backbone: M,
        device: &B::Device,
    ) -> Result<RegistrationNetwork<B, M>> {
        let method = RegistrationMethod::parse(&self.method)?;
        let warping = Warping::new(self.fixed_image_size, device);
        let integrator = match method {
            RegistrationMethod::Dvf => Some(VelocityFieldIntegrator::new(
                IntegrationConfig::with_steps(self.integration_steps),
            )),
            RegistrationMethod::Ddf => None,
        };

        tracing::info!(
            ?method,
            moving = ?self.moving_image_size,
            fixed = ?self.fixed_image_size,
            "built registration network"
        );

        Ok(RegistrationNetwork {
            backbone,
            method,
            moving_size: self.moving_image_size,
            fixed_size: self.fixed_image_size,
            warping,
            integrator,
        })
    }
}

/// Inputs of one registration forward pass, batch-first.
#[derive(Debug, Clone)]
pub struct RegistrationInputs<B: Backend> {
    /// Moving image `[B, m1, m2, m3]`.
    pub moving_image: Tensor<B, 4>,
    /// Fixed image `[B, f1, f2, f3]`.
    pub fixed_image: Tensor<B, 4>,
    /// Sample identification indices `[B, index_size]`, carried through.
    pub indices: Tensor<B, 2>,
    /// Moving label `[B, m1, m2, m3]`. Warped by the same displacement field
    /// at its supplied resolution; expected to already live on the fixed
    /// grid.
    pub moving_label: Option<Tensor<B, 4>>,
    /// Fixed label `[B, f1, f2, f3]`, consumed by the objective assembly.
    pub fixed_label: Option<Tensor<B, 4>>,
}

/// Outputs of one registration forward pass.
#[derive(Debug, Clone)]
pub struct RegistrationOutput<B: Backend> {
    /// Velocity field `[B, f1, f2, f3, 3]`, present only in `dvf` mode.
    pub dvf: Option<Tensor<B, 5>>,
    /// Displacement field `[B, f1, f2, f3, 3]`.
    pub ddf: Tensor<B, 5>,
    /// Warped moving image `[B, f1, f2, f3]`.
    pub pred_fixed_image: Tensor<B, 4>,
    /// Warped moving label, present only when a moving label was supplied.
    pub pred_fixed_label: Option<Tensor<B, 4>>,
    /// Reference grid of the fixed volume `[f1, f2, f3, 3]`.
    pub grid_fixed: Tensor<B, 4>,
}

/// Deformable registration network over a pluggable backbone.
pub struct RegistrationNetwork<B: Backend, M: Backbone<B>> {
    backbone: M,
    method: RegistrationMethod,
    moving_size: [usize; 3],
    fixed_size: [usize; 3],
    warping: Warping<B>,
    integrator: Option<VelocityFieldIntegrator>,
}

impl<B: Backend, M: Backbone<B>> RegistrationNetwork<B, M> {
    /// The configured method.
    pub fn method(&self) -> RegistrationMethod {
        self.method
    }

    /// The shared resampler over the fixed grid.
    pub fn warping(&self) -> &Warping<B> {
        &self.warping
    }

    /// Run the forward pipeline.
    pub fn forward(&self, inputs: RegistrationInputs<B>) -> Result<RegistrationOutput<B>> {
        let RegistrationInputs {
            moving_image,
            fixed_image,
            moving_label,
            ..
        } = inputs;

        self.check_volume(&moving_image, self.moving_size)?;
        self.check_volume(&fixed_image, self.fixed_size)?;

        let [b, m1, m2, m3] = moving_image.dims();
        let [_, f1, f2, f3] = fixed_image.dims();

        // Channel expansion; the moving label is deliberately left at its
        // supplied resolution.
        let moving = moving_image.reshape([b, m1, m2, m3, 1]);
        let fixed = fixed_image.reshape([b, f1, f2, f3, 1]);
        let moving = resize_linear(moving, self.fixed_size);

        let raw_field = run_backbone(&self.backbone, moving.clone(), fixed)?;

        let (dvf, ddf) = match &self.integrator {
            Some(integrator) => {
                let ddf = integrator.integrate(&self.warping, raw_field.clone())?;
                (Some(raw_field), ddf)
            }
            None => (None, raw_field),
        };

        let moving: Tensor<B, 4> = moving.squeeze(4);
        let pred_fixed_image = self.warping.warp(moving, ddf.clone())?;
        let pred_fixed_label = match moving_label {
            Some(label) => Some(self.warping.warp(label, ddf.clone())?),
            None => None,
        };

        Ok(RegistrationOutput {
            dvf,
            ddf,
            pred_fixed_image,
            pred_fixed_label,
            grid_fixed: self.warping.grid(),
        })
    }

    fn check_volume(&self, volume: &Tensor<B, 4>, expected: [usize; 3]) -> Result<()> {
        let [_, d1, d2, d3] = volume.dims();
        if [d1, d2, d3] != expected {
            return Err(RegistrationError::shape_mismatch(
                expected.to_vec(),
                vec![d1, d2, d3],
            ));
        }
        Ok(())
    }
}
