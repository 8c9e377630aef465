//! Loss configuration: the raw serde tree and its resolution into strongly
//! typed strategies.
//!
//! Resolution happens once, before any forward pass: unknown method names and
//! missing weights are rejected here, never at first use.

use burn::prelude::*;
use serde::Deserialize;

use defreg_core::{RegistrationError, Result};

use crate::loss::image::LocalNcc;
use crate::loss::{DeformationEnergy, ImageDissimilarity, LabelDissimilarity};

const DEFAULT_LNCC_KERNEL_SIZE: usize = 9;

/// Raw loss configuration, one entry per term.
#[derive(Debug, Clone, Deserialize)]
pub struct LossConfig {
    pub regularization: RegularizationConfig,
    pub dissimilarity: DissimilarityConfig,
}

/// Deformation regularization term.
#[derive(Debug, Clone, Deserialize)]
pub struct RegularizationConfig {
    /// Energy method name: `gradient-l1`, `gradient-l2` or `bending`.
    pub energy_type: String,
    pub weight: Option<f64>,
}

/// Image and label dissimilarity terms.
#[derive(Debug, Clone, Deserialize)]
pub struct DissimilarityConfig {
    pub image: ImageLossConfig,
    pub label: LabelLossConfig,
}

/// Image dissimilarity term.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageLossConfig {
    /// Method name: `lncc`, `gncc` or `ssd`.
    pub name: String,
    /// A non-positive weight disables the term's loss contribution.
    pub weight: Option<f64>,
    /// Window edge length for `lncc`.
    pub kernel_size: Option<usize>,
}

/// Label dissimilarity term. The weight is folded into the loss value.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelLossConfig {
    /// Method name: `dice`, `jaccard` or `cross-entropy`.
    pub name: String,
    pub weight: Option<f64>,
}

/// Fully resolved loss strategies, ready to assemble an objective.
#[derive(Debug)]
pub struct ResolvedLoss<B: Backend> {
    pub regularization: RegularizationTerm,
    pub image: ImageTerm<B>,
    pub label: LabelTerm,
}

#[derive(Debug)]
pub struct RegularizationTerm {
    pub energy: DeformationEnergy,
    pub weight: f64,
}

#[derive(Debug)]
pub struct ImageTerm<B: Backend> {
    pub method: ImageDissimilarity<B>,
    pub weight: f64,
}

#[derive(Debug)]
pub struct LabelTerm {
    pub method: LabelDissimilarity,
    pub weight: f64,
}

impl LossConfig {
    /// Resolve method names and weights into typed strategies.
    ///
    /// The regularization weight is not gated on sign: a zero weight still
    /// scales the (always computed) energy to zero.
    pub fn resolve<B: Backend>(&self, device: &B::Device) -> Result<ResolvedLoss<B>> {
        let regularization = RegularizationTerm {
            energy: resolve_energy(&self.regularization.energy_type)?,
            weight: require_weight(self.regularization.weight, "regularization")?,
        };

        let image_config = &self.dissimilarity.image;
        let image = ImageTerm {
            method: resolve_image::<B>(image_config, device)?,
            weight: require_weight(image_config.weight, "dissimilarity.image")?,
        };

        let label_config = &self.dissimilarity.label;
        let label = LabelTerm {
            method: resolve_label(&label_config.name)?,
            weight: require_weight(label_config.weight, "dissimilarity.label")?,
        };

        tracing::debug!(
            energy = ?regularization.energy,
            image = ?image.method,
            label = ?label.method,
            "resolved loss configuration"
        );

        Ok(ResolvedLoss {
            regularization,
            image,
            label,
        })
    }
}

fn require_weight(weight: Option<f64>, term: &str) -> Result<f64> {
    weight.ok_or_else(|| {
        RegistrationError::invalid_configuration(format!("missing 'weight' for {term}"))
    })
}

fn resolve_energy(name: &str) -> Result<DeformationEnergy> {
    match name {
        "gradient-l1" => Ok(DeformationEnergy::GradientL1),
        "gradient-l2" => Ok(DeformationEnergy::GradientL2),
        "bending" => Ok(DeformationEnergy::Bending),
        other => Err(RegistrationError::unsupported_method(
            "regularization energy",
            other,
        )),
    }
}

fn resolve_image<B: Backend>(
    config: &ImageLossConfig,
    device: &B::Device,
) -> Result<ImageDissimilarity<B>> {
    match config.name.as_str() {
        "lncc" => {
            let kernel_size = config.kernel_size.unwrap_or(DEFAULT_LNCC_KERNEL_SIZE);
            Ok(ImageDissimilarity::Lncc(LocalNcc::new(kernel_size, device)))
        }
        "gncc" => Ok(ImageDissimilarity::Gncc),
        "ssd" => Ok(ImageDissimilarity::Ssd),
        other => Err(RegistrationError::unsupported_method(
            "image dissimilarity",
            other,
        )),
    }
}

fn resolve_label(name: &str) -> Result<LabelDissimilarity> {
    match name {
        "dice" => Ok(LabelDissimilarity::Dice),
        "jaccard" => Ok(LabelDissimilarity::Jaccard),
        "cross-entropy" => Ok(LabelDissimilarity::CrossEntropy),
        other => Err(RegistrationError::unsupported_method(
            "label dissimilarity",
            other,
        )),
    }
}
