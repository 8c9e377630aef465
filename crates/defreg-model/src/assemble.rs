//! Assembly of the composite training objective and its reported scalars.
//!
//! Losses are additive; metrics are observational only and never contribute
//! a gradient. Scalar names are a stable contract for dashboards.

use std::collections::BTreeMap;

use burn::prelude::*;

use defreg_core::{RegistrationError, Result};

use crate::config::ResolvedLoss;
use crate::loss::label::{centroid_distance, dice_score, foreground_proportion};

pub const LOSS_REGULARIZATION: &str = "loss/regularization";
pub const LOSS_WEIGHTED_REGULARIZATION: &str = "loss/weighted_regularization";
pub const LOSS_IMAGE_DISSIMILARITY: &str = "loss/image_dissimilarity";
pub const LOSS_WEIGHTED_IMAGE_DISSIMILARITY: &str = "loss/weighted_image_dissimilarity";
pub const LOSS_LABEL_DISSIMILARITY: &str = "loss/label_dissimilarity";
pub const LOSS_WEIGHTED_LABEL_DISSIMILARITY: &str = "loss/weighted_label_dissimilarity";
pub const METRIC_DICE_BINARY: &str = "metric/dice_binary";
pub const METRIC_DICE_FLOAT: &str = "metric/dice_float";
pub const METRIC_TRE: &str = "metric/tre";
pub const METRIC_FOREGROUND_LABEL: &str = "metric/foreground_label";
pub const METRIC_FOREGROUND_PRED: &str = "metric/foreground_pred";

/// The assembled objective: the additive total loss and every reported
/// scalar, keyed by its stable name.
#[derive(Debug, Clone)]
pub struct TrainingObjective<B: Backend> {
    pub total: Tensor<B, 1>,
    pub scalars: BTreeMap<&'static str, Tensor<B, 1>>,
}

impl<B: Backend> TrainingObjective<B> {
    /// Look up a reported scalar by name.
    pub fn scalar(&self, name: &str) -> Option<&Tensor<B, 1>> {
        self.scalars.get(name)
    }
}

/// Compute the composite loss and diagnostic metrics of one forward pass.
///
/// Regularization is always computed and always contributes, whatever its
/// weight. The image term contributes only for a positive weight. The label
/// branch runs only when a fixed label is present; its four diagnostics are
/// reported but never added to the total.
///
/// # Arguments
/// * `ddf` - Displacement field `[B, f1, f2, f3, 3]`
/// * `grid_fixed` - Reference grid `[f1, f2, f3, 3]`
/// * `fixed_image` / `pred_fixed_image` - `[B, f1, f2, f3]`
/// * `fixed_label` / `pred_fixed_label` - `[B, f1, f2, f3]`, both present or
///   both absent
pub fn assemble<B: Backend>(
    ddf: Tensor<B, 5>,
    grid_fixed: Tensor<B, 4>,
    fixed_image: Tensor<B, 4>,
    fixed_label: Option<Tensor<B, 4>>,
    pred_fixed_image: Tensor<B, 4>,
    pred_fixed_label: Option<Tensor<B, 4>>,
    loss: &ResolvedLoss<B>,
) -> Result<TrainingObjective<B>> {
    let mut scalars: BTreeMap<&'static str, Tensor<B, 1>> = BTreeMap::new();

    // Regularization on the displacement field.
    let energy = loss.regularization.energy.forward(ddf);
    let weighted_energy = energy.clone().mul_scalar(loss.regularization.weight);
    let mut total = weighted_energy.clone();
    scalars.insert(LOSS_REGULARIZATION, energy);
    scalars.insert(LOSS_WEIGHTED_REGULARIZATION, weighted_energy);

    // Image dissimilarity.
    if loss.image.weight > 0.0 {
        let dissimilarity = loss
            .image
            .method
            .forward(fixed_image, pred_fixed_image);
        let weighted = dissimilarity.clone().mul_scalar(loss.image.weight);
        total = total + weighted.clone();
        scalars.insert(LOSS_IMAGE_DISSIMILARITY, dissimilarity);
        scalars.insert(LOSS_WEIGHTED_IMAGE_DISSIMILARITY, weighted);
    }

    // Label dissimilarity and diagnostics.
    match (fixed_label, pred_fixed_label) {
        (Some(fixed_label), Some(pred_fixed_label)) => {
            let dissimilarity = loss
                .label
                .method
                .forward(fixed_label.clone(), pred_fixed_label.clone())
                .mul_scalar(loss.label.weight);
            total = total + dissimilarity.clone();
            scalars.insert(LOSS_LABEL_DISSIMILARITY, dissimilarity.clone());
            scalars.insert(LOSS_WEIGHTED_LABEL_DISSIMILARITY, dissimilarity);

            scalars.insert(
                METRIC_DICE_BINARY,
                dice_score(fixed_label.clone(), pred_fixed_label.clone(), true),
            );
            scalars.insert(
                METRIC_DICE_FLOAT,
                dice_score(fixed_label.clone(), pred_fixed_label.clone(), false),
            );
            scalars.insert(
                METRIC_TRE,
                centroid_distance(fixed_label.clone(), pred_fixed_label.clone(), grid_fixed),
            );
            scalars.insert(
                METRIC_FOREGROUND_LABEL,
                foreground_proportion(fixed_label),
            );
            scalars.insert(
                METRIC_FOREGROUND_PRED,
                foreground_proportion(pred_fixed_label),
            );
        }
        (None, None) => {}
        _ => {
            return Err(RegistrationError::invalid_configuration(
                "fixed_label and pred_fixed_label must be supplied together",
            ))
        }
    }

    Ok(TrainingObjective { total, scalars })
}
