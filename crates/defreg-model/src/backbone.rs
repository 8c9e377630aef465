//! Backbone contract and channel-concatenation adapter.
//!
//! The backbone is an opaque differentiable field regressor supplied by the
//! caller: it maps a 2-channel volume over the fixed grid to a 3-channel
//! field over the same grid. This module owns only the concatenation contract
//! and the shape bookkeeping around the call.

use burn::prelude::*;
use defreg_core::{RegistrationError, Result};

/// A differentiable network regressing a dense field from an image pair.
///
/// Input is `[B, d1, d2, d3, 2]` (moving and fixed concatenated along the
/// channel axis), output must be `[B, d1, d2, d3, 3]`.
pub trait Backbone<B: Backend> {
    fn forward(&self, input: Tensor<B, 5>) -> Tensor<B, 5>;
}

impl<B: Backend, T: Backbone<B> + ?Sized> Backbone<B> for &T {
    fn forward(&self, input: Tensor<B, 5>) -> Tensor<B, 5> {
        (**self).forward(input)
    }
}

/// Concatenate a moving/fixed volume pair and run the backbone.
///
/// Both volumes must be single-channel and share a spatial shape; the raw
/// field returned by the backbone is validated to cover the same grid with
/// exactly 3 components before it is handed on.
pub fn run_backbone<B: Backend>(
    backbone: &impl Backbone<B>,
    moving: Tensor<B, 5>,
    fixed: Tensor<B, 5>,
) -> Result<Tensor<B, 5>> {
    let moving_dims = moving.dims();
    let fixed_dims = fixed.dims();
    if moving_dims != fixed_dims || moving_dims[4] != 1 {
        return Err(RegistrationError::shape_mismatch(
            fixed_dims.to_vec(),
            moving_dims.to_vec(),
        ));
    }

    let inputs = Tensor::cat(vec![moving, fixed], 4);
    let field = backbone.forward(inputs);

    let field_dims = field.dims();
    let expected = [
        fixed_dims[0],
        fixed_dims[1],
        fixed_dims[2],
        fixed_dims[3],
        3,
    ];
    if field_dims != expected {
        return Err(RegistrationError::shape_mismatch(
            expected.to_vec(),
            field_dims.to_vec(),
        ));
    }
    Ok(field)
}
