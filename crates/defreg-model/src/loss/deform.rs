//! Deformation regularization energies on displacement fields.
//!
//! Spatial derivatives use central differences on the interior of the field,
//! so every term is evaluated over `[B, d1-2, d2-2, d3-2, 3]` (second-order
//! terms shrink the interior once more).

use burn::prelude::*;

/// Central difference along the first spatial axis, interior voxels only.
fn gradient_axis1<B: Backend>(f: &Tensor<B, 5>) -> Tensor<B, 5> {
    let [b, d1, d2, d3, c] = f.dims();
    (f.clone().slice([0..b, 2..d1, 1..d2 - 1, 1..d3 - 1, 0..c])
        - f.clone().slice([0..b, 0..d1 - 2, 1..d2 - 1, 1..d3 - 1, 0..c]))
        / 2.0
}

/// Central difference along the second spatial axis, interior voxels only.
fn gradient_axis2<B: Backend>(f: &Tensor<B, 5>) -> Tensor<B, 5> {
    let [b, d1, d2, d3, c] = f.dims();
    (f.clone().slice([0..b, 1..d1 - 1, 2..d2, 1..d3 - 1, 0..c])
        - f.clone().slice([0..b, 1..d1 - 1, 0..d2 - 2, 1..d3 - 1, 0..c]))
        / 2.0
}

/// Central difference along the third spatial axis, interior voxels only.
fn gradient_axis3<B: Backend>(f: &Tensor<B, 5>) -> Tensor<B, 5> {
    let [b, d1, d2, d3, c] = f.dims();
    (f.clone().slice([0..b, 1..d1 - 1, 1..d2 - 1, 2..d3, 0..c])
        - f.clone().slice([0..b, 1..d1 - 1, 1..d2 - 1, 0..d3 - 2, 0..c]))
        / 2.0
}

/// Mean first-order gradient magnitude of the field.
fn gradient_norm<B: Backend>(field: Tensor<B, 5>, l1: bool) -> Tensor<B, 1> {
    let d1 = gradient_axis1(&field);
    let d2 = gradient_axis2(&field);
    let d3 = gradient_axis3(&field);

    if l1 {
        (d1.abs() + d2.abs() + d3.abs()).mean()
    } else {
        (d1.powf_scalar(2.0) + d2.powf_scalar(2.0) + d3.powf_scalar(2.0)).mean()
    }
}

/// Mean second-order bending energy of the field.
fn bending_energy<B: Backend>(field: Tensor<B, 5>) -> Tensor<B, 1> {
    let d1 = gradient_axis1(&field);
    let d2 = gradient_axis2(&field);
    let d3 = gradient_axis3(&field);

    let d11 = gradient_axis1(&d1);
    let d22 = gradient_axis2(&d2);
    let d33 = gradient_axis3(&d3);
    let d12 = gradient_axis2(&d1);
    let d13 = gradient_axis3(&d1);
    let d23 = gradient_axis3(&d2);

    (d11.powf_scalar(2.0)
        + d22.powf_scalar(2.0)
        + d33.powf_scalar(2.0)
        + d12.powf_scalar(2.0).mul_scalar(2.0)
        + d13.powf_scalar(2.0).mul_scalar(2.0)
        + d23.powf_scalar(2.0).mul_scalar(2.0))
    .mean()
}

/// Resolved deformation energy strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeformationEnergy {
    GradientL1,
    GradientL2,
    Bending,
}

impl DeformationEnergy {
    /// Mean local displacement energy of a displacement field
    /// `[B, d1, d2, d3, 3]`.
    ///
    /// First-order energies need every spatial dimension to be at least 3,
    /// bending needs at least 5.
    pub fn forward<B: Backend>(&self, displacement: Tensor<B, 5>) -> Tensor<B, 1> {
        match self {
            Self::GradientL1 => gradient_norm(displacement, true),
            Self::GradientL2 => gradient_norm(displacement, false),
            Self::Bending => bending_energy(displacement),
        }
    }
}
