//! Linear resizing of volumes to a target spatial shape.

use burn::prelude::*;

use crate::grid::reference_grid;
use crate::interpolation::sample_trilinear;

/// Resize a channeled volume to a target spatial shape with trilinear
/// interpolation.
///
/// Each output voxel maps back to a fractional input coordinate through a
/// per-axis linear scale factor `(in - 1) / (out - 1)`, so the first and last
/// samples of every axis align with the input corners; boundaries are clamped.
/// When the shape already matches, the input tensor is returned unchanged.
///
/// # Arguments
/// * `volume` - Input volume `[B, m1, m2, m3, C]`
/// * `target_shape` - Output spatial shape `[t1, t2, t3]`
///
/// # Returns
/// * Resized volume `[B, t1, t2, t3, C]`
pub fn resize_linear<B: Backend>(volume: Tensor<B, 5>, target_shape: [usize; 3]) -> Tensor<B, 5> {
    let [b, m1, m2, m3, _c] = volume.dims();
    if [m1, m2, m3] == target_shape {
        return volume;
    }

    let device = volume.device();
    let scales = [
        axis_scale(m1, target_shape[0]),
        axis_scale(m2, target_shape[1]),
        axis_scale(m3, target_shape[2]),
    ];
    let scales = Tensor::<B, 1>::from_floats(scales, &device).reshape([1, 1, 1, 3]);

    let coords = (reference_grid::<B>(target_shape, &device) * scales)
        .unsqueeze::<5>()
        .repeat(&[b, 1, 1, 1, 1]);

    sample_trilinear(volume, coords)
}

fn axis_scale(in_dim: usize, out_dim: usize) -> f32 {
    if out_dim > 1 {
        (in_dim - 1) as f32 / (out_dim - 1) as f32
    } else {
        0.0
    }
}
