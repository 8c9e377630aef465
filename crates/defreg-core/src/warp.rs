//! Warping of volumes by dense displacement fields.
//!
//! A [`Warping`] owns the reference grid for a fixed spatial shape and
//! resamples moving volumes at `grid + displacement` using trilinear
//! interpolation with replicate boundaries.

use burn::prelude::*;

use crate::error::{RegistrationError, Result};
use crate::grid::reference_grid;
use crate::interpolation::sample_trilinear;

/// Resampler for a fixed output grid.
///
/// The reference grid is built once at construction and is never mutated;
/// consumers warping different volumes by the same field see identical
/// sample locations.
#[derive(Debug, Clone)]
pub struct Warping<B: Backend> {
    shape: [usize; 3],
    grid_ref: Tensor<B, 5>,
}

impl<B: Backend> Warping<B> {
    /// Create a warping layer for the given output spatial shape.
    pub fn new(shape: [usize; 3], device: &B::Device) -> Self {
        let grid_ref = reference_grid::<B>(shape, device).unsqueeze::<5>();
        Self { shape, grid_ref }
    }

    /// Output spatial shape of warped volumes.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// The identity coordinate grid, shape `[d1, d2, d3, 3]`.
    pub fn grid(&self) -> Tensor<B, 4> {
        self.grid_ref.clone().squeeze(0)
    }

    /// Warp a scalar volume by a displacement field.
    ///
    /// For every output voxel the sample location is
    /// `reference_grid[voxel] + displacement[voxel]`, in the moving volume's
    /// voxel coordinates. The volume's own spatial shape may differ from the
    /// grid shape; coordinates clamp to the volume bounds.
    ///
    /// # Arguments
    /// * `volume` - Moving volume `[B, m1, m2, m3]`
    /// * `displacement` - Field `[B, d1, d2, d3, 3]` over the grid shape
    ///
    /// # Returns
    /// * Warped volume `[B, d1, d2, d3]`
    pub fn warp(&self, volume: Tensor<B, 4>, displacement: Tensor<B, 5>) -> Result<Tensor<B, 4>> {
        let [b, m1, m2, m3] = volume.dims();
        let warped = self.warp_channels(volume.reshape([b, m1, m2, m3, 1]), displacement)?;
        let [b, o1, o2, o3, _] = warped.dims();
        Ok(warped.reshape([b, o1, o2, o3]))
    }

    /// Warp a channeled volume (labels with channels, or a field) by a
    /// displacement field. Channels are resampled independently in the
    /// continuous domain, with no special-casing of label contents.
    ///
    /// # Arguments
    /// * `volume` - Moving volume `[B, m1, m2, m3, C]`
    /// * `displacement` - Field `[B, d1, d2, d3, 3]` over the grid shape
    pub fn warp_channels(
        &self,
        volume: Tensor<B, 5>,
        displacement: Tensor<B, 5>,
    ) -> Result<Tensor<B, 5>> {
        self.check_field(&displacement)?;
        let vol_dims = volume.dims();
        let field_dims = displacement.dims();
        if vol_dims[0] != field_dims[0] {
            return Err(RegistrationError::shape_mismatch(
                vec![field_dims[0]],
                vec![vol_dims[0]],
            ));
        }

        let coords = self.grid_ref.clone() + displacement;
        Ok(sample_trilinear(volume, coords))
    }

    fn check_field(&self, displacement: &Tensor<B, 5>) -> Result<()> {
        let [_, d1, d2, d3, k] = displacement.dims();
        if [d1, d2, d3] != self.shape || k != 3 {
            let mut expected = self.shape.to_vec();
            expected.push(3);
            return Err(RegistrationError::shape_mismatch(
                expected,
                vec![d1, d2, d3, k],
            ));
        }
        Ok(())
    }
}
