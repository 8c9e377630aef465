//! Reference sampling grids.
//!
//! The reference grid holds the identity voxel coordinates of a volume: entry
//! `(i, j, k)` is the float vector `[i, j, k]`. It is built once per spatial
//! shape and shared read-only by every consumer.

use burn::prelude::*;

/// Build the identity coordinate grid for a spatial shape.
///
/// # Arguments
/// * `shape` - Spatial shape `[d1, d2, d3]`
/// * `device` - Device to create the grid on
///
/// # Returns
/// * Grid of shape `[d1, d2, d3, 3]`, component `k` holding the integer voxel
///   index along axis `k` as a float
pub fn reference_grid<B: Backend>(shape: [usize; 3], device: &B::Device) -> Tensor<B, 4> {
    let [d1, d2, d3] = shape;

    let c1 = Tensor::<B, 1, Int>::arange(0..d1 as i64, device)
        .float()
        .reshape([d1, 1, 1, 1])
        .repeat(&[1, d2, d3, 1]);
    let c2 = Tensor::<B, 1, Int>::arange(0..d2 as i64, device)
        .float()
        .reshape([1, d2, 1, 1])
        .repeat(&[d1, 1, d3, 1]);
    let c3 = Tensor::<B, 1, Int>::arange(0..d3 as i64, device)
        .float()
        .reshape([1, 1, d3, 1])
        .repeat(&[d1, d2, 1, 1]);

    Tensor::cat(vec![c1, c2, c3], 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_grid_shape() {
        let device = Default::default();
        let grid = reference_grid::<TestBackend>([2, 3, 4], &device);
        assert_eq!(grid.dims(), [2, 3, 4, 3]);
    }

    #[test]
    fn test_grid_values() {
        let device = Default::default();
        let grid = reference_grid::<TestBackend>([2, 2, 2], &device);
        let data = grid.into_data();
        let values = data.as_slice::<f32>().unwrap();

        // voxel (0, 0, 0) -> [0, 0, 0]
        assert_eq!(&values[0..3], &[0.0, 0.0, 0.0]);
        // voxel (0, 0, 1) -> [0, 0, 1]
        assert_eq!(&values[3..6], &[0.0, 0.0, 1.0]);
        // voxel (1, 1, 1) -> [1, 1, 1]
        assert_eq!(&values[21..24], &[1.0, 1.0, 1.0]);
    }
}
