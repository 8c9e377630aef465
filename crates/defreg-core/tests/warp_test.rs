use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use defreg_core::{RegistrationError, Warping};

type Backend = NdArray<f32>;

fn ramp_volume(device: &<Backend as burn::tensor::backend::Backend>::Device) -> Tensor<Backend, 4> {
    // volume[0, i, j, k] = 16*i + 4*j + k
    let data: Vec<f32> = (0..64).map(|v| v as f32).collect();
    Tensor::from_floats(TensorData::new(data, [1, 4, 4, 4]), device)
}

fn constant_field(
    value: f32,
    axis: usize,
    device: &<Backend as burn::tensor::backend::Backend>::Device,
) -> Tensor<Backend, 5> {
    let mut data = vec![0.0_f32; 64 * 3];
    for voxel in 0..64 {
        data[voxel * 3 + axis] = value;
    }
    Tensor::from_floats(TensorData::new(data, [1, 4, 4, 4, 3]), device)
}

#[test]
fn test_zero_displacement_is_identity() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    let volume = ramp_volume(&device);
    let ddf = Tensor::zeros([1, 4, 4, 4, 3], &device);

    let warped = warping.warp(volume.clone(), ddf).unwrap();

    let expected = volume.into_data();
    let actual = warped.into_data();
    let expected = expected.as_slice::<f32>().unwrap();
    let actual = actual.as_slice::<f32>().unwrap();
    assert_eq!(expected, actual);
}

#[test]
fn test_unit_shift_along_last_axis() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    let volume = ramp_volume(&device);
    let ddf = constant_field(1.0, 2, &device);

    let warped = warping.warp(volume, ddf).unwrap();
    let data = warped.into_data();
    let values = data.as_slice::<f32>().unwrap();

    // warped[i, j, k] = volume[i, j, min(k + 1, 3)]
    assert_eq!(values[0], 1.0); // (0,0,0) -> (0,0,1)
    assert_eq!(values[2], 3.0); // (0,0,2) -> (0,0,3)
    assert_eq!(values[3], 3.0); // (0,0,3) clamps to (0,0,3)
    assert_eq!(values[21], 22.0); // (1,1,1) -> (1,1,2)
}

#[test]
fn test_out_of_bounds_replicates_boundary() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    let volume = ramp_volume(&device);
    let ddf = constant_field(-5.0, 0, &device);

    let warped = warping.warp(volume, ddf).unwrap();
    let data = warped.into_data();
    let values = data.as_slice::<f32>().unwrap();

    // Every sample clamps to the i = 0 slab.
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                let flat = 16 * i + 4 * j + k;
                assert_eq!(values[flat], (4 * j + k) as f32);
            }
        }
    }
}

#[test]
fn test_fractional_shift_interpolates() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    let volume = ramp_volume(&device);
    let ddf = constant_field(0.5, 2, &device);

    let warped = warping.warp(volume, ddf).unwrap();
    let data = warped.into_data();
    let values = data.as_slice::<f32>().unwrap();

    // Halfway between voxels 0 and 1 along the last axis.
    assert!((values[0] - 0.5).abs() < 1e-5);
    assert!((values[1] - 1.5).abs() < 1e-5);
}

#[test]
fn test_warp_channels_identity() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([2, 2, 2], &device);

    let data: Vec<f32> = (0..16).map(|v| v as f32 * 0.25).collect();
    let volume = Tensor::<Backend, 5>::from_floats(TensorData::new(data, [1, 2, 2, 2, 2]), &device);
    let ddf = Tensor::zeros([1, 2, 2, 2, 3], &device);

    let warped = warping.warp_channels(volume.clone(), ddf).unwrap();

    let expected = volume.into_data();
    let actual = warped.into_data();
    assert_eq!(
        expected.as_slice::<f32>().unwrap(),
        actual.as_slice::<f32>().unwrap()
    );
}

#[test]
fn test_field_spatial_shape_mismatch() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    let volume = ramp_volume(&device);
    let ddf = Tensor::zeros([1, 2, 2, 2, 3], &device);

    let err = warping.warp(volume, ddf).unwrap_err();
    assert!(matches!(err, RegistrationError::ShapeMismatch { .. }));
}

#[test]
fn test_field_component_count_mismatch() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    let volume = ramp_volume(&device);
    let ddf = Tensor::zeros([1, 4, 4, 4, 2], &device);

    let err = warping.warp(volume, ddf).unwrap_err();
    assert!(matches!(err, RegistrationError::ShapeMismatch { .. }));
}

#[test]
fn test_batch_mismatch() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    let volume = Tensor::zeros([2, 4, 4, 4], &device);
    let ddf = Tensor::zeros([1, 4, 4, 4, 3], &device);

    let err = warping.warp(volume, ddf).unwrap_err();
    assert!(matches!(err, RegistrationError::ShapeMismatch { .. }));
}

#[test]
fn test_moving_volume_smaller_than_grid() {
    let device = Default::default();
    let warping = Warping::<Backend>::new([4, 4, 4], &device);

    // Sampling a 2^3 volume on a 4^3 grid clamps to the smaller bounds.
    let data: Vec<f32> = (0..8).map(|v| v as f32).collect();
    let volume = Tensor::<Backend, 4>::from_floats(TensorData::new(data, [1, 2, 2, 2]), &device);
    let ddf = Tensor::zeros([1, 4, 4, 4, 3], &device);

    let warped = warping.warp(volume, ddf).unwrap();
    assert_eq!(warped.dims(), [1, 4, 4, 4]);

    let data = warped.into_data();
    let values = data.as_slice::<f32>().unwrap();
    // Grid coordinates >= 1 clamp to the last voxel of each axis.
    assert_eq!(values[0], 0.0);
    assert_eq!(values[63], 7.0);
}
