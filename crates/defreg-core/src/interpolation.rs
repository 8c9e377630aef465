//! Trilinear interpolation for channel-last 3D volumes.

use burn::prelude::*;

/// Sample a volume at arbitrary voxel coordinates with trilinear interpolation.
///
/// Coordinates are clamped per axis to `[0, dim - 1]`, so out-of-range samples
/// replicate the boundary voxel (border padding, not zero padding). Sampling
/// exactly on an integer grid point returns that voxel's value exactly.
///
/// # Arguments
/// * `volume` - Input volume `[B, m1, m2, m3, C]`
/// * `coords` - Sample locations `[B, o1, o2, o3, 3]` in voxel coordinates
///
/// # Returns
/// * Interpolated volume `[B, o1, o2, o3, C]`
pub fn sample_trilinear<B: Backend>(volume: Tensor<B, 5>, coords: Tensor<B, 5>) -> Tensor<B, 5> {
    let [b, m1, m2, m3, c] = volume.dims();
    let [_, o1, o2, o3, _] = coords.dims();
    let n_in = m1 * m2 * m3;
    let n_out = o1 * o2 * o3;

    // Split coordinates per axis, flattened over output voxels
    let coords = coords.reshape([b, n_out, 3]);
    let x = coords
        .clone()
        .slice([0..b, 0..n_out, 0..1])
        .reshape([b, n_out])
        .clamp(0.0, (m1 - 1) as f32);
    let y = coords
        .clone()
        .slice([0..b, 0..n_out, 1..2])
        .reshape([b, n_out])
        .clamp(0.0, (m2 - 1) as f32);
    let z = coords
        .slice([0..b, 0..n_out, 2..3])
        .reshape([b, n_out])
        .clamp(0.0, (m3 - 1) as f32);

    // Corner indices
    let x0 = x.clone().floor();
    let y0 = y.clone().floor();
    let z0 = z.clone().floor();
    let x1 = (x0.clone() + 1.0).clamp(0.0, (m1 - 1) as f32);
    let y1 = (y0.clone() + 1.0).clamp(0.0, (m2 - 1) as f32);
    let z1 = (z0.clone() + 1.0).clamp(0.0, (m3 - 1) as f32);

    // Per-axis linear weights from the fractional offset
    let wx1 = x - x0.clone();
    let wy1 = y - y0.clone();
    let wz1 = z - z0.clone();
    let wx0 = wx1.clone().neg().add_scalar(1.0);
    let wy0 = wy1.clone().neg().add_scalar(1.0);
    let wz0 = wz1.clone().neg().add_scalar(1.0);

    // Flat offsets into the volume, strides for axes (m2*m3, m3, 1)
    let stride_1 = (m2 * m3) as i32;
    let stride_2 = m3 as i32;
    let x0_off = x0.int().mul_scalar(stride_1);
    let x1_off = x1.int().mul_scalar(stride_1);
    let y0_off = y0.int().mul_scalar(stride_2);
    let y1_off = y1.int().mul_scalar(stride_2);
    let z0_idx = z0.int();
    let z1_idx = z1.int();

    // Flatten volume once: [B, N, C]
    let flat = volume.reshape([b, n_in, c]);

    let gather_val = |idx: Tensor<B, 2, Int>| -> Tensor<B, 3> {
        let idx = idx.reshape([b, n_out, 1]).repeat(&[1, 1, c]);
        flat.clone().gather(1, idx)
    };

    let idx_00 = x0_off.clone() + y0_off.clone();
    let idx_01 = x0_off + y1_off.clone();
    let idx_10 = x1_off.clone() + y0_off;
    let idx_11 = x1_off + y1_off;

    let v000 = gather_val(idx_00.clone() + z0_idx.clone());
    let v001 = gather_val(idx_00 + z1_idx.clone());
    let v010 = gather_val(idx_01.clone() + z0_idx.clone());
    let v011 = gather_val(idx_01 + z1_idx.clone());
    let v100 = gather_val(idx_10.clone() + z0_idx.clone());
    let v101 = gather_val(idx_10 + z1_idx.clone());
    let v110 = gather_val(idx_11.clone() + z0_idx);
    let v111 = gather_val(idx_11 + z1_idx);

    // Broadcast weights over channels
    let wx0 = wx0.reshape([b, n_out, 1]);
    let wx1 = wx1.reshape([b, n_out, 1]);
    let wy0 = wy0.reshape([b, n_out, 1]);
    let wy1 = wy1.reshape([b, n_out, 1]);
    let wz0 = wz0.reshape([b, n_out, 1]);
    let wz1 = wz1.reshape([b, n_out, 1]);

    // Interpolate along axis 3, then 2, then 1
    let c00 = v000 * wz0.clone() + v001 * wz1.clone();
    let c01 = v010 * wz0.clone() + v011 * wz1.clone();
    let c10 = v100 * wz0.clone() + v101 * wz1.clone();
    let c11 = v110 * wz0 + v111 * wz1;

    let c0 = c00 * wy0.clone() + c01 * wy1.clone();
    let c1 = c10 * wy0 + c11 * wy1;

    let out = c0 * wx0 + c1 * wx1;
    out.reshape([b, o1, o2, o3, c])
}
