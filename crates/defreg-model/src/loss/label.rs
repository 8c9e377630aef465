//! Label dissimilarity measures and label-overlap diagnostics.
//!
//! Labels are soft volumes in `[0, 1]`; binary variants threshold at 0.5
//! before computing overlap.

use burn::prelude::*;

const EPSILON: f32 = 1e-6;

/// Threshold used to binarize soft labels.
const FOREGROUND_THRESHOLD: f32 = 0.5;

fn flatten_spatial<B: Backend>(y: Tensor<B, 4>) -> Tensor<B, 2> {
    let [b, d1, d2, d3] = y.dims();
    y.reshape([b, d1 * d2 * d3])
}

fn binarize<B: Backend>(y: Tensor<B, 2>) -> Tensor<B, 2> {
    y.greater_equal_elem(FOREGROUND_THRESHOLD).float()
}

/// Per-batch soft Dice overlap, averaged over the batch.
///
/// With `binary` set, both volumes are thresholded at 0.5 first.
pub fn dice_score<B: Backend>(
    y_true: Tensor<B, 4>,
    y_pred: Tensor<B, 4>,
    binary: bool,
) -> Tensor<B, 1> {
    let mut t = flatten_spatial(y_true);
    let mut p = flatten_spatial(y_pred);
    if binary {
        t = binarize(t);
        p = binarize(p);
    }

    let intersection = (t.clone() * p.clone()).sum_dim(1);
    let sizes = t.sum_dim(1) + p.sum_dim(1);

    let dice = (intersection.mul_scalar(2.0) + EPSILON) / (sizes + EPSILON);
    dice.mean()
}

/// Per-batch soft Jaccard overlap, averaged over the batch.
pub fn jaccard_index<B: Backend>(y_true: Tensor<B, 4>, y_pred: Tensor<B, 4>) -> Tensor<B, 1> {
    let t = flatten_spatial(y_true);
    let p = flatten_spatial(y_pred);

    let intersection = (t.clone() * p.clone()).sum_dim(1);
    let union = t.sum_dim(1) + p.sum_dim(1) - intersection.clone();

    let jaccard = (intersection + EPSILON) / (union + EPSILON);
    jaccard.mean()
}

/// Binary cross entropy between soft labels, with an epsilon guard on the
/// logarithms.
pub fn cross_entropy<B: Backend>(y_true: Tensor<B, 4>, y_pred: Tensor<B, 4>) -> Tensor<B, 1> {
    let pos = y_true.clone() * (y_pred.clone() + EPSILON).log();
    let neg = (y_true.neg().add_scalar(1.0)) * (y_pred.neg().add_scalar(1.0 + EPSILON)).log();
    (pos + neg).mean().neg()
}

/// Distance between the intensity-weighted label centroids of truth and
/// prediction, a proxy for target registration error.
///
/// Centroids are weighted averages of the reference grid coordinates by
/// label intensity; the Euclidean distance is averaged over the batch.
///
/// # Arguments
/// * `y_true` - Fixed label `[B, d1, d2, d3]`
/// * `y_pred` - Warped moving label `[B, d1, d2, d3]`
/// * `grid` - Reference grid `[d1, d2, d3, 3]`
pub fn centroid_distance<B: Backend>(
    y_true: Tensor<B, 4>,
    y_pred: Tensor<B, 4>,
    grid: Tensor<B, 4>,
) -> Tensor<B, 1> {
    let c_true = centroid(y_true, grid.clone());
    let c_pred = centroid(y_pred, grid);

    let sq: Tensor<B, 2> = (c_true - c_pred).powf_scalar(2.0).sum_dim(1);
    sq.sqrt().mean()
}

/// Intensity-weighted centroid of a label volume, `[B, 3]`.
fn centroid<B: Backend>(y: Tensor<B, 4>, grid: Tensor<B, 4>) -> Tensor<B, 2> {
    let [b, d1, d2, d3] = y.dims();
    let n = d1 * d2 * d3;

    let weights = y.reshape([b, n, 1]);
    let coords = grid.reshape([1, n, 3]);

    let weighted: Tensor<B, 2> = (weights.clone() * coords).sum_dim(1).reshape([b, 3]);
    let mass: Tensor<B, 2> = weights.sum_dim(1).reshape([b, 1]);

    weighted / (mass + EPSILON)
}

/// Fraction of voxels at or above the foreground threshold, averaged over
/// the batch.
pub fn foreground_proportion<B: Backend>(y: Tensor<B, 4>) -> Tensor<B, 1> {
    binarize(flatten_spatial(y)).mean()
}

/// Resolved label dissimilarity strategy. The configured weight is folded
/// into the returned loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDissimilarity {
    Dice,
    Jaccard,
    CrossEntropy,
}

impl LabelDissimilarity {
    pub fn forward<B: Backend>(
        &self,
        y_true: Tensor<B, 4>,
        y_pred: Tensor<B, 4>,
    ) -> Tensor<B, 1> {
        match self {
            Self::Dice => dice_score(y_true, y_pred, false).neg().add_scalar(1.0),
            Self::Jaccard => jaccard_index(y_true, y_pred).neg().add_scalar(1.0),
            Self::CrossEntropy => cross_entropy(y_true, y_pred),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_dice_identical_is_one() {
        let device = Default::default();
        let label = Tensor::<TestBackend, 4>::ones([1, 4, 4, 4], &device);
        let dice: f32 = dice_score(label.clone(), label, true).into_scalar();
        assert_eq!(dice, 1.0);
    }

    #[test]
    fn test_dice_disjoint_is_zero() {
        let device = Default::default();
        let mut left = vec![0.0_f32; 8];
        let mut right = vec![0.0_f32; 8];
        left[0] = 1.0;
        right[7] = 1.0;
        let y_true =
            Tensor::<TestBackend, 4>::from_floats(TensorData::new(left, [1, 2, 2, 2]), &device);
        let y_pred =
            Tensor::<TestBackend, 4>::from_floats(TensorData::new(right, [1, 2, 2, 2]), &device);

        let dice: f32 = dice_score(y_true, y_pred, true).into_scalar();
        assert!(dice < 1e-5);
    }

    #[test]
    fn test_foreground_proportion_extremes() {
        let device = Default::default();
        let zeros = Tensor::<TestBackend, 4>::zeros([2, 4, 4, 4], &device);
        let ones = Tensor::<TestBackend, 4>::ones([2, 4, 4, 4], &device);

        let p0: f32 = foreground_proportion(zeros).into_scalar();
        let p1: f32 = foreground_proportion(ones).into_scalar();
        assert_eq!(p0, 0.0);
        assert_eq!(p1, 1.0);
    }

    #[test]
    fn test_centroid_distance_identical_is_zero() {
        let device = Default::default();
        let mut data = vec![0.0_f32; 64];
        data[21] = 1.0;
        let label =
            Tensor::<TestBackend, 4>::from_floats(TensorData::new(data, [1, 4, 4, 4]), &device);
        let grid = defreg_core::grid::reference_grid::<TestBackend>([4, 4, 4], &device);

        let tre: f32 = centroid_distance(label.clone(), label, grid).into_scalar();
        assert!(tre < 1e-5);
    }

    #[test]
    fn test_centroid_distance_unit_shift() {
        let device = Default::default();
        let mut t = vec![0.0_f32; 64];
        let mut p = vec![0.0_f32; 64];
        // Single-voxel labels at (1,1,1) and (1,1,2): centroids one apart.
        t[21] = 1.0;
        p[22] = 1.0;
        let y_true =
            Tensor::<TestBackend, 4>::from_floats(TensorData::new(t, [1, 4, 4, 4]), &device);
        let y_pred =
            Tensor::<TestBackend, 4>::from_floats(TensorData::new(p, [1, 4, 4, 4]), &device);
        let grid = defreg_core::grid::reference_grid::<TestBackend>([4, 4, 4], &device);

        let tre: f32 = centroid_distance(y_true, y_pred, grid).into_scalar();
        assert!((tre - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_label_loss_dice_identical_is_zero() {
        let device = Default::default();
        let label = Tensor::<TestBackend, 4>::ones([1, 4, 4, 4], &device);
        let loss: f32 = LabelDissimilarity::Dice
            .forward(label.clone(), label)
            .into_scalar();
        assert!(loss.abs() < 1e-5);
    }
}
