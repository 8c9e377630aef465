//! Image dissimilarity measures between the fixed image and the warped
//! moving image.

use burn::{
    module::Module,
    nn::conv::{Conv3d, Conv3dConfig},
    prelude::*,
};

const EPSILON: f32 = 1e-5;

/// Local Normalized Cross Correlation dissimilarity.
///
/// Computes the NCC between two volumes over a sliding cubic window and
/// returns `-mean(cc)`, so minimizing it maximizes correlation.
#[derive(Module, Debug)]
pub struct LocalNcc<B: Backend> {
    window_conv: Conv3d<B>,
    kernel_size: usize,
}

impl<B: Backend> LocalNcc<B> {
    /// Create a windowed NCC measure.
    ///
    /// # Arguments
    /// * `kernel_size` - Edge length of the sliding window cube.
    /// * `device` - Device to create the mean filter on.
    pub fn new(kernel_size: usize, device: &B::Device) -> Self {
        let padding = kernel_size / 2;
        let conv_config = Conv3dConfig::new([1, 1], [kernel_size, kernel_size, kernel_size])
            .with_stride([1, 1, 1])
            .with_padding(burn::nn::PaddingConfig3d::Explicit(padding, padding, padding))
            .with_bias(false);

        let mut window_conv = conv_config.init(device);

        // Weights fixed at 1/N so the convolution computes the window mean.
        let n = (kernel_size * kernel_size * kernel_size) as f32;
        let weight = Tensor::ones([1, 1, kernel_size, kernel_size, kernel_size], device) / n;
        window_conv.weight = burn::module::Param::from_tensor(weight);

        Self {
            window_conv,
            kernel_size,
        }
    }

    /// Window edge length.
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn forward(&self, y_true: Tensor<B, 4>, y_pred: Tensor<B, 4>) -> Tensor<B, 1> {
        let [b, d1, d2, d3] = y_true.dims();
        // Conv3d wants a channel-first layout.
        let y_true = y_true.reshape([b, 1, d1, d2, d3]);
        let y_pred = y_pred.reshape([b, 1, d1, d2, d3]);

        let ii = y_true.clone() * y_true.clone();
        let jj = y_pred.clone() * y_pred.clone();
        let ij = y_true.clone() * y_pred.clone();

        let i_mean = self.window_conv.forward(y_true);
        let j_mean = self.window_conv.forward(y_pred);
        let i2_mean = self.window_conv.forward(ii);
        let j2_mean = self.window_conv.forward(jj);
        let ij_mean = self.window_conv.forward(ij);

        let cross = ij_mean - i_mean.clone() * j_mean.clone();
        let i_var = i2_mean - i_mean.powf_scalar(2.0);
        let j_var = j2_mean - j_mean.powf_scalar(2.0);

        let cc = cross.clone() * cross / (i_var * j_var + EPSILON);
        cc.mean().neg()
    }
}

/// Global Normalized Cross Correlation dissimilarity over the whole volume.
pub fn global_ncc<B: Backend>(y_true: Tensor<B, 4>, y_pred: Tensor<B, 4>) -> Tensor<B, 1> {
    let i_mean = y_true.clone().mean().reshape([1, 1, 1, 1]);
    let j_mean = y_pred.clone().mean().reshape([1, 1, 1, 1]);

    let i_hat = y_true.sub(i_mean);
    let j_hat = y_pred.sub(j_mean);

    let num = (i_hat.clone() * j_hat.clone()).mean();
    let den = (i_hat.powf_scalar(2.0).mean() * j_hat.powf_scalar(2.0).mean() + EPSILON).sqrt();

    num.div(den).neg().reshape([1])
}

/// Sum-of-squared-differences dissimilarity (mean squared voxel error).
pub fn ssd<B: Backend>(y_true: Tensor<B, 4>, y_pred: Tensor<B, 4>) -> Tensor<B, 1> {
    (y_true - y_pred).powf_scalar(2.0).mean()
}

/// Resolved image dissimilarity strategy.
#[derive(Debug)]
pub enum ImageDissimilarity<B: Backend> {
    Lncc(LocalNcc<B>),
    Gncc,
    Ssd,
}

impl<B: Backend> ImageDissimilarity<B> {
    pub fn forward(&self, y_true: Tensor<B, 4>, y_pred: Tensor<B, 4>) -> Tensor<B, 1> {
        match self {
            Self::Lncc(lncc) => lncc.forward(y_true, y_pred),
            Self::Gncc => global_ncc(y_true, y_pred),
            Self::Ssd => ssd(y_true, y_pred),
        }
    }
}
