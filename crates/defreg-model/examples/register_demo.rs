//! End-to-end demo: register a random moving/fixed pair with a minimal
//! convolutional backbone and print the assembled objective.

use anyhow::Result;
use burn::{
    nn::conv::{Conv3d, Conv3dConfig},
    nn::PaddingConfig3d,
    prelude::*,
};
use burn_ndarray::NdArray;
use defreg_model::{
    assemble, Backbone, LossConfig, RegistrationInputs, RegistrationNetworkConfig,
};

type B = NdArray<f32>;

/// A single 3x3x3 convolution regressing the field from the image pair.
#[derive(Module, Debug)]
struct TinyConvBackbone<Bk: Backend> {
    conv: Conv3d<Bk>,
}

impl<Bk: Backend> TinyConvBackbone<Bk> {
    fn new(device: &Bk::Device) -> Self {
        let conv = Conv3dConfig::new([2, 3], [3, 3, 3])
            .with_padding(PaddingConfig3d::Explicit(1, 1, 1))
            .init(device);
        Self { conv }
    }
}

impl<Bk: Backend> Backbone<Bk> for TinyConvBackbone<Bk> {
    fn forward(&self, input: Tensor<Bk, 5>) -> Tensor<Bk, 5> {
        // Conv3d is channel-first; the pipeline is channel-last.
        let x = input.permute([0, 4, 1, 2, 3]);
        let x = self.conv.forward(x);
        x.permute([0, 2, 3, 4, 1])
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let device = Default::default();
    let size = [16, 16, 16];

    let network = RegistrationNetworkConfig {
        method: "dvf".into(),
        moving_image_size: size,
        fixed_image_size: size,
        integration_steps: 7,
    }
    .init::<B, _>(TinyConvBackbone::new(&device), &device)?;

    let loss_config: LossConfig = serde_json::from_str(
        r#"{
            "regularization": { "energy_type": "gradient-l2", "weight": 0.5 },
            "dissimilarity": {
                "image": { "name": "lncc", "weight": 1.0, "kernel_size": 9 },
                "label": { "name": "dice", "weight": 1.0 }
            }
        }"#,
    )?;
    let loss = loss_config.resolve::<B>(&device)?;

    let moving = Tensor::random(
        [1, size[0], size[1], size[2]],
        burn::tensor::Distribution::Normal(0.5, 0.1),
        &device,
    );
    let fixed = Tensor::random(
        [1, size[0], size[1], size[2]],
        burn::tensor::Distribution::Normal(0.5, 0.1),
        &device,
    );

    let output = network.forward(RegistrationInputs {
        moving_image: moving,
        fixed_image: fixed.clone(),
        indices: Tensor::zeros([1, 1], &device),
        moving_label: None,
        fixed_label: None,
    })?;

    println!("ddf shape: {:?}", output.ddf.dims());
    println!(
        "dvf present: {}",
        if output.dvf.is_some() { "yes" } else { "no" }
    );

    let objective = assemble(
        output.ddf,
        output.grid_fixed,
        fixed,
        None,
        output.pred_fixed_image,
        None,
        &loss,
    )?;

    for (name, value) in &objective.scalars {
        let value: f32 = value.clone().into_scalar();
        println!("{name}: {value:.6}");
    }
    let total: f32 = objective.total.into_scalar();
    println!("total: {total:.6}");

    Ok(())
}
