//! Deformable registration model: forward pipeline and training objective.
//!
//! Given a moving and a fixed 3D volume (and optional labels), the network
//! regresses a dense 3-component field over the fixed grid through a
//! pluggable backbone, optionally integrates it as a stationary velocity
//! field, and warps the moving volume onto the fixed frame. The objective
//! assembler turns the outputs into a weighted composite loss plus
//! diagnostic overlap metrics.
//!
//! ```text
//! inputs ──► resize ──► backbone ──► raw field ──► (integrate) ──► ddf
//!                                                                   │
//!                       warp(moving image), warp(moving label) ◄────┘
//!                                     │
//!                                     ▼
//!                         objective assembly (losses + metrics)
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use burn_ndarray::NdArray;
//! use defreg_model::{
//!     assemble, Backbone, LossConfig, RegistrationInputs, RegistrationNetworkConfig,
//! };
//!
//! type B = NdArray<f32>;
//! let device = Default::default();
//!
//! let network = RegistrationNetworkConfig {
//!     method: "ddf".into(),
//!     moving_image_size: [32, 32, 32],
//!     fixed_image_size: [32, 32, 32],
//!     integration_steps: 7,
//! }
//! .init::<B, _>(my_backbone, &device)?;
//!
//! let output = network.forward(inputs)?;
//! let objective = assemble(
//!     output.ddf,
//!     output.grid_fixed,
//!     fixed_image,
//!     None,
//!     output.pred_fixed_image,
//!     None,
//!     &loss_config.resolve(&device)?,
//! )?;
//! ```

pub mod assemble;
pub mod backbone;
pub mod config;
pub mod loss;
pub mod network;

pub use assemble::{assemble, TrainingObjective};
pub use backbone::{run_backbone, Backbone};
pub use config::{LossConfig, ResolvedLoss};
pub use network::{
    RegistrationInputs, RegistrationMethod, RegistrationNetwork, RegistrationNetworkConfig,
    RegistrationOutput,
};
