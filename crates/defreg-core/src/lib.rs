//! Tensor-level primitives for deformable image registration.
//!
//! Volumes are channel-last: images and labels are `[B, d1, d2, d3]` (or
//! `[B, d1, d2, d3, C]` in channeled form), dense fields are
//! `[B, d1, d2, d3, 3]` with component `k` displacing along axis `k` in voxel
//! units. All operations are functional tensor compositions on a
//! backend-generic `burn` tensor.

pub mod error;
pub mod grid;
pub mod integrate;
pub mod interpolation;
pub mod resize;
pub mod warp;

pub use error::{RegistrationError, Result};
pub use integrate::{IntegrationConfig, VelocityFieldIntegrator};
pub use warp::Warping;
