//! Pluggable loss terms: image dissimilarity, label dissimilarity, and
//! deformation regularization, plus label-overlap diagnostics.

pub mod deform;
pub mod image;
pub mod label;

pub use deform::DeformationEnergy;
pub use image::{ImageDissimilarity, LocalNcc};
pub use label::LabelDissimilarity;
