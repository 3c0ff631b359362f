//! model — forward image-formation models.

pub mod forward_model;

pub use forward_model::{DecimationModel, ForwardModel};
