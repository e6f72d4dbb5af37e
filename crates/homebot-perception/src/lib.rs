//! `homebot-perception` – turns camera frames into a fused robot state.
//!
//! # Modules
//!
//! - [`distance`] – [`DistanceEstimator`][distance::DistanceEstimator]:
//!   pinhole-camera range estimate from a bounding-box width.
//! - [`pipeline`] – [`PerceptionPipeline`][pipeline::PerceptionPipeline]:
//!   one frame in, confidence-filtered and labelled
//!   [`Detection`][homebot_types::Detection]s out, in classifier order.
//! - [`fusion`] – [`StateFusion`][fusion::StateFusion]: picks exactly one
//!   distance source per cycle and freezes the result into a
//!   [`RobotState`][homebot_types::RobotState].

pub mod distance;
pub mod fusion;
pub mod pipeline;

pub use distance::DistanceEstimator;
pub use fusion::StateFusion;
pub use pipeline::{PerceptionConfig, PerceptionPipeline};
