//! Monocular distance estimation.
//!
//! Uses similar triangles under a pinhole-camera model:
//!
//! ```text
//! distance = known_object_width_m * focal_length_px / bbox_width_px
//! ```
//!
//! One assumed object width is used for every class.
//!
//! # Example
//!
//! ```rust
//! use homebot_perception::distance::DistanceEstimator;
//!
//! let estimator = DistanceEstimator::new(0.08, 600.0);
//! let d = estimator.estimate(50).unwrap();
//! assert!((d - 0.96).abs() < 1e-9);
//! assert!(estimator.estimate(0).is_none());
//! ```

/// Pinhole range estimate for a box `bbox_width_px` pixels wide.
///
/// A box with no positive width carries no perspective information and
/// yields `None`.
pub fn estimate(bbox_width_px: i32, known_object_width_m: f64, focal_length_px: f64) -> Option<f64> {
    if bbox_width_px <= 0 {
        return None;
    }
    Some((known_object_width_m * focal_length_px) / f64::from(bbox_width_px))
}

/// [`estimate`] with the camera calibration baked in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimator {
    known_object_width_m: f64,
    focal_length_px: f64,
}

impl DistanceEstimator {
    pub fn new(known_object_width_m: f64, focal_length_px: f64) -> Self {
        Self {
            known_object_width_m,
            focal_length_px,
        }
    }

    pub fn estimate(&self, bbox_width_px: i32) -> Option<f64> {
        estimate(bbox_width_px, self.known_object_width_m, self.focal_length_px)
    }
}
