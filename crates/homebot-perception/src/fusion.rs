//! State Fusion.
//!
//! Combines the latest detections with a single distance value into an
//! immutable [`RobotState`].  The distance comes from exactly one source,
//! chosen by [`DistanceMode`]:
//!
//! - **Sensor** – the range sensor is queried once per call, whether or not
//!   anything was detected.  No reading fuses to "no distance".
//! - **Vision** – the first detection's estimate (model order), or "no
//!   distance" when nothing was detected.
//!
//! Sources are never mixed or averaged, and no history is kept.
//!
//! # Example
//!
//! ```rust
//! use homebot_perception::fusion::StateFusion;
//! use homebot_types::DistanceMode;
//!
//! let fusion = StateFusion::new(DistanceMode::Sensor);
//! let state = fusion.fuse(Vec::new(), || Ok(Some(0.42))).unwrap();
//! assert_eq!(state.distance_m, Some(0.42));
//! ```

use homebot_types::{Detection, DistanceMode, HomebotError, RobotState};
use tracing::debug;

/// Fuse `detections` with a distance chosen according to `mode`.
///
/// `read_sensor` is invoked exactly once in [`DistanceMode::Sensor`] and
/// never in [`DistanceMode::Vision`].  A non-finite sensor value counts as no
/// reading.
///
/// # Errors
///
/// Propagates a transport failure from `read_sensor`.
pub fn fuse<F>(
    detections: Vec<Detection>,
    mode: DistanceMode,
    read_sensor: F,
) -> Result<RobotState, HomebotError>
where
    F: FnOnce() -> Result<Option<f64>, HomebotError>,
{
    let distance_m = match mode {
        DistanceMode::Sensor => read_sensor()?.filter(|d| d.is_finite()),
        DistanceMode::Vision => detections.first().and_then(|d| d.distance_m),
    };
    debug!(
        ?mode,
        detections = detections.len(),
        distance_m = ?distance_m,
        "state fused"
    );
    Ok(RobotState::new(detections, distance_m))
}

/// Stateless combinator holding the configured [`DistanceMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateFusion {
    mode: DistanceMode,
}

impl StateFusion {
    pub fn new(mode: DistanceMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DistanceMode {
        self.mode
    }

    /// See [`fuse`].
    ///
    /// # Errors
    ///
    /// Propagates a transport failure from `read_sensor`.
    pub fn fuse<F>(&self, detections: Vec<Detection>, read_sensor: F) -> Result<RobotState, HomebotError>
    where
        F: FnOnce() -> Result<Option<f64>, HomebotError>,
    {
        fuse(detections, self.mode, read_sensor)
    }
}
