//! [`PerceptionPipeline`] – camera frame → labelled, distance-annotated
//! detections.
//!
//! Per cycle the pipeline:
//!
//! 1. grabs one frame from the [`Camera`]; a missed frame yields no detections,
//! 2. runs the [`Classifier`] on it,
//! 3. walks the candidates in model output order, dropping anything below the
//!    confidence threshold (a candidate exactly *at* the threshold is kept),
//! 4. names each survivor through the [`LabelTable`], truncates its box to
//!    integer pixels and attaches a [`DistanceEstimator`] range.
//!
//! Output order is model order; nothing is re-sorted.

use homebot_hal::{Camera, CameraFrame, Classifier, LabelTable, RawDetection};
use homebot_types::{BoundingBox, Detection, HomebotError};
use tracing::{debug, info, instrument};

use crate::distance::DistanceEstimator;

/// Calibration and filtering parameters for [`PerceptionPipeline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptionConfig {
    /// Candidates with confidence strictly below this are discarded.
    pub confidence_threshold: f32,
    /// Camera focal length in pixels.
    pub focal_length_px: f64,
    /// Assumed real-world width of any detected object, in metres.
    pub known_object_width_m: f64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            focal_length_px: 600.0,
            known_object_width_m: 0.08,
        }
    }
}

/// Owns the camera and the classifier and produces one detection list per
/// call to [`detect`][Self::detect].
pub struct PerceptionPipeline {
    camera: Box<dyn Camera>,
    classifier: Box<dyn Classifier>,
    config: PerceptionConfig,
    estimator: DistanceEstimator,
}

impl PerceptionPipeline {
    pub fn new(
        camera: Box<dyn Camera>,
        classifier: Box<dyn Classifier>,
        config: PerceptionConfig,
    ) -> Self {
        let estimator = DistanceEstimator::new(config.known_object_width_m, config.focal_length_px);
        Self {
            camera,
            classifier,
            config,
            estimator,
        }
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Capture one frame and return its detections.
    ///
    /// # Errors
    ///
    /// Propagates [`HomebotError::HardwareFault`] from the camera or the
    /// classifier.  A frame that simply could not be grabbed is *not* an
    /// error and yields an empty list.
    #[instrument(level = "debug", skip(self), fields(camera = %self.camera.id()))]
    pub fn detect(&mut self) -> Result<Vec<Detection>, HomebotError> {
        let Some(frame) = self.camera.read_frame()? else {
            debug!("no frame available; reporting nothing seen");
            return Ok(Vec::new());
        };
        self.detect_in(&frame)
    }

    /// Run classification and filtering on an already-captured frame.
    ///
    /// # Errors
    ///
    /// Propagates classifier faults.
    pub fn detect_in(&mut self, frame: &CameraFrame) -> Result<Vec<Detection>, HomebotError> {
        let raw = self.classifier.predict(frame)?;
        let candidates = raw.len();
        let detections = annotate(&raw, self.classifier.labels(), &self.config, &self.estimator);
        debug!(candidates, kept = detections.len(), "frame classified");
        Ok(detections)
    }

    /// Release the camera.  Called once on shutdown.
    ///
    /// # Errors
    ///
    /// Propagates the camera driver's release error.
    pub fn release(&mut self) -> Result<(), HomebotError> {
        self.camera.release()?;
        info!(camera = %self.camera.id(), "camera released");
        Ok(())
    }
}

fn annotate(
    raw: &[RawDetection],
    labels: &LabelTable,
    config: &PerceptionConfig,
    estimator: &DistanceEstimator,
) -> Vec<Detection> {
    raw.iter()
        .filter(|c| c.confidence >= config.confidence_threshold)
        .map(|c| {
            let [x1, y1, x2, y2] = c.xyxy;
            let bbox = BoundingBox::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32);
            Detection {
                label: labels.label_for(c.class_id).into_owned(),
                confidence: c.confidence,
                bbox,
                distance_m: estimator.estimate(bbox.width_px()),
            }
        })
        .collect()
}
