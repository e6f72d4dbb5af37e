//! Object-detection oracle interface.
//!
//! The detection model itself lives outside this workspace.  A driver wraps
//! it behind [`Classifier`], returning raw candidates in model output order
//! together with a [`LabelTable`] that names each class id.

use std::borrow::Cow;
use std::collections::HashMap;

use homebot_types::HomebotError;

use crate::camera::CameraFrame;

/// One unfiltered candidate box straight out of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: i64,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in (sub-)pixel coordinates.
    pub xyxy: [f32; 4],
}

/// Class-id → human-readable label mapping.
///
/// Lookup is total: an id the model does not name resolves to its decimal
/// representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    names: HashMap<i64, String>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dense table where the n-th name belongs to class id `n`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(id, name)| (id as i64, name.into()))
                .collect(),
        }
    }

    /// Add or replace a single entry (for sparse label maps).
    pub fn insert(&mut self, class_id: i64, name: impl Into<String>) {
        self.names.insert(class_id, name.into());
    }

    pub fn label_for(&self, class_id: i64) -> Cow<'_, str> {
        match self.names.get(&class_id) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(class_id.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A single-frame object detector.
pub trait Classifier: Send {
    /// Run the model on `frame` and return every candidate box, unfiltered,
    /// in model output order.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::HardwareFault`] if inference cannot run at all.
    fn predict(&mut self, frame: &CameraFrame) -> Result<Vec<RawDetection>, HomebotError>;

    /// Names for the class ids this model emits.
    fn labels(&self) -> &LabelTable;
}
