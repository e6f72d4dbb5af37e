use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer pixel rectangle `(x1, y1)`–`(x2, y2)` in camera-frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Horizontal extent in pixels, never negative.
    pub fn width_px(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }
}

/// One classified, localized object instance from a single camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// Pinhole-model distance estimate in metres, if the box had usable width.
    pub distance_m: Option<f64>,
}

/// Immutable snapshot of what the robot currently perceives.
///
/// Replaced wholesale once per turn; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    /// Detections in classifier output order.
    pub detections: Vec<Detection>,
    /// Fused distance in metres, taken from exactly one source.
    pub distance_m: Option<f64>,
}

impl RobotState {
    pub fn new(detections: Vec<Detection>, distance_m: Option<f64>) -> Self {
        Self {
            detections,
            distance_m,
        }
    }

    /// A state with nothing perceived, used before the first refresh.
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Where the fused distance comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    /// Ask the range sensor on the control board every cycle.
    Sensor,
    /// Use the first detection's pinhole estimate.
    #[default]
    Vision,
}

impl FromStr for DistanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sensor" => Ok(DistanceMode::Sensor),
            "vision" => Ok(DistanceMode::Vision),
            other => Err(format!("unknown distance mode '{other}' (expected sensor or vision)")),
        }
    }
}

/// Conversation language for trigger words, prompts and spoken feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Portuguese,
    English,
}

impl Language {
    /// Resolve a BCP-47 style tag such as `"pt-BR"` or `"en-US"`.
    ///
    /// Anything that is not recognisably English falls back to Portuguese.
    pub fn from_locale(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        if tag == "en" || tag.starts_with("en-") || tag.starts_with("en_") {
            Language::English
        } else {
            Language::Portuguese
        }
    }
}

/// Direction argument carried by locomotion commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// The fixed set of discrete actions the robot can be asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum Command {
    Lift,
    MoveArm { angle_deg: u16 },
    Grab,
    Release,
    Walk { direction: Direction, steps: u32 },
    Rotate { direction: Direction, degrees: u32 },
    /// The utterance matched no trigger; nothing is sent to the hardware.
    Unrecognized,
}

impl Command {
    /// Short stable name used in logs and feedback text.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Lift => "lift",
            Command::MoveArm { .. } => "arm",
            Command::Grab => "grab",
            Command::Release => "release",
            Command::Walk { .. } => "walk",
            Command::Rotate { .. } => "rotate",
            Command::Unrecognized => "unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Command::Unrecognized)
    }
}

/// Reply from the actuator sink for one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub ok: bool,
    pub response: String,
}

/// Errors that end the current run of the control loop.
#[derive(Error, Debug)]
pub enum HomebotError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Chat request failed: {0}")]
    ChatFailed(String),

    #[error("Speech backend error: {0}")]
    Speech(String),

    #[error("Command cannot be dispatched: {0}")]
    UnsupportedCommand(String),
}

impl HomebotError {
    pub fn hardware(component: impl Into<String>, details: impl Into<String>) -> Self {
        HomebotError::HardwareFault {
            component: component.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_width_clamps_inverted_boxes_to_zero() {
        assert_eq!(BoundingBox::new(10, 10, 60, 110).width_px(), 50);
        assert_eq!(BoundingBox::new(60, 10, 10, 110).width_px(), 0);
        assert_eq!(BoundingBox::new(5, 0, 5, 1).width_px(), 0);
    }

    #[test]
    fn distance_mode_deserializes_lowercase() {
        let mode: DistanceMode = serde_json::from_str("\"sensor\"").unwrap();
        assert_eq!(mode, DistanceMode::Sensor);
        let mode: DistanceMode = serde_json::from_str("\"vision\"").unwrap();
        assert_eq!(mode, DistanceMode::Vision);
    }

    #[test]
    fn distance_mode_from_str_is_case_insensitive() {
        assert_eq!("Sensor".parse::<DistanceMode>(), Ok(DistanceMode::Sensor));
        assert_eq!(" vision ".parse::<DistanceMode>(), Ok(DistanceMode::Vision));
        assert!("lidar".parse::<DistanceMode>().is_err());
    }

    #[test]
    fn language_from_locale() {
        assert_eq!(Language::from_locale("pt-BR"), Language::Portuguese);
        assert_eq!(Language::from_locale("en-US"), Language::English);
        assert_eq!(Language::from_locale("EN"), Language::English);
        assert_eq!(Language::from_locale("es-ES"), Language::Portuguese);
    }

    #[test]
    fn command_serializes_with_action_tag() {
        let cmd = Command::Walk {
            direction: Direction::Forward,
            steps: 3,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"action\":\"Walk\""));
        assert!(json.contains("\"forward\""));
    }

    #[test]
    fn unrecognized_is_not_recognized() {
        assert!(!Command::Unrecognized.is_recognized());
        assert!(Command::Grab.is_recognized());
        assert_eq!(Command::MoveArm { angle_deg: 90 }.name(), "arm");
    }

    #[test]
    fn empty_state_has_nothing() {
        let state = RobotState::empty();
        assert!(state.detections.is_empty());
        assert!(state.distance_m.is_none());
    }

    #[test]
    fn homebot_error_display() {
        let err = HomebotError::hardware("arduino", "port closed");
        assert!(err.to_string().contains("arduino"));
        assert!(err.to_string().contains("port closed"));
    }
}
