//! In-process simulation drivers for headless runs and tests.
//!
//! None of these touch real hardware.  The board and the speech drivers write
//! into shared journals so a test can hand the driver to the control loop and
//! still inspect what happened afterwards.
//!
//! # Example
//!
//! ```rust
//! use homebot_hal::sim::SimBoard;
//! use homebot_hal::{ActuatorSink, RangeSensor};
//! use homebot_types::Command;
//!
//! let mut board = SimBoard::new().with_distance(Some(0.5));
//! let journal = board.journal();
//!
//! board.execute(&Command::Grab).expect("sim board always acknowledges");
//! assert_eq!(board.read_distance().unwrap(), Some(0.5));
//! assert_eq!(journal.commands(), vec![Command::Grab]);
//! assert_eq!(journal.distance_reads(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use homebot_types::{Command, CommandResult, HomebotError};
use tracing::debug;

use crate::arduino::encode;
use crate::board::{ActuatorSink, ControlBoard, RangeSensor};
use crate::camera::{Camera, CameraFrame};
use crate::classifier::{Classifier, LabelTable, RawDetection};
use crate::speech::{SpeechInput, SpeechOutput};

// ────────────────────────────────────────────────────────────────────────────
// Camera
// ────────────────────────────────────────────────────────────────────────────

/// Shared view of whether a [`SimCamera`] has been released.
#[derive(Debug, Clone, Default)]
pub struct ReleaseFlag(Arc<AtomicBool>);

impl ReleaseFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A simulated camera that returns blank greyscale frames.
///
/// [`SimCamera::dropping_frames`] makes every read come back empty, which is
/// how a real capture device reports a missed frame.
pub struct SimCamera {
    id: String,
    width: u32,
    height: u32,
    drop_frames: bool,
    released: ReleaseFlag,
}

impl SimCamera {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: 4,
            height: 4,
            drop_frames: false,
            released: ReleaseFlag::default(),
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn dropping_frames(mut self) -> Self {
        self.drop_frames = true;
        self
    }

    pub fn is_released(&self) -> bool {
        self.released.is_set()
    }

    /// Handle that stays readable after the camera is boxed away.
    pub fn release_flag(&self) -> ReleaseFlag {
        self.released.clone()
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_frame(&mut self) -> Result<Option<CameraFrame>, HomebotError> {
        if self.released.is_set() {
            return Err(HomebotError::hardware(&self.id, "camera already released"));
        }
        if self.drop_frames {
            return Ok(None);
        }
        Ok(Some(CameraFrame {
            width: self.width,
            height: self.height,
            data: vec![0u8; (self.width * self.height) as usize],
        }))
    }

    fn release(&mut self) -> Result<(), HomebotError> {
        self.released.set();
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Classifier
// ────────────────────────────────────────────────────────────────────────────

/// A classifier that replays pre-recorded candidate lists, one per frame.
///
/// Once the script runs out every further frame yields no candidates.
pub struct ScriptedClassifier {
    labels: LabelTable,
    script: VecDeque<Vec<RawDetection>>,
}

impl ScriptedClassifier {
    pub fn new(labels: LabelTable) -> Self {
        Self {
            labels,
            script: VecDeque::new(),
        }
    }

    /// Queue the candidates returned for the next unscripted frame.
    pub fn then(mut self, candidates: Vec<RawDetection>) -> Self {
        self.script.push_back(candidates);
        self
    }
}

impl Classifier for ScriptedClassifier {
    fn predict(&mut self, _frame: &CameraFrame) -> Result<Vec<RawDetection>, HomebotError> {
        Ok(self.script.pop_front().unwrap_or_default())
    }

    fn labels(&self) -> &LabelTable {
        &self.labels
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Control board
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct BoardLog {
    commands: Vec<Command>,
    distance_reads: usize,
    closed: bool,
}

/// Shared view of everything a [`SimBoard`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct BoardJournal(Arc<Mutex<BoardLog>>);

impl BoardJournal {
    pub fn commands(&self) -> Vec<Command> {
        self.0.lock().map(|log| log.commands.clone()).unwrap_or_default()
    }

    pub fn distance_reads(&self) -> usize {
        self.0.lock().map(|log| log.distance_reads).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.0.lock().map(|log| log.closed).unwrap_or_default()
    }

    fn record(&self, f: impl FnOnce(&mut BoardLog)) {
        if let Ok(mut log) = self.0.lock() {
            f(&mut log);
        }
    }
}

/// A simulated control board that acknowledges every command with
/// `OK <REQUEST>` and reports a fixed range-sensor reading.
pub struct SimBoard {
    id: String,
    distance_m: Option<f64>,
    journal: BoardJournal,
}

impl SimBoard {
    pub fn new() -> Self {
        Self {
            id: "sim-board".to_string(),
            distance_m: None,
            journal: BoardJournal::default(),
        }
    }

    /// Reading returned by every [`RangeSensor::read_distance`] call.
    pub fn with_distance(mut self, distance_m: Option<f64>) -> Self {
        self.distance_m = distance_m;
        self
    }

    pub fn journal(&self) -> BoardJournal {
        self.journal.clone()
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorSink for SimBoard {
    fn execute(&mut self, command: &Command) -> Result<CommandResult, HomebotError> {
        let request = encode(command)
            .ok_or_else(|| HomebotError::UnsupportedCommand(command.name().to_string()))?;
        debug!(board = %self.id, %request, "sim board executing");
        self.journal.record(|log| log.commands.push(command.clone()));
        Ok(CommandResult {
            ok: true,
            response: format!("OK {request}"),
        })
    }
}

impl RangeSensor for SimBoard {
    fn read_distance(&mut self) -> Result<Option<f64>, HomebotError> {
        self.journal.record(|log| log.distance_reads += 1);
        Ok(self.distance_m)
    }
}

impl ControlBoard for SimBoard {
    fn id(&self) -> &str {
        &self.id
    }

    fn close(&mut self) -> Result<(), HomebotError> {
        self.journal.record(|log| log.closed = true);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Speech
// ────────────────────────────────────────────────────────────────────────────

/// Speech input that replays a fixed list of listen results.
///
/// `None` entries simulate a listen timeout; once the script is exhausted
/// every call times out.
pub struct ScriptedListener {
    script: VecDeque<Option<String>>,
}

impl ScriptedListener {
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            script: script.into_iter().map(|s| s.map(Into::into)).collect(),
        }
    }
}

impl SpeechInput for ScriptedListener {
    fn listen(&mut self, _timeout: Duration) -> Result<Option<String>, HomebotError> {
        Ok(self.script.pop_front().flatten())
    }
}

/// Shared list of every utterance a [`RecordingSpeaker`] rendered.
#[derive(Debug, Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

/// Speech output that records instead of synthesising.
#[derive(Default)]
pub struct RecordingSpeaker {
    transcript: Transcript,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

impl SpeechOutput for RecordingSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), HomebotError> {
        if let Ok(mut lines) = self.transcript.0.lock() {
            lines.push(text.to_string());
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use homebot_types::Direction;

    #[test]
    fn sim_camera_returns_blank_frame() {
        let mut cam = SimCamera::new("front").with_resolution(8, 2);
        let frame = cam.read_frame().unwrap().unwrap();
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.data.len(), 16);
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn sim_camera_can_drop_frames() {
        let mut cam = SimCamera::new("front").dropping_frames();
        assert!(cam.read_frame().unwrap().is_none());
    }

    #[test]
    fn released_camera_faults() {
        let mut cam = SimCamera::new("front");
        let flag = cam.release_flag();
        assert!(!flag.is_set());
        cam.release().unwrap();
        assert!(cam.is_released());
        assert!(flag.is_set());
        assert!(cam.read_frame().is_err());
    }

    #[test]
    fn scripted_classifier_replays_then_goes_quiet() {
        let cup = RawDetection {
            class_id: 41,
            confidence: 0.9,
            xyxy: [10.0, 10.0, 60.0, 110.0],
        };
        let mut clf = ScriptedClassifier::new(LabelTable::new()).then(vec![cup.clone()]);
        let frame = SimCamera::new("c").read_frame().unwrap().unwrap();
        assert_eq!(clf.predict(&frame).unwrap(), vec![cup]);
        assert!(clf.predict(&frame).unwrap().is_empty());
    }

    #[test]
    fn sim_board_acknowledges_with_wire_request() {
        let mut board = SimBoard::new();
        let result = board
            .execute(&Command::Rotate {
                direction: Direction::Left,
                degrees: 45,
            })
            .unwrap();
        assert!(result.ok);
        assert_eq!(result.response, "OK ROTATE:left:45");
    }

    #[test]
    fn sim_board_rejects_unrecognized_without_recording() {
        let mut board = SimBoard::new();
        let journal = board.journal();
        assert!(board.execute(&Command::Unrecognized).is_err());
        assert!(journal.commands().is_empty());
    }

    #[test]
    fn sim_board_journal_tracks_close() {
        let mut board = SimBoard::new();
        let journal = board.journal();
        board.close().unwrap();
        assert!(journal.is_closed());
    }

    #[test]
    fn scripted_listener_times_out_when_exhausted() {
        let mut ear = ScriptedListener::new([Some("olá"), None]);
        let t = Duration::from_secs(5);
        assert_eq!(ear.listen(t).unwrap().as_deref(), Some("olá"));
        assert!(ear.listen(t).unwrap().is_none());
        assert!(ear.listen(t).unwrap().is_none());
    }

    #[test]
    fn recording_speaker_keeps_order() {
        let mut voice = RecordingSpeaker::new();
        let transcript = voice.transcript();
        voice.speak("um").unwrap();
        voice.speak("dois").unwrap();
        assert_eq!(transcript.lines(), vec!["um", "dois"]);
    }
}
