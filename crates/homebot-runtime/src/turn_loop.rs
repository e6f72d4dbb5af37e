//! [`TurnLoop`] – the perceive / listen / talk / act orchestrator.
//!
//! Each turn:
//!
//! 1. **Refresh perception** – [`PerceptionPipeline::detect`] then
//!    [`StateFusion::fuse`]; the result replaces the held [`RobotState`].
//! 2. **Await speech** – block on [`SpeechInput::listen`] for at most
//!    [`TurnLoopConfig::listen_timeout`].  No speech, or a blank transcript,
//!    ends the turn with [`TurnOutcome::Silent`] and nothing else happens.
//! 3. **Dialogue** – persona, perception context and the utterance go to the
//!    [`ChatOracle`].
//! 4. **Act** – the same utterance goes through the [`CommandInterpreter`];
//!    a recognised command is executed on the [`ControlBoard`].
//! 5. **Speak** – chat reply and action feedback are rendered as one
//!    utterance.
//!
//! Any collaborator failure aborts the turn, puts the loop back in
//! [`Phase::Idle`] and is returned to the caller.  Nothing is retried here.  [`TurnLoop::run_until`] repeats turns until the
//! shutdown flag is raised; the flag is only checked between turns.
//! [`TurnLoop::close`] releases the camera and the board afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use homebot_hal::{ActuatorSink, ControlBoard, RangeSensor, SpeechInput, SpeechOutput};
use homebot_perception::{PerceptionPipeline, StateFusion};
use homebot_types::{Command, DistanceMode, HomebotError, Language, RobotState};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::dialogue::DialogueContextBuilder;
use crate::interpreter::CommandInterpreter;
use crate::llm_driver::ChatOracle;
use crate::phrasebook::Phrasebook;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`TurnLoop`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnLoopConfig {
    /// Which source [`StateFusion`] takes the distance from.
    pub distance_mode: DistanceMode,
    /// Language of the trigger vocabulary, persona and spoken feedback.
    pub language: Language,
    /// Upper bound on one [`SpeechInput::listen`] call.
    pub listen_timeout: Duration,
}

impl Default for TurnLoopConfig {
    fn default() -> Self {
        Self {
            distance_mode: DistanceMode::default(),
            language: Language::default(),
            listen_timeout: Duration::from_secs(5),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Turn outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Where the loop currently is inside a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    RefreshingPerception,
    AwaitingSpeech,
    Dialoguing,
    ActingAndSpeaking,
    Closing,
}

/// What one call to [`TurnLoop::run_once`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Nothing was heard; no chat request, no actuation, nothing spoken.
    Silent,
    /// A full dialogue turn.
    Responded {
        utterance: String,
        reply: String,
        command: Command,
        feedback: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// TurnLoop
// ─────────────────────────────────────────────────────────────────────────────

/// Owns every collaborator and the current [`RobotState`].
pub struct TurnLoop {
    config: TurnLoopConfig,
    perception: PerceptionPipeline,
    fusion: StateFusion,
    board: Box<dyn ControlBoard>,
    ear: Box<dyn SpeechInput>,
    voice: Box<dyn SpeechOutput>,
    chat: Box<dyn ChatOracle>,
    dialogue: DialogueContextBuilder,
    interpreter: CommandInterpreter,
    phrasebook: Phrasebook,
    state: RobotState,
    phase: Phase,
}

impl TurnLoop {
    pub fn new(
        config: TurnLoopConfig,
        perception: PerceptionPipeline,
        board: Box<dyn ControlBoard>,
        ear: Box<dyn SpeechInput>,
        voice: Box<dyn SpeechOutput>,
        chat: Box<dyn ChatOracle>,
    ) -> Self {
        Self {
            config,
            perception,
            fusion: StateFusion::new(config.distance_mode),
            board,
            ear,
            voice,
            chat,
            dialogue: DialogueContextBuilder::new(config.language),
            interpreter: CommandInterpreter::new(config.language),
            phrasebook: Phrasebook::new(config.language),
            state: RobotState::empty(),
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &TurnLoopConfig {
        &self.config
    }

    /// The state produced by the most recent perception refresh.
    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Detect, fuse and replace the held state.
    ///
    /// # Errors
    ///
    /// Camera, classifier and range-sensor faults.
    pub fn refresh_perception(&mut self) -> Result<&RobotState, HomebotError> {
        self.phase = Phase::RefreshingPerception;
        let detections = self.perception.detect()?;
        let board = &mut self.board;
        self.state = self.fusion.fuse(detections, || board.read_distance())?;
        debug!(
            detections = self.state.detections.len(),
            distance_m = ?self.state.distance_m,
            "perception refreshed"
        );
        Ok(&self.state)
    }

    /// Execute `command` on the board and return the spoken feedback.
    ///
    /// [`Command::Unrecognized`] never reaches the board.
    ///
    /// # Errors
    ///
    /// Board transport faults.
    pub fn act(&mut self, command: &Command) -> Result<String, HomebotError> {
        if !command.is_recognized() {
            debug!("no command recognised; board left idle");
            return Ok(self.phrasebook.not_recognized().to_string());
        }
        let result = self.board.execute(command)?;
        if result.ok {
            info!(command = command.name(), response = %result.response, "command executed");
        } else {
            warn!(command = command.name(), response = %result.response, "board rejected command");
        }
        Ok(self.phrasebook.action_feedback(command, &result.response))
    }

    /// Run one turn inside a `turn` span carrying a fresh `turn_id`.
    ///
    /// # Errors
    ///
    /// The first collaborator failure; the turn is abandoned at that point.
    pub async fn run_once(&mut self) -> Result<TurnOutcome, HomebotError> {
        let span = info_span!("turn", turn_id = %Uuid::new_v4());
        let outcome = self.turn().instrument(span).await;
        if outcome.is_err() {
            self.phase = Phase::Idle;
        }
        outcome
    }

    /// Repeat [`run_once`][Self::run_once] until `shutdown` is set.
    ///
    /// Returns the number of completed turns.
    ///
    /// # Errors
    ///
    /// The first failing turn ends the loop.
    pub async fn run_until(&mut self, shutdown: &AtomicBool) -> Result<u64, HomebotError> {
        let mut turns = 0u64;
        while !shutdown.load(Ordering::Acquire) {
            self.run_once().await?;
            turns += 1;
        }
        info!(turns, "shutdown requested");
        Ok(turns)
    }

    /// Release the camera and the board.
    ///
    /// Both releases are attempted even when the first fails; the first
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Driver release failures.
    pub fn close(mut self) -> Result<(), HomebotError> {
        self.phase = Phase::Closing;
        let camera = self.perception.release();
        if let Err(e) = &camera {
            warn!(error = %e, "camera release failed");
        }
        let board = self.board.close();
        match &board {
            Ok(()) => info!(board = %self.board.id(), "control board closed"),
            Err(e) => warn!(board = %self.board.id(), error = %e, "control board close failed"),
        }
        camera.and(board)
    }

    async fn turn(&mut self) -> Result<TurnOutcome, HomebotError> {
        self.refresh_perception()?;

        self.phase = Phase::AwaitingSpeech;
        let heard = self.ear.listen(self.config.listen_timeout)?;
        let Some(utterance) = heard.filter(|text| !text.trim().is_empty()) else {
            debug!("no speech this turn");
            self.phase = Phase::Idle;
            return Ok(TurnOutcome::Silent);
        };
        info!(%utterance, "heard");

        self.phase = Phase::Dialoguing;
        let messages = self.dialogue.messages(&self.state, &utterance);
        let reply = self
            .chat
            .complete(&messages)
            .await
            .map_err(|e| HomebotError::ChatFailed(e.to_string()))?;
        debug!(%reply, "chat reply received");

        self.phase = Phase::ActingAndSpeaking;
        let command = self.interpreter.interpret(&utterance);
        let feedback = self.act(&command)?;
        self.voice.speak(&format!("{reply} {feedback}"))?;

        self.phase = Phase::Idle;
        Ok(TurnOutcome::Responded {
            utterance,
            reply,
            command,
            feedback,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use homebot_hal::sim::{
        BoardJournal, RecordingSpeaker, ReleaseFlag, ScriptedClassifier, ScriptedListener,
        SimBoard, SimCamera, Transcript,
    };
    use homebot_hal::{LabelTable, RawDetection};
    use homebot_perception::PerceptionConfig;

    use crate::llm_driver::{ChatMessage, LlmError, Role};

    /// Chat oracle that answers with a fixed reply and records each request.
    #[derive(Clone, Default)]
    struct FakeChat {
        calls: Arc<AtomicUsize>,
        last: Arc<Mutex<Vec<ChatMessage>>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatOracle for FakeChat {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last.lock() {
                *last = messages.to_vec();
            }
            if self.fail {
                return Err(LlmError::BadResponse("server said no".into()));
            }
            Ok("Claro.".to_string())
        }
    }

    struct Rig {
        turn_loop: TurnLoop,
        chat: FakeChat,
        board: BoardJournal,
        transcript: Transcript,
        camera: ReleaseFlag,
    }

    fn cup() -> RawDetection {
        RawDetection {
            class_id: 41,
            confidence: 0.9,
            xyxy: [10.0, 10.0, 60.0, 110.0],
        }
    }

    fn rig(
        mode: DistanceMode,
        frames: Vec<Vec<RawDetection>>,
        speech: Vec<Option<&str>>,
        sensor: Option<f64>,
        chat: FakeChat,
    ) -> Rig {
        let mut labels = LabelTable::new();
        labels.insert(41, "cup");
        let mut classifier = ScriptedClassifier::new(labels);
        for frame in frames {
            classifier = classifier.then(frame);
        }
        let camera = SimCamera::new("sim-cam");
        let camera_flag = camera.release_flag();
        let perception = PerceptionPipeline::new(
            Box::new(camera),
            Box::new(classifier),
            PerceptionConfig::default(),
        );
        let board = SimBoard::new().with_distance(sensor);
        let journal = board.journal();
        let speaker = RecordingSpeaker::new();
        let transcript = speaker.transcript();
        let config = TurnLoopConfig {
            distance_mode: mode,
            ..TurnLoopConfig::default()
        };
        let turn_loop = TurnLoop::new(
            config,
            perception,
            Box::new(board),
            Box::new(ScriptedListener::new(speech)),
            Box::new(speaker),
            Box::new(chat.clone()),
        );
        Rig {
            turn_loop,
            chat,
            board: journal,
            transcript,
            camera: camera_flag,
        }
    }

    #[tokio::test]
    async fn silent_turn_has_no_side_effects() {
        let mut r = rig(
            DistanceMode::Vision,
            vec![vec![cup()]],
            vec![None],
            None,
            FakeChat::default(),
        );
        let outcome = r.turn_loop.run_once().await.unwrap();
        assert_eq!(outcome, TurnOutcome::Silent);
        assert_eq!(r.chat.calls.load(Ordering::SeqCst), 0);
        assert!(r.board.commands().is_empty());
        assert!(r.transcript.lines().is_empty());
        // Perception still ran.
        assert_eq!(r.turn_loop.state().detections.len(), 1);
        assert_eq!(r.turn_loop.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn blank_transcripts_count_as_silence() {
        let mut r = rig(
            DistanceMode::Vision,
            vec![],
            vec![Some(""), Some("   ")],
            None,
            FakeChat::default(),
        );
        for _ in 0..2 {
            let outcome = r.turn_loop.run_once().await.unwrap();
            assert_eq!(outcome, TurnOutcome::Silent);
        }
        assert_eq!(r.chat.calls.load(Ordering::SeqCst), 0);
        assert!(r.board.commands().is_empty());
        assert!(r.transcript.lines().is_empty());
    }

    #[tokio::test]
    async fn vision_distance_reaches_the_chat_context() {
        let mut r = rig(
            DistanceMode::Vision,
            vec![vec![cup()]],
            vec![Some("o que você vê?")],
            Some(3.0),
            FakeChat::default(),
        );
        r.turn_loop.run_once().await.unwrap();
        let distance = r.turn_loop.state().distance_m.unwrap();
        assert!((distance - 0.96).abs() < 1e-9);
        assert_eq!(r.board.distance_reads(), 0);

        let sent = r.chat.last.lock().unwrap().clone();
        assert_eq!(sent.len(), 3);
        assert_eq!(
            sent[1],
            ChatMessage::system("Objetos detectados: cup. Distância estimada: 0.96 m.")
        );
        assert_eq!(sent[2].role, Role::User);
        assert_eq!(sent[2].content, "o que você vê?");
    }

    #[tokio::test]
    async fn sensor_mode_reads_the_board_once_per_turn() {
        let mut r = rig(
            DistanceMode::Sensor,
            vec![vec![cup(), cup()]],
            vec![None, None],
            Some(1.25),
            FakeChat::default(),
        );
        r.turn_loop.run_once().await.unwrap();
        assert_eq!(r.board.distance_reads(), 1);
        assert_eq!(r.turn_loop.state().distance_m, Some(1.25));
        r.turn_loop.run_once().await.unwrap();
        assert_eq!(r.board.distance_reads(), 2);
        // Second frame saw nothing, but the sensor still answered.
        assert!(r.turn_loop.state().detections.is_empty());
        assert_eq!(r.turn_loop.state().distance_m, Some(1.25));
    }

    #[tokio::test]
    async fn lift_utterance_drives_one_command_and_one_utterance() {
        let mut r = rig(
            DistanceMode::Vision,
            vec![],
            vec![Some("pode levantar o braço")],
            None,
            FakeChat::default(),
        );
        let outcome = r.turn_loop.run_once().await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Responded {
                utterance: "pode levantar o braço".to_string(),
                reply: "Claro.".to_string(),
                command: Command::Lift,
                feedback: "Comando lift: OK LIFT".to_string(),
            }
        );
        assert_eq!(r.board.commands(), vec![Command::Lift]);
        assert_eq!(r.chat.calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.transcript.lines(), vec!["Claro. Comando lift: OK LIFT"]);
    }

    #[tokio::test]
    async fn unrecognized_utterance_skips_the_board() {
        let mut r = rig(
            DistanceMode::Vision,
            vec![],
            vec![Some("bom dia")],
            None,
            FakeChat::default(),
        );
        r.turn_loop.run_once().await.unwrap();
        assert!(r.board.commands().is_empty());
        assert_eq!(r.transcript.lines(), vec!["Claro. Comando não reconhecido."]);
    }

    #[tokio::test]
    async fn chat_failure_aborts_the_turn() {
        let chat = FakeChat {
            fail: true,
            ..FakeChat::default()
        };
        let mut r = rig(
            DistanceMode::Vision,
            vec![],
            vec![Some("pegar o copo")],
            None,
            chat,
        );
        let err = r.turn_loop.run_once().await.unwrap_err();
        assert!(matches!(err, HomebotError::ChatFailed(_)), "got {err:?}");
        assert!(r.board.commands().is_empty());
        assert!(r.transcript.lines().is_empty());
        assert_eq!(r.turn_loop.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn run_until_stops_on_preset_flag() {
        let mut r = rig(
            DistanceMode::Vision,
            vec![],
            vec![],
            None,
            FakeChat::default(),
        );
        let shutdown = AtomicBool::new(true);
        assert_eq!(r.turn_loop.run_until(&shutdown).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn run_until_propagates_the_first_failure() {
        let chat = FakeChat {
            fail: true,
            ..FakeChat::default()
        };
        let mut r = rig(
            DistanceMode::Vision,
            vec![],
            vec![None, Some("andar")],
            None,
            chat,
        );
        let shutdown = AtomicBool::new(false);
        let err = r.turn_loop.run_until(&shutdown).await.unwrap_err();
        assert!(matches!(err, HomebotError::ChatFailed(_)));
        assert_eq!(r.chat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fatal_turn_still_releases_camera_and_board() {
        let chat = FakeChat {
            fail: true,
            ..FakeChat::default()
        };
        let r = rig(
            DistanceMode::Vision,
            vec![],
            vec![Some("andar")],
            None,
            chat,
        );
        let Rig {
            mut turn_loop,
            board,
            camera,
            ..
        } = r;
        let shutdown = AtomicBool::new(false);
        assert!(turn_loop.run_until(&shutdown).await.is_err());
        assert!(!camera.is_set());
        assert!(!board.is_closed());

        turn_loop.close().unwrap();
        assert!(camera.is_set());
        assert!(board.is_closed());
    }

    #[test]
    fn close_releases_camera_and_board() {
        let r = rig(
            DistanceMode::Vision,
            vec![],
            vec![],
            None,
            FakeChat::default(),
        );
        let journal = r.board.clone();
        let camera = r.camera.clone();
        r.turn_loop.close().unwrap();
        assert!(journal.is_closed());
        assert!(camera.is_set());
    }

    #[test]
    fn act_reports_board_reply() {
        let mut r = rig(
            DistanceMode::Vision,
            vec![],
            vec![],
            None,
            FakeChat::default(),
        );
        let feedback = r.turn_loop.act(&Command::MoveArm { angle_deg: 90 }).unwrap();
        assert_eq!(feedback, "Comando braço: OK ARM:90");
    }
}
