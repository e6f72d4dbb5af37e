//! `homebot-runtime` – the conversational control loop.
//!
//! # Modules
//!
//! - [`turn_loop`] – [`TurnLoop`][turn_loop::TurnLoop]: owns every
//!   collaborator and drives perceive → listen → chat → act → speak turns
//!   until shutdown, then releases the hardware.
//! - [`interpreter`] – [`CommandInterpreter`][interpreter::CommandInterpreter]:
//!   first-match keyword rules from an utterance to one
//!   [`Command`][homebot_types::Command].
//! - [`dialogue`] – [`DialogueContextBuilder`][dialogue::DialogueContextBuilder]:
//!   renders the current [`RobotState`][homebot_types::RobotState] as context
//!   sentences for the chat request.
//! - [`phrasebook`] – per-language vocabulary, persona and feedback strings.
//! - [`llm_driver`] – the [`ChatOracle`][llm_driver::ChatOracle] trait and
//!   [`LlmDriver`][llm_driver::LlmDriver], an [Ollama](https://ollama.com)
//!   `/api/chat` client.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: `tracing`
//!   subscriber with optional OTLP span export.

pub mod dialogue;
pub mod interpreter;
pub mod llm_driver;
pub mod phrasebook;
pub mod telemetry;
pub mod turn_loop;

pub use dialogue::DialogueContextBuilder;
pub use interpreter::CommandInterpreter;
pub use llm_driver::{ChatMessage, ChatOracle, LlmDriver, LlmError, Role};
pub use phrasebook::Phrasebook;
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use turn_loop::{Phase, TurnLoop, TurnLoopConfig, TurnOutcome};
