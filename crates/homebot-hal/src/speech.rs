//! Blocking speech collaborators.
//!
//! Recognition and synthesis backends are external; drivers adapt them to
//! these two traits.  Neither requires `Send`: terminal and audio handles
//! usually stay on the thread that opened them.

use std::time::Duration;

use homebot_types::HomebotError;

/// Speech-to-text input.
pub trait SpeechInput {
    /// Block until an utterance is recognised or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout or unintelligible audio.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::Speech`] when the audio device is unusable.
    fn listen(&mut self, timeout: Duration) -> Result<Option<String>, HomebotError>;
}

/// Text-to-speech output.
pub trait SpeechOutput {
    /// Render `text` and block until playback has finished.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::Speech`] when the synthesiser fails.
    fn speak(&mut self, text: &str) -> Result<(), HomebotError>;
}
