//! Terminal stand-ins for the microphone and the speaker.
//!
//! [`ConsoleEar`] reads one typed line per listen.  The terminal has no
//! notion of a listen timeout, so an empty line plays the role of "nothing
//! heard".  Ctrl-C or Ctrl-D at the prompt raises the shutdown flag.
//! [`ConsoleVoice`] prints what the robot says.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use homebot_hal::{SpeechInput, SpeechOutput};
use homebot_types::HomebotError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

const PROMPT: &str = "you> ";

pub struct ConsoleEar {
    editor: DefaultEditor,
    shutdown: Arc<AtomicBool>,
}

impl ConsoleEar {
    pub fn new(shutdown: Arc<AtomicBool>) -> Result<Self, HomebotError> {
        let editor = DefaultEditor::new()
            .map_err(|e| HomebotError::Speech(format!("terminal unavailable: {e}")))?;
        Ok(Self { editor, shutdown })
    }
}

impl SpeechInput for ConsoleEar {
    fn listen(&mut self, _timeout: Duration) -> Result<Option<String>, HomebotError> {
        match self.editor.readline(PROMPT) {
            Ok(line) => Ok(heard(&line).inspect(|text| {
                let _ = self.editor.add_history_entry(text.as_str());
            })),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                debug!("console closed by operator");
                self.shutdown.store(true, Ordering::SeqCst);
                Ok(None)
            }
            Err(e) => Err(HomebotError::Speech(e.to_string())),
        }
    }
}

/// A blank line counts as silence.
fn heard(line: &str) -> Option<String> {
    let text = line.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[derive(Default)]
pub struct ConsoleVoice;

impl SpeechOutput for ConsoleVoice {
    fn speak(&mut self, text: &str) -> Result<(), HomebotError> {
        println!("{} {}", "robot>".bold().green(), text);
        Ok(())
    }
}
