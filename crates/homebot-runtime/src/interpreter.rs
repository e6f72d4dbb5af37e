//! [`CommandInterpreter`] – free-form speech → one discrete [`Command`].
//!
//! Matching is a flat priority list of substring triggers evaluated top to
//! bottom on the lower-cased utterance.  The first family with a matching
//! keyword wins, even when later keywords are present too:
//!
//! 1. lift → [`Command::Lift`]
//! 2. arm → [`Command::MoveArm`] at [`ARM_ANGLE_DEG`]
//! 3. grab / take → [`Command::Grab`]
//! 4. release / drop → [`Command::Release`]
//! 5. walk / move → [`Command::Walk`] [`WALK_STEPS`] steps forward
//! 6. rotate / turn → [`Command::Rotate`] [`ROTATE_DEGREES`]° left
//! 7. anything else → [`Command::Unrecognized`]
//!
//! Command parameters are fixed; nothing is parsed out of the utterance.
//!
//! # Example
//!
//! ```rust
//! use homebot_runtime::interpreter::CommandInterpreter;
//! use homebot_types::{Command, Language};
//!
//! let interpreter = CommandInterpreter::new(Language::Portuguese);
//! assert_eq!(interpreter.interpret("pode levantar o braço"), Command::Lift);
//! ```

use homebot_types::{Command, Direction, Language};
use tracing::debug;

use crate::phrasebook::{Phrasebook, Trigger};

pub const ARM_ANGLE_DEG: u16 = 90;
pub const WALK_DIRECTION: Direction = Direction::Forward;
pub const WALK_STEPS: u32 = 3;
pub const ROTATE_DIRECTION: Direction = Direction::Left;
pub const ROTATE_DEGREES: u32 = 45;

/// Deterministic keyword interpreter for one language.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    phrasebook: Phrasebook,
}

impl CommandInterpreter {
    pub fn new(language: Language) -> Self {
        Self {
            phrasebook: Phrasebook::new(language),
        }
    }

    pub fn interpret(&self, utterance: &str) -> Command {
        let normalized = utterance.to_lowercase();
        let command = self
            .phrasebook
            .vocabulary()
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(*k)))
            .map(|(trigger, _)| command_for(*trigger))
            .unwrap_or(Command::Unrecognized);
        debug!(utterance = %normalized, command = command.name(), "utterance interpreted");
        command
    }
}

fn command_for(trigger: Trigger) -> Command {
    match trigger {
        Trigger::Lift => Command::Lift,
        Trigger::Arm => Command::MoveArm {
            angle_deg: ARM_ANGLE_DEG,
        },
        Trigger::Grab => Command::Grab,
        Trigger::Release => Command::Release,
        Trigger::Walk => Command::Walk {
            direction: WALK_DIRECTION,
            steps: WALK_STEPS,
        },
        Trigger::Rotate => Command::Rotate {
            direction: ROTATE_DIRECTION,
            degrees: ROTATE_DEGREES,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> CommandInterpreter {
        CommandInterpreter::new(Language::Portuguese)
    }

    fn en() -> CommandInterpreter {
        CommandInterpreter::new(Language::English)
    }

    #[test]
    fn lift_beats_arm_in_same_utterance() {
        assert_eq!(pt().interpret("pode levantar o braço"), Command::Lift);
    }

    #[test]
    fn lift_beats_grab() {
        assert_eq!(pt().interpret("pegar e levantar a caixa"), Command::Lift);
        assert_eq!(en().interpret("grab it and lift it"), Command::Lift);
    }

    #[test]
    fn arm_accepts_both_spellings() {
        let expected = Command::MoveArm { angle_deg: 90 };
        assert_eq!(pt().interpret("mexa o braço"), expected);
        assert_eq!(pt().interpret("mexa o braco"), expected);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(pt().interpret("PEGAR o copo"), Command::Grab);
        assert_eq!(pt().interpret("Soltar"), Command::Release);
        assert_eq!(pt().interpret("BRAÇO"), Command::MoveArm { angle_deg: 90 });
    }

    #[test]
    fn locomotion_uses_fixed_parameters() {
        assert_eq!(
            pt().interpret("andar dez passos para trás"),
            Command::Walk {
                direction: Direction::Forward,
                steps: 3
            }
        );
        assert_eq!(
            pt().interpret("girar noventa graus à direita"),
            Command::Rotate {
                direction: Direction::Left,
                degrees: 45
            }
        );
    }

    #[test]
    fn release_before_walk() {
        assert_eq!(pt().interpret("soltar e andar"), Command::Release);
        assert_eq!(en().interpret("drop it and move on"), Command::Release);
    }

    #[test]
    fn english_synonyms() {
        assert_eq!(en().interpret("take the cup"), Command::Grab);
        assert_eq!(
            en().interpret("turn around"),
            Command::Rotate {
                direction: Direction::Left,
                degrees: 45
            }
        );
    }

    #[test]
    fn no_trigger_is_unrecognized() {
        assert_eq!(pt().interpret("qual é a previsão do tempo?"), Command::Unrecognized);
        assert_eq!(pt().interpret(""), Command::Unrecognized);
    }
}
