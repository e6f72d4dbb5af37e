//! Per-language wording: trigger vocabulary, persona prompt, perception
//! context sentences and spoken action feedback.

use homebot_types::{Command, Language};

/// Which command family a trigger keyword selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Lift,
    Arm,
    Grab,
    Release,
    Walk,
    Rotate,
}

/// Trigger keywords in priority order; the first family with a match wins.
type Vocabulary = [(Trigger, &'static [&'static str]); 6];

const PORTUGUESE_VOCABULARY: Vocabulary = [
    (Trigger::Lift, &["levantar"]),
    (Trigger::Arm, &["braço", "braco"]),
    (Trigger::Grab, &["pegar"]),
    (Trigger::Release, &["soltar"]),
    (Trigger::Walk, &["andar"]),
    (Trigger::Rotate, &["girar"]),
];

const ENGLISH_VOCABULARY: Vocabulary = [
    (Trigger::Lift, &["lift"]),
    (Trigger::Arm, &["arm"]),
    (Trigger::Grab, &["grab", "take"]),
    (Trigger::Release, &["release", "drop"]),
    (Trigger::Walk, &["walk", "move"]),
    (Trigger::Rotate, &["rotate", "turn"]),
];

const PORTUGUESE_PERSONA: &str = "Você é o cérebro de um robô doméstico com visão, locomoção e braço. \
Responda em português e seja direto ao orientar o usuário.";

const ENGLISH_PERSONA: &str = "You are the brain of a home robot with vision, locomotion and an arm. \
Answer in English and be direct when guiding the user.";

/// Fixed strings for one [`Language`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phrasebook {
    language: Language,
}

impl Phrasebook {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn vocabulary(&self) -> &'static [(Trigger, &'static [&'static str])] {
        match self.language {
            Language::Portuguese => &PORTUGUESE_VOCABULARY,
            Language::English => &ENGLISH_VOCABULARY,
        }
    }

    /// System-role instruction sent at the top of every chat request.
    pub fn persona(&self) -> &'static str {
        match self.language {
            Language::Portuguese => PORTUGUESE_PERSONA,
            Language::English => ENGLISH_PERSONA,
        }
    }

    pub fn detected_objects(&self, labels: &str) -> String {
        match self.language {
            Language::Portuguese => format!("Objetos detectados: {labels}."),
            Language::English => format!("Detected objects: {labels}."),
        }
    }

    pub fn estimated_distance(&self, distance_m: f64) -> String {
        match self.language {
            Language::Portuguese => format!("Distância estimada: {distance_m:.2} m."),
            Language::English => format!("Estimated distance: {distance_m:.2} m."),
        }
    }

    /// Spoken summary of a dispatched command and the board's reply.
    pub fn action_feedback(&self, command: &Command, response: &str) -> String {
        if !command.is_recognized() {
            return self.not_recognized().to_string();
        }
        let name = match (self.language, command) {
            (Language::Portuguese, Command::MoveArm { .. }) => "braço",
            (Language::Portuguese, Command::Grab) => "pegar",
            (Language::Portuguese, Command::Release) => "soltar",
            (Language::Portuguese, Command::Walk { .. }) => "andar",
            (Language::Portuguese, Command::Rotate { .. }) => "girar",
            (_, other) => other.name(),
        };
        match self.language {
            Language::Portuguese => format!("Comando {name}: {response}"),
            Language::English => format!("Command {name}: {response}"),
        }
    }

    pub fn not_recognized(&self) -> &'static str {
        match self.language {
            Language::Portuguese => "Comando não reconhecido.",
            Language::English => "Command not recognized.",
        }
    }
}
